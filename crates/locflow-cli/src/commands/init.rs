use color_eyre::eyre::eyre;

const STARTER_CONFIG: &str = r#"# locflow project configuration
api_base = "https://api.locflow.dev"
project_id = ""
source_locale = "en"
target_locales = []

[files]
include = ["content"]
output = "locales/{locale}/{name}"

[poll]
tick_ms = 5000
timeout_secs = 600
"#;

pub fn run_init(overwrite: bool) -> color_eyre::Result<()> {
    let path = std::env::current_dir()?.join("locflow.toml");
    if path.exists() && !overwrite {
        return Err(eyre!(
            "{} already exists (use --overwrite to replace it)",
            path.display()
        ));
    }
    std::fs::write(&path, STARTER_CONFIG)?;
    crate::ui_ok!("wrote {}", path.display());
    crate::ui_info!("fill in project_id and target_locales, then run `locflow scan`");
    Ok(())
}
