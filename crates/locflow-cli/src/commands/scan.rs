use crate::context::ProjectContext;

pub fn run_scan(json: bool) -> color_eyre::Result<()> {
    let ctx = ProjectContext::load()?;
    let include = ctx.include();
    tracing::debug!(root = %ctx.root.display(), ?include, "scanning for source files");

    let files = locflow_services::discover_files(&ctx.root, &include)?;

    if json {
        let items: Vec<_> = files.iter().map(|f| f.to_scanned()).collect();
        serde_json::to_writer_pretty(std::io::stdout().lock(), &items)?;
        println!();
        return Ok(());
    }

    if files.is_empty() {
        crate::ui_warn!("no translatable files found under {:?}", include);
        return Ok(());
    }
    let mut total_units = 0usize;
    for f in &files {
        let scanned = f.to_scanned();
        total_units += scanned.units;
        crate::ui_out!(
            "{}  [{}]  {} unit(s)",
            f.rel_path,
            f.file_format.as_str(),
            scanned.units
        );
    }
    crate::ui_ok!("{} file(s), {} unit(s)", files.len(), total_units);
    Ok(())
}
