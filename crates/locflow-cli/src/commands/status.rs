use locflow_domain::StatusRequest;

use crate::context::ProjectContext;

pub async fn run_status(version_id: String, use_color: bool) -> color_eyre::Result<()> {
    let ctx = ProjectContext::load()?;
    let client = ctx.client()?;
    let resp = client
        .job_status(&StatusRequest { version_id })
        .await?;

    let mut ready = 0usize;
    let mut failed = 0usize;
    let mut pending = 0usize;
    for unit in &resp.files {
        let state = if unit.ready {
            ready += 1;
            "ready"
        } else if unit.failed {
            failed += 1;
            "failed"
        } else {
            pending += 1;
            "pending"
        };
        if use_color {
            use owo_colors::OwoColorize;
            let colored: String = match state {
                "ready" => format!("{}", state.green()),
                "failed" => format!("{}", state.red()),
                _ => format!("{}", state.yellow()),
            };
            crate::ui_out!("{:<8} {} [{}]", colored, unit.file_name, unit.locale);
        } else {
            crate::ui_out!("{:<8} {} [{}]", state, unit.file_name, unit.locale);
        }
    }
    crate::ui_ok!("{ready} ready, {failed} failed, {pending} pending");
    Ok(())
}
