use locflow_services::send::track_sources;
use locflow_services::{Reconciler, VersionLedger};

use crate::context::ProjectContext;

pub async fn run_pull(force: bool, backup: bool, dry_run: bool) -> color_eyre::Result<()> {
    let ctx = ProjectContext::load()?;
    let files = locflow_services::discover_files(&ctx.root, &ctx.include())?;
    if files.is_empty() {
        crate::ui_warn!("nothing to pull: no translatable files found");
        return Ok(());
    }
    let locales = ctx.target_locales()?;
    let tracker = track_sources(&files, &ctx.branch_id(), &locales, ctx.output_resolver());

    if dry_run {
        let mut rows: Vec<_> = tracker
            .iter()
            .map(|t| {
                let out = t
                    .output_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unresolved>".to_string());
                format!("{} [{}] -> {}", t.file_name, t.query.locale, out)
            })
            .collect();
        rows.sort();
        for row in rows {
            crate::ui_out!("{row}");
        }
        crate::ui_out!("TOTAL: {} file/locale pair(s)", tracker.len());
        return Ok(());
    }

    let client = ctx.client()?;
    let mut ledger = VersionLedger::load(ctx.ledger_path());
    let result = Reconciler::new(&client, &mut ledger)
        .force(force)
        .backup(backup)
        .download_batch(&tracker)
        .await?;

    for w in &result.warnings {
        crate::ui_warn!("{} [{}]: {}", w.file_id, w.locale, w.message);
    }
    crate::ui_ok!(
        "{} written, {} skipped, {} failed",
        result.successful.len(),
        result.skipped.len(),
        result.failed.len()
    );
    Ok(())
}
