use locflow_domain::{PollOutcome, PushReport, SCHEMA_VERSION};
use locflow_services::{push_files, wait_for_translations, Reconciler, VersionLedger};

use crate::context::ProjectContext;

pub async fn run_push(force: bool, wait: bool, dry_run: bool) -> color_eyre::Result<()> {
    let ctx = ProjectContext::load()?;
    let files = locflow_services::discover_files(&ctx.root, &ctx.include())?;
    if files.is_empty() {
        crate::ui_warn!("nothing to push: no translatable files found");
        return Ok(());
    }

    if dry_run {
        for f in &files {
            crate::ui_out!("would upload {}  [{}]", f.rel_path, f.file_format.as_str());
        }
        crate::ui_out!("TOTAL: {} file(s)", files.len());
        return Ok(());
    }

    let client = ctx.client()?;
    let settings = ctx.settings(force)?;
    let (outcome, tracker) =
        push_files(&client, &settings, &files, ctx.output_resolver()).await?;

    let report = PushReport {
        schema_version: SCHEMA_VERSION,
        version_id: outcome.version_id.clone(),
        locales: outcome.locales.clone(),
        files: files.len(),
        message: outcome.message.clone(),
    };
    crate::ui_ok!(
        "enqueued {} file(s) for {} locale(s) as version {}",
        report.files,
        report.locales.len(),
        report.version_id
    );
    if !report.message.is_empty() {
        crate::ui_info!("{}", report.message);
    }

    if !wait {
        return Ok(());
    }

    let opts = ctx.poll_options();
    let (poll_outcome, status) = wait_for_translations(
        &client,
        &outcome.version_id,
        tracker.len(),
        &opts,
        |p| {
            crate::ui_info!(
                "waiting: {} ready, {} failed, {} pending",
                p.ready,
                p.failed,
                p.pending
            );
        },
    )
    .await;

    if poll_outcome == PollOutcome::TimedOut {
        crate::ui_warn!(
            "timed out after {}s; downloading what is ready",
            opts.timeout.as_secs()
        );
    }
    for key in &status.failed {
        crate::ui_warn!("translation failed for {key}");
    }

    let mut ledger = VersionLedger::load(ctx.ledger_path());
    let result = Reconciler::new(&client, &mut ledger)
        .force(force)
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
