//! The "push" pipeline: Upload → Setup → Enqueue, plus the wait loop that
//! follows translation progress for an enqueued version.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use locflow_client::ApiClient;
use locflow_core::Result;
use locflow_domain::{
    EnqueueOutcome, EnqueueRequest, FileLocaleState, FileQuery, PollOutcome, PollProgress,
    SetupRequest, StatusRequest, UploadFilePayload, UploadedFile,
};

use crate::download::{FileTracker, TrackedFile};
use crate::poll::{wait_until, PollOptions};
use crate::scan::SourceFile;
use crate::workflow::{Step, StepContext, Workflow};

/// Settings of one sync operation, threaded through steps by reference.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub branch_id: String,
    pub source_locale: String,
    pub target_locales: Vec<String>,
    pub timeout: Duration,
    pub force: bool,
}

/// Uploads raw file payloads and returns the server-acknowledged entities.
pub struct UploadStep;

#[async_trait]
impl Step for UploadStep {
    type Input = Vec<UploadFilePayload>;
    type Output = Vec<UploadedFile>;

    fn name(&self) -> &'static str {
        "upload"
    }

    async fn run(
        &self,
        input: Self::Input,
        ctx: &StepContext<'_>,
    ) -> Result<Self::Output> {
        debug!(files = input.len(), "uploading source files");
        let resp = ctx.client.upload_files(&input).await?;
        Ok(resp.files)
    }
}

pub struct SetupOutput {
    pub files: Vec<UploadedFile>,
    pub branch_id: String,
    pub locales: Vec<String>,
}

/// Performs project/version setup for the uploaded entities.
pub struct SetupStep;

#[async_trait]
impl Step for SetupStep {
    type Input = Vec<UploadedFile>;
    type Output = SetupOutput;

    fn name(&self) -> &'static str {
        "setup"
    }

    async fn run(
        &self,
        input: Self::Input,
        ctx: &StepContext<'_>,
    ) -> Result<Self::Output> {
        let resp = ctx
            .client
            .setup_project(&SetupRequest {
                files: input.clone(),
                timeout_secs: ctx.settings.timeout.as_secs(),
            })
            .await?;
        Ok(SetupOutput {
            files: input,
            branch_id: resp.branch_id,
            locales: resp.locales,
        })
    }
}

pub struct PushOutput {
    pub branch_id: String,
    pub outcome: EnqueueOutcome,
}

/// Registers the uploaded entities for translation.
pub struct EnqueueStep;

#[async_trait]
impl Step for EnqueueStep {
    type Input = SetupOutput;
    type Output = PushOutput;

    fn name(&self) -> &'static str {
        "enqueue"
    }

    async fn run(
        &self,
        input: Self::Input,
        ctx: &StepContext<'_>,
    ) -> Result<Self::Output> {
        let resp = ctx
            .client
            .enqueue(&EnqueueRequest {
                files: input.files,
                branch_id: input.branch_id.clone(),
                force: ctx.settings.force,
                timeout_secs: ctx.settings.timeout.as_secs(),
            })
            .await?;
        Ok(PushOutput {
            branch_id: input.branch_id,
            outcome: EnqueueOutcome {
                version_id: resp.version_id,
                locales: resp.locales,
                message: resp.message,
            },
        })
    }
}

/// Run the full push workflow for the discovered sources and build the
/// tracker used by polling and the reconciler. `resolve_output` maps a
/// relative source path and locale to the local destination; `None` marks
/// the destination unresolvable (the reconciler will fail that file).
pub async fn push_files(
    client: &ApiClient,
    settings: &SyncSettings,
    sources: &[SourceFile],
    resolve_output: impl Fn(&str, &str) -> Option<PathBuf>,
) -> Result<(EnqueueOutcome, FileTracker)> {
    let payloads: Vec<UploadFilePayload> = sources
        .iter()
        .map(|s| UploadFilePayload {
            file_name: s.rel_path.clone(),
            file_format: s.file_format,
            data_format: s.data_format,
            content: s.content.clone(),
            locale: settings.source_locale.clone(),
            format_metadata: None,
        })
        .collect();

    let ctx = StepContext { client, settings };
    let workflow = Workflow::start(UploadStep).then(SetupStep).then(EnqueueStep);
    let pushed = workflow.run(payloads, &ctx).await?;

    let tracker = track_sources(sources, &pushed.branch_id, &settings.target_locales, resolve_output);
    Ok((pushed.outcome, tracker))
}

/// Build the file tracker for a set of sources without a remote round-trip.
/// File and version ids are derived locally (path/content hashing), so the
/// pull-only path can reconstruct the same tracker the push path produced.
pub fn track_sources(
    sources: &[SourceFile],
    branch_id: &str,
    locales: &[String],
    resolve_output: impl Fn(&str, &str) -> Option<PathBuf>,
) -> FileTracker {
    let mut tracker = FileTracker::default();
    for source in sources {
        for locale in locales {
            tracker.insert(TrackedFile {
                query: FileQuery {
                    branch_id: branch_id.to_string(),
                    file_id: source.file_id.clone(),
                    version_id: source.version_id.clone(),
                    locale: locale.clone(),
                },
                file_name: source.rel_path.clone(),
                file_format: source.file_format,
                input_path: source.path.clone(),
                output_path: resolve_output(&source.rel_path, locale),
            });
        }
    }
    tracker
}

/// Per-invocation poll bookkeeping: which file/locale pairs are done.
/// Discarded when the wait terminates; never shared across invocations.
#[derive(Debug, Default)]
pub struct DownloadStatus {
    pub downloaded: HashSet<String>,
    pub failed: HashSet<String>,
}

pub fn file_key(file_name: &str, locale: &str) -> String {
    format!("{file_name}:{locale}")
}

/// Poll job status until every expected file/locale pair is ready or failed,
/// or the deadline elapses. Progress snapshots go to `on_progress`; the
/// callback is presentational and cannot influence the outcome.
pub async fn wait_for_translations(
    client: &ApiClient,
    version_id: &str,
    expected: usize,
    opts: &PollOptions,
    on_progress: impl FnMut(&PollProgress),
) -> (PollOutcome, DownloadStatus) {
    let status = RefCell::new(DownloadStatus::default());
    let on_progress = RefCell::new(on_progress);

    let outcome = wait_until(opts, || {
        let status = &status;
        let on_progress = &on_progress;
        let req = StatusRequest {
            version_id: version_id.to_string(),
        };
        async move {
            let resp = client.job_status(&req).await?;

            let mut st = status.borrow_mut();
            let mut progress = PollProgress::default();
            for unit in &resp.files {
                let key = file_key(&unit.file_name, &unit.locale);
                let state = if unit.ready {
                    st.downloaded.insert(key);
                    "ready"
                } else if unit.failed {
                    st.failed.insert(key);
                    "failed"
                } else {
                    "pending"
                };
                progress.files.push(FileLocaleState {
                    file_name: unit.file_name.clone(),
                    locale: unit.locale.clone(),
                    state: state.to_string(),
                });
            }
            progress.ready = st.downloaded.len();
            progress.failed = st.failed.len();
            progress.pending = expected.saturating_sub(progress.ready + progress.failed);
            let done = st.downloaded.len() + st.failed.len() >= expected;
            drop(st);

            (on_progress.borrow_mut())(&progress);
            Ok(done)
        }
    })
    .await;

    (outcome, status.into_inner())
}
