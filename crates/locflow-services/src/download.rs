//! Batch download & merge reconciliation.
//!
//! Given the file/version/locale triples that are ready on the service, the
//! reconciler fetches their content in one batch call, decides per file
//! whether to write, skip or fail, merges composite formats into the
//! existing target file, and records version bookkeeping so later runs skip
//! work that is already done. Per-file failures never abort the batch; the
//! ledger is flushed at most once per batch.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, warn};

use locflow_client::ApiClient;
use locflow_core::{FileFormat, Result};
use locflow_domain::{
    BatchDownloadRequest, BatchDownloadResult, DownloadWarning, DownloadedFile, FileQuery,
    FileReference,
};

use crate::ledger::{LedgerEntry, LedgerKey, VersionLedger};
use crate::util::write_atomic;

/// One requested file/locale pair with everything the reconciler needs to
/// land it on disk.
#[derive(Debug, Clone)]
pub struct TrackedFile {
    pub query: FileQuery,
    pub file_name: String,
    pub file_format: FileFormat,
    pub input_path: PathBuf,
    /// `None` when the output template could not be resolved; such files
    /// fail instead of being written somewhere surprising.
    pub output_path: Option<PathBuf>,
}

impl TrackedFile {
    fn reference(&self) -> FileReference {
        FileReference {
            branch_id: self.query.branch_id.clone(),
            file_id: self.query.file_id.clone(),
            version_id: self.query.version_id.clone(),
            locale: self.query.locale.clone(),
            input_path: self.input_path.display().to_string(),
            output_path: self
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

/// The requested set of one batch operation, keyed by the composite
/// `branch:file:version:locale`.
#[derive(Debug, Default)]
pub struct FileTracker {
    records: HashMap<String, TrackedFile>,
}

impl FileTracker {
    pub fn insert(&mut self, file: TrackedFile) {
        self.records.insert(file.query.composite_key(), file);
    }

    pub fn get(&self, composite_key: &str) -> Option<&TrackedFile> {
        self.records.get(composite_key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn queries(&self) -> Vec<FileQuery> {
        let mut queries: Vec<FileQuery> =
            self.records.values().map(|r| r.query.clone()).collect();
        queries.sort_by_key(|q| q.composite_key());
        queries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedFile> {
        self.records.values()
    }
}

pub struct Reconciler<'a> {
    client: &'a ApiClient,
    ledger: &'a mut VersionLedger,
    force: bool,
    backup: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a ApiClient, ledger: &'a mut VersionLedger) -> Self {
        Reconciler {
            client,
            ledger,
            force: false,
            backup: false,
        }
    }

    /// Re-download and re-merge even when the ledger says the work is done.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Copy existing outputs to `.bak` before overwriting.
    pub fn backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Fetch every tracked file in one batch call and merge the results. A
    /// transport failure of the batch call itself fails the whole requested
    /// set; per-file problems only fail that file.
    pub async fn download_batch(&mut self, tracker: &FileTracker) -> Result<BatchDownloadResult> {
        if tracker.is_empty() {
            return Ok(BatchDownloadResult::default());
        }
        let request = BatchDownloadRequest {
            files: tracker.queries(),
        };
        match self.client.download_batch(&request).await {
            Ok(resp) => self.apply_batch(tracker, resp.files),
            Err(err) => {
                warn!("batch download failed: {err}");
                let mut result = BatchDownloadResult::default();
                for tracked in tracker.iter() {
                    result.failed.push(tracked.reference());
                    result.warnings.push(DownloadWarning {
                        file_id: tracked.query.file_id.clone(),
                        locale: tracked.query.locale.clone(),
                        message: format!("batch download failed: {err}"),
                    });
                }
                // Mutation only happens after per-file success, so the ledger
                // is clean here; the flush keeps the invariant explicit.
                if self.ledger.is_dirty() {
                    self.ledger.save()?;
                }
                Ok(result)
            }
        }
    }

    /// Merge a batch response into the local tree. Split from the network
    /// call so tests (and dry-run tooling) can drive it directly.
    pub fn apply_batch(
        &mut self,
        tracker: &FileTracker,
        entries: Vec<DownloadedFile>,
    ) -> Result<BatchDownloadResult> {
        let mut result = BatchDownloadResult::default();
        let mut seen: Vec<String> = Vec::new();

        for entry in entries {
            let key = entry.composite_key();
            // The server may return entries nobody asked for; ignore them.
            let Some(tracked) = tracker.get(&key) else {
                debug!(%key, "ignoring unrequested response entry");
                continue;
            };
            seen.push(key.clone());

            match self.apply_one(tracked, &entry) {
                Ok(Applied::Written) => result.successful.push(tracked.reference()),
                Ok(Applied::Skipped) => result.skipped.push(tracked.reference()),
                Err(message) => {
                    warn!(
                        file = %tracked.file_name,
                        locale = %tracked.query.locale,
                        "failed_download: {message}"
                    );
                    result.failed.push(tracked.reference());
                    result.warnings.push(DownloadWarning {
                        file_id: tracked.query.file_id.clone(),
                        locale: tracked.query.locale.clone(),
                        message,
                    });
                }
            }
        }

        // Requested files the server did not return are a server-side miss.
        for tracked in tracker.iter() {
            let key = tracked.query.composite_key();
            if !seen.contains(&key) {
                result.failed.push(tracked.reference());
                result.warnings.push(DownloadWarning {
                    file_id: tracked.query.file_id.clone(),
                    locale: tracked.query.locale.clone(),
                    message: "no content returned by the service".to_string(),
                });
            }
        }

        if self.ledger.is_dirty() {
            self.ledger.save()?;
        }
        Ok(result)
    }

    fn apply_one(&mut self, tracked: &TrackedFile, entry: &DownloadedFile) -> std::result::Result<Applied, String> {
        let Some(output_path) = tracked.output_path.as_ref() else {
            return Err("no output path mapping for this file".to_string());
        };

        let key = LedgerKey::from(&tracked.query);
        let prior = self.ledger.get(&key).cloned();

        // Source drift: if we recorded what the source looked like when this
        // translation was merged, compare against the source as it is now.
        // An unreadable source counts as changed (reprocess, don't skip).
        let source_changed = match prior.as_ref().and_then(|p| p.source_hash.as_deref()) {
            Some(recorded) => match std::fs::read_to_string(&tracked.input_path) {
                Ok(current) => locflow_hash::hash_content(&current) != recorded,
                Err(_) => true,
            },
            None => false,
        };

        if !self.force && !source_changed && prior.is_some() && output_path.exists() {
            debug!(
                file = %tracked.file_name,
                locale = %tracked.query.locale,
                "up to date, skipping"
            );
            return Ok(Applied::Skipped);
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("cannot create {}: {e}", parent.display()))?;
        }

        // Composite formats merge into whatever is already translated on
        // disk; whole-document formats replace it.
        let existing = if tracked.file_format.is_composite() && output_path.exists() {
            std::fs::read_to_string(output_path).ok()
        } else {
            None
        };
        let merged =
            locflow_formats::merge_translated(tracked.file_format, existing.as_deref(), &entry.data)
                .map_err(|e| e.to_string())?;

        // Hash the pre-merge source now, so the next run can tell whether
        // the source drifted after this translation landed.
        let source_hash = std::fs::read_to_string(&tracked.input_path)
            .ok()
            .map(|c| locflow_hash::hash_content(&c));

        if self.backup {
            let _ = crate::util::backup_file(output_path);
        }
        write_atomic(output_path, merged.as_bytes())
            .map_err(|e| format!("cannot write {}: {e}", output_path.display()))?;

        self.ledger.upsert(
            key,
            LedgerEntry {
                updated_at: Utc::now(),
                source_hash,
            },
        );
        Ok(Applied::Written)
    }
}

enum Applied {
    Written,
    Skipped,
}
