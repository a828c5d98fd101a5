use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use locflow_core::{DataFormat, FileFormat};

pub const SCHEMA_VERSION: u32 = 1;

/// One file/locale pair tracked through a sync operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileReference {
    pub branch_id: String,
    pub file_id: String,
    pub version_id: String,
    pub locale: String,
    /// Local source path the upload was produced from.
    pub input_path: String,
    /// Local destination for the translated file.
    pub output_path: String,
}

impl FileReference {
    /// Composite lookup key used by the reconciler and the ledger.
    pub fn composite_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.branch_id, self.file_id, self.version_id, self.locale
        )
    }
}

/// Outcome of one batch download & merge pass.
/// `skipped` entries already reflect the requested version on disk and their
/// source has not drifted; downloading again would be redundant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BatchDownloadResult {
    pub successful: Vec<FileReference>,
    pub failed: Vec<FileReference>,
    pub skipped: Vec<FileReference>,
    pub warnings: Vec<DownloadWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DownloadWarning {
    pub file_id: String,
    pub locale: String,
    pub message: String,
}

/// Result of the Upload → Setup → Enqueue workflow.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EnqueueOutcome {
    pub version_id: String,
    pub locales: Vec<String>,
    /// Human-readable summary from the service, passed through for display.
    pub message: String,
}

/// Terminal states of the poll engine. Exactly one is reported per wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PollOutcome {
    Completed,
    TimedOut,
}

/// Presentational snapshot emitted on each poll tick. Never feeds back into
/// the poll state machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PollProgress {
    pub ready: usize,
    pub failed: usize,
    pub pending: usize,
    pub files: Vec<FileLocaleState>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileLocaleState {
    pub file_name: String,
    pub locale: String,
    /// "ready" | "failed" | "pending"
    pub state: String,
}

/// Summary handed to the CLI after a `push`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushReport {
    pub schema_version: u32,
    pub version_id: String,
    pub locales: Vec<String>,
    pub files: usize,
    pub message: String,
}

/// A source file discovered by the scanner.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScannedFile {
    pub schema_version: u32,
    pub path: String,
    pub rel_path: String,
    pub file_format: FileFormat,
    pub units: usize,
}

// ---------------------------------------------------------------------------
// Wire shapes. The remote service speaks camelCase JSON.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFilePayload {
    pub file_name: String,
    pub file_format: FileFormat,
    pub data_format: DataFormat,
    pub content: String,
    pub locale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_id: String,
    pub file_name: String,
    pub version_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    pub files: Vec<UploadedFile>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    pub branch_id: String,
    pub locales: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    pub files: Vec<UploadedFile>,
    pub branch_id: String,
    pub force: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub version_id: String,
    pub locales: Vec<String>,
    pub message: String,
}

/// Identifies one downloadable artifact on the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileQuery {
    pub branch_id: String,
    pub file_id: String,
    pub version_id: String,
    pub locale: String,
}

impl FileQuery {
    pub fn composite_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.branch_id, self.file_id, self.version_id, self.locale
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub version_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatus {
    pub file_id: String,
    pub file_name: String,
    pub locale: String,
    pub ready: bool,
    #[serde(default)]
    pub failed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub files: Vec<UnitStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDownloadRequest {
    pub files: Vec<FileQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedFile {
    pub branch_id: String,
    pub file_id: String,
    pub version_id: String,
    pub locale: String,
    /// Translated payload, encoded per `file_format`.
    pub data: String,
    pub file_format: FileFormat,
}

impl DownloadedFile {
    pub fn composite_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.branch_id, self.file_id, self.version_id, self.locale
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDownloadResponse {
    pub files: Vec<DownloadedFile>,
}

// ---------------------------------------------------------------------------
// Persisted ledger shape: entries.branchId.fileId.versionId.locale.
// BTreeMaps keep the serialized form stable across runs.
// ---------------------------------------------------------------------------

pub type LedgerTree = BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, LedgerFileEntry>>>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFile {
    #[serde(default)]
    pub entries: LedgerTree,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFileEntry {
    /// ISO-8601 instant of the successful merge.
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}
