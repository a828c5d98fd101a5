//! High-level orchestration layer over lower-level crates.
//! Intentionally thin: exposes stable entry points used by the CLI and SDK.

pub mod download;
pub mod ledger;
pub mod poll;
pub mod scan;
pub mod send;
pub mod util;
pub mod workflow;

pub use locflow_core::Result;

pub use download::{FileTracker, Reconciler, TrackedFile};
pub use ledger::{LedgerEntry, LedgerKey, VersionLedger};
pub use poll::{wait_until, PollOptions};
pub use scan::{discover_files, output_path_for, SourceFile};
pub use send::{push_files, wait_for_translations, DownloadStatus, SyncSettings};
pub use workflow::{Step, StepContext, Workflow};
