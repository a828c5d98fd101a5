//! Durable record of which file/version/locale combinations have already
//! been downloaded and merged.
//!
//! In memory the ledger is a flat map keyed by the composite
//! `branch:file:version:locale`, so every reconciler lookup is a single
//! `get`. On disk it keeps the nested
//! `entries.branchId.fileId.versionId.locale` shape, serialized through
//! BTreeMaps so repeated saves are byte-stable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use locflow_core::Result;
use locflow_domain::{FileQuery, FileReference, LedgerFile, LedgerFileEntry};

use crate::util::write_atomic;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub branch_id: String,
    pub file_id: String,
    pub version_id: String,
    pub locale: String,
}

impl LedgerKey {
    pub fn composite(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.branch_id, self.file_id, self.version_id, self.locale
        )
    }
}

impl From<&FileQuery> for LedgerKey {
    fn from(q: &FileQuery) -> Self {
        LedgerKey {
            branch_id: q.branch_id.clone(),
            file_id: q.file_id.clone(),
            version_id: q.version_id.clone(),
            locale: q.locale.clone(),
        }
    }
}

impl From<&FileReference> for LedgerKey {
    fn from(r: &FileReference) -> Self {
        LedgerKey {
            branch_id: r.branch_id.clone(),
            file_id: r.file_id.clone(),
            version_id: r.version_id.clone(),
            locale: r.locale.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub updated_at: DateTime<Utc>,
    /// Hash of the local source file at the moment the translation was
    /// merged; used to detect source drift on later runs.
    pub source_hash: Option<String>,
}

#[derive(Debug)]
pub struct VersionLedger {
    path: PathBuf,
    entries: HashMap<LedgerKey, LedgerEntry>,
    dirty: bool,
}

impl VersionLedger {
    /// Load the ledger from `path`. A missing file is an empty ledger, not
    /// an error; an unreadable file is logged and treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut entries = HashMap::new();
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<LedgerFile>(&raw) {
                Ok(file) => {
                    for (branch_id, files) in file.entries {
                        for (file_id, versions) in files {
                            for (version_id, locales) in versions {
                                for (locale, entry) in locales {
                                    let Ok(updated_at) =
                                        DateTime::parse_from_rfc3339(&entry.updated_at)
                                    else {
                                        warn!(
                                            %branch_id,
                                            %file_id,
                                            %locale,
                                            "skipping ledger entry with bad timestamp"
                                        );
                                        continue;
                                    };
                                    entries.insert(
                                        LedgerKey {
                                            branch_id: branch_id.clone(),
                                            file_id: file_id.clone(),
                                            version_id: version_id.clone(),
                                            locale,
                                        },
                                        LedgerEntry {
                                            updated_at: updated_at.with_timezone(&Utc),
                                            source_hash: entry.source_hash,
                                        },
                                    );
                                }
                            }
                        }
                    }
                }
                Err(err) => warn!(path = %path.display(), "unreadable ledger, starting empty: {err}"),
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), "unreadable ledger, starting empty: {err}"),
        }
        VersionLedger {
            path,
            entries,
            dirty: false,
        }
    }

    pub fn get(&self, key: &LedgerKey) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    /// Record a successful download+merge. Only called after the output file
    /// is durably written.
    pub fn upsert(&mut self, key: LedgerKey, entry: LedgerEntry) {
        if self.entries.insert(key, entry.clone()) != Some(entry) {
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the nested on-disk shape atomically. No-op when nothing
    /// changed since load or the last save.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let mut file = LedgerFile::default();
        for (key, entry) in &self.entries {
            file.entries
                .entry(key.branch_id.clone())
                .or_default()
                .entry(key.file_id.clone())
                .or_default()
                .entry(key.version_id.clone())
                .or_default()
                .insert(
                    key.locale.clone(),
                    LedgerFileEntry {
                        updated_at: entry.updated_at.to_rfc3339(),
                        source_hash: entry.source_hash.clone(),
                    },
                );
        }
        let rendered = serde_json::to_string_pretty(&file)?;
        write_atomic(&self.path, rendered.as_bytes())?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key(version: &str, locale: &str) -> LedgerKey {
        LedgerKey {
            branch_id: "main".into(),
            file_id: "f_abc".into(),
            version_id: version.into(),
            locale: locale.into(),
        }
    }

    fn entry(hash: Option<&str>) -> LedgerEntry {
        LedgerEntry {
            updated_at: Utc::now(),
            source_hash: hash.map(String::from),
        }
    }

    #[test]
    fn missing_file_is_an_empty_ledger() {
        let dir = tempdir().unwrap();
        let ledger = VersionLedger::load(dir.path().join("versions.json"));
        assert!(ledger.is_empty());
        assert!(!ledger.is_dirty());
    }

    #[test]
    fn garbage_file_is_treated_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.json");
        std::fs::write(&path, "not json at all").unwrap();
        let ledger = VersionLedger::load(&path);
        assert!(ledger.is_empty());
    }

    #[test]
    fn round_trips_through_the_nested_shape() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.json");

        let mut ledger = VersionLedger::load(&path);
        ledger.upsert(key("v_1", "de"), entry(Some("hash-de")));
        ledger.upsert(key("v_1", "ja"), entry(None));
        assert!(ledger.is_dirty());
        ledger.save()?;
        assert!(!ledger.is_dirty());

        let reloaded = VersionLedger::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get(&key("v_1", "de")).unwrap().source_hash.as_deref(),
            Some("hash-de")
        );

        // The persisted shape is entries.branch.file.version.locale.
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        let de = &raw["entries"]["main"]["f_abc"]["v_1"]["de"];
        assert_eq!(de["sourceHash"], "hash-de");
        assert!(de["updatedAt"].is_string());
        Ok(())
    }

    #[test]
    fn save_without_changes_is_a_noop() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.json");
        let mut ledger = VersionLedger::load(&path);
        ledger.save()?;
        assert!(!path.exists(), "clean ledger must not touch the disk");
        Ok(())
    }

    #[test]
    fn identical_upsert_does_not_mark_dirty() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.json");
        let mut ledger = VersionLedger::load(&path);
        let e = entry(Some("h"));
        ledger.upsert(key("v_1", "de"), e.clone());
        ledger.save()?;
        ledger.upsert(key("v_1", "de"), e);
        assert!(!ledger.is_dirty());
        Ok(())
    }
}
