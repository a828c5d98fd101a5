use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// How the content of a translatable unit is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DataFormat {
    /// Plain string content.
    Text,
    /// ICU MessageFormat string (may contain plural/select branches).
    Icu,
    /// JSX-like element tree, already flattened to a JSON structure.
    Jsx,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Text => "text",
            DataFormat::Icu => "icu",
            DataFormat::Jsx => "jsx",
        }
    }
}

/// On-disk format of a source or translated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FileFormat {
    Json,
    Yaml,
    Mdx,
    /// The platform's structured interchange format: JSON with one
    /// translatable entry per key. Written with canonically sorted keys so
    /// repeated syncs of identical content are byte-identical.
    LocJson,
}

impl FileFormat {
    /// Composite formats hold many independently translatable keys, so a
    /// translation response must be merged into the existing target file
    /// instead of replacing it wholesale.
    pub fn is_composite(&self) -> bool {
        !matches!(self, FileFormat::Mdx)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Yaml => "yaml",
            FileFormat::Mdx => "mdx",
            FileFormat::LocJson => "locjson",
        }
    }
}

/// A single fragment of translatable content paired with its metadata.
/// Identity is derived by hashing, never assigned (see `locflow-hash`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatableUnit {
    /// Content: a JSON string for plain text/ICU, or a tree for JSX-like
    /// content. Branch/plural tables are JSON objects; their key order is
    /// irrelevant to unit identity.
    pub source: serde_json::Value,
    /// Stable caller-assigned id, when the source annotates one.
    pub id: Option<String>,
    /// Free-form disambiguation context (e.g. "button label").
    pub context: Option<String>,
    pub data_format: DataFormat,
    /// BCP-47 tag of the authored content; falls back to the project default.
    pub source_locale: Option<String>,
}

/// Keep a lightweight error type for crates that still import it.
#[derive(Debug, Error)]
pub enum LocflowError {
    #[error("{0}")]
    Other(String),
}
