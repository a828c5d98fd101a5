//! Format-specific reconciliation of translated payloads with files on disk.
//!
//! Composite formats (JSON, YAML, the platform interchange format) carry many
//! independently translatable keys, so a downloaded fragment is merged into
//! the existing target-locale file instead of replacing it. MDX documents are
//! translated wholesale and replace the previous output.

use std::path::Path;

use thiserror::Error;

use locflow_core::FileFormat;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid {format} payload: {message}")]
    Parse { format: &'static str, message: String },
}

/// Detect a file format from its extension. `.locjson` is the platform's own
/// interchange format; plain `.json` stays generic JSON.
pub fn detect_format(path: &Path) -> Option<FileFormat> {
    let ext = path.extension()?.to_str()?;
    match ext.to_ascii_lowercase().as_str() {
        "json" => Some(FileFormat::Json),
        "locjson" => Some(FileFormat::LocJson),
        "yaml" | "yml" => Some(FileFormat::Yaml),
        "mdx" | "md" => Some(FileFormat::Mdx),
        _ => None,
    }
}

/// Merge a translated `fragment` into the current content of the target file
/// (`existing`, when the file is already on disk) and return the final
/// content to write.
pub fn merge_translated(
    format: FileFormat,
    existing: Option<&str>,
    fragment: &str,
) -> Result<String, FormatError> {
    match format {
        FileFormat::Mdx => Ok(fragment.to_string()),
        FileFormat::Json => merge_json(existing, fragment, false),
        FileFormat::LocJson => merge_json(existing, fragment, true),
        FileFormat::Yaml => merge_yaml(existing, fragment),
    }
}

fn merge_json(
    existing: Option<&str>,
    fragment: &str,
    canonical: bool,
) -> Result<String, FormatError> {
    let fragment: serde_json::Value = serde_json::from_str(fragment).map_err(|e| {
        FormatError::Parse {
            format: "json",
            message: e.to_string(),
        }
    })?;
    let merged = match existing {
        Some(current) => {
            let mut base: serde_json::Value =
                serde_json::from_str(current).map_err(|e| FormatError::Parse {
                    format: "json",
                    message: e.to_string(),
                })?;
            deep_merge_json(&mut base, fragment);
            base
        }
        None => fragment,
    };
    let rendered = if canonical {
        render_canonical_json(&merged)
    } else {
        serde_json::to_string_pretty(&merged).map_err(|e| FormatError::Parse {
            format: "json",
            message: e.to_string(),
        })?
    };
    Ok(rendered + "\n")
}

/// Fragment values win; objects recurse; everything else replaces.
fn deep_merge_json(base: &mut serde_json::Value, fragment: serde_json::Value) {
    match (base, fragment) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(frag_map)) => {
            for (k, v) in frag_map {
                match base_map.get_mut(&k) {
                    Some(slot) => deep_merge_json(slot, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

/// Render with recursively sorted keys and fixed indentation so that two
/// syncs of identical logical content produce byte-identical files.
fn render_canonical_json(value: &serde_json::Value) -> String {
    fn sort(value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = serde_json::Map::new();
                for k in keys {
                    out.insert(k.clone(), sort(&map[k]));
                }
                serde_json::Value::Object(out)
            }
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(sort).collect())
            }
            other => other.clone(),
        }
    }
    // Sorted maps serialize deterministically with the default pretty printer.
    serde_json::to_string_pretty(&sort(value)).unwrap_or_else(|_| String::from("{}"))
}

fn merge_yaml(existing: Option<&str>, fragment: &str) -> Result<String, FormatError> {
    let fragment: serde_yaml::Value =
        serde_yaml::from_str(fragment).map_err(|e| FormatError::Parse {
            format: "yaml",
            message: e.to_string(),
        })?;
    let merged = match existing {
        Some(current) => {
            let mut base: serde_yaml::Value =
                serde_yaml::from_str(current).map_err(|e| FormatError::Parse {
                    format: "yaml",
                    message: e.to_string(),
                })?;
            deep_merge_yaml(&mut base, fragment);
            base
        }
        None => fragment,
    };
    serde_yaml::to_string(&merged).map_err(|e| FormatError::Parse {
        format: "yaml",
        message: e.to_string(),
    })
}

fn deep_merge_yaml(base: &mut serde_yaml::Value, fragment: serde_yaml::Value) {
    match (base, fragment) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(frag_map)) => {
            for (k, v) in frag_map {
                match base_map.get_mut(&k) {
                    Some(slot) => deep_merge_yaml(slot, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_by_extension() {
        assert_eq!(detect_format(Path::new("a/b.json")), Some(FileFormat::Json));
        assert_eq!(
            detect_format(Path::new("a/b.locjson")),
            Some(FileFormat::LocJson)
        );
        assert_eq!(detect_format(Path::new("b.yml")), Some(FileFormat::Yaml));
        assert_eq!(detect_format(Path::new("post.mdx")), Some(FileFormat::Mdx));
        assert_eq!(detect_format(Path::new("script.rs")), None);
    }

    #[test]
    fn json_merge_keeps_untranslated_keys() {
        let existing = r#"{"home": {"title": "Startseite", "cta": "Los"}, "about": "Über uns"}"#;
        let fragment = r#"{"home": {"title": "Willkommen"}}"#;
        let out = merge_translated(FileFormat::Json, Some(existing), fragment).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["home"]["title"], "Willkommen");
        assert_eq!(v["home"]["cta"], "Los");
        assert_eq!(v["about"], "Über uns");
    }

    #[test]
    fn json_merge_without_existing_file_is_the_fragment() {
        let fragment = r#"{"k": "v"}"#;
        let out = merge_translated(FileFormat::Json, None, fragment).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["k"], "v");
    }

    #[test]
    fn locjson_output_is_byte_stable_regardless_of_key_order() {
        let a = merge_translated(FileFormat::LocJson, None, r#"{"b": "2", "a": "1"}"#).unwrap();
        let b = merge_translated(FileFormat::LocJson, None, r#"{"a": "1", "b": "2"}"#).unwrap();
        assert_eq!(a, b);
        assert!(a.ends_with('\n'));
    }

    #[test]
    fn locjson_merge_then_rewrite_is_idempotent() {
        let first =
            merge_translated(FileFormat::LocJson, None, r#"{"z": "zz", "a": "aa"}"#).unwrap();
        let second =
            merge_translated(FileFormat::LocJson, Some(&first), r#"{"a": "aa", "z": "zz"}"#)
                .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn yaml_merge_recurses_into_mappings() {
        let existing = "nav:\n  home: Startseite\n  about: Über\n";
        let fragment = "nav:\n  home: Willkommen\n";
        let out = merge_translated(FileFormat::Yaml, Some(existing), fragment).unwrap();
        let v: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(v["nav"]["home"], "Willkommen");
        assert_eq!(v["nav"]["about"], "Über");
    }

    #[test]
    fn mdx_replaces_wholesale() {
        let out =
            merge_translated(FileFormat::Mdx, Some("# Alt\n"), "# Neu\n\nHallo.\n").unwrap();
        assert_eq!(out, "# Neu\n\nHallo.\n");
    }

    #[test]
    fn invalid_json_fragment_is_an_error() {
        assert!(merge_translated(FileFormat::Json, None, "{nope").is_err());
    }
}
