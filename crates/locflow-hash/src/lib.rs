//! Deterministic fingerprinting of translatable content.
//!
//! Unit keys double as dedup/idempotency tokens on the service side, so the
//! hash must be stable across runs and across machines: unordered
//! sub-structures (branch/plural tables) are serialized with sorted keys
//! before digesting, and transient metadata is stripped.

use serde_json::Value;
use sha2::{Digest, Sha256};

use locflow_core::{DataFormat, TranslatableUnit};

/// Serialize a JSON value canonically: object keys sorted, no whitespace.
/// Array order is preserved (arrays are semantically ordered).
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            out.push_str(&serde_json::to_string(s).expect("string escaping is infallible"))
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, k) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(k).expect("string escaping is infallible"));
                out.push(':');
                write_canonical(&map[k], out);
            }
            out.push('}');
        }
    }
}

/// Drop object entries whose key starts with `_`. JSX-like trees carry
/// transient render metadata under such keys; it is not part of content
/// identity.
fn strip_transient(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                if k.starts_with('_') {
                    continue;
                }
                out.insert(k.clone(), strip_transient(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(strip_transient).collect()),
        other => other.clone(),
    }
}

fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Stable identity of a translatable unit:
/// `sha256(canonicalize(source) + context + dataFormat + id)` with each
/// component length-tagged so adjacent fields can never collide.
pub fn hash_unit(unit: &TranslatableUnit) -> String {
    let source = match unit.data_format {
        DataFormat::Jsx => strip_transient(&unit.source),
        _ => unit.source.clone(),
    };
    let mut buf = String::new();
    push_field(&mut buf, "source", &canonicalize(&source));
    push_field(&mut buf, "context", unit.context.as_deref().unwrap_or(""));
    push_field(&mut buf, "dataFormat", unit.data_format.as_str());
    push_field(&mut buf, "id", unit.id.as_deref().unwrap_or(""));
    sha256_hex(buf.as_bytes())
}

fn push_field(buf: &mut String, tag: &str, value: &str) {
    buf.push_str(tag);
    buf.push(':');
    buf.push_str(&value.len().to_string());
    buf.push(':');
    buf.push_str(value);
    buf.push(';');
}

/// Fingerprint of file content, used for `versionId` and for source-drift
/// detection (`sourceHash` in the ledger).
pub fn hash_content(content: &str) -> String {
    sha256_hex(content.as_bytes())
}

/// Derive a file id from the normalized relative input path. Paths are
/// normalized to forward slashes so ids match across platforms.
pub fn file_id(rel_path: &str) -> String {
    let normalized = rel_path.replace('\\', "/");
    format!("f_{}", &sha256_hex(normalized.as_bytes())[..16])
}

/// Derive a version id from processed source content. The id changes when
/// the meaningful content changes, not on every run.
pub fn version_id(processed_content: &str) -> String {
    format!("v_{}", &hash_content(processed_content)[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unit(source: Value) -> TranslatableUnit {
        TranslatableUnit {
            source,
            id: None,
            context: None,
            data_format: DataFormat::Icu,
            source_locale: None,
        }
    }

    #[test]
    fn hash_is_stable_under_branch_map_reordering() {
        let a = unit(json!({"one": "{n} item", "other": "{n} items"}));
        let b = unit(json!({"other": "{n} items", "one": "{n} item"}));
        assert_eq!(hash_unit(&a), hash_unit(&b));
    }

    #[test]
    fn hash_is_stable_for_nested_structures() {
        let a = unit(json!({"plural": {"zero": "none", "one": "one"}, "tag": "p"}));
        let b = unit(json!({"tag": "p", "plural": {"one": "one", "zero": "none"}}));
        assert_eq!(hash_unit(&a), hash_unit(&b));
    }

    #[test]
    fn hash_changes_with_each_identity_field() {
        let base = TranslatableUnit {
            source: json!("Hello"),
            id: Some("greeting".into()),
            context: Some("landing page".into()),
            data_format: DataFormat::Text,
            source_locale: None,
        };
        let h = hash_unit(&base);

        let mut changed = base.clone();
        changed.source = json!("Hello!");
        assert_ne!(h, hash_unit(&changed));

        let mut changed = base.clone();
        changed.context = Some("checkout".into());
        assert_ne!(h, hash_unit(&changed));

        let mut changed = base.clone();
        changed.data_format = DataFormat::Icu;
        assert_ne!(h, hash_unit(&changed));

        let mut changed = base.clone();
        changed.id = Some("farewell".into());
        assert_ne!(h, hash_unit(&changed));
    }

    #[test]
    fn source_locale_does_not_affect_identity() {
        let mut a = unit(json!("Hello"));
        let mut b = unit(json!("Hello"));
        a.source_locale = Some("en".into());
        b.source_locale = Some("en-GB".into());
        assert_eq!(hash_unit(&a), hash_unit(&b));
    }

    #[test]
    fn field_boundaries_do_not_collide() {
        // "ab" + "" must differ from "a" + "b" across adjacent fields.
        let mut a = unit(json!("x"));
        a.context = Some("ab".into());
        a.id = Some(String::new());
        let mut b = unit(json!("x"));
        b.context = Some("a".into());
        b.id = Some("b".into());
        assert_ne!(hash_unit(&a), hash_unit(&b));
    }

    #[test]
    fn transient_keys_are_ignored_for_jsx() {
        let mut a = unit(json!({"tag": "b", "children": ["hi"], "_key": "react-key-1"}));
        a.data_format = DataFormat::Jsx;
        let mut b = unit(json!({"tag": "b", "children": ["hi"], "_key": "react-key-2"}));
        b.data_format = DataFormat::Jsx;
        assert_eq!(hash_unit(&a), hash_unit(&b));
    }

    #[test]
    fn canonicalize_sorts_keys_without_whitespace() {
        let v = json!({"b": 1, "a": [true, null]});
        assert_eq!(canonicalize(&v), r#"{"a":[true,null],"b":1}"#);
    }

    #[test]
    fn file_id_is_platform_neutral() {
        assert_eq!(file_id("content/home.json"), file_id("content\\home.json"));
    }
}
