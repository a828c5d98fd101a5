use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use locflow_core::{DataFormat, FileFormat, Result};
use locflow_domain::{ScannedFile, SCHEMA_VERSION};

/// A translatable source file discovered on disk. `file_id` is derived from
/// the normalized relative path; `version_id` from the processed content, so
/// it changes when the meaningful content changes, not on every run.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub rel_path: String,
    pub file_format: FileFormat,
    pub data_format: DataFormat,
    pub content: String,
    pub file_id: String,
    pub version_id: String,
}

impl SourceFile {
    pub fn to_scanned(&self) -> ScannedFile {
        ScannedFile {
            schema_version: SCHEMA_VERSION,
            path: self.path.display().to_string(),
            rel_path: self.rel_path.clone(),
            file_format: self.file_format,
            units: count_units(self.file_format, &self.content),
        }
    }
}

/// Walk the include roots under `root` and collect supported source files.
/// Include entries may point at directories or single files.
pub fn discover_files(root: &Path, include: &[String]) -> Result<Vec<SourceFile>> {
    let mut out = Vec::new();
    for inc in include {
        let base = root.join(inc);
        for entry in WalkDir::new(&base).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_format) = locflow_formats::detect_format(path) else {
                continue;
            };
            let content = std::fs::read_to_string(path)?;
            let rel_path = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            let processed = processed_content(file_format, &content);
            out.push(SourceFile {
                path: path.to_path_buf(),
                rel_path: rel_path.clone(),
                file_format,
                data_format: default_data_format(file_format),
                content,
                file_id: locflow_hash::file_id(&rel_path),
                version_id: locflow_hash::version_id(&processed),
            });
        }
    }
    out.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(out)
}

fn default_data_format(format: FileFormat) -> DataFormat {
    match format {
        FileFormat::Json | FileFormat::LocJson => DataFormat::Icu,
        FileFormat::Yaml | FileFormat::Mdx => DataFormat::Text,
    }
}

/// Content as it is meaningful for versioning: structured formats are
/// canonicalized first so that formatting-only edits do not bump the
/// version.
fn processed_content(format: FileFormat, raw: &str) -> String {
    match format {
        FileFormat::Json | FileFormat::LocJson => serde_json::from_str::<serde_json::Value>(raw)
            .map(|v| locflow_hash::canonicalize(&v))
            .unwrap_or_else(|_| raw.to_string()),
        FileFormat::Yaml => serde_yaml::from_str::<serde_json::Value>(raw)
            .map(|v| locflow_hash::canonicalize(&v))
            .unwrap_or_else(|_| raw.to_string()),
        FileFormat::Mdx => raw.to_string(),
    }
}

/// Number of translatable units in a file: leaf strings for composite
/// formats, the whole document for MDX.
pub fn count_units(format: FileFormat, content: &str) -> usize {
    if !format.is_composite() {
        return 1;
    }
    let parsed: Option<serde_json::Value> = match format {
        FileFormat::Yaml => serde_yaml::from_str(content).ok(),
        _ => serde_json::from_str(content).ok(),
    };
    fn leaves(v: &serde_json::Value) -> usize {
        match v {
            serde_json::Value::String(_) => 1,
            serde_json::Value::Object(map) => map.values().map(leaves).sum(),
            serde_json::Value::Array(items) => items.iter().map(leaves).sum(),
            _ => 0,
        }
    }
    parsed.as_ref().map(leaves).unwrap_or(0)
}

/// Resolve the output path for a file/locale pair from the configured
/// template, e.g. `locales/{locale}/{name}` with `{name}` being the
/// relative source path. Returns `None` when the template has no `{locale}`
/// placeholder — writing every locale to one path would clobber.
pub fn output_path_for(root: &Path, template: &str, rel_path: &str, locale: &str) -> Option<PathBuf> {
    if !template.contains("{locale}") {
        return None;
    }
    let resolved = template
        .replace("{locale}", locale)
        .replace("{name}", rel_path);
    Some(root.join(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovers_supported_files_and_derives_ids() -> Result<()> {
        let dir = tempdir()?;
        let content_dir = dir.path().join("content");
        fs::create_dir_all(&content_dir)?;
        fs::write(content_dir.join("home.json"), r#"{"title": "Welcome"}"#)?;
        fs::write(content_dir.join("guide.mdx"), "# Guide\n")?;
        fs::write(content_dir.join("notes.txt"), "ignored")?;

        let files = discover_files(dir.path(), &["content".into()])?;
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].rel_path, "content/guide.mdx");
        assert_eq!(files[1].rel_path, "content/home.json");
        assert!(files[1].file_id.starts_with("f_"));
        assert!(files[1].version_id.starts_with("v_"));
        Ok(())
    }

    #[test]
    fn version_id_ignores_formatting_only_changes() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("c"))?;
        let path = dir.path().join("c").join("a.json");

        fs::write(&path, r#"{"b":"2","a":"1"}"#)?;
        let first = discover_files(dir.path(), &["c".into()])?;

        fs::write(&path, "{\n  \"a\": \"1\",\n  \"b\": \"2\"\n}\n")?;
        let second = discover_files(dir.path(), &["c".into()])?;

        assert_eq!(first[0].version_id, second[0].version_id);
        Ok(())
    }

    #[test]
    fn version_id_changes_with_content() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("c"))?;
        let path = dir.path().join("c").join("a.json");

        fs::write(&path, r#"{"a": "1"}"#)?;
        let first = discover_files(dir.path(), &["c".into()])?;

        fs::write(&path, r#"{"a": "changed"}"#)?;
        let second = discover_files(dir.path(), &["c".into()])?;

        assert_ne!(first[0].version_id, second[0].version_id);
        Ok(())
    }

    #[test]
    fn counts_leaf_strings_as_units() {
        assert_eq!(
            count_units(
                FileFormat::Json,
                r#"{"a": "x", "b": {"c": "y", "n": 3}, "d": ["z"]}"#
            ),
            3
        );
        assert_eq!(count_units(FileFormat::Mdx, "# Doc"), 1);
    }

    #[test]
    fn output_template_requires_locale_placeholder() {
        let root = Path::new("/proj");
        assert_eq!(
            output_path_for(root, "locales/{locale}/{name}", "content/home.json", "de"),
            Some(PathBuf::from("/proj/locales/de/content/home.json"))
        );
        assert_eq!(
            output_path_for(root, "locales/{name}", "content/home.json", "de"),
            None
        );
    }
}
