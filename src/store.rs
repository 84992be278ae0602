//! Reading and writing record documents on disk.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::record::{Record, RecordDocument};

pub fn read_document(path: &Path) -> Result<RecordDocument> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    if !path.is_file() {
        bail!("Path is not a file: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let doc = RecordDocument::from_value(value)
        .with_context(|| format!("unexpected document shape in {}", path.display()))?;

    debug!(
        "Read {} records from {} (wrapped: {})",
        doc.records.len(),
        path.display(),
        doc.is_wrapped()
    );
    Ok(doc)
}

/// Write the document as pretty-printed JSON in the shape it was read with.
/// The file is replaced atomically so a failed run never leaves half a file.
pub fn write_document(path: &Path, doc: RecordDocument) -> Result<()> {
    write_json(path, &doc.into_value())
}

pub fn write_records(path: &Path, records: Vec<Record>) -> Result<()> {
    write_document(path, RecordDocument::list(records))
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    // Write through symlinks to the file they point at
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(_) => path.to_path_buf(),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let existing = fs::metadata(&target).ok().map(|m| m.permissions());

    let mut tmp = temp_file_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    if let Some(permissions) = existing {
        tmp.as_file()
            .set_permissions(permissions)
            .with_context(|| format!("failed to copy permissions of {}", target.display()))?;
    }

    serde_json::to_writer_pretty(&mut tmp, value).context("failed to serialize records")?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.persist(&target)
        .with_context(|| format!("failed to write {}", target.display()))?;

    debug!("Wrote {}", target.display());
    Ok(())
}

/// Temp file created with the same default mode as a plain `fs::write`
/// (0666 less the umask) rather than tempfile's owner-only 0600.
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .prefix(".skillsync-")
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    tempfile::Builder::new().prefix(".skillsync-").tempfile_in(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_file() {
        let err = read_document(Path::new("/tmp/skillsync-nonexistent-xyz.json")).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_read_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = read_document(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_read_rejects_malformed_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mixed.json");
        fs::write(&path, r#"[{"name": "ok"}, "oops"]"#).unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("entry 1"));
    }

    #[test]
    fn test_write_preserves_wrapped_shape_and_unicode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(
            &path,
            r#"{"generated": "2026-01-01", "skills": [{"name": "Café"}]}"#,
        )
        .unwrap();

        let doc = read_document(&path).unwrap();
        write_document(&path, doc).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Café"), "non-ASCII should be written literally");
        assert!(text.contains("\n  \"generated\""));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"generated": "2026-01-01", "skills": [{"name": "Café"}]})
        );
    }

    #[test]
    fn test_write_records_creates_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let record = json!({"id": "a"}).as_object().cloned().unwrap();
        write_records(&path, vec![record]).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, json!([{"id": "a"}]));
    }

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clean.json");
        fs::write(&path, "[]").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_records(&path, Vec::new()).unwrap();
        assert_eq!(mode_of(&path), 0o644);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        write_records(&path, Vec::new()).unwrap();
        assert_eq!(mode_of(&path), 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_fresh_file_gets_default_mode() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("reference.json");
        fs::write(&reference, "[]").unwrap();

        let path = dir.path().join("fresh.json");
        write_records(&path, Vec::new()).unwrap();
        assert_eq!(mode_of(&path), mode_of(&reference));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_follows_symlink() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.json");
        let link = dir.path().join("link.json");
        fs::write(&real, "[]").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let record = json!({"id": "a"}).as_object().cloned().unwrap();
        write_records(&link, vec![record]).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        let value: Value = serde_json::from_str(&fs::read_to_string(&real).unwrap()).unwrap();
        assert_eq!(value, json!([{"id": "a"}]));
    }
}
