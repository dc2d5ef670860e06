use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{DocError, DocResult};

const DEFAULT_DIR_NAME: &str = "documents";

/// Resolves a bare document name inside `base_dir`.
///
/// The base directory is created when missing. Names that are empty, carry
/// directory parts, or would land anywhere other than directly inside the
/// base directory are rejected. The target file itself is not touched.
pub fn resolve(name: &str, base_dir: Option<&Path>) -> DocResult<PathBuf> {
    let base = match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_base_dir()?,
    };
    fs::create_dir_all(&base).map_err(|err| {
        DocError::InvalidPath(format!(
            "cannot create documents directory {}: {err}",
            base.display()
        ))
    })?;
    let base = std::path::absolute(&base).map_err(|err| {
        DocError::InvalidPath(format!("invalid documents directory {}: {err}", base.display()))
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(DocError::InvalidPath("document name cannot be empty".to_string()));
    }

    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    let path = base.join(name);
    if !single_normal || path.parent() != Some(base.as_path()) {
        return Err(DocError::InvalidPath(format!("invalid document path: {name}")));
    }
    Ok(path)
}

fn default_base_dir() -> DocResult<PathBuf> {
    let exe = std::env::current_exe().map_err(|err| {
        DocError::InvalidPath(format!("cannot locate the executable directory: {err}"))
    })?;
    let root = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(root.join(DEFAULT_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn simple_names_land_in_base_dir() {
        let dir = tempdir().expect("tempdir");
        let path = resolve("report.docx", Some(dir.path())).expect("resolve");
        assert_eq!(path.parent(), Some(dir.path()));
        assert!(path.is_absolute());
        assert!(!path.exists());
    }

    #[test]
    fn creates_missing_base_dir() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("nested").join("docs");
        resolve("a.docx", Some(&base)).expect("resolve");
        assert!(base.is_dir());
    }

    #[test]
    fn rejects_escaping_names() {
        let dir = tempdir().expect("tempdir");
        for name in [
            "../a.docx",
            "../../etc/passwd",
            "/etc/passwd",
            "sub/a.docx",
            "a/../../b.docx",
            ".",
            "..",
            "",
            "   ",
        ] {
            let result = resolve(name, Some(dir.path()));
            assert!(
                matches!(result, Err(DocError::InvalidPath(_))),
                "{name:?} should be rejected, got {result:?}"
            );
        }
    }
}
