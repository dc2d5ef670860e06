use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::docx::{self, Document};
use crate::error::{DocError, DocResult};

pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["doc", "docx", "docm", "dot", "dotx", "dotm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Existing,
    CreateIfMissing,
}

/// One opened document bound to its file.
///
/// The handle is released by [`DocumentSession::close`] or when the session
/// goes out of scope, whichever comes first. Every accessor fails once the
/// session is closed.
#[derive(Debug)]
pub struct DocumentSession {
    path: PathBuf,
    document: Option<Document>,
}

impl DocumentSession {
    pub fn open(path: &Path, mode: OpenMode) -> DocResult<Self> {
        check_path(path)?;

        if !path.is_file() {
            return match mode {
                OpenMode::Existing => Err(DocError::Load(format!(
                    "document file not found: {}",
                    path.display()
                ))),
                OpenMode::CreateIfMissing => Ok(Self::create(path, Document::blank())),
            };
        }

        let bytes = fs::read(path).map_err(|err| {
            DocError::Load(format!("no read permission for document {}: {err}", path.display()))
        })?;
        let writable = fs::metadata(path)
            .map(|meta| !meta.permissions().readonly())
            .unwrap_or(false);
        if !writable {
            return Err(DocError::Load(format!(
                "no write permission for document: {}",
                path.display()
            )));
        }

        let document = docx::from_bytes(&bytes).map_err(|err| {
            DocError::Load(format!("failed to load document {}: {err}", path.display()))
        })?;
        if document.section_count() == 0 {
            return Err(DocError::Load(format!(
                "document has no sections: {}",
                path.display()
            )));
        }

        debug!(path = %path.display(), sections = document.section_count(), "document opened");
        Ok(Self {
            path: path.to_path_buf(),
            document: Some(document),
        })
    }

    /// Binds `document` to `path` without reading anything from disk. The
    /// file is written on the first [`DocumentSession::save`].
    pub fn create(path: &Path, document: Document) -> Self {
        Self {
            path: path.to_path_buf(),
            document: Some(document),
        }
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> DocResult<&Document> {
        self.document.as_ref().ok_or_else(closed)
    }

    pub fn document_mut(&mut self) -> DocResult<&mut Document> {
        self.document.as_mut().ok_or_else(closed)
    }

    pub fn save(&self) -> DocResult<()> {
        self.save_as(&self.path)
    }

    pub fn save_as(&self, path: &Path) -> DocResult<()> {
        let document = self.document()?;
        docx::save(document, path).map_err(|err| {
            DocError::Save(format!("failed to save document {}: {err}", path.display()))
        })?;
        debug!(path = %path.display(), "document saved");
        Ok(())
    }

    /// Releases the handle. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.document.take().is_some() {
            debug!(path = %self.path.display(), "document closed");
        }
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        if self.is_open() {
            self.close();
        }
    }
}

/// Checks the parts of a document path that can be judged without reading it.
pub fn check_path(path: &Path) -> DocResult<()> {
    if path.as_os_str().is_empty() {
        return Err(DocError::Load("document path cannot be empty".to_string()));
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DocError::Load(format!(
            "unsupported document format: .{extension} (supported: {})",
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

fn closed() -> DocError {
    DocError::Load("document session is closed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::model::{Block, Paragraph};
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_package(path: &Path, document_xml: &str) {
        let file = fs::File::create(path).expect("create");
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .expect("start file");
        zip.write_all(document_xml.as_bytes()).expect("write");
        zip.finish().expect("finish");
    }

    #[test]
    fn missing_file_needs_create_mode() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("absent.docx");

        let err = DocumentSession::open(&path, OpenMode::Existing).expect_err("missing");
        assert!(matches!(err, DocError::Load(_)));

        let session = DocumentSession::open(&path, OpenMode::CreateIfMissing).expect("create");
        assert_eq!(session.document().expect("open").section_count(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn rejects_unsupported_extensions() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain").expect("write");
        let err = DocumentSession::open(&path, OpenMode::Existing).expect_err("txt");
        assert_eq!(err.code(), "LOAD_ERROR");
        assert!(check_path(Path::new("upper.DOCX")).is_ok());
        assert!(check_path(Path::new("")).is_err());
    }

    #[test]
    fn unparsable_file_is_a_load_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.docx");
        fs::write(&path, b"definitely not a zip").expect("write");
        let err = DocumentSession::open(&path, OpenMode::Existing).expect_err("broken");
        assert!(matches!(err, DocError::Load(_)));
    }

    #[test]
    fn document_without_sections_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("empty.docx");
        write_package(
            &path,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body/></w:document>"#,
        );
        let err = DocumentSession::open(&path, OpenMode::Existing).expect_err("no sections");
        assert!(err.message().contains("no sections"));
    }

    #[test]
    fn read_only_file_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("locked.docx");
        docx::save(&Document::blank(), &path).expect("save");
        let mut permissions = fs::metadata(&path).expect("metadata").permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions).expect("chmod");

        let err = DocumentSession::open(&path, OpenMode::Existing).expect_err("read only");
        assert!(err.message().contains("write permission"));
    }

    #[test]
    fn save_persists_and_close_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.docx");
        let mut session = DocumentSession::open(&path, OpenMode::CreateIfMissing).expect("open");
        session.document_mut().expect("open").sections[0]
            .blocks
            .push(Block::Paragraph(Paragraph::with_text("kept")));
        session.save().expect("save");

        session.close();
        session.close();
        assert!(!session.is_open());
        assert!(session.document().is_err());

        let reopened = DocumentSession::open(&path, OpenMode::Existing).expect("reopen");
        let text = &reopened.document().expect("open").sections[0]
            .paragraph(0)
            .expect("paragraph")
            .text;
        assert_eq!(text, "kept");
    }
}
