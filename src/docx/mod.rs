//! WordprocessingML engine: package reader/writer, document model and
//! plain-format exporters.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

pub mod color;
pub mod export;
pub mod model;
pub mod protection;
mod reader;
mod styles;
mod writer;

pub use model::Document;
pub use styles::resolve_table_style;

pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const R_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
pub(crate) const TWIPS_PER_POINT: f64 = 20.0;

const DOCUMENT_PART: &str = "word/document.xml";
const SETTINGS_PART: &str = "word/settings.xml";
const STYLES_PART: &str = "word/styles.xml";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a valid OOXML package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("package part missing: {0}")]
    MissingPart(String),

    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Flavour of package to emit, chosen from the target file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Document,
    Template,
    MacroDocument,
    MacroTemplate,
}

impl PackageKind {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("dotx") | Some("dot") => PackageKind::Template,
            Some("docm") => PackageKind::MacroDocument,
            Some("dotm") => PackageKind::MacroTemplate,
            _ => PackageKind::Document,
        }
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, PackageKind::MacroDocument | PackageKind::MacroTemplate)
    }

    fn main_content_type(&self) -> &'static str {
        match self {
            PackageKind::Document => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"
            }
            PackageKind::Template => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml"
            }
            PackageKind::MacroDocument => "application/vnd.ms-word.document.macroEnabled.main+xml",
            PackageKind::MacroTemplate => {
                "application/vnd.ms-word.template.macroEnabledTemplate.main+xml"
            }
        }
    }
}

pub fn from_bytes(bytes: &[u8]) -> Result<Document, EngineError> {
    reader::read_document(bytes)
}

pub fn to_bytes(document: &Document, kind: PackageKind) -> Result<Vec<u8>, EngineError> {
    writer::write_document(document, kind)
}

/// Writes the package next to `path` and renames it into place, so readers
/// never observe a half-written file.
pub fn save(document: &Document, path: &Path) -> Result<(), EngineError> {
    let bytes = to_bytes(document, PackageKind::from_path(path))?;
    write_atomically(path, &bytes)
}

pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), EngineError> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| EngineError::Io(err.error))?;
    Ok(())
}
