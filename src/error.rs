use thiserror::Error;

/// Failure taxonomy every tool reports through the response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocError {
    #[error("{0}")]
    InvalidPath(String),

    #[error("{0}")]
    Load(String),

    #[error("{0}")]
    Index(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Dimension(String),

    #[error("{0}")]
    Conversion(String),

    #[error("{0}")]
    Merge(String),

    #[error("{0}")]
    Save(String),
}

pub type DocResult<T> = Result<T, DocError>;

impl DocError {
    pub fn code(&self) -> &'static str {
        match self {
            DocError::InvalidPath(_) => "INVALID_PATH",
            DocError::Load(_) => "LOAD_ERROR",
            DocError::Index(_) => "INDEX_ERROR",
            DocError::Validation(_) | DocError::Dimension(_) => "VALIDATION_ERROR",
            DocError::Conversion(_) => "CONVERSION_ERROR",
            DocError::Merge(_) => "MERGE_ERROR",
            DocError::Save(_) => "INTERNAL_ERROR",
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            DocError::InvalidPath(_) => "InvalidPathError",
            DocError::Load(_) => "LoadError",
            DocError::Index(_) => "IndexError",
            DocError::Validation(_) => "ValidationError",
            DocError::Dimension(_) => "DimensionError",
            DocError::Conversion(_) => "ConversionError",
            DocError::Merge(_) => "MergeError",
            DocError::Save(_) => "SaveError",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            DocError::InvalidPath(_) => {
                "Use a plain file name without directories; it is resolved inside the documents directory"
            }
            DocError::Load(_) => {
                "Check that the file exists, is a Word document and is readable and writable"
            }
            DocError::Index(_) => "Read the document info first; indices are zero-based and shift after deletions",
            DocError::Validation(_) => "Check the parameter against the accepted values listed in the message",
            DocError::Dimension(_) => "Tables must have 1 to 1000 rows and 1 to 100 columns",
            DocError::Conversion(_) => "Use one of the supported target formats: docx, txt, md, html, rtf, xml",
            DocError::Merge(_) => "Make sure the document to merge exists in the documents directory",
            DocError::Save(_) => "Check free disk space and write permission on the documents directory",
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}
