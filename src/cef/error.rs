/// Errors that can occur while reading CEF files
#[derive(Debug, thiserror::Error)]
pub enum CefError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Malformed attribute syntax
    #[error("XML attribute error: {0}")]
    AttrError(#[from] quick_xml::events::attributes::AttrError),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The document is not a readable CEF document
    #[error("Unreadable source: {0}")]
    UnreadableSource(String),

    /// A compound entry lacks a required value or carries an invalid one
    #[error("Malformed compound #{index}: {reason}")]
    MalformedRecord {
        /// Zero-based position of the compound in the document
        index: usize,
        /// What was wrong with it
        reason: String,
    },
}

impl CefError {
    /// Whether the error invalidates the whole file rather than one compound.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CefError::MalformedRecord { .. })
    }

    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        CefError::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }
}
