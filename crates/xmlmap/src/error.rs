//! Error types for converting between the array model and XML.

use thiserror::Error;
use xmlmap_dom::DomError;

/// Errors raised by the tree builder, the tree extractor and the registry.
///
/// Every conversion either succeeds completely or fails with one of these;
/// there is no partial output.
#[derive(Error, Debug)]
pub enum XmlMapError {
    /// The XML input is not well-formed, or binds a reserved namespace prefix
    /// to the wrong URI. Carries the parser diagnostic.
    #[error("Error parsing the XML string: {0}")]
    Parse(String),

    /// The array model cannot be represented as XML.
    #[error("invalid structure at '{path}': {message}")]
    InvalidStructure { path: String, message: String },

    /// The requested declaration or namespace setting is not supported.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// JSON encoding or decoding of the array model failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while writing a document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl XmlMapError {
    pub(crate) fn invalid_structure(path: impl Into<String>, message: impl Into<String>) -> Self {
        XmlMapError::InvalidStructure {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<DomError> for XmlMapError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::Parse(msg) => XmlMapError::Parse(msg),
            DomError::Configuration(msg) => XmlMapError::Configuration(msg),
            DomError::InvalidNode(msg) => XmlMapError::invalid_structure("", msg),
            DomError::Xml(e) => XmlMapError::Parse(e.to_string()),
            DomError::Io(e) => XmlMapError::Io(e),
        }
    }
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, XmlMapError>;
