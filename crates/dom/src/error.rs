//! Error types for parsing and writing XML documents.

use thiserror::Error;

/// Errors produced by the XML node tree, its parser and its writer.
#[derive(Error, Debug)]
pub enum DomError {
    /// The input is not well-formed XML or violates a namespace rule.
    #[error("{0}")]
    Parse(String),

    /// The document declaration requests something the writer cannot produce.
    #[error("unsupported document configuration: {0}")]
    Configuration(String),

    /// A node id does not belong to the document, or points to the wrong kind of node.
    #[error("invalid node: {0}")]
    InvalidNode(String),

    /// Low-level XML reader or writer error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error while writing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DomError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        DomError::Parse(msg.into())
    }
}

/// Result type alias for node tree operations
pub type Result<T> = std::result::Result<T, DomError>;
