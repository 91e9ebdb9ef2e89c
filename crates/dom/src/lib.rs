//! # xmlmap-dom
//!
//! A small owned XML node tree used by the `xmlmap` converters.
//!
//! - **Tree**: [`XmlDocument`] stores every node in one arena and hands out
//!   [`NodeId`] indices; parents own their children.
//! - **Parsing**: [`parse`] drives a `quick_xml::Reader` and builds the tree,
//!   dropping formatting whitespace and validating the reserved `xml`
//!   namespace binding.
//! - **Writing**: [`XmlDocument::to_xml_string`] and
//!   [`XmlDocument::to_compact_string`] emit the tree through a
//!   `quick_xml::Writer`, declaration and doc type included.
//!
//! ```
//! use xmlmap_dom::{Declaration, XmlDocument};
//!
//! let mut doc = XmlDocument::with_declaration(Declaration::default());
//! let root = doc.new_root("root").unwrap();
//! let item = doc.append_element(root, "item").unwrap();
//! doc.append_text(item, "fish & chips").unwrap();
//!
//! assert_eq!(
//!     doc.to_compact_string().unwrap(),
//!     r#"<?xml version="1.0" encoding="utf-8" standalone="no"?><root><item>fish &amp; chips</item></root>"#
//! );
//! ```

pub mod document;
pub mod error;
pub mod escape;
pub mod names;
mod parse;
mod write;

pub use document::{Declaration, NodeId, XmlDocument, XmlNode, XmlNodeKind};
pub use error::{DomError, Result};
pub use parse::parse;
pub use write::Format;
