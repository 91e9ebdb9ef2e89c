//! # xmlmap
//!
//! Lossless conversion between nested key-value trees (the "array model")
//! and XML documents.
//!
//! ## Features
//!
//! - **Tree Builder**: [`TreeBuilder`] turns a [`Node`] (attributes, text,
//!   CDATA, repeated children) into an [`XmlDocument`].
//! - **Tree Extractor**: [`TreeExtractor`] turns XML text or a parsed
//!   document back into a [`Tree`].
//! - **Namespace Registry**: declaration values and namespace verbosity
//!   toggles, held process-wide ([`configure`]) or per converter
//!   ([`Settings`]).
//! - **JSON interop**: the array model's JSON form with the reserved keys
//!   `@attributes`, `@value`, `@cdata` and `@docType`.
//!
//! ## Array Model ↔ XML Mapping
//!
//! | JSON form | XML |
//! |-----------|-----|
//! | `{"item": "text"}` | `<item>text</item>` |
//! | `{"item": null}` | `<item></item>` |
//! | `{"item": {}}` | `<item/>` |
//! | `{"item": {"@attributes": {"id": "1"}, "@value": "text"}}` | `<item id="1">text</item>` |
//! | `{"item": {"@cdata": "<b>"}}` | `<item><![CDATA[<b>]]></item>` |
//! | `{"item": {"node": ["A", "B"]}}` | `<item><node>A</node><node>B</node></item>` |
//!
//! Extraction returns strings for every value; `null` attribute values come
//! back as `""`. Compare trees with [`Tree::normalized`] to check a round trip.
//!
//! ## Examples
//!
//! ```
//! use serde_json::json;
//! use xmlmap::{Settings, Tree, TreeBuilder, TreeExtractor};
//! use std::sync::Arc;
//!
//! let settings = Arc::new(Settings::default());
//! let tree = Tree::from_json(&json!({
//!     "item": {
//!         "@attributes": {"present": "none"},
//!         "term": "description",
//!         "zero": 0
//!     }
//! }))?;
//!
//! let xml = TreeBuilder::with_settings(settings.clone())
//!     .build_tree(&tree)?
//!     .to_compact_string()?;
//! assert_eq!(
//!     xml,
//!     r#"<?xml version="1.0" encoding="utf-8" standalone="no"?><item present="none"><term>description</term><zero>0</zero></item>"#
//! );
//!
//! let back = TreeExtractor::with_settings(settings).extract(xml.as_str())?;
//! assert_eq!(back.normalized(), tree.normalized());
//! # Ok::<(), xmlmap::XmlMapError>(())
//! ```

pub mod builder;
pub mod error;
pub mod extractor;
pub mod json;
pub mod model;
pub mod registry;

pub use builder::TreeBuilder;
pub use error::{Result, XmlMapError};
pub use extractor::{TreeExtractor, XmlSource};
pub use model::{Attributes, Child, Children, Node, NodeBody, Scalar, Tree};
pub use registry::{NamespaceRegistry, Settings};

pub use json::{from_json_str, from_json_value, to_json_string, to_json_string_pretty};

// The XML engine types callers receive from the builder
pub use xmlmap_dom::{Format, XmlDocument};

/// Shorthand for [`XmlMapError`].
pub type Error = XmlMapError;

/// Builds a document with the global settings.
pub fn build(root_name: &str, root: &Node, doc_type: Option<&str>) -> Result<XmlDocument> {
    TreeBuilder::new().build(root_name, root, doc_type)
}

/// Extracts the array model with the global settings.
pub fn extract<'a>(source: impl Into<XmlSource<'a>>) -> Result<Tree> {
    TreeExtractor::new().extract(source)
}

/// Builds `tree` and serializes it with two-space indentation.
pub fn tree_to_xml_string(tree: &Tree) -> Result<String> {
    Ok(TreeBuilder::new().build_tree(tree)?.to_xml_string()?)
}

/// Decodes the JSON form of a whole tree, builds it and serializes it.
pub fn json_to_xml_string(value: &serde_json::Value) -> Result<String> {
    tree_to_xml_string(&Tree::from_json(value)?)
}

/// Extracts an XML string into the JSON form of the array model.
pub fn xml_string_to_json(xml: &str) -> Result<serde_json::Value> {
    Ok(extract(xml)?.to_json())
}

/// Reconfigures the global registry.
///
/// Affects every later conversion that does not carry its own [`Settings`];
/// conversions already running keep the settings they started with.
pub fn configure(
    version: &str,
    encoding: &str,
    standalone: bool,
    include_all_namespaces: bool,
    include_default_xml_namespace: bool,
) {
    registry::global().configure(
        version,
        encoding,
        standalone,
        include_all_namespaces,
        include_default_xml_namespace,
    );
}
