//! Tree Extractor: XML document to array model.

use crate::error::{Result, XmlMapError};
use crate::model::{Attributes, Child, Children, Node, NodeBody, Scalar, Tree};
use crate::registry::{self, Settings};
use std::sync::Arc;
use xmlmap_dom::names::{XML_NAMESPACE, check_namespace_binding, declared_prefix};
use xmlmap_dom::{NodeId, XmlDocument, XmlNodeKind};

/// Input accepted by [`TreeExtractor::extract`].
#[derive(Debug, Clone, Copy)]
pub enum XmlSource<'a> {
    /// Raw XML, parsed before extraction.
    Text(&'a str),
    /// An already parsed document.
    Document(&'a XmlDocument),
}

impl<'a> From<&'a str> for XmlSource<'a> {
    fn from(xml: &'a str) -> Self {
        XmlSource::Text(xml)
    }
}

impl<'a> From<&'a String> for XmlSource<'a> {
    fn from(xml: &'a String) -> Self {
        XmlSource::Text(xml)
    }
}

impl<'a> From<&'a XmlDocument> for XmlSource<'a> {
    fn from(doc: &'a XmlDocument) -> Self {
        XmlSource::Document(doc)
    }
}

/// Converts XML documents into the array model.
///
/// Without explicit settings, every call takes a fresh snapshot of the
/// global registry.
#[derive(Debug, Clone, Default)]
pub struct TreeExtractor {
    settings: Option<Arc<Settings>>,
}

impl TreeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Arc<Settings>) -> Self {
        Self {
            settings: Some(settings),
        }
    }

    fn settings(&self) -> Arc<Settings> {
        self.settings
            .clone()
            .unwrap_or_else(|| registry::global().settings())
    }

    /// Extracts `{ rootTagName: node }` from a document or XML string.
    pub fn extract<'a>(&self, source: impl Into<XmlSource<'a>>) -> Result<Tree> {
        let settings = self.settings();
        match source.into() {
            XmlSource::Text(xml) => {
                tracing::debug!(len = xml.len(), "Extracting array model from XML string");
                let doc = xmlmap_dom::parse(xml)?;
                extract_document(&doc, &settings)
            }
            XmlSource::Document(doc) => {
                tracing::debug!(nodes = doc.len(), "Extracting array model from document");
                extract_document(doc, &settings)
            }
        }
    }
}

fn extract_document(doc: &XmlDocument, settings: &Settings) -> Result<Tree> {
    let root = doc
        .root()
        .ok_or_else(|| XmlMapError::Parse("the document has no root element".to_string()))?;
    check_bindings(doc, root)?;

    let root_name = doc.element_name(root).unwrap_or_default().to_string();
    let mut attributes = element_attributes(doc, root);
    if settings.include_all_namespaces
        && settings.include_default_xml_namespace
        && !attributes.contains_key("xmlns:xml")
    {
        attributes.shift_insert(0, "xmlns:xml".to_string(), Scalar::from(XML_NAMESPACE));
    }

    Ok(Tree::new(root_name, convert(doc, root, attributes)))
}

/// Parsed documents are checked by the parser already; documents built in
/// code are not.
fn check_bindings(doc: &XmlDocument, root: NodeId) -> Result<()> {
    for id in std::iter::once(root).chain(doc.descendants(root)) {
        for (name, value) in doc.attributes(id) {
            if let Some(prefix) = declared_prefix(name) {
                check_namespace_binding(prefix, value).map_err(XmlMapError::Parse)?;
            }
        }
    }
    Ok(())
}

fn element_attributes(doc: &XmlDocument, id: NodeId) -> Attributes {
    doc.attributes(id)
        .iter()
        .map(|(name, value)| (name.clone(), Scalar::String(value.clone())))
        .collect()
}

fn convert(doc: &XmlDocument, id: NodeId, attributes: Attributes) -> Node {
    let body = element_body(doc, id);
    let body = match body {
        Some(body) => body,
        None if attributes.is_empty() => NodeBody::Value(Scalar::Null),
        None => NodeBody::Empty,
    };
    Node { attributes, body }
}

fn element_body(doc: &XmlDocument, id: NodeId) -> Option<NodeBody> {
    let mut children = Children::new();
    let mut text: Vec<(&str, bool)> = Vec::new();

    for &child in doc.children(id) {
        let Some(node) = doc.node(child) else {
            continue;
        };
        match &node.kind {
            XmlNodeKind::Element { name, .. } => {
                let converted = convert(doc, child, element_attributes(doc, child));
                match children.get_mut(name) {
                    Some(existing) => existing.push(converted),
                    None => {
                        children.insert(name.clone(), Child::One(converted));
                    }
                }
            }
            XmlNodeKind::Text(content) if content.is_empty() => {}
            XmlNodeKind::Text(content) => text.push((content.as_str(), false)),
            XmlNodeKind::CData(content) => text.push((content.as_str(), true)),
        }
    }

    if !children.is_empty() {
        if text
            .iter()
            .any(|(content, is_cdata)| *is_cdata || !content.trim().is_empty())
        {
            tracing::trace!(
                element = doc.element_name(id).unwrap_or_default(),
                "Ignoring text mixed with child elements"
            );
        }
        return Some(NodeBody::Children(children));
    }

    match text.as_slice() {
        [] => None,
        [(content, true)] => Some(NodeBody::Cdata(content.to_string())),
        parts => Some(NodeBody::Value(Scalar::String(
            parts.iter().map(|(content, _)| *content).collect(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract_with(settings: Settings, xml: &str) -> Result<Tree> {
        TreeExtractor::with_settings(Arc::new(settings)).extract(xml)
    }

    fn extract_json(xml: &str) -> serde_json::Value {
        extract_with(Settings::default(), xml).unwrap().to_json()
    }

    #[test]
    fn test_item_example() {
        let tree = extract_with(
            Settings::default(),
            r#"<item present="none" zero="0"><term>description</term><label></label><zero>0</zero><zeroCData><![CDATA[0]]></zeroCData></item>"#,
        )
        .unwrap();
        assert_eq!(
            tree.to_json(),
            json!({
                "item": {
                    "@attributes": {"present": "none", "zero": "0"},
                    "term": "description",
                    "label": null,
                    "zero": "0",
                    "zeroCData": {"@cdata": "0"}
                }
            })
        );
    }

    #[test]
    fn test_body_rules() {
        assert_eq!(extract_json("<root/>"), json!({"root": null}));
        assert_eq!(extract_json("<root></root>"), json!({"root": null}));
        assert_eq!(extract_json("<root>0</root>"), json!({"root": "0"}));
        assert_eq!(
            extract_json("<root><![CDATA[]]></root>"),
            json!({"root": {"@cdata": ""}})
        );
        assert_eq!(
            extract_json(r#"<root a=""/>"#),
            json!({"root": {"@attributes": {"a": ""}}})
        );
        assert_eq!(
            extract_json(r#"<root a="1">text</root>"#),
            json!({"root": {"@attributes": {"a": "1"}, "@value": "text"}})
        );
        assert_eq!(
            extract_json("<root>a<![CDATA[<b>]]>c</root>"),
            json!({"root": "a<b>c"})
        );
    }

    #[test]
    fn test_whitespace_only_leaf_text_is_a_value() {
        assert_eq!(
            extract_json("<root>\n  <sep> </sep>\n  <tab a=\"1\">\t</tab>\n</root>"),
            json!({"root": {"sep": " ", "tab": {"@attributes": {"a": "1"}, "@value": "\t"}}})
        );
    }

    #[test]
    fn test_grouping_keeps_first_appearance_order() {
        assert_eq!(
            extract_json("<root>\n  <b>1</b>\n  <a/>\n  <b>2</b>\n</root>"),
            json!({"root": {"b": ["1", "2"], "a": null}})
        );
    }

    #[test]
    fn test_mixed_text_ignored() {
        assert_eq!(
            extract_json("<root>loose<a>1</a>text</root>"),
            json!({"root": {"a": "1"}})
        );
    }

    #[test]
    fn test_namespace_declarations_kept() {
        assert_eq!(
            extract_json(r#"<root xmlns:lalit="http://www.digitickets.co.uk/lalit"><lalit:item lalit:present="yes"/></root>"#),
            json!({
                "root": {
                    "@attributes": {"xmlns:lalit": "http://www.digitickets.co.uk/lalit"},
                    "lalit:item": {"@attributes": {"lalit:present": "yes"}}
                }
            })
        );
    }

    #[test]
    fn test_xml_namespace_injected_on_root() {
        let settings = Settings::default().with_include_all_namespaces(true);
        let tree = extract_with(settings.clone(), "<root/>").unwrap();
        assert_eq!(
            tree.to_json(),
            json!({"root": {"@attributes": {"xmlns:xml": XML_NAMESPACE}}})
        );

        let tree = extract_with(settings.clone(), r#"<root id="1">x</root>"#).unwrap();
        let keys: Vec<&str> = tree.root.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["xmlns:xml", "id"]);

        let tree = extract_with(settings.with_include_default_xml_namespace(false), "<root/>").unwrap();
        assert!(tree.root.is_null());
    }

    #[test]
    fn test_wrong_xml_binding_is_parse_error() {
        for settings in [
            Settings::default(),
            Settings::default().with_include_all_namespaces(true),
        ] {
            let err = extract_with(settings, r#"<root xmlns:xml="http://example.com/xmlns"/>"#)
                .unwrap_err();
            assert!(matches!(err, XmlMapError::Parse(_)), "{err:?}");
        }
    }

    #[test]
    fn test_document_source_is_validated() {
        let mut doc = XmlDocument::new();
        let root = doc.new_root("root").unwrap();
        let child = doc.append_element(root, "child").unwrap();
        doc.push_attribute(child, "xmlns:xml", "http://example.com/xmlns")
            .unwrap();

        let err = TreeExtractor::with_settings(Arc::new(Settings::default()))
            .extract(&doc)
            .unwrap_err();
        assert!(matches!(err, XmlMapError::Parse(_)));
    }

    #[test]
    fn test_document_source() {
        let mut doc = XmlDocument::new();
        let root = doc.new_root("root").unwrap();
        let child = doc.append_element(root, "child").unwrap();
        doc.append_text(child, "").unwrap();
        doc.append_cdata(child, "x").unwrap();

        let tree = TreeExtractor::with_settings(Arc::new(Settings::default()))
            .extract(&doc)
            .unwrap();
        assert_eq!(tree.to_json(), json!({"root": {"child": {"@cdata": "x"}}}));
    }

    #[test]
    fn test_malformed_input() {
        for xml in ["", "<root>", "<root></other>", "<a/><b/>"] {
            let err = extract_with(Settings::default(), xml).unwrap_err();
            assert!(matches!(err, XmlMapError::Parse(_)), "{xml:?}: {err:?}");
        }
    }
}
