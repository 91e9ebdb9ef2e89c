//! Builds an [`XmlDocument`] from a string using quick-xml reader events.

use crate::document::{Declaration, NodeId, XmlDocument};
use crate::error::{DomError, Result};
use crate::names;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use tracing::trace;

/// Parses an XML string into an owned node tree.
///
/// Formatting whitespace (whitespace-only text beside child elements) is
/// dropped, while a leaf element keeps its whitespace-only text. Entity and
/// character references are decoded, and namespace declarations are checked
/// against the reserved `xml`/`xmlns` bindings. Comments and processing
/// instructions are skipped.
///
/// # Examples
///
/// ```
/// use xmlmap_dom::parse;
///
/// let doc = parse("<root><item>one &amp; two</item></root>").unwrap();
/// let root = doc.root().unwrap();
/// let item = doc.children(root)[0];
/// assert_eq!(doc.text(item), "one & two");
/// ```
pub fn parse(xml: &str) -> Result<XmlDocument> {
    let mut reader = Reader::from_str(xml);
    // Trimming would also strip meaningful leading/trailing text and
    // whitespace-only leaf values; formatting whitespace is dropped per text
    // run instead.
    reader.config_mut().trim_text(false);

    let mut builder = DocumentBuilder::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            DomError::parse(format!(
                "Error parsing XML at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Decl(decl) => {
                builder.doc.declaration = Some(read_declaration(&decl)?);
            }
            Event::DocType(content) => {
                let content = utf8(&content)?;
                builder.doc.doc_type = Some(content.trim().to_string());
            }
            Event::Start(start) => {
                let id = builder.open_element(&start)?;
                builder.stack.push(id);
            }
            Event::Empty(start) => {
                builder.open_element(&start)?;
            }
            Event::End(_) => {
                builder.flush_text(false)?;
                builder.stack.pop();
            }
            Event::Text(text) => {
                let raw = utf8(&text)?;
                let decoded = unescape(raw).map_err(|e| DomError::parse(e.to_string()))?;
                builder.push_text(&decoded)?;
            }
            Event::GeneralRef(reference) => {
                let name = utf8(&reference)?;
                let entity = format!("&{};", name);
                let decoded = unescape(&entity).map_err(|e| DomError::parse(e.to_string()))?;
                builder.push_text(&decoded)?;
            }
            Event::CData(data) => {
                let parent = builder.current("CDATA section")?;
                builder.flush_text(false)?;
                let content = utf8(&data)?.to_string();
                builder.doc.append_cdata(parent, content)?;
            }
            Event::Eof => break,
            other => {
                trace!(event = ?other, "Skipping XML event");
            }
        }
    }

    if let Some(open) = builder.stack.last() {
        let name = builder.doc.element_name(*open).unwrap_or_default();
        return Err(DomError::parse(format!(
            "Premature end of data: element '{}' is not closed",
            name
        )));
    }
    if builder.doc.root().is_none() {
        return Err(DomError::parse("Document is empty: no root element found"));
    }

    Ok(builder.doc)
}

#[derive(Default)]
struct DocumentBuilder {
    doc: XmlDocument,
    stack: Vec<NodeId>,
    pending_text: String,
}

impl DocumentBuilder {
    fn current(&self, what: &str) -> Result<NodeId> {
        self.stack.last().copied().ok_or_else(|| {
            DomError::parse(format!("{} found outside of the root element", what))
        })
    }

    fn push_text(&mut self, text: &str) -> Result<()> {
        if self.stack.is_empty() {
            if is_xml_whitespace(text) {
                return Ok(());
            }
            return Err(DomError::parse(
                "Text content found outside of the root element",
            ));
        }
        self.pending_text.push_str(text);
        Ok(())
    }

    /// Moves buffered character data into the tree. A whitespace-only run is
    /// formatting when an element sibling follows (`before_element`) or
    /// precedes it, and is dropped then.
    fn flush_text(&mut self, before_element: bool) -> Result<()> {
        if self.pending_text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending_text);
        let parent = self.current("Text content")?;
        if is_xml_whitespace(&text) && (before_element || self.has_element_children(parent)) {
            return Ok(());
        }
        self.doc.append_text(parent, text)?;
        Ok(())
    }

    fn has_element_children(&self, parent: NodeId) -> bool {
        self.doc
            .children(parent)
            .iter()
            .any(|&child| self.doc.element_name(child).is_some())
    }

    fn open_element(&mut self, start: &BytesStart) -> Result<NodeId> {
        self.flush_text(true)?;

        let name = utf8(start.name().as_ref())?.to_string();
        if !names::is_valid_name(&name) {
            return Err(DomError::parse(format!("Invalid element name '{}'", name)));
        }

        let id = match self.stack.last() {
            Some(parent) => self.doc.append_element(*parent, name)?,
            None if self.doc.root().is_some() => {
                return Err(DomError::parse(format!(
                    "Extra content at the end of the document: second root element '{}'",
                    name
                )));
            }
            None => self.doc.new_root(name)?,
        };

        for attr in start.attributes() {
            let attr = attr.map_err(|e| DomError::parse(format!("Failed to parse attribute: {}", e)))?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let raw = utf8(&attr.value)?;
            let normalized = normalize_attribute_value(raw);
            let value = unescape(&normalized)
                .map_err(|e| DomError::parse(format!("Invalid value for attribute '{}': {}", key, e)))?
                .into_owned();

            if let Some(prefix) = names::declared_prefix(&key) {
                names::check_namespace_binding(prefix, &value).map_err(DomError::Parse)?;
            }

            self.doc.push_attribute(id, key, value)?;
        }

        Ok(id)
    }
}

fn read_declaration(decl: &BytesDecl) -> Result<Declaration> {
    let version = decl
        .version()
        .map_err(|e| DomError::parse(format!("Invalid XML declaration: {}", e)))?;
    let encoding = match decl.encoding() {
        Some(encoding) => {
            let encoding =
                encoding.map_err(|e| DomError::parse(format!("Invalid XML declaration: {}", e)))?;
            Some(utf8(&encoding)?.to_string())
        }
        None => None,
    };
    let standalone = match decl.standalone() {
        Some(standalone) => {
            let standalone = standalone
                .map_err(|e| DomError::parse(format!("Invalid XML declaration: {}", e)))?;
            match utf8(&standalone)? {
                "yes" => Some(true),
                "no" => Some(false),
                other => {
                    return Err(DomError::parse(format!(
                        "Invalid standalone value '{}' in XML declaration",
                        other
                    )));
                }
            }
        }
        None => None,
    };

    Ok(Declaration {
        version: utf8(&version)?.to_string(),
        encoding,
        standalone,
    })
}

/// Attribute-value normalization: literal tab, CR and LF become spaces.
/// Character references are resolved afterwards, so `&#10;` survives.
fn normalize_attribute_value(raw: &str) -> std::borrow::Cow<'_, str> {
    if raw.contains(['\t', '\n', '\r']) {
        std::borrow::Cow::Owned(raw.replace("\r\n", " ").replace(['\t', '\n', '\r'], " "))
    } else {
        std::borrow::Cow::Borrowed(raw)
    }
}

fn is_xml_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| DomError::parse(format!("Invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::XmlNodeKind;

    #[test]
    fn test_parse_nested_elements_and_attributes() {
        let doc = parse(
            r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>
<root root_attribute="root_attribute_value">
  <item present="none" zero="0">
    <term>description</term>
    <label></label>
  </item>
</root>
"#,
        )
        .unwrap();

        let declaration = doc.declaration.clone().unwrap();
        assert_eq!(declaration.version, "1.0");
        assert_eq!(declaration.encoding.as_deref(), Some("utf-8"));
        assert_eq!(declaration.standalone, Some(false));

        let root = doc.root().unwrap();
        assert_eq!(doc.element_name(root), Some("root"));
        assert_eq!(doc.attribute(root, "root_attribute"), Some("root_attribute_value"));

        // Formatting whitespace between elements is gone.
        let items = doc.children(root);
        assert_eq!(items.len(), 1);
        let item = items[0];
        assert_eq!(doc.attributes(item).len(), 2);

        let fields = doc.children(item);
        assert_eq!(fields.len(), 2);
        assert_eq!(doc.text(fields[0]), "description");
        assert!(doc.children(fields[1]).is_empty());
    }

    #[test]
    fn test_leaf_whitespace_is_kept() {
        let doc = parse("<root>\n  <sep> </sep>\n  <tab a=\"1\">\t</tab>\n  <empty></empty>\n</root>").unwrap();
        let root = doc.root().unwrap();
        let children = doc.children(root);
        assert_eq!(children.len(), 3);
        assert_eq!(doc.text(children[0]), " ");
        assert_eq!(doc.text(children[1]), "\t");
        assert!(doc.children(children[2]).is_empty());
    }

    #[test]
    fn test_whitespace_after_last_child_is_dropped() {
        let doc = parse("<root><a>1</a>\n   \n</root>").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.children(root).len(), 1);
    }

    #[test]
    fn test_parse_decodes_entities() {
        let doc = parse(r#"<root a="&lt;important&gt;">&lt;escaped&gt; &amp; &#65;</root>"#).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.attribute(root, "a"), Some("<important>"));
        assert_eq!(doc.text(root), "<escaped> & A");
        // Adjacent text and references form a single text node.
        assert_eq!(doc.children(root).len(), 1);
    }

    #[test]
    fn test_parse_cdata() {
        let doc = parse("<root><![CDATA[<very_important>]]></root>").unwrap();
        let root = doc.root().unwrap();
        let child = doc.children(root)[0];
        assert_eq!(
            doc.node(child).unwrap().kind,
            XmlNodeKind::CData("<very_important>".to_string())
        );
    }

    #[test]
    fn test_parse_empty_cdata_is_kept() {
        let doc = parse("<root><![CDATA[]]></root>").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.children(root).len(), 1);
    }

    #[test]
    fn test_attribute_value_normalization() {
        let doc = parse("<root a=\"one\ntwo\" b=\"one&#10;two\"/>").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.attribute(root, "a"), Some("one two"));
        assert_eq!(doc.attribute(root, "b"), Some("one\ntwo"));
    }

    #[test]
    fn test_namespace_declarations_are_attributes() {
        let doc = parse(
            r#"<root xmlns:lalit="http://www.digitickets.co.uk/lalit" lalit:root_attribute="v"/>"#,
        )
        .unwrap();
        let root = doc.root().unwrap();
        let names: Vec<&str> = doc.attributes(root).iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["xmlns:lalit", "lalit:root_attribute"]);
    }

    #[test]
    fn test_wrong_xml_namespace_uri_is_rejected() {
        let err = parse(r#"<root xmlns:xml="http://example.com/xmlns"/>"#).unwrap_err();
        assert!(matches!(err, DomError::Parse(_)));
        assert!(err.to_string().contains("xml namespace prefix mapped to wrong URI"));
    }

    #[test]
    fn test_correct_xml_namespace_uri_is_accepted() {
        assert!(parse(r#"<root xmlns:xml="http://www.w3.org/XML/1998/namespace"/>"#).is_ok());
    }

    #[test]
    fn test_malformed_documents() {
        for xml in [
            "",
            "<root>",
            "<root></other>",
            "<root/><second/>",
            "text<root/>",
            "<root>&unknown;</root>",
            "<1root/>",
        ] {
            assert!(
                matches!(parse(xml), Err(DomError::Parse(_))),
                "expected a parse error for {xml:?}"
            );
        }
    }

    #[test]
    fn test_doctype_is_captured() {
        let doc = parse("<!DOCTYPE root SYSTEM \"root.dtd\"><root/>").unwrap();
        assert_eq!(doc.doc_type.as_deref(), Some("root SYSTEM \"root.dtd\""));
    }

    #[test]
    fn test_comments_are_skipped() {
        let doc = parse("<root><!-- note --><a>1</a></root>").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.children(root).len(), 1);
    }
}
