//! Serializes an [`XmlDocument`] through quick-xml writer events.

use crate::document::{Declaration, NodeId, XmlDocument, XmlNodeKind};
use crate::error::{DomError, Result};
use crate::escape::{escape_attribute, escape_text};
use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One element per line, children indented by the given number of spaces,
    /// text kept inline with its element, trailing newline.
    Indented(usize),
    /// No whitespace added between nodes.
    Compact,
}

impl XmlDocument {
    /// Serializes with two-space indentation.
    pub fn to_xml_string(&self) -> Result<String> {
        self.to_string_with(Format::Indented(2))
    }

    /// Serializes without any formatting whitespace.
    pub fn to_compact_string(&self) -> Result<String> {
        self.to_string_with(Format::Compact)
    }

    pub fn to_string_with(&self, format: Format) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, format)?;
        String::from_utf8(buffer).map_err(|e| DomError::Configuration(e.to_string()))
    }

    /// Writes the document, declaration and doc type included.
    pub fn write_to<W: Write>(&self, writer: W, format: Format) -> Result<()> {
        if let Some(declaration) = &self.declaration {
            check_declaration(declaration)?;
        }

        let mut writer = match format {
            Format::Indented(width) => Writer::new_with_indent(writer, b' ', width),
            Format::Compact => Writer::new(writer),
        };

        if let Some(declaration) = &self.declaration {
            let standalone = declaration
                .standalone
                .map(|standalone| if standalone { "yes" } else { "no" });
            writer.write_event(Event::Decl(BytesDecl::new(
                &declaration.version,
                declaration.encoding.as_deref(),
                standalone,
            )))?;
        }

        if let Some(doc_type) = &self.doc_type {
            writer.write_event(Event::DocType(BytesText::from_escaped(doc_type.as_str())))?;
        }

        if let Some(root) = self.root() {
            self.write_node(&mut writer, root)?;
        }

        let mut inner = writer.into_inner();
        if matches!(format, Format::Indented(_)) {
            inner.write_all(b"\n")?;
        }
        Ok(())
    }

    fn write_node<W: Write>(&self, writer: &mut Writer<W>, id: NodeId) -> Result<()> {
        let node = self
            .node(id)
            .ok_or_else(|| DomError::InvalidNode(format!("node #{} does not exist", id.index())))?;

        match &node.kind {
            XmlNodeKind::Element { name, attributes } => {
                let mut start = BytesStart::new(name.as_str());
                for (key, value) in attributes {
                    let escaped = escape_attribute(value);
                    start.push_attribute(Attribute::from((key.as_bytes(), escaped.as_bytes())));
                }

                if node.children.is_empty() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    for child in &node.children {
                        self.write_node(writer, *child)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
                }
            }
            XmlNodeKind::Text(text) => {
                writer.write_event(Event::Text(BytesText::from_escaped(escape_text(text))))?;
            }
            XmlNodeKind::CData(content) => {
                if content.contains("]]>") {
                    return Err(DomError::InvalidNode(
                        "CDATA section content contains ']]>'".to_string(),
                    ));
                }
                writer.write_event(Event::CData(BytesCData::new(content.as_str())))?;
            }
        }
        Ok(())
    }
}

/// Output is always produced as a Rust string, so only UTF-8 can be honoured.
fn check_declaration(declaration: &Declaration) -> Result<()> {
    if !matches!(declaration.version.as_str(), "1.0" | "1.1") {
        return Err(DomError::Configuration(format!(
            "XML version '{}' is not supported",
            declaration.version
        )));
    }
    if let Some(encoding) = &declaration.encoding {
        if !encoding.eq_ignore_ascii_case("utf-8") && !encoding.eq_ignore_ascii_case("utf8") {
            return Err(DomError::Configuration(format!(
                "encoding '{}' is not supported, only UTF-8 output can be produced",
                encoding
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_document() -> XmlDocument {
        let mut doc = XmlDocument::with_declaration(Declaration::default());
        let root = doc.new_root("item").unwrap();
        doc.push_attribute(root, "present", "none").unwrap();
        doc.push_attribute(root, "zero", "0").unwrap();
        let term = doc.append_element(root, "term").unwrap();
        doc.append_text(term, "description").unwrap();
        let label = doc.append_element(root, "label").unwrap();
        doc.append_text(label, "").unwrap();
        let cdata = doc.append_element(root, "zeroCData").unwrap();
        doc.append_cdata(cdata, "0").unwrap();
        doc
    }

    #[test]
    fn test_compact_output() {
        let xml = item_document().to_compact_string().unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"no\"?>\
             <item present=\"none\" zero=\"0\"><term>description</term><label></label>\
             <zeroCData><![CDATA[0]]></zeroCData></item>"
        );
    }

    #[test]
    fn test_indented_output() {
        let xml = item_document().to_xml_string().unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"no\"?>\n\
             <item present=\"none\" zero=\"0\">\n  \
             <term>description</term>\n  \
             <label></label>\n  \
             <zeroCData><![CDATA[0]]></zeroCData>\n\
             </item>\n"
        );
    }

    #[test]
    fn test_childless_element_is_self_closing() {
        let mut doc = XmlDocument::new();
        let root = doc.new_root("root").unwrap();
        doc.push_attribute(root, "xmlns:xml", "http://example.com/xmlns").unwrap();
        assert_eq!(
            doc.to_compact_string().unwrap(),
            "<root xmlns:xml=\"http://example.com/xmlns\"/>"
        );
    }

    #[test]
    fn test_escaping() {
        let mut doc = XmlDocument::new();
        let root = doc.new_root("root").unwrap();
        doc.push_attribute(root, "attribute4", "'<important>'").unwrap();
        doc.append_text(root, "<escaped> & \"quoted\"").unwrap();
        assert_eq!(
            doc.to_compact_string().unwrap(),
            "<root attribute4=\"'&lt;important&gt;'\">&lt;escaped&gt; &amp; &quot;quoted&quot;</root>"
        );
    }

    #[test]
    fn test_doc_type_follows_declaration() {
        let mut doc = XmlDocument::with_declaration(Declaration::default());
        doc.doc_type = Some("root SYSTEM \"root.dtd\"".to_string());
        doc.new_root("root").unwrap();
        let xml = doc.to_compact_string().unwrap();
        assert!(xml.contains("?><!DOCTYPE root SYSTEM \"root.dtd\"><root/>"));
    }

    #[test]
    fn test_cdata_terminator_is_rejected() {
        let mut doc = XmlDocument::new();
        let root = doc.new_root("root").unwrap();
        doc.append_cdata(root, "a]]>b").unwrap();
        assert!(doc.to_compact_string().is_err());
    }

    #[test]
    fn test_unsupported_declaration() {
        let mut doc = XmlDocument::with_declaration(Declaration {
            encoding: Some("ISO-8859-1".to_string()),
            ..Declaration::default()
        });
        doc.new_root("root").unwrap();
        assert!(matches!(
            doc.to_compact_string(),
            Err(DomError::Configuration(_))
        ));

        let mut doc = XmlDocument::with_declaration(Declaration {
            version: "2.0".to_string(),
            ..Declaration::default()
        });
        doc.new_root("root").unwrap();
        assert!(matches!(
            doc.to_compact_string(),
            Err(DomError::Configuration(_))
        ));
    }

    #[test]
    fn test_written_document_parses_back() {
        let doc = item_document();
        let reparsed = crate::parse(&doc.to_xml_string().unwrap()).unwrap();
        let root = reparsed.root().unwrap();
        assert_eq!(reparsed.element_name(root), Some("item"));
        // The empty label text node is not reproduced by parsing.
        let label = reparsed.children(root)[1];
        assert!(reparsed.children(label).is_empty());
    }
}
