//! Tree Builder: array model to XML document.
//!
//! The builder walks a [`Node`] depth first and mirrors it into an
//! [`XmlDocument`]. Names are validated before anything is emitted, and the
//! namespace toggles of the current [`Settings`] decide which declarations
//! are added to the root element.

use crate::error::{Result, XmlMapError};
use crate::model::{ATTRIBUTES_KEY, CDATA_KEY, Child, Node, NodeBody, Tree};
use crate::registry::{self, NamespaceScope, Settings};
use serde_json::Value;
use std::sync::Arc;
use xmlmap_dom::names::{XML_NAMESPACE, declared_prefix, is_valid_qname, split_qname};
use xmlmap_dom::{NodeId, XmlDocument};

const CDATA_END: &str = "]]>";

/// Builds XML documents from the array model.
///
/// Without explicit settings, every call takes a fresh snapshot of the
/// global registry.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    settings: Option<Arc<Settings>>,
}

impl TreeBuilder {
    /// A builder following the global registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with its own settings, independent of the global registry.
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

    /// Builds a document whose root element is `root_name` holding `root`.
    /// `doc_type` is written verbatim as `<!DOCTYPE ...>` after the
    /// declaration.
    pub fn build(&self, root_name: &str, root: &Node, doc_type: Option<&str>) -> Result<XmlDocument> {
        tracing::debug!(root = root_name, "Building XML document");
        let settings = self.settings();

        check_name(root_name, root_name)?;
        let mut doc = XmlDocument::with_declaration(settings.declaration());
        doc.doc_type = doc_type.map(str::to_string);
        let root_id = doc.new_root(root_name)?;

        let mut walker = Walker {
            doc,
            settings: &settings,
            scope: NamespaceScope::new(),
            root: root_id,
            next_root_declaration: 0,
        };
        walker.emit(root_id, root_name, root, root_name, true)?;
        Ok(walker.doc)
    }

    pub fn build_tree(&self, tree: &Tree) -> Result<XmlDocument> {
        self.build(&tree.root_name, &tree.root, tree.doc_type.as_deref())
    }

    /// Decodes the JSON form of the root node and builds it.
    pub fn build_json(&self, root_name: &str, value: &Value) -> Result<XmlDocument> {
        let tree = Tree::from_root_json(root_name, value)?;
        self.build_tree(&tree)
    }
}

fn check_name(name: &str, path: &str) -> Result<()> {
    if is_valid_qname(name) {
        Ok(())
    } else {
        Err(XmlMapError::invalid_structure(
            path,
            format!("'{name}' is not a valid XML name"),
        ))
    }
}

struct Walker<'a> {
    doc: XmlDocument,
    settings: &'a Settings,
    scope: NamespaceScope,
    root: NodeId,
    /// Where the next namespace declaration hoisted to the root goes.
    next_root_declaration: usize,
}

impl Walker<'_> {
    fn emit(&mut self, id: NodeId, name: &str, node: &Node, path: &str, is_root: bool) -> Result<()> {
        for (attribute, value) in &node.attributes {
            check_name(attribute, &format!("{path}/{ATTRIBUTES_KEY}/{attribute}"))?;
            self.doc
                .push_attribute(id, attribute.as_str(), value.to_text().into_owned())?;
        }
        self.scope
            .push(node.attributes.keys().map(String::as_str));

        if is_root && self.settings.include_all_namespaces && self.settings.include_default_xml_namespace {
            self.declare_xml_namespace()?;
        }

        self.check_prefix(name, path)?;
        for attribute in node.attributes.keys() {
            if declared_prefix(attribute).is_none() {
                self.check_prefix(attribute, path)?;
            }
        }

        match &node.body {
            NodeBody::Empty => {}
            NodeBody::Value(value) => {
                self.doc.append_text(id, value.to_text().into_owned())?;
            }
            NodeBody::Cdata(content) => {
                if content.contains(CDATA_END) {
                    return Err(XmlMapError::invalid_structure(
                        format!("{path}/{CDATA_KEY}"),
                        "CDATA content cannot contain ']]>'",
                    ));
                }
                self.doc.append_cdata(id, content.as_str())?;
            }
            NodeBody::Children(children) => {
                for (child_name, child) in children {
                    match child {
                        Child::One(child_node) => {
                            self.emit_child(id, child_name, child_node, format!("{path}/{child_name}"))?;
                        }
                        Child::Many(nodes) => {
                            for (index, child_node) in nodes.iter().enumerate() {
                                let child_path = format!("{path}/{child_name}[{index}]");
                                self.emit_child(id, child_name, child_node, child_path)?;
                            }
                        }
                    }
                }
            }
        }

        self.scope.pop();
        Ok(())
    }

    fn emit_child(&mut self, parent: NodeId, name: &str, node: &Node, path: String) -> Result<()> {
        check_name(name, &path)?;
        let id = self.doc.append_element(parent, name)?;
        self.emit(id, name, node, &path, false)
    }

    /// Puts `xmlns:xml` first on the root unless the caller declared it.
    fn declare_xml_namespace(&mut self) -> Result<()> {
        if self.doc.attribute(self.root, "xmlns:xml").is_some() {
            return Ok(());
        }
        self.doc
            .insert_attribute(self.root, 0, "xmlns:xml", XML_NAMESPACE)?;
        self.next_root_declaration = 1;
        Ok(())
    }

    fn check_prefix(&mut self, name: &str, path: &str) -> Result<()> {
        let (Some(prefix), _) = split_qname(name) else {
            return Ok(());
        };
        if self.scope.is_declared(prefix) {
            return Ok(());
        }

        let uri = self.settings.namespace_uri(prefix);
        match uri {
            Some(uri) if self.settings.include_all_namespaces => {
                let declaration = format!("xmlns:{prefix}");
                self.doc
                    .insert_attribute(self.root, self.next_root_declaration, declaration, uri)?;
                self.next_root_declaration += 1;
                self.scope.declare_at_root(prefix);
                tracing::trace!(prefix, uri, "Declared namespace on the root element");
            }
            _ => {
                tracing::debug!(prefix, path, "Namespace prefix used without a declaration");
            }
        }
        Ok(())
    }
}
