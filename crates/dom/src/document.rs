//! Arena-indexed XML node tree.
//!
//! All nodes of a document live in a single `Vec`; parents own their children
//! through index lists, so the tree is plain owned data with no reference
//! counting. Only the node kinds the converters need are represented:
//! elements, text and CDATA sections. Comments and processing instructions
//! are dropped by the parser.

use crate::error::{DomError, Result};

/// Index of a node inside its [`XmlDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the document arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The content of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNodeKind {
    /// An element with its qualified name and attributes in document order.
    ///
    /// Attribute values are stored decoded (entities resolved). Namespace
    /// declarations are kept as ordinary `xmlns`/`xmlns:prefix` attributes.
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Decoded character data.
    Text(String),
    /// Raw CDATA section content.
    CData(String),
}

/// A node together with its links into the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    pub kind: XmlNodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The XML declaration of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("utf-8".to_string()),
            standalone: Some(false),
        }
    }
}

/// An owned XML document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
    root: Option<NodeId>,
    /// Written as `<?xml ...?>` when present.
    pub declaration: Option<Declaration>,
    /// Raw content of the document type declaration, written as `<!DOCTYPE content>`.
    pub doc_type: Option<String>,
}

impl XmlDocument {
    /// Creates an empty document without declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty document carrying the given declaration.
    pub fn with_declaration(declaration: Declaration) -> Self {
        Self {
            declaration: Some(declaration),
            ..Self::default()
        }
    }

    fn push_node(&mut self, kind: XmlNodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(XmlNode {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn checked(&self, id: NodeId) -> Result<&XmlNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| DomError::InvalidNode(format!("node #{} does not exist", id.0)))
    }

    fn checked_element(&self, id: NodeId) -> Result<()> {
        match self.checked(id)?.kind {
            XmlNodeKind::Element { .. } => Ok(()),
            _ => Err(DomError::InvalidNode(format!(
                "node #{} is not an element",
                id.0
            ))),
        }
    }

    /// Creates the document element. A document has exactly one.
    pub fn new_root(&mut self, name: impl Into<String>) -> Result<NodeId> {
        if self.root.is_some() {
            return Err(DomError::InvalidNode(
                "document already has a root element".to_string(),
            ));
        }
        let id = self.push_node(
            XmlNodeKind::Element {
                name: name.into(),
                attributes: Vec::new(),
            },
            None,
        );
        self.root = Some(id);
        Ok(id)
    }

    /// Appends a child element to `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        self.checked_element(parent)?;
        Ok(self.push_node(
            XmlNodeKind::Element {
                name: name.into(),
                attributes: Vec::new(),
            },
            Some(parent),
        ))
    }

    /// Appends a text node to `parent`. An empty string still creates a node,
    /// which makes the writer emit an explicit start/end tag pair.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> Result<NodeId> {
        self.checked_element(parent)?;
        Ok(self.push_node(XmlNodeKind::Text(text.into()), Some(parent)))
    }

    /// Appends a CDATA section to `parent`.
    pub fn append_cdata(&mut self, parent: NodeId, content: impl Into<String>) -> Result<NodeId> {
        self.checked_element(parent)?;
        Ok(self.push_node(XmlNodeKind::CData(content.into()), Some(parent)))
    }

    /// Adds an attribute after the existing ones.
    pub fn push_attribute(
        &mut self,
        element: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.insert_attribute(element, usize::MAX, name, value)
    }

    /// Adds an attribute at `index` (clamped to the attribute count).
    pub fn insert_attribute(
        &mut self,
        element: NodeId,
        index: usize,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.checked_element(element)?;
        if let XmlNodeKind::Element { attributes, .. } = &mut self.nodes[element.0].kind {
            let index = index.min(attributes.len());
            attributes.insert(index, (name.into(), value.into()));
        }
        Ok(())
    }

    /// The document element, if one has been created or parsed.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id.0)
    }

    /// Child ids of a node, empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    /// Qualified name of an element node.
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.kind {
            XmlNodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Attributes of an element node, empty for other nodes.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.nodes.get(id.0).map(|node| &node.kind) {
            Some(XmlNodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Value of a single attribute of an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text and CDATA content directly below `id`.
    pub fn text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|child| match &self.nodes[child.0].kind {
                XmlNodeKind::Text(text) | XmlNodeKind::CData(text) => Some(text.as_str()),
                XmlNodeKind::Element { .. } => None,
            })
            .collect()
    }

    /// All nodes below `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
