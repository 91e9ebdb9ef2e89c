//! The array model: a nested key-value tree mirroring an XML document.
//!
//! An element is a [`Node`]: its attributes plus exactly one [`NodeBody`].
//! Child elements are keyed by tag name in document order; a tag that repeats
//! among siblings is stored once, as [`Child::Many`].
//!
//! | XML | Array model (JSON form) |
//! |-----|-------------------------|
//! | `<a>text</a>` | `{"a": "text"}` |
//! | `<a></a>` | `{"a": null}` |
//! | `<a x="1">text</a>` | `{"a": {"@attributes": {"x": "1"}, "@value": "text"}}` |
//! | `<a x="1"/>` | `{"a": {"@attributes": {"x": "1"}}}` |
//! | `<a><![CDATA[<b>]]></a>` | `{"a": {"@cdata": "<b>"}}` |
//! | `<a><b>1</b><b>2</b></a>` | `{"a": {"b": ["1", "2"]}}` |

use indexmap::IndexMap;
use serde_json::Number;
use std::borrow::Cow;

/// Key holding an element's attributes.
pub const ATTRIBUTES_KEY: &str = "@attributes";
/// Key holding an element's text when it also has attributes.
pub const VALUE_KEY: &str = "@value";
/// Key holding an element's CDATA content.
pub const CDATA_KEY: &str = "@cdata";
/// Key holding raw doc type content; accepted on the root only.
pub const DOC_TYPE_KEY: &str = "@docType";

/// Checks whether a key is one of the reserved `@` keys.
pub fn is_reserved_key(key: &str) -> bool {
    matches!(key, ATTRIBUTES_KEY | VALUE_KEY | CDATA_KEY | DOC_TYPE_KEY)
}

/// A leaf value: attribute values and element text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// The natural textual form written to XML. `Null` is the empty string,
    /// numbers keep their digits (`0` stays `"0"`).
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Null => Cow::Borrowed(""),
            Scalar::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Scalar::Number(n) => Cow::Owned(n.to_string()),
            Scalar::String(s) => Cow::Borrowed(s),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// True for `Null` and the empty string; `0` and `false` are not empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<Number> for Scalar {
    fn from(value: Number) -> Self {
        Scalar::Number(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

/// Attributes of an element in document order.
pub type Attributes = IndexMap<String, Scalar>;

/// Child elements keyed by qualified tag name, in first-appearance order.
pub type Children = IndexMap<String, Child>;

/// What an element contains besides its attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeBody {
    /// Nothing at all: a childless element (`<a/>`).
    #[default]
    Empty,
    /// Text content; `Scalar::Null` is an empty text node (`<a></a>`).
    Value(Scalar),
    /// A single CDATA section, written without escaping.
    Cdata(String),
    /// Child elements.
    Children(Children),
}

/// One child key: a single element or a run of same-named siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    One(Node),
    Many(Vec<Node>),
}

impl Child {
    /// The elements behind this key in document order.
    pub fn nodes(&self) -> &[Node] {
        match self {
            Child::One(node) => std::slice::from_ref(node),
            Child::Many(nodes) => nodes,
        }
    }

    pub(crate) fn push(&mut self, node: Node) {
        match self {
            Child::One(_) => {
                let Child::One(first) = std::mem::replace(self, Child::Many(Vec::new())) else {
                    return;
                };
                *self = Child::Many(vec![first, node]);
            }
            Child::Many(nodes) => nodes.push(node),
        }
    }
}

/// An element of the array model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub attributes: Attributes,
    pub body: NodeBody,
}

impl Node {
    /// A childless element without attributes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The null scalar: an element holding an empty text node.
    pub fn null() -> Self {
        Self::scalar(Scalar::Null)
    }

    /// An element holding text.
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Self {
            attributes: Attributes::new(),
            body: NodeBody::Value(value.into()),
        }
    }

    /// An element holding a CDATA section.
    pub fn cdata(content: impl Into<String>) -> Self {
        Self {
            attributes: Attributes::new(),
            body: NodeBody::Cdata(content.into()),
        }
    }

    /// An element with the given children.
    pub fn children(children: Children) -> Self {
        Self {
            attributes: Attributes::new(),
            body: NodeBody::Children(children),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Appends a child element. A second child with the same name turns the
    /// key into a [`Child::Many`]. A text or CDATA body is replaced.
    pub fn with_child(mut self, name: impl Into<String>, node: Node) -> Self {
        let name = name.into();
        let mut children = self.take_children();
        match children.get_mut(&name) {
            Some(existing) => existing.push(node),
            None => {
                children.insert(name, Child::One(node));
            }
        }
        self.body = NodeBody::Children(children);
        self
    }

    /// Sets a key to a list of same-named child elements.
    pub fn with_children(mut self, name: impl Into<String>, nodes: Vec<Node>) -> Self {
        let mut children = self.take_children();
        children.insert(name.into(), Child::Many(nodes));
        self.body = NodeBody::Children(children);
        self
    }

    fn take_children(&mut self) -> Children {
        match std::mem::take(&mut self.body) {
            NodeBody::Children(children) => children,
            _ => Children::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Scalar> {
        self.attributes.get(name)
    }

    pub fn child(&self, name: &str) -> Option<&Child> {
        match &self.body {
            NodeBody::Children(children) => children.get(name),
            _ => None,
        }
    }

    /// Text or CDATA content, if the body is one of those.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match &self.body {
            NodeBody::Value(value) => Some(value.to_text()),
            NodeBody::Cdata(content) => Some(Cow::Borrowed(content)),
            _ => None,
        }
    }

    /// True for the bare null scalar (no attributes, empty text).
    pub fn is_null(&self) -> bool {
        self.attributes.is_empty() && matches!(self.body, NodeBody::Value(Scalar::Null))
    }

    /// Applies the normalizations a trip through XML performs, so that two
    /// trees describing the same document compare equal.
    ///
    /// - every scalar becomes its string form, null attributes become `""`
    /// - empty text is no text; whitespace-only text is kept
    /// - an element without attributes and without content is `null`;
    ///   with attributes it has no `@value`
    /// - single-entry lists become single children, empty lists disappear
    pub fn normalized(&self) -> Node {
        let attributes: Attributes = self
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), Scalar::String(value.to_text().into_owned())))
            .collect();

        let body = match &self.body {
            NodeBody::Empty => NodeBody::Empty,
            NodeBody::Value(value) => {
                let text = value.to_text();
                if text.is_empty() {
                    NodeBody::Empty
                } else {
                    NodeBody::Value(Scalar::String(text.into_owned()))
                }
            }
            NodeBody::Cdata(content) => NodeBody::Cdata(content.clone()),
            NodeBody::Children(children) => {
                let mut normalized = Children::new();
                for (name, child) in children {
                    match child.nodes() {
                        [] => {}
                        [single] => {
                            normalized.insert(name.clone(), Child::One(single.normalized()));
                        }
                        nodes => {
                            normalized.insert(
                                name.clone(),
                                Child::Many(nodes.iter().map(Node::normalized).collect()),
                            );
                        }
                    }
                }
                if normalized.is_empty() {
                    NodeBody::Empty
                } else {
                    NodeBody::Children(normalized)
                }
            }
        };

        let body = match body {
            NodeBody::Empty if attributes.is_empty() => NodeBody::Value(Scalar::Null),
            other => other,
        };

        Node { attributes, body }
    }
}

/// A whole document in array-model form: `{ root_name: root }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub root_name: String,
    pub root: Node,
    /// Raw doc type content injected after the XML declaration when building.
    pub doc_type: Option<String>,
}

impl Tree {
    pub fn new(root_name: impl Into<String>, root: Node) -> Self {
        Self {
            root_name: root_name.into(),
            root,
            doc_type: None,
        }
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// See [`Node::normalized`]. The doc type is not part of the comparison
    /// since extraction never reports one.
    pub fn normalized(&self) -> Tree {
        Tree {
            root_name: self.root_name.clone(),
            root: self.root.normalized(),
            doc_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_text() {
        assert_eq!(Scalar::Null.to_text(), "");
        assert_eq!(Scalar::from(0).to_text(), "0");
        assert_eq!(Scalar::from(true).to_text(), "true");
        assert_eq!(Scalar::from("normal").to_text(), "normal");
        assert_eq!(Scalar::from(None::<&str>), Scalar::Null);
    }

    #[test]
    fn test_scalar_emptiness() {
        assert!(Scalar::Null.is_empty());
        assert!(Scalar::from("").is_empty());
        assert!(!Scalar::from(0).is_empty());
        assert!(!Scalar::from(false).is_empty());
    }

    #[test]
    fn test_with_child_groups_repeated_names() {
        let node = Node::empty()
            .with_child("node", Node::scalar("A"))
            .with_child("other", Node::null())
            .with_child("node", Node::scalar("B"));

        let NodeBody::Children(children) = &node.body else {
            panic!("expected children");
        };
        let keys: Vec<&str> = children.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["node", "other"]);
        assert_eq!(
            node.child("node").unwrap().nodes(),
            &[Node::scalar("A"), Node::scalar("B")]
        );
    }

    #[test]
    fn test_with_child_replaces_text_body() {
        let node = Node::scalar("text").with_child("child", Node::null());
        assert!(node.child("child").is_some());
        assert!(node.text().is_none());
    }

    #[test]
    fn test_normalized_scalars_and_attributes() {
        let node = Node::scalar(0)
            .with_attribute("empty", Scalar::Null)
            .with_attribute("zero", 0);
        let normalized = node.normalized();
        assert_eq!(normalized.attribute("empty"), Some(&Scalar::from("")));
        assert_eq!(normalized.attribute("zero"), Some(&Scalar::from("0")));
        assert_eq!(normalized.body, NodeBody::Value(Scalar::from("0")));
    }

    #[test]
    fn test_normalized_empty_forms() {
        assert_eq!(Node::empty().normalized(), Node::null());
        assert_eq!(Node::scalar("").normalized(), Node::null());
        assert_eq!(
            Node::scalar("  \n").normalized(),
            Node::scalar("  \n")
        );
        assert_eq!(
            Node::children(Children::new()).normalized(),
            Node::null()
        );

        let attribute_only = Node::null().with_attribute("a", "1").normalized();
        assert_eq!(attribute_only.body, NodeBody::Empty);
    }

    #[test]
    fn test_normalized_keeps_empty_cdata() {
        assert_eq!(Node::cdata("").normalized(), Node::cdata(""));
    }

    #[test]
    fn test_normalized_lists() {
        let node = Node::empty()
            .with_children("single", vec![Node::scalar("A")])
            .with_children("none", vec![])
            .with_children("pair", vec![Node::scalar(1), Node::scalar(2)]);
        let normalized = node.normalized();

        assert_eq!(
            normalized.child("single"),
            Some(&Child::One(Node::scalar("A")))
        );
        assert!(normalized.child("none").is_none());
        assert_eq!(
            normalized.child("pair"),
            Some(&Child::Many(vec![Node::scalar("1"), Node::scalar("2")]))
        );
    }
}
