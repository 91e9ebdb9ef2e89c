//! JSON form of the array model.
//!
//! The array model is usually exchanged as JSON using the reserved keys
//! `@attributes`, `@value`, `@cdata` and `@docType`. This module converts
//! between that form and the typed [`Node`]/[`Tree`], and provides thin
//! `serde_json` wrappers for anything that (de)serializes through it.

use crate::error::{Result, XmlMapError};
use crate::model::{
    ATTRIBUTES_KEY, Attributes, CDATA_KEY, Child, Children, DOC_TYPE_KEY, Node, NodeBody, Scalar,
    Tree, VALUE_KEY,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

impl Scalar {
    /// Decodes a JSON scalar. Arrays and objects are not scalars.
    pub fn from_json(value: &Value) -> Option<Scalar> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}

impl Node {
    /// Decodes a node from its JSON form.
    ///
    /// A scalar is an element holding text. An object may carry
    /// `@attributes`, one of `@cdata`/`@value`, and child keys; arrays under a
    /// child key are repeated siblings.
    pub fn from_json(value: &Value) -> Result<Node> {
        decode_node(value, "")
    }

    /// Encodes the node into its JSON form.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        if !self.attributes.is_empty() {
            let attributes: Map<String, Value> = self
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect();
            object.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
        }

        match &self.body {
            NodeBody::Empty => {}
            NodeBody::Value(value) => {
                if self.attributes.is_empty() {
                    return value.to_json();
                }
                object.insert(VALUE_KEY.to_string(), value.to_json());
            }
            NodeBody::Cdata(content) => {
                object.insert(CDATA_KEY.to_string(), Value::String(content.clone()));
            }
            NodeBody::Children(children) => {
                for (name, child) in children {
                    let value = match child {
                        Child::One(node) => node.to_json(),
                        Child::Many(nodes) => Value::Array(nodes.iter().map(Node::to_json).collect()),
                    };
                    object.insert(name.clone(), value);
                }
            }
        }
        Value::Object(object)
    }
}

impl Tree {
    /// Decodes `{ rootName: node }`. A `@docType` string is accepted next to
    /// the root key or inside the root object.
    pub fn from_json(value: &Value) -> Result<Tree> {
        let Value::Object(object) = value else {
            return Err(XmlMapError::invalid_structure(
                "",
                "the array model must be a mapping with a single root key",
            ));
        };

        let mut doc_type = None;
        let mut root = None;
        for (key, value) in object {
            if key == DOC_TYPE_KEY {
                doc_type = Some(decode_doc_type(value, key)?);
            } else if root.is_some() {
                return Err(XmlMapError::invalid_structure(
                    key.as_str(),
                    "the array model must have exactly one root element",
                ));
            } else {
                root = Some((key, value));
            }
        }

        let Some((root_name, root_value)) = root else {
            return Err(XmlMapError::invalid_structure("", "the array model has no root element"));
        };

        let mut tree = Tree::from_root_json(root_name.as_str(), root_value)?;
        if tree.doc_type.is_none() {
            tree.doc_type = doc_type;
        }
        Ok(tree)
    }

    /// Decodes the root node given separately from its name. A `@docType` key
    /// in the root object is taken as the tree's doc type.
    pub fn from_root_json(root_name: &str, value: &Value) -> Result<Tree> {
        let mut doc_type = None;
        let root = match value {
            Value::Object(object) if object.contains_key(DOC_TYPE_KEY) => {
                let mut object = object.clone();
                if let Some(raw) = object.remove(DOC_TYPE_KEY) {
                    doc_type = Some(decode_doc_type(&raw, &format!("{root_name}/{DOC_TYPE_KEY}"))?);
                }
                decode_node(&Value::Object(object), root_name)?
            }
            Value::Array(_) => {
                return Err(XmlMapError::invalid_structure(
                    root_name,
                    "the root element cannot be a list",
                ));
            }
            other => decode_node(other, root_name)?,
        };

        Ok(Tree {
            root_name: root_name.to_string(),
            root,
            doc_type,
        })
    }

    /// Encodes `{ rootName: node }`, followed by `@docType` when one is set.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(self.root_name.clone(), self.root.to_json());
        if let Some(doc_type) = &self.doc_type {
            object.insert(DOC_TYPE_KEY.to_string(), Value::String(doc_type.clone()));
        }
        Value::Object(object)
    }
}

fn decode_doc_type(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(XmlMapError::invalid_structure(path, "@docType must be a string")),
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}/{key}")
    }
}

fn decode_node(value: &Value, path: &str) -> Result<Node> {
    let object = match value {
        Value::Array(_) => {
            return Err(XmlMapError::invalid_structure(
                path,
                "a list cannot appear directly inside another list",
            ));
        }
        Value::Object(object) => object,
        scalar => {
            let scalar = Scalar::from_json(scalar).unwrap_or_default();
            return Ok(Node::scalar(scalar));
        }
    };

    let mut attributes = Attributes::new();
    let mut value = None;
    let mut cdata = None;
    let mut children = Children::new();

    for (key, entry) in object {
        let entry_path = child_path(path, key);
        match key.as_str() {
            ATTRIBUTES_KEY => attributes = decode_attributes(entry, &entry_path)?,
            VALUE_KEY => value = Some(decode_scalar(entry, &entry_path)?),
            CDATA_KEY => cdata = Some(decode_scalar(entry, &entry_path)?),
            DOC_TYPE_KEY => {
                return Err(XmlMapError::invalid_structure(
                    entry_path,
                    "@docType is only allowed on the root element",
                ));
            }
            reserved if reserved.starts_with('@') => {
                return Err(XmlMapError::invalid_structure(
                    entry_path,
                    format!("unknown reserved key '{reserved}'"),
                ));
            }
            _ => {
                let child = match entry {
                    Value::Array(items) => Child::Many(
                        items
                            .iter()
                            .enumerate()
                            .map(|(index, item)| decode_node(item, &format!("{entry_path}[{index}]")))
                            .collect::<Result<Vec<_>>>()?,
                    ),
                    other => Child::One(decode_node(other, &entry_path)?),
                };
                children.insert(key.clone(), child);
            }
        }
    }

    if !children.is_empty() && (cdata.is_some() || value.is_some()) {
        tracing::debug!(
            path,
            ignored = children.len(),
            "Child keys ignored next to @value/@cdata"
        );
    }

    let body = match (cdata, value) {
        (Some(cdata), Some(value)) if !cdata.is_empty() && !value.is_empty() => {
            return Err(XmlMapError::invalid_structure(
                path,
                "an element cannot hold both @value and @cdata",
            ));
        }
        (Some(cdata), _) => NodeBody::Cdata(cdata.to_text().into_owned()),
        (None, Some(value)) => NodeBody::Value(value),
        (None, None) if children.is_empty() => NodeBody::Empty,
        (None, None) => NodeBody::Children(children),
    };

    Ok(Node { attributes, body })
}

fn decode_scalar(value: &Value, path: &str) -> Result<Scalar> {
    Scalar::from_json(value)
        .ok_or_else(|| XmlMapError::invalid_structure(path, "expected a scalar value"))
}

fn decode_attributes(value: &Value, path: &str) -> Result<Attributes> {
    let Value::Object(object) = value else {
        return Err(XmlMapError::invalid_structure(
            path,
            "@attributes must be a mapping of names to scalar values",
        ));
    };
    object
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_scalar(value, &child_path(path, name))?)))
        .collect()
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Node::from_json(&value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Tree::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Deserialize a value (typically a [`Tree`]) from a JSON string.
///
/// # Examples
///
/// ```
/// use xmlmap::{Tree, json::from_json_str};
///
/// let tree: Tree = from_json_str(r#"{"root": {"item": "value"}}"#)?;
/// assert_eq!(tree.root_name, "root");
/// # Ok::<(), xmlmap::XmlMapError>(())
/// ```
pub fn from_json_str<'a, T>(s: &'a str) -> Result<T>
where
    T: Deserialize<'a>,
{
    Ok(serde_json::from_str(s)?)
}

/// Serialize a value to a JSON string.
pub fn to_json_string<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    Ok(serde_json::to_string(value)?)
}

/// Serialize a value to a pretty-printed JSON string.
pub fn to_json_string_pretty<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    Ok(serde_json::to_string_pretty(value)?)
}

/// Deserialize a value from a `serde_json::Value`.
pub fn from_json_value<T>(value: Value) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    Ok(serde_json::from_value(value)?)
}
