//! Namespace registry and conversion settings.
//!
//! [`Settings`] holds the XML declaration values and the two namespace
//! verbosity toggles. A [`NamespaceRegistry`] keeps the current settings
//! behind an [`ArcSwap`], so reconfiguration is one atomic pointer swap and
//! conversions that already took a snapshot are unaffected.
//!
//! # Environment Variables
//!
//! [`Settings::from_env`] reads the following overrides:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XMLMAP_XML_VERSION` | 1.0 | Declared XML version |
//! | `XMLMAP_XML_ENCODING` | utf-8 | Declared encoding |
//! | `XMLMAP_XML_STANDALONE` | false | Declared standalone flag |
//! | `XMLMAP_INCLUDE_ALL_NAMESPACES` | false | Declare every known namespace in use |
//! | `XMLMAP_INCLUDE_DEFAULT_XML_NAMESPACE` | true | Declare `xmlns:xml` on the root |
//!
//! The process-wide registry returned by [`global`] is shared mutable state.
//! Concurrent reconfiguration while other threads convert is last-writer-wins;
//! callers that need different settings per conversion should use an explicit
//! [`Settings`] with [`TreeBuilder::with_settings`](crate::TreeBuilder::with_settings)
//! or [`TreeExtractor::with_settings`](crate::TreeExtractor::with_settings).

use crate::error::{Result, XmlMapError};
use arc_swap::ArcSwap;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use xmlmap_dom::names::{XML_NAMESPACE, check_namespace_binding, is_valid_ncname};
use xmlmap_dom::Declaration;

/// Declaration values and namespace toggles used by conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// XML version written in the declaration.
    pub version: String,
    /// Encoding written in the declaration. Only UTF-8 can be serialized.
    pub encoding: String,
    /// Standalone flag written in the declaration.
    pub standalone: bool,
    /// Declare every namespace whose URI is known on the root element.
    pub include_all_namespaces: bool,
    /// With `include_all_namespaces`, also declare the `xml` namespace.
    pub include_default_xml_namespace: bool,
    /// Known prefix to URI bindings.
    pub namespaces: IndexMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut namespaces = IndexMap::new();
        namespaces.insert("xml".to_string(), XML_NAMESPACE.to_string());
        Self {
            version: "1.0".to_string(),
            encoding: "utf-8".to_string(),
            standalone: false,
            include_all_namespaces: false,
            include_default_xml_namespace: true,
            namespaces,
        }
    }
}

impl Settings {
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    pub fn with_include_all_namespaces(mut self, include: bool) -> Self {
        self.include_all_namespaces = include;
        self
    }

    pub fn with_include_default_xml_namespace(mut self, include: bool) -> Self {
        self.include_default_xml_namespace = include;
        self
    }

    /// Adds a prefix binding after checking it against the reserved
    /// `xml`/`xmlns` rules.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Result<Self> {
        self.add_namespace(prefix.into(), uri.into())?;
        Ok(self)
    }

    fn add_namespace(&mut self, prefix: String, uri: String) -> Result<()> {
        if !is_valid_ncname(&prefix) {
            return Err(XmlMapError::Configuration(format!(
                "'{prefix}' is not a valid namespace prefix"
            )));
        }
        check_namespace_binding(&prefix, &uri).map_err(XmlMapError::Configuration)?;
        self.namespaces.insert(prefix, uri);
        Ok(())
    }

    /// The URI bound to `prefix`, if known.
    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// The declaration written at the top of built documents.
    pub fn declaration(&self) -> Declaration {
        Declaration {
            version: self.version.clone(),
            encoding: Some(self.encoding.clone()),
            standalone: Some(self.standalone),
        }
    }

    /// Settings with environment variable overrides applied to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(version) = lookup("XMLMAP_XML_VERSION") {
            settings.version = version;
        }
        if let Some(encoding) = lookup("XMLMAP_XML_ENCODING") {
            settings.encoding = encoding;
        }
        if let Some(raw) = lookup("XMLMAP_XML_STANDALONE") {
            settings.standalone = parse_flag("XMLMAP_XML_STANDALONE", &raw)?;
        }
        if let Some(raw) = lookup("XMLMAP_INCLUDE_ALL_NAMESPACES") {
            settings.include_all_namespaces = parse_flag("XMLMAP_INCLUDE_ALL_NAMESPACES", &raw)?;
        }
        if let Some(raw) = lookup("XMLMAP_INCLUDE_DEFAULT_XML_NAMESPACE") {
            settings.include_default_xml_namespace =
                parse_flag("XMLMAP_INCLUDE_DEFAULT_XML_NAMESPACE", &raw)?;
        }
        Ok(settings)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(XmlMapError::Configuration(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}

/// Shared, atomically replaceable [`Settings`].
#[derive(Debug)]
pub struct NamespaceRegistry {
    settings: ArcSwap<Settings>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl NamespaceRegistry {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
        }
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    /// Sets the declaration values and namespace toggles in one update.
    /// Registered namespaces are kept.
    pub fn configure(
        &self,
        version: &str,
        encoding: &str,
        standalone: bool,
        include_all_namespaces: bool,
        include_default_xml_namespace: bool,
    ) {
        tracing::debug!(
            version,
            encoding,
            standalone,
            include_all_namespaces,
            include_default_xml_namespace,
            "Reconfiguring namespace registry"
        );
        self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            next.version = version.to_string();
            next.encoding = encoding.to_string();
            next.standalone = standalone;
            next.include_all_namespaces = include_all_namespaces;
            next.include_default_xml_namespace = include_default_xml_namespace;
            next
        });
    }

    /// Makes `prefix` resolvable to `uri` for namespace hoisting.
    pub fn register_namespace(&self, prefix: &str, uri: &str) -> Result<()> {
        let mut candidate = Settings::clone(&self.settings.load());
        candidate.add_namespace(prefix.to_string(), uri.to_string())?;
        tracing::debug!(prefix, uri, "Registering namespace");
        self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            next.namespaces.insert(prefix.to_string(), uri.to_string());
            next
        });
        Ok(())
    }

    /// Replaces every setting at once.
    pub fn replace(&self, settings: Settings) -> Result<()> {
        for (prefix, uri) in &settings.namespaces {
            check_namespace_binding(prefix, uri).map_err(XmlMapError::Configuration)?;
        }
        tracing::debug!(?settings, "Replacing namespace registry settings");
        self.settings.store(Arc::new(settings));
        Ok(())
    }

    /// Restores the default settings.
    pub fn reset(&self) {
        tracing::debug!("Resetting namespace registry");
        self.settings.store(Arc::new(Settings::default()));
    }
}

static GLOBAL: Lazy<NamespaceRegistry> = Lazy::new(NamespaceRegistry::default);

/// The process-wide registry used by conversions without explicit settings.
pub fn global() -> &'static NamespaceRegistry {
    &GLOBAL
}

/// Prefixes declared on the element path currently being walked.
///
/// `xml` and `xmlns` are always bound.
#[derive(Debug, Default)]
pub(crate) struct NamespaceScope {
    frames: Vec<Vec<String>>,
}

impl NamespaceScope {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Enters an element, recording the prefixes its attributes declare.
    pub(crate) fn push<'a>(&mut self, attribute_names: impl IntoIterator<Item = &'a str>) {
        let declared = attribute_names
            .into_iter()
            .filter_map(xmlmap_dom::names::declared_prefix)
            .map(str::to_string)
            .collect();
        self.frames.push(declared);
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    /// Adds a declaration to the outermost frame (the root element).
    pub(crate) fn declare_at_root(&mut self, prefix: &str) {
        if let Some(root) = self.frames.first_mut() {
            root.push(prefix.to_string());
        }
    }

    pub(crate) fn is_declared(&self, prefix: &str) -> bool {
        matches!(prefix, "xml" | "xmlns")
            || self
                .frames
                .iter()
                .any(|frame| frame.iter().any(|declared| declared == prefix))
    }
}
