//! XML name rules.
//!
//! Names follow the XML 1.0 (fifth edition) `Name` production. Qualified names
//! additionally follow the Namespaces in XML `QName` production: an optional
//! prefix and a local part, both colon-free, separated by a single colon.

/// The URI the reserved `xml` prefix is permanently bound to.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The URI the reserved `xmlns` prefix is permanently bound to.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

/// Checks a string against the XML `Name` production.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Checks a string against the `NCName` production (a name without colons).
pub fn is_valid_ncname(name: &str) -> bool {
    !name.contains(':') && is_valid_name(name)
}

/// Checks a string against the `QName` production (`local` or `prefix:local`).
pub fn is_valid_qname(name: &str) -> bool {
    match split_qname(name) {
        (Some(prefix), local) => is_valid_ncname(prefix) && is_valid_ncname(local),
        (None, local) => is_valid_ncname(local),
    }
}

/// Splits a qualified name at its first colon.
///
/// `"lalit:item"` yields `(Some("lalit"), "item")`, `"item"` yields `(None, "item")`.
pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Returns the prefix declared by a namespace declaration attribute.
///
/// `xmlns:foo` declares `Some("foo")`, a bare `xmlns` declares the default
/// namespace and yields `Some("")`. Any other attribute name yields `None`.
pub fn declared_prefix(attribute_name: &str) -> Option<&str> {
    if attribute_name == "xmlns" {
        Some("")
    } else {
        attribute_name.strip_prefix("xmlns:")
    }
}

/// Checks a namespace declaration against the reserved-prefix rules.
///
/// The `xml` prefix may only be bound to [`XML_NAMESPACE`], the `xmlns`
/// prefix may never be declared, and neither reserved URI may be bound to any
/// other prefix. Returns a diagnostic describing the violation.
pub fn check_namespace_binding(prefix: &str, uri: &str) -> Result<(), String> {
    match prefix {
        "xml" if uri != XML_NAMESPACE => Err(format!(
            "xml namespace prefix mapped to wrong URI '{}' (must be '{}')",
            uri, XML_NAMESPACE
        )),
        "xml" => Ok(()),
        "xmlns" => Err("the xmlns prefix must not be declared".to_string()),
        _ if uri == XML_NAMESPACE => Err(format!(
            "prefix '{}' cannot be bound to the reserved xml namespace URI",
            prefix
        )),
        _ if uri == XMLNS_NAMESPACE => Err(format!(
            "prefix '{}' cannot be bound to the reserved xmlns namespace URI",
            prefix
        )),
        _ => Ok(()),
    }
}
