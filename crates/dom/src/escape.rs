//! Output escaping for attribute values and character data.

use std::borrow::Cow;

fn escape_with(input: &str, entity_for: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    let mut escaped: Option<String> = None;
    let mut last = 0;

    for (idx, ch) in input.char_indices() {
        if let Some(entity) = entity_for(ch) {
            let out = escaped.get_or_insert_with(|| String::with_capacity(input.len() + 8));
            out.push_str(&input[last..idx]);
            out.push_str(entity);
            last = idx + ch.len_utf8();
        }
    }

    match escaped {
        Some(mut out) => {
            out.push_str(&input[last..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(input),
    }
}

/// Escapes an attribute value for use inside double quotes.
///
/// Tab, line feed and carriage return are written as character references so
/// attribute-value normalization on the reading side leaves them intact.
pub fn escape_attribute(input: &str) -> Cow<'_, str> {
    escape_with(input, |ch| match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#9;"),
        '\n' => Some("&#10;"),
        '\r' => Some("&#13;"),
        _ => None,
    })
}

/// Escapes character data.
pub fn escape_text(input: &str) -> Cow<'_, str> {
    escape_with(input, |ch| match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute("<important>"), "&lt;important&gt;");
        assert_eq!(escape_attribute("'<important>'"), "'&lt;important&gt;'");
        assert_eq!(escape_attribute("a \"b\" & c"), "a &quot;b&quot; &amp; c");
        assert_eq!(escape_attribute("one\ttwo\nthree"), "one&#9;two&#10;three");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("<escaped>"), "&lt;escaped&gt;");
        assert_eq!(escape_text("fish & chips"), "fish &amp; chips");
        assert_eq!(escape_text("line\nbreak"), "line\nbreak");
    }

    #[test]
    fn test_unescaped_input_is_borrowed() {
        assert!(matches!(escape_text("description"), Cow::Borrowed(_)));
        assert!(matches!(escape_attribute(""), Cow::Borrowed(_)));
    }
}
