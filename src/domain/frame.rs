//! Message classifier.
//!
//! Every inbound text frame is either a structured JSON document or an
//! opaque payload (base64 image text). Classification is total: a parse
//! failure is simply an opaque frame.
//!
//! A payload that happens to be valid JSON (for example a base64 string
//! made only of digits) classifies as structured. The wire format has no
//! envelope that could tell the two apart.

use serde_json::Value;

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame<'a> {
    /// The frame parsed as a JSON document.
    Structured(Value),
    /// The frame is raw payload text.
    Opaque(&'a str),
}

impl<'a> Frame<'a> {
    /// Classifies a raw text frame. Never fails.
    #[must_use]
    pub fn classify(raw: &'a str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::Structured(value),
            Err(_) => Self::Opaque(raw),
        }
    }

    /// Returns `true` for [`Frame::Structured`].
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_object_is_structured() {
        let frame = Frame::classify(r#"{"command": "enqueue_prompt"}"#);
        assert!(frame.is_structured());
    }

    #[test]
    fn base64_text_is_opaque() {
        let raw = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVQYV2NgYAAAAAMAAWgmWQ0AAAAASUVORK5CYII=";
        assert_eq!(Frame::classify(raw), Frame::Opaque(raw));
    }

    #[test]
    fn empty_and_garbage_are_opaque() {
        assert!(!Frame::classify("").is_structured());
        assert!(!Frame::classify("{not json").is_structured());
        assert!(!Frame::classify("\u{0}\u{1}").is_structured());
    }

    #[test]
    fn bare_scalars_are_structured() {
        assert!(Frame::classify("12345").is_structured());
        assert!(Frame::classify("null").is_structured());
        assert!(Frame::classify("\"text\"").is_structured());
        assert!(Frame::classify("[1, 2]").is_structured());
    }
}
