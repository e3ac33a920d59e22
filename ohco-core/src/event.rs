//! Markup events - the input side of the corpus loader.
//!
//! The loader never reads markup itself: an external lexer supplies a lazy,
//! single-pass sequence of these events, each stamped with the byte offset
//! where it begins. The builder consumes the sequence through one shared
//! cursor (`&mut impl Iterator`), so every event is pulled exactly once and
//! nothing is buffered or rewound.
//!
//! ## Event Sequences
//!
//! A paragraph `<p>Hello.</p>` arrives as:
//! ```text
//! Open  { name: "p", offset }
//! Text  { content: b"Hello.", offset }
//! Close { name: "p", offset }
//! ```
//!
//! Text content is raw bytes, not a `String`: character decoding happens in
//! the builder so one undecodable node can be dropped without disturbing the
//! rest of the stream.

use std::collections::BTreeMap;

/// Attribute map of a tag-open event.
pub type AttrMap = BTreeMap<String, String>;

/// A single markup event.
///
/// Byte offsets are non-decreasing across a well-formed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    /// Opening tag with its attributes.
    Open {
        name: String,
        offset: u64,
        attrs: AttrMap,
    },

    /// Character data between tags.
    Text {
        content: Vec<u8>,
        offset: u64,
    },

    /// Closing tag.
    Close {
        name: String,
        offset: u64,
    },
}

impl MarkupEvent {
    /// Byte offset where this event begins.
    #[inline]
    pub fn offset(&self) -> u64 {
        match self {
            MarkupEvent::Open { offset, .. } => *offset,
            MarkupEvent::Text { offset, .. } => *offset,
            MarkupEvent::Close { offset, .. } => *offset,
        }
    }

    /// Tag name for open and close events.
    pub fn name(&self) -> Option<&str> {
        match self {
            MarkupEvent::Open { name, .. } | MarkupEvent::Close { name, .. } => Some(name),
            MarkupEvent::Text { .. } => None,
        }
    }

    /// Check if this is a text event.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, MarkupEvent::Text { .. })
    }

    /// Open event without attributes.
    pub fn open(name: impl Into<String>, offset: u64) -> Self {
        MarkupEvent::Open {
            name: name.into(),
            offset,
            attrs: AttrMap::new(),
        }
    }

    /// Open event with attributes.
    pub fn open_with<K, V>(
        name: impl Into<String>,
        offset: u64,
        attrs: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        MarkupEvent::Open {
            name: name.into(),
            offset,
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Text event from anything byte-like.
    pub fn text(content: impl Into<Vec<u8>>, offset: u64) -> Self {
        MarkupEvent::Text {
            content: content.into(),
            offset,
        }
    }

    /// Close event.
    pub fn close(name: impl Into<String>, offset: u64) -> Self {
        MarkupEvent::Close {
            name: name.into(),
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        assert_eq!(MarkupEvent::open("div", 10).offset(), 10);
        assert_eq!(MarkupEvent::text("hi", 14).offset(), 14);
        assert_eq!(MarkupEvent::close("div", 20).offset(), 20);
    }

    #[test]
    fn test_names() {
        assert_eq!(MarkupEvent::open("div", 0).name(), Some("div"));
        assert_eq!(MarkupEvent::close("div", 0).name(), Some("div"));
        assert_eq!(MarkupEvent::text("x", 0).name(), None);
    }

    #[test]
    fn test_open_with_attrs() {
        let event = MarkupEvent::open_with("l", 3, [("n", "42")]);
        match event {
            MarkupEvent::Open { name, offset, attrs } => {
                assert_eq!(name, "l");
                assert_eq!(offset, 3);
                assert_eq!(attrs.get("n").map(String::as_str), Some("42"));
            }
            other => panic!("expected Open, got {:?}", other),
        }
    }

    #[test]
    fn test_text_is_bytes() {
        let event = MarkupEvent::text(vec![0xff, 0xfe], 0);
        assert!(event.is_text());
        match event {
            MarkupEvent::Text { content, .. } => assert_eq!(content, vec![0xff, 0xfe]),
            other => panic!("expected Text, got {:?}", other),
        }
    }
}
