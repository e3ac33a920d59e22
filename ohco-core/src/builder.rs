//! The object builder - a recursive state machine over a shared event
//! cursor.
//!
//! One call to [`ObjectBuilder::build`] consumes one document's event
//! stream and emits every finished object to the caller's sink. The
//! recursion *is* the tree structure: when a mapped element opens, the
//! builder recurses into the child object, and the nested call advances the
//! same cursor the parent resumes from. Nothing is buffered or rewound, so
//! objects are emitted in the order their closing tags are seen
//! (post-order); the document record is always last.
//!
//! # Architecture
//!
//! ```text
//! events ──▶ open/close loop ──▶ hierarchy frames ──▶ emitter
//!               │                     ▲
//!               ├── raw element context (metadata matching)
//!               ├── tokenizer (word / sentence-boundary leaves)
//!               └── parallel line counter (line-sync records)
//! ```
//!
//! Malformed markup never aborts a build: unbalanced closing tags are
//! ignored by a conservative pop rule, and an undecodable text node is
//! reported and dropped individually.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use memchr::memchr2;
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::config::{ConfigError, LoaderConfig};
use crate::emit::{Emitter, ObjectRecord, Record};
use crate::event::{AttrMap, MarkupEvent};
use crate::token::{tokens, TokenKind};
use crate::vector::{Level, ObjectId, OhcoVector, LEVEL_COUNT};

/// Failures that abort a document build.
///
/// Malformed markup is not in here: structural imbalance is tolerated and
/// undecodable text nodes are dropped individually. Only a rejected
/// configuration or a failing sink stops a build.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("emitting record failed: {0}")]
    Emit(#[from] std::io::Error),
}

/// Result of one document build: the peak counter vector extended with the
/// final byte offset and line number, plus the word-frequency table.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    /// Highest counter value reached per level.
    pub peak: [u32; LEVEL_COUNT],
    /// Byte offset of the last event pulled.
    pub final_offset: u64,
    /// Highest line number the parallel counter reached.
    pub final_line: u32,
    /// Case-sensitive token text to occurrence count.
    pub word_counts: HashMap<String, u64>,
}

impl BuildSummary {
    /// Flat shape: peak components, then final offset and line.
    pub fn extended_vector(&self) -> Vec<u64> {
        let mut extended: Vec<u64> = self.peak.iter().map(|&c| u64::from(c)).collect();
        extended.push(self.final_offset);
        extended.push(u64::from(self.final_line));
        extended
    }
}

/// An open hierarchy object.
#[derive(Debug)]
struct Frame {
    name: String,
    level: Level,
    id: ObjectId,
    /// Raw element context captured when the frame opened. Metadata paths
    /// for this frame match against the context suffix past this prefix.
    context: Vec<String>,
    /// Harvested metadata fields.
    attrs: BTreeMap<String, String>,
    start: u64,
}

/// Active metadata destination: one field on one open frame.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MetaDest {
    frame: usize,
    field: String,
}

/// Builds one document's objects from its event stream.
///
/// The event cursor is passed by exclusive reference into every recursive
/// call frame; each pull advances the single shared position, which is what
/// interleaves parent and child consumption without buffering.
pub struct ObjectBuilder<'cfg> {
    config: &'cfg LoaderConfig,
    doc_id: u32,
    vector: OhcoVector,
    /// Currently-open raw markup elements, independent of the frame stack.
    /// Grows on every tag-open; shrinks on tag-close only when the top
    /// matches, so damaged markup tends to grow it rather than corrupt it.
    context: Vec<String>,
    stack: Vec<Frame>,
    meta_dest: Option<MetaDest>,
    /// Byte cursor: offset of the most recently pulled event.
    offset: u64,
    line: u32,
    line_max: u32,
    counts: HashMap<String, u64>,
    doc_attrs: BTreeMap<String, String>,
}

impl<'cfg> ObjectBuilder<'cfg> {
    pub fn new(config: &'cfg LoaderConfig, doc_id: u32) -> Self {
        ObjectBuilder {
            config,
            doc_id,
            vector: OhcoVector::new(doc_id),
            context: Vec::new(),
            stack: Vec::new(),
            meta_dest: None,
            offset: 0,
            line: 0,
            line_max: 0,
            counts: HashMap::new(),
            doc_attrs: BTreeMap::new(),
        }
    }

    /// Stamp an attribute onto the document object, e.g. the source
    /// filename.
    pub fn doc_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.doc_attrs.insert(key.into(), value.into());
        self
    }

    /// Run the build to stream exhaustion.
    ///
    /// Validates the configuration, opens the root document frame, and
    /// consumes the cursor until the root's closing tag or the end of the
    /// stream. Both the cursor and the emitter stay owned by the caller and
    /// are released on every exit path.
    pub fn build<I, E>(mut self, events: &mut I, emitter: &mut E) -> Result<BuildSummary, LoadError>
    where
        I: Iterator<Item = MarkupEvent>,
        E: Emitter + ?Sized,
    {
        self.config.validate()?;
        let root = self.config.root_element.clone();
        let doc_attrs = std::mem::take(&mut self.doc_attrs);
        debug!(doc = self.doc_id, root = %root, "building document");
        self.open_object(events, emitter, root, Level::Doc, self.offset, doc_attrs)?;
        debug!(
            doc = self.doc_id,
            tokens = self.counts.values().sum::<u64>(),
            types = self.counts.len(),
            "document built"
        );
        Ok(BuildSummary {
            peak: self.vector.peak(),
            final_offset: self.offset,
            final_line: self.line_max,
            word_counts: self.counts,
        })
    }

    /// The open/close procedure.
    ///
    /// Opens an object at `level`, consumes events from the shared cursor
    /// until the matching closing tag (recursing for nested objects), then
    /// emits the finished record. Stream exhaustion finalizes the frame at
    /// the current byte cursor, so truncated input unwinds cleanly.
    fn open_object<I, E>(
        &mut self,
        events: &mut I,
        emitter: &mut E,
        name: String,
        level: Level,
        start: u64,
        attrs: BTreeMap<String, String>,
    ) -> Result<(), LoadError>
    where
        I: Iterator<Item = MarkupEvent>,
        E: Emitter + ?Sized,
    {
        self.vector.open(level);
        let id = self.vector.snapshot();
        trace!(level = level.label(), name = %name, id = %id, "open");
        self.stack.push(Frame {
            name,
            level,
            id,
            context: self.context.clone(),
            attrs,
            start,
        });
        let mut end = None;

        while let Some(event) = events.next() {
            self.offset = event.offset();
            match event {
                MarkupEvent::Open { name, offset, attrs } => {
                    self.context.push(name.clone());
                    self.refresh_meta_dest();
                    if let Some(class) = self.config.class_of(&name) {
                        let child = class.resolve(self.innermost_division());
                        self.open_object(events, emitter, name, child, offset, BTreeMap::new())?;
                    } else if name == self.config.line_element {
                        self.line_marker(emitter, offset, &attrs)?;
                    }
                }
                MarkupEvent::Text { content, offset } => {
                    self.text_node(emitter, &content, offset)?;
                }
                MarkupEvent::Close { name, offset } => {
                    if self.context.last().map(String::as_str) == Some(name.as_str()) {
                        self.context.pop();
                    } else {
                        trace!(element = %name, offset, "unbalanced closing tag ignored");
                    }
                    self.refresh_meta_dest();
                    if name == self.top_frame().name {
                        end = Some(offset);
                        break;
                    }
                }
            }
        }

        let frame = self.stack.pop().expect("open_object pushed a frame");
        // A destination must never outlive its frame.
        self.refresh_meta_dest();
        trace!(level = frame.level.label(), name = %frame.name, "close");
        emitter.emit(Record::Object(ObjectRecord {
            level: frame.level,
            content: frame.name,
            id: frame.id,
            start: frame.start,
            end: end.unwrap_or(self.offset),
            line: self.line,
            attrs: frame.attrs,
        }))?;
        self.vector.close(level);
        Ok(())
    }

    /// Advance the parallel line counter and emit a line-sync record.
    ///
    /// An explicit number comes from the configured attribute; anything
    /// else (absent or unparseable) increments.
    fn line_marker<E>(&mut self, emitter: &mut E, offset: u64, attrs: &AttrMap) -> Result<(), LoadError>
    where
        E: Emitter + ?Sized,
    {
        match attrs.get(self.config.line_number_attr.as_str()) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(number) => self.line = number,
                Err(_) => {
                    warn!(
                        doc = self.doc_id,
                        offset,
                        value = %raw,
                        "line number attribute did not parse, incrementing"
                    );
                    self.line += 1;
                }
            },
            None => self.line += 1,
        }
        self.line_max = self.line_max.max(self.line);
        emitter.emit(Record::Line { offset, number: self.line })?;
        Ok(())
    }

    /// Route one text node: metadata if a destination is active, tokens
    /// otherwise. A node is exclusively one or the other, never both.
    fn text_node<E>(&mut self, emitter: &mut E, content: &[u8], offset: u64) -> Result<(), LoadError>
    where
        E: Emitter + ?Sized,
    {
        let text = match std::str::from_utf8(content) {
            Ok(text) => text,
            Err(err) => {
                // The one recoverable per-node failure: report with document
                // identity, offset and detail, drop the node, keep parsing.
                error!(doc = self.doc_id, offset, %err, "undecodable text node dropped");
                return Ok(());
            }
        };

        if let Some(dest) = self.meta_dest.clone() {
            let cleaned = strip_layout(text);
            let frame = &mut self.stack[dest.frame];
            frame.attrs.entry(dest.field).or_default().push_str(&cleaned);
            return Ok(());
        }

        for token in tokens(text) {
            let level = match token.kind {
                TokenKind::Word => Level::Word,
                TokenKind::Boundary => Level::Sent,
            };
            // Leaves are opened and emitted atomically; they never join the
            // frame stack.
            self.vector.open(level);
            let start = offset + token.offset as u64;
            emitter.emit(Record::Object(ObjectRecord {
                level,
                content: token.text.to_string(),
                id: self.vector.snapshot(),
                start,
                end: start + token.text.len() as u64,
                line: self.line,
                attrs: BTreeMap::new(),
            }))?;
            if token.kind == TokenKind::Word {
                *self.counts.entry(token.text.to_string()).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    #[inline]
    fn top_frame(&self) -> &Frame {
        self.stack.last().expect("frame stack is never empty inside open_object")
    }

    /// Innermost open division, if any.
    fn innermost_division(&self) -> Option<Level> {
        self.stack
            .iter()
            .rev()
            .map(|frame| frame.level)
            .find(|level| level.is_division())
    }

    fn refresh_meta_dest(&mut self) {
        self.meta_dest = self.resolve_meta_dest();
    }

    /// Walk the open frames innermost-first and find the destination the
    /// current context selects, if any.
    ///
    /// A frame is eligible when its open-time context is a prefix of the
    /// current context; its level's patterns are tested against the context
    /// suffix past that prefix. The first eligible frame with a matching
    /// pattern wins, and its first matching pattern (declaration order)
    /// names the field.
    fn resolve_meta_dest(&self) -> Option<MetaDest> {
        for (idx, frame) in self.stack.iter().enumerate().rev() {
            if self.context.len() < frame.context.len()
                || self.context[..frame.context.len()] != frame.context[..]
            {
                // The frame's context is no longer a prefix: the file is
                // damaged. Safer to skip than to mis-route metadata.
                continue;
            }
            let suffix = &self.context[frame.context.len()..];
            for (path, field) in self.config.metadata.for_level(frame.level) {
                if path.matches(suffix) {
                    return Some(MetaDest {
                        frame: idx,
                        field: field.clone(),
                    });
                }
            }
        }
        None
    }
}

/// Strip embedded newlines and tabs from harvested metadata text.
fn strip_layout(text: &str) -> Cow<'_, str> {
    if memchr2(b'\n', b'\t', text.as_bytes()).is_none() {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| c != '\n' && c != '\t').collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_layout() {
        assert!(matches!(strip_layout("plain text"), Cow::Borrowed(_)));
        assert_eq!(strip_layout("a\n\tb\n"), "ab");
    }

    #[test]
    fn test_builder_starts_empty() {
        let config = LoaderConfig::default();
        let builder = ObjectBuilder::new(&config, 7);
        assert_eq!(builder.vector.snapshot().components(), &[7, 0, 0, 0, 0, 0, 0]);
        assert!(builder.stack.is_empty());
        assert!(builder.context.is_empty());
    }
}
