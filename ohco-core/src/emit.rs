//! Output records and emitters.
//!
//! The record stream is the loader's sole output: one record per finished
//! object, appended strictly in post-order (an object's descendants all
//! precede it; the document record is last). Consumers that need document
//! order re-sort by [`ObjectId`].

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::vector::{Level, ObjectId};

/// A finished hierarchy or leaf object.
///
/// Created when the object opens, finalized and emitted exactly once when
/// it closes, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Hierarchy level; its label is the record's type tag.
    pub level: Level,

    /// Element name for hierarchy objects, literal token text for leaves.
    pub content: String,

    /// Counter snapshot taken when the object opened.
    pub id: ObjectId,

    /// Byte offset of the opening event.
    pub start: u64,

    /// Byte offset of the closing event. For leaves, start plus the
    /// token's byte length.
    pub end: u64,

    /// Parallel line counter at emission time.
    pub line: u32,

    /// Harvested metadata fields. Append-only while the object is open.
    pub attrs: BTreeMap<String, String>,
}

/// One element of the output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Object(ObjectRecord),

    /// Line-synchronization marker from the parallel line counter.
    Line { offset: u64, number: u32 },
}

impl Record {
    /// The object record, if this is one.
    pub fn as_object(&self) -> Option<&ObjectRecord> {
        match self {
            Record::Object(record) => Some(record),
            Record::Line { .. } => None,
        }
    }
}

/// Append-only sink for the record stream.
///
/// The sink is owned by the caller and scoped to one build; the builder
/// only ever appends.
pub trait Emitter {
    fn emit(&mut self, record: Record) -> io::Result<()>;
}

/// Renders records as whitespace-separated text lines:
///
/// ```text
/// <label> <content> <c0> .. <c6> <start> <end> <line> [key="value" ..]
/// line <offset> <number>
/// ```
///
/// Metadata pairs are rendered in sorted key order with escaped, quoted
/// values, so the fixed fields stay whitespace-parseable.
#[derive(Debug)]
pub struct WriteEmitter<W: Write> {
    out: W,
}

impl<W: Write> WriteEmitter<W> {
    pub fn new(out: W) -> Self {
        WriteEmitter { out }
    }

    /// Hand the underlying writer back to the caller.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Emitter for WriteEmitter<W> {
    fn emit(&mut self, record: Record) -> io::Result<()> {
        match record {
            Record::Object(rec) => {
                write!(
                    self.out,
                    "{} {} {} {} {} {}",
                    rec.level.label(),
                    rec.content,
                    rec.id,
                    rec.start,
                    rec.end,
                    rec.line,
                )?;
                for (key, value) in &rec.attrs {
                    write!(self.out, " {}={:?}", key, value)?;
                }
                writeln!(self.out)
            }
            Record::Line { offset, number } => writeln!(self.out, "line {} {}", offset, number),
        }
    }
}

/// Collects records in memory. Used by tests and in-process consumers.
#[derive(Debug, Default)]
pub struct VecEmitter {
    pub records: Vec<Record>,
}

impl VecEmitter {
    pub fn new() -> Self {
        VecEmitter::default()
    }

    /// The object records, skipping line markers.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.records.iter().filter_map(Record::as_object)
    }
}

impl Emitter for VecEmitter {
    fn emit(&mut self, record: Record) -> io::Result<()> {
        self.records.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_record() -> ObjectRecord {
        ObjectRecord {
            level: Level::Word,
            content: "Hello".to_string(),
            id: ObjectId::from([1, 1, 0, 0, 1, 0, 1]),
            start: 120,
            end: 125,
            line: 4,
            attrs: BTreeMap::new(),
        }
    }

    #[test]
    fn test_object_line_format() {
        let mut emitter = WriteEmitter::new(Vec::new());
        emitter.emit(Record::Object(word_record())).unwrap();
        let out = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(out, "word Hello 1 1 0 0 1 0 1 120 125 4\n");
    }

    #[test]
    fn test_metadata_pairs_are_sorted_and_quoted() {
        let mut record = word_record();
        record.level = Level::Doc;
        record.content = "TEI".to_string();
        record.attrs.insert("title".to_string(), "La Peste".to_string());
        record.attrs.insert("author".to_string(), "Camus".to_string());

        let mut emitter = WriteEmitter::new(Vec::new());
        emitter.emit(Record::Object(record)).unwrap();
        let out = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(
            out,
            "doc TEI 1 1 0 0 1 0 1 120 125 4 author=\"Camus\" title=\"La Peste\"\n"
        );
    }

    #[test]
    fn test_line_record_format() {
        let mut emitter = WriteEmitter::new(Vec::new());
        emitter.emit(Record::Line { offset: 88, number: 17 }).unwrap();
        assert_eq!(
            String::from_utf8(emitter.into_inner()).unwrap(),
            "line 88 17\n"
        );
    }

    #[test]
    fn test_vec_emitter_collects_in_order() {
        let mut emitter = VecEmitter::new();
        emitter.emit(Record::Line { offset: 0, number: 1 }).unwrap();
        emitter.emit(Record::Object(word_record())).unwrap();
        assert_eq!(emitter.records.len(), 2);
        assert_eq!(emitter.objects().count(), 1);
    }
}
