//! Shared test infrastructure.
//!
//! The main piece is a quick-xml adapter that turns real markup into the
//! loader's event stream, playing the role of the external lexer.

#![allow(dead_code)]

use ohco_core::event::AttrMap;
use ohco_core::{MarkupEvent, ObjectRecord, Record};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Lex an XML string into loader events.
///
/// Offsets are the reader's buffer position when each event starts, which
/// keeps them non-decreasing; they are not asserted byte-exactly in the
/// tests that go through this adapter.
pub fn events_from_xml(xml: &str) -> Vec<MarkupEvent> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut out = Vec::new();
    loop {
        let offset = reader.buffer_position() as u64;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                out.push(MarkupEvent::Open {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    offset,
                    attrs: attr_map(&e),
                });
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                out.push(MarkupEvent::Open {
                    name: name.clone(),
                    offset,
                    attrs: attr_map(&e),
                });
                out.push(MarkupEvent::Close { name, offset });
            }
            Ok(Event::Text(e)) => {
                let content = match e.unescape() {
                    Ok(text) => text.into_owned().into_bytes(),
                    Err(_) => e.as_ref().to_vec(),
                };
                out.push(MarkupEvent::Text { content, offset });
            }
            Ok(Event::CData(e)) => {
                out.push(MarkupEvent::Text {
                    content: e.into_inner().into_owned(),
                    offset,
                });
            }
            Ok(Event::End(e)) => {
                out.push(MarkupEvent::Close {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    offset,
                });
            }
            Ok(Event::Eof) => break,
            // Declarations, comments and processing instructions carry no
            // corpus content.
            Ok(_) => {}
            Err(err) => panic!("xml lexing failed: {err}"),
        }
    }
    out
}

fn attr_map(e: &quick_xml::events::BytesStart<'_>) -> AttrMap {
    e.attributes()
        .flatten()
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            )
        })
        .collect()
}

/// The object records of a stream, skipping line markers.
pub fn objects(records: &[Record]) -> Vec<&ObjectRecord> {
    records.iter().filter_map(Record::as_object).collect()
}

/// Word-level records in emission order.
pub fn words(records: &[Record]) -> Vec<&ObjectRecord> {
    objects(records)
        .into_iter()
        .filter(|record| record.level == ohco_core::Level::Word)
        .collect()
}
