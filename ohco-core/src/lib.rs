//! OHCO Corpus Loader Core
//!
//! Streaming, stack-based parser that turns a single-pass markup event
//! sequence into an Ordered Hierarchy of Content Objects: nested typed
//! spans (document, three division levels, paragraph, sentence, word),
//! each with byte-exact positions, a stable counter-vector identifier and
//! optionally harvested metadata. Finished objects are appended to an
//! emitter in post-order; downstream indexing re-sorts by identifier.
//!
//! # Architecture
//!
//! - **event.rs** - markup event types, the external event-source interface
//! - **vector.rs** - hierarchy levels, counter vector, object identifiers
//! - **config.rs** - element-to-level table, metadata paths, validation
//! - **meta.rs** - context-pattern matching for metadata harvesting
//! - **token.rs** - Unicode word / sentence-boundary tokenizer
//! - **emit.rs** - output records and sinks
//! - **builder.rs** - the recursive object builder

pub mod builder;
pub mod config;
pub mod emit;
pub mod event;
pub mod meta;
pub mod token;
pub mod vector;

pub use builder::{BuildSummary, LoadError, ObjectBuilder};
pub use config::{ConfigError, ElementClass, LoaderConfig};
pub use emit::{Emitter, ObjectRecord, Record, VecEmitter, WriteEmitter};
pub use event::{AttrMap, MarkupEvent};
pub use meta::{MetaPath, MetaPaths};
pub use token::{tokens, Token, TokenKind};
pub use vector::{Level, ObjectId, OhcoVector, LEVEL_COUNT};
