//! Hierarchy levels and the OHCO counter vector.
//!
//! Every object the loader emits is identified by a snapshot of a fixed
//! seven-counter vector, one counter per hierarchy level. Opening an object
//! bumps its level's counter and zeroes every deeper one; the snapshot taken
//! at that moment is the object's permanent identifier and doubles as the
//! document-order sort key for consumers of the post-order output stream.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of hierarchy levels.
pub const LEVEL_COUNT: usize = 7;

/// Hierarchy levels, outer to inner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Doc = 0,
    Div1,
    Div2,
    Div3,
    Para,
    Sent,
    Word,
}

impl Level {
    /// All levels, outer to inner.
    pub const ALL: [Level; LEVEL_COUNT] = [
        Level::Doc,
        Level::Div1,
        Level::Div2,
        Level::Div3,
        Level::Para,
        Level::Sent,
        Level::Word,
    ];

    /// Position in the vector, 0 = outermost.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable text label. Part of the output record format.
    pub fn label(self) -> &'static str {
        match self {
            Level::Doc => "doc",
            Level::Div1 => "div1",
            Level::Div2 => "div2",
            Level::Div3 => "div3",
            Level::Para => "para",
            Level::Sent => "sent",
            Level::Word => "word",
        }
    }

    /// Check if this is one of the three division levels.
    #[inline]
    pub fn is_division(self) -> bool {
        matches!(self, Level::Div1 | Level::Div2 | Level::Div3)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Permanent object identifier: the counter snapshot taken at open time.
///
/// Lexicographic order over the components is document order, which is how
/// consumers of the post-order record stream restore reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u32; LEVEL_COUNT]);

impl ObjectId {
    /// The raw components, outer to inner.
    #[inline]
    pub fn components(&self) -> &[u32; LEVEL_COUNT] {
        &self.0
    }

    /// Component for one level.
    #[inline]
    pub fn component(&self, level: Level) -> u32 {
        self.0[level.index()]
    }
}

impl From<[u32; LEVEL_COUNT]> for ObjectId {
    fn from(components: [u32; LEVEL_COUNT]) -> Self {
        ObjectId(components)
    }
}

impl fmt::Display for ObjectId {
    /// Space-joined components, matching the output record format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", component)?;
            first = false;
        }
        Ok(())
    }
}

/// The level counter vector with its running peak.
///
/// The peak records the highest value each counter has ever reached across
/// the whole document; it is refreshed on every open and close so that it
/// component-wise dominates every snapshot ever taken.
#[derive(Debug, Clone)]
pub struct OhcoVector {
    v: [u32; LEVEL_COUNT],
    peak: [u32; LEVEL_COUNT],
}

impl OhcoVector {
    /// Seed the document counter. It is never incremented or reset
    /// afterwards: the caller-supplied document id stays the first
    /// component of every identifier in the document.
    pub fn new(doc_id: u32) -> Self {
        let mut v = [0; LEVEL_COUNT];
        v[Level::Doc.index()] = doc_id;
        OhcoVector { v, peak: v }
    }

    /// Open an object: bump the level's counter and zero every deeper one.
    /// The document level keeps its seed and only zeroes below itself.
    pub fn open(&mut self, level: Level) {
        let i = level.index();
        if level != Level::Doc {
            self.v[i] += 1;
        }
        for counter in &mut self.v[i + 1..] {
            *counter = 0;
        }
        self.touch_peak();
    }

    /// Close an object. No counts change; the peak is refreshed.
    pub fn close(&mut self, _level: Level) {
        self.touch_peak();
    }

    /// Snapshot the current counters as a permanent identifier.
    #[inline]
    pub fn snapshot(&self) -> ObjectId {
        ObjectId(self.v)
    }

    /// The running peak vector.
    #[inline]
    pub fn peak(&self) -> [u32; LEVEL_COUNT] {
        self.peak
    }

    fn touch_peak(&mut self) {
        for (peak, counter) in self.peak.iter_mut().zip(&self.v) {
            *peak = (*peak).max(*counter);
        }
    }
}
