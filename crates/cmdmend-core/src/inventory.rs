//! Character inventory derived from the vocabulary.
//!
//! The inventory is the universal alphabet of the pipeline: every character
//! observed anywhere in the vocabulary file, sorted and deduplicated. The
//! sort order is what assigns each character its fixed index, and that order
//! must be identical between encode and decode or the codec corrupts data
//! silently — which is why the inventory is built once and immutable after.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::PipelineResult;

/// Ordered, deduplicated set of characters with fixed indices.
///
/// Safe to share read-only across any number of concurrent encode/decode
/// calls once constructed.
#[derive(Debug, Clone)]
pub struct CharInventory {
    chars: Vec<char>,
    index: HashMap<char, usize>,
}

impl CharInventory {
    /// Build the inventory from every line of the vocabulary file.
    ///
    /// Trailing whitespace is stripped per line before characters are
    /// collected. An unreadable file is fatal and propagates.
    pub fn from_vocab_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut seen = BTreeSet::new();
        for line in reader.lines() {
            let line = line?;
            seen.extend(line.trim_end().chars());
        }
        let inventory = Self::from_sorted(seen);
        debug!(
            path = %path.as_ref().display(),
            alphabet = inventory.len(),
            "built character inventory"
        );
        Ok(inventory)
    }

    /// Build the inventory from an arbitrary character source.
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        Self::from_sorted(chars.into_iter().collect::<BTreeSet<_>>())
    }

    fn from_sorted(seen: BTreeSet<char>) -> Self {
        let chars: Vec<char> = seen.into_iter().collect();
        let index = chars.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        Self { chars, index }
    }

    /// Fixed index of a character, or `None` if it is outside the alphabet.
    #[must_use]
    pub fn index_of(&self, c: char) -> Option<usize> {
        self.index.get(&c).copied()
    }

    /// Character at a fixed index, or `None` if out of range.
    #[must_use]
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Alphabet size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the alphabet is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The characters in index order.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}
