//! Fixed-width character-level encoding and decoding.
//!
//! Strings become `(batch, max_cmd_len, alphabet)` one-hot tensors and come
//! back out through per-position argmax. Two policies are load-bearing:
//!
//! - Encoding a character outside the inventory leaves its slot all-zero
//!   instead of failing. This is how the padding sentinel — which need not
//!   belong to the inventory — is represented, so it must never become an
//!   error.
//! - Decoding trims on class index 0: a position whose argmax is 0 counts
//!   as cold. All-zero padding slots argmax to 0, which is what makes
//!   trimming work, at the cost of treating genuine index-0 characters at
//!   the string edge as padding.

use crate::inventory::CharInventory;

/// A `(batch, width, alphabet)` one-hot tensor as a flat f32 buffer.
///
/// At most one hot slot per `(sample, position)`; a slot is all-zero when
/// the character was outside the inventory or the position was beyond the
/// string. The buffer is row-major, so `as_slice` + `dims` is everything a
/// tensor library needs to adopt it.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBatch {
    batch: usize,
    width: usize,
    alphabet: usize,
    data: Vec<f32>,
}

impl EncodedBatch {
    fn zeros(batch: usize, width: usize, alphabet: usize) -> Self {
        Self {
            batch,
            width,
            alphabet,
            data: vec![0.0; batch * width * alphabet],
        }
    }

    /// `(batch, width, alphabet)`.
    #[must_use]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.batch, self.width, self.alphabet)
    }

    /// The whole buffer in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// One sample's `width * alphabet` slots.
    ///
    /// # Panics
    /// Panics if `row` is out of range; rows are always indexed within
    /// `dims().0` by construction.
    #[must_use]
    pub fn row(&self, row: usize) -> &[f32] {
        let stride = self.width * self.alphabet;
        &self.data[row * stride..(row + 1) * stride]
    }

    fn set_hot(&mut self, row: usize, pos: usize, class: usize) {
        let offset = (row * self.width + pos) * self.alphabet + class;
        self.data[offset] = 1.0;
    }
}

/// Encoder/decoder over a fixed character inventory.
///
/// Encode and decode share the inventory's index order; constructing the
/// codec from the same inventory on both sides is what keeps the round
/// trip lossless within padding.
pub struct FixedWidthCodec<'a> {
    inventory: &'a CharInventory,
}

impl<'a> FixedWidthCodec<'a> {
    /// New codec over `inventory`.
    pub fn new(inventory: &'a CharInventory) -> Self {
        Self { inventory }
    }

    /// Alphabet size of the underlying inventory.
    #[must_use]
    pub fn alphabet(&self) -> usize {
        self.inventory.len()
    }

    /// Encode `commands` into a `(commands.len(), max_len, alphabet)` batch.
    ///
    /// Characters outside the inventory and positions beyond a string's
    /// length leave all-zero slots; characters past `max_len` are dropped.
    pub fn encode<S: AsRef<str>>(&self, commands: &[S], max_len: usize) -> EncodedBatch {
        let mut batch = EncodedBatch::zeros(commands.len(), max_len, self.inventory.len());
        for (row, command) in commands.iter().enumerate() {
            for (pos, c) in command.as_ref().chars().take(max_len).enumerate() {
                if let Some(class) = self.inventory.index_of(c) {
                    batch.set_hot(row, pos, class);
                }
            }
        }
        batch
    }

    /// Decode one encoded row back into a command string.
    ///
    /// Each position's slot collapses to its highest-scoring class (first
    /// index wins ties), which recovers the hot index exactly for one-hot
    /// ground truth and picks the most probable character for model output.
    ///
    /// With `inverted` set the row is expected to carry its padding at the
    /// front (the string was reversed before encoding): characters are
    /// emitted from the lowest warm position to the end. Otherwise padding
    /// sits at the back and characters run from the start through the
    /// highest warm position.
    ///
    /// A row with no warm position decodes to the empty string.
    #[must_use]
    pub fn decode_one_hot(&self, row: &[f32], inverted: bool) -> String {
        let alphabet = self.inventory.len();
        if alphabet == 0 {
            return String::new();
        }
        let classes: Vec<usize> = row.chunks_exact(alphabet).map(argmax).collect();

        if inverted {
            let Some(begin) = classes.iter().position(|&c| c != 0) else {
                return String::new();
            };
            self.render(&classes[begin..])
        } else {
            let Some(end) = classes.iter().rposition(|&c| c != 0) else {
                return String::new();
            };
            self.render(&classes[..=end])
        }
    }

    /// Render an already-discrete class sequence (a model's per-position
    /// predictions) as a command string.
    ///
    /// Characters run from the start through the highest non-zero class;
    /// an all-zero sequence renders as the empty string. Classes outside
    /// the alphabet are skipped.
    #[must_use]
    pub fn decode_indices(&self, classes: &[u32]) -> String {
        let Some(end) = classes.iter().rposition(|&c| c != 0) else {
            return String::new();
        };
        let classes: Vec<usize> = classes[..=end].iter().map(|&c| c as usize).collect();
        self.render(&classes)
    }

    fn render(&self, classes: &[usize]) -> String {
        classes
            .iter()
            .filter_map(|&class| self.inventory.char_at(class))
            .collect()
    }
}

fn argmax(slot: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in slot.iter().enumerate() {
        if v > slot[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> CharInventory {
        // Sorted: [' ', '-', 'a'..'z'] — 28 characters, ' ' is class 0.
        CharInventory::from_chars("abcdefghijklmnopqrstuvwxyz -".chars())
    }

    #[test]
    fn test_encode_shape_and_hot_count() {
        let inv = inventory();
        let codec = FixedWidthCodec::new(&inv);
        let batch = codec.encode(&["ls -l"], 10);
        assert_eq!(batch.dims(), (1, 10, 28));
        let hot: f32 = batch.as_slice().iter().sum();
        assert_eq!(hot, 5.0);
    }

    #[test]
    fn test_round_trip_strips_trailing_padding() {
        let inv = inventory();
        let codec = FixedWidthCodec::new(&inv);
        // '$' is the padding sentinel and is not in the inventory.
        let batch = codec.encode(&["ls -l$$$$$"], 10);
        assert_eq!(codec.decode_one_hot(batch.row(0), false), "ls -l");
    }

    #[test]
    fn test_unknown_characters_leave_zero_slots() {
        let inv = inventory();
        let codec = FixedWidthCodec::new(&inv);
        let batch = codec.encode(&["a$b"], 3);
        let row = batch.row(0);
        // Middle slot all-zero.
        assert!(row[28..56].iter().all(|&v| v == 0.0));
        // Decode keeps interior cold slots: class 0 maps to ' '.
        assert_eq!(codec.decode_one_hot(row, false), "a b");
    }

    #[test]
    fn test_inverted_decode_skips_leading_padding() {
        let inv = inventory();
        let codec = FixedWidthCodec::new(&inv);
        let reversed: String = "ls -l".chars().rev().collect();
        let padded = format!("$$$$${reversed}");
        let batch = codec.encode(&[padded], 10);
        let decoded = codec.decode_one_hot(batch.row(0), true);
        assert_eq!(decoded.chars().rev().collect::<String>(), "ls -l");
    }

    #[test]
    fn test_all_zero_row_decodes_to_empty_string() {
        let inv = inventory();
        let codec = FixedWidthCodec::new(&inv);
        let batch = codec.encode(&["$$$$"], 4);
        assert_eq!(codec.decode_one_hot(batch.row(0), false), "");
        assert_eq!(codec.decode_one_hot(batch.row(0), true), "");
    }

    #[test]
    fn test_decode_indices_trims_trailing_zero_classes() {
        let inv = inventory();
        let codec = FixedWidthCodec::new(&inv);
        // 'l' = class 13, 's' = class 20 (2 + letter offset in
        // [' ', '-', 'a'..]): 'a' is 2, so 'l' is 13 and 's' is 20.
        assert_eq!(codec.decode_indices(&[13, 20, 0, 0]), "ls");
        assert_eq!(codec.decode_indices(&[0, 0, 0]), "");
        assert_eq!(codec.decode_indices(&[]), "");
    }

    #[test]
    fn test_decode_indices_keeps_interior_zero_classes() {
        let inv = inventory();
        let codec = FixedWidthCodec::new(&inv);
        // Interior class 0 renders as ' '.
        assert_eq!(codec.decode_indices(&[13, 0, 20]), "l s");
    }

    #[test]
    fn test_encode_drops_overflow_characters() {
        let inv = inventory();
        let codec = FixedWidthCodec::new(&inv);
        let batch = codec.encode(&["abcdef"], 4);
        assert_eq!(batch.dims(), (1, 4, 28));
        assert_eq!(codec.decode_one_hot(batch.row(0), false), "abcd");
    }

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
        assert_eq!(argmax(&[0.0, 0.0]), 0);
        assert_eq!(argmax(&[0.1, 0.9, 0.2]), 1);
    }

    #[test]
    fn test_in_inventory_padding_encodes_hot() {
        // A sentinel inside the inventory is a real character to the
        // codec: its slots are hot and decode keeps it. Padding only
        // disappears when the sentinel stays outside the alphabet.
        let inv = CharInventory::from_chars("abcdefghijklmnopqrstuvwxyz$".chars());
        let codec = FixedWidthCodec::new(&inv);
        let batch = codec.encode(&["ls$$"], 4);
        let hot: f32 = batch.as_slice().iter().sum();
        assert_eq!(hot, 4.0);
        // '$' sorts first, so it is class 0 and decode trims it anyway —
        // the trimming rule keys on class index 0, not on identity.
        assert_eq!(codec.decode_one_hot(batch.row(0), false), "ls");
    }
}
