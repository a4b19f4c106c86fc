//! Field sets and the dirty tracker.

/// A set of field identifiers backed by a bitset.
///
/// Reducers receive one per transition and record every field they alter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    words: Vec<u64>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field_id: u16) {
        let (word, bit) = split(field_id);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    pub fn contains(&self, field_id: u16) -> bool {
        let (word, bit) = split(field_id);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn union_with(&mut self, other: &FieldSet) {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            *mine |= theirs;
        }
    }

    /// Field ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.words.iter().enumerate().flat_map(|(i, word)| {
            (0..64u32)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| (i * 64 + bit as usize) as u16)
        })
    }

    /// Bits for ids 0-63.
    pub fn low_mask(&self) -> u64 {
        self.words.first().copied().unwrap_or(0)
    }

    fn retain_below(&mut self, limit: usize) {
        let full_words = limit / 64;
        let rem = limit % 64;
        if rem == 0 {
            self.words.truncate(full_words);
        } else if self.words.len() > full_words {
            self.words.truncate(full_words + 1);
            self.words[full_words] &= (1u64 << rem) - 1;
        }
    }
}

impl FromIterator<u16> for FieldSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

fn split(field_id: u16) -> (usize, u32) {
    (field_id as usize / 64, field_id as u32 % 64)
}

/// Summary of the fields changed by the latest observed transition(s).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffSummary {
    /// Bit `n` set when field `n` (0-63) changed.
    pub changed_mask: u64,
    /// Number of changed fields, saturating at 255.
    pub change_count: u8,
    /// State version the summary describes.
    pub version: u64,
}

/// Per-field "changed since the last observed call" bitmap.
///
/// Only the dispatcher writes to it, and only when a transition commits.
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    bits: FieldSet,
    max_fields: usize,
    version: u64,
}

impl DirtyTracker {
    pub fn new(max_fields: usize) -> Self {
        Self {
            bits: FieldSet::new(),
            max_fields,
            version: 0,
        }
    }

    /// Replace the bitmap with `touched` (no accumulation).
    pub(crate) fn overwrite(&mut self, touched: &FieldSet, version: u64) {
        self.bits = touched.clone();
        self.bits.retain_below(self.max_fields);
        self.version = version;
    }

    /// Clear the bitmap; nothing has changed as of `version`.
    pub(crate) fn reset(&mut self, version: u64) {
        self.bits.clear();
        self.version = version;
    }

    /// OR `touched` into the bitmap.
    pub(crate) fn merge(&mut self, touched: &FieldSet, version: u64) {
        self.bits.union_with(touched);
        self.bits.retain_below(self.max_fields);
        self.version = version;
    }

    /// `false` for ids outside the tracked range.
    pub fn field_changed(&self, field_id: u16) -> bool {
        (field_id as usize) < self.max_fields && self.bits.contains(field_id)
    }

    pub fn changed(&self) -> &FieldSet {
        &self.bits
    }

    pub fn diff(&self) -> DiffSummary {
        DiffSummary {
            changed_mask: self.bits.low_mask(),
            change_count: self.bits.len().min(u8::MAX as usize) as u8,
            version: self.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_set_tracks_membership() {
        let mut set = FieldSet::new();
        assert!(set.is_empty());
        set.insert(3);
        set.insert(200);
        assert!(set.contains(3));
        assert!(set.contains(200));
        assert!(!set.contains(4));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 200]);
    }

    #[test]
    fn field_set_handles_the_full_id_range() {
        let set: FieldSet = [0u16, 63, 64, u16::MAX].into_iter().collect();
        assert_eq!(set.len(), 4);
        assert!(set.contains(u16::MAX));
        assert_eq!(set.low_mask(), 1 | (1 << 63));
    }

    #[test]
    fn overwrite_replaces_previous_bits() {
        let mut tracker = DirtyTracker::new(64);
        tracker.overwrite(&[0u16, 1].into_iter().collect(), 1);
        tracker.overwrite(&[2u16].into_iter().collect(), 2);
        assert!(!tracker.field_changed(0));
        assert!(!tracker.field_changed(1));
        assert!(tracker.field_changed(2));
        assert_eq!(tracker.diff().version, 2);
    }

    #[test]
    fn reset_clears_and_keeps_version() {
        let mut tracker = DirtyTracker::new(64);
        tracker.overwrite(&[3u16].into_iter().collect(), 4);
        tracker.reset(4);
        assert!(!tracker.field_changed(3));
        assert_eq!(tracker.diff(), DiffSummary { changed_mask: 0, change_count: 0, version: 4 });
    }

    #[test]
    fn merge_accumulates() {
        let mut tracker = DirtyTracker::new(64);
        tracker.overwrite(&[0u16].into_iter().collect(), 1);
        tracker.merge(&[5u16].into_iter().collect(), 2);
        assert!(tracker.field_changed(0));
        assert!(tracker.field_changed(5));
        assert_eq!(tracker.diff().change_count, 2);
    }

    #[test]
    fn out_of_range_ids_are_dropped() {
        let mut tracker = DirtyTracker::new(10);
        tracker.overwrite(&[9u16, 10, 500].into_iter().collect(), 1);
        assert!(tracker.field_changed(9));
        assert!(!tracker.field_changed(10));
        assert!(!tracker.field_changed(500));
        assert_eq!(tracker.changed().len(), 1);
    }

    #[test]
    fn diff_masks_low_fields() {
        let mut tracker = DirtyTracker::new(128);
        tracker.overwrite(&[0u16, 4, 100].into_iter().collect(), 7);
        let diff = tracker.diff();
        assert_eq!(diff.changed_mask, 0b1_0001);
        assert_eq!(diff.change_count, 3);
        assert_eq!(diff.version, 7);
    }
}
