/// Cached leaf evaluation, keyed by the primary board's Zobrist hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TTEntry {
    pub key: u64,
    pub score: i32,
}

pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    mask: usize,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TTEntry>>();
        let num_entries = (size_mb * 1024 * 1024) / entry_size;

        // Power of 2 size for efficient masking
        let mut size = 1;
        while size <= num_entries {
            size *= 2;
        }
        size /= 2; // Keep it within memory limit

        if size == 0 {
            size = 1024; // Minimum size
        }

        Self {
            entries: vec![None; size],
            mask: size - 1,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    pub fn probe(&self, key: u64) -> Option<i32> {
        self.entries
            .get(self.index(key))
            .copied()
            .flatten()
            .filter(|e| e.key == key)
            .map(|e| e.score)
    }

    /// Always replace.
    pub fn store(&mut self, key: u64, score: i32) {
        let idx = self.index(key);
        if let Some(slot) = self.entries.get_mut(idx) {
            *slot = Some(TTEntry { key, score });
        }
    }

    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_then_hit() {
        let mut tt = TranspositionTable::new(1);
        assert_eq!(tt.probe(0), None);
        tt.store(0, -12);
        assert_eq!(tt.probe(0), Some(-12));
        tt.store(12345, 40);
        assert_eq!(tt.probe(12345), Some(40));
        tt.clear();
        assert_eq!(tt.probe(12345), None);
    }

    #[test]
    fn test_colliding_key_misses() {
        let mut tt = TranspositionTable::new(1);
        let stride = tt.capacity() as u64;
        tt.store(7, 1);
        assert_eq!(tt.probe(7 + stride), None);
        tt.store(7 + stride, 2);
        assert_eq!(tt.probe(7), None);
        assert_eq!(tt.probe(7 + stride), Some(2));
    }

    #[test]
    fn test_capacity_is_power_of_two() {
        assert!(TranspositionTable::new(1).capacity().is_power_of_two());
        assert_eq!(TranspositionTable::new(0).capacity(), 1024);
    }
}
