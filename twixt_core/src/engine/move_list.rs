use crate::engine::Move;
use std::ops::Index;

// Candidate sets are small; this is only a sizing hint.
const TYPICAL_MOVES: usize = 32;

/// Ordered, duplicate-free candidate moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveList {
    moves: Vec<Move>,
}

impl MoveList {
    pub fn new() -> Self {
        Self {
            moves: Vec::with_capacity(TYPICAL_MOVES),
        }
    }

    /// Append `mv` unless it is already listed. Returns whether it was added.
    pub fn push(&mut self, mv: Move) -> bool {
        if self.moves.contains(&mv) {
            return false;
        }
        self.moves.push(mv);
        true
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn contains(&self, mv: &Move) -> bool {
        self.moves.contains(mv)
    }

    pub fn first(&self) -> Option<Move> {
        self.moves.first().copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }

    /// Stable sort, so equal keys keep generation order.
    pub fn sort_by_key<K, F>(&mut self, f: F)
    where
        F: FnMut(&Move) -> K,
        K: Ord,
    {
        self.moves.sort_by_key(f);
    }
}

impl FromIterator<Move> for MoveList {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        let mut list = Self::new();
        for mv in iter {
            list.push(mv);
        }
        list
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter()
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, index: usize) -> &Self::Output {
        &self.moves[index]
    }
}
