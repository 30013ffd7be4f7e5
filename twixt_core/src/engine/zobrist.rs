use crate::logic::board::{BridgeDir, Player, GRID_SIDE, MARGIN};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashSet;

const NUM_CELLS: usize = (GRID_SIDE * GRID_SIDE) as usize;
const NUM_PLAYERS: usize = 2;
const NUM_DIRS: usize = 4;

const ZOBRIST_SEED: u64 = 123_456_789;

/// Random keys for every (cell, pin owner) and every (cell, bridge direction).
///
/// Keys are drawn from a fixed seed so hashes are reproducible between runs,
/// and no two keys are equal.
#[derive(Debug, Clone)]
pub struct ZobristKeys {
    pin_keys: Vec<u64>,
    link_keys: Vec<u64>,
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl ZobristKeys {
    pub fn new() -> Self {
        Self::with_seed(ZOBRIST_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut seen = HashSet::with_capacity(NUM_CELLS * (NUM_PLAYERS + NUM_DIRS));
        let mut next_key = || loop {
            let key = rng.next_u64();
            // zero would make a pin invisible to the hash
            if key != 0 && seen.insert(key) {
                return key;
            }
        };

        let pin_keys = (0..NUM_CELLS * NUM_PLAYERS).map(|_| next_key()).collect();
        let link_keys = (0..NUM_CELLS * NUM_DIRS).map(|_| next_key()).collect();

        Self {
            pin_keys,
            link_keys,
        }
    }

    fn cell(x: i32, y: i32) -> usize {
        let (gx, gy) = (x + MARGIN, y + MARGIN);
        assert!(
            (0..GRID_SIDE).contains(&gx) && (0..GRID_SIDE).contains(&gy),
            "cell ({x}, {y}) is outside the board grid"
        );
        #[allow(clippy::cast_sign_loss)]
        let idx = (gx * GRID_SIDE + gy) as usize;
        idx
    }

    /// Key for a pin of `player` at logical `(x, y)`.
    pub fn pin_key(&self, x: i32, y: i32, player: Player) -> u64 {
        self.pin_keys[Self::cell(x, y) * NUM_PLAYERS + player.index()]
    }

    /// Key for a bridge anchored at logical `(x, y)` in direction `dir`.
    pub fn link_key(&self, x: i32, y: i32, dir: BridgeDir) -> u64 {
        self.link_keys[Self::cell(x, y) * NUM_DIRS + dir.index()]
    }
}
