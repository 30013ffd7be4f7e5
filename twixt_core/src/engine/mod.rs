use crate::logic::board::Player;
use crate::logic::game::Match;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod eval;
pub mod move_list;
pub mod movegen;
pub mod patterns;
pub mod races;
pub mod search;
pub mod tt;
pub mod zobrist;

#[cfg(test)]
mod search_test;

/// A pin placement in physical board coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Move {
    pub x: i32,
    pub y: i32,
}

impl Move {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinates on the board owned by `owner` (the X board is stored transposed).
    pub const fn on_board(self, owner: Player) -> (i32, i32) {
        match owner {
            Player::Y => (self.x, self.y),
            Player::X => (self.y, self.x),
        }
    }

    /// Inverse of [`on_board`](Self::on_board).
    pub const fn from_board(x: i32, y: i32, owner: Player) -> Self {
        match owner {
            Player::Y => Self::new(x, y),
            Player::X => Self::new(y, x),
        }
    }
}

impl fmt::Display for Move {
    // Column letters (A, B, .., Z, AA, ..) and 1-based rows.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut col = self.x;
        while col >= 0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            letters.push(char::from(b'A' + (col % 26) as u8));
            col = col / 26 - 1;
        }
        let column: String = letters.iter().rev().collect();
        write!(f, "{column}{}", self.y + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchLimit {
    Depth(u8),
    Time(u64), // milliseconds
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub depth: u8,
    pub nodes: u32,
    pub time_ms: u64,
    pub value: i32,
}

pub trait Searcher {
    /// Best move for `player` in `game`, or `None` when nothing can be played.
    ///
    /// The match is mutated during the search and restored before returning.
    fn compute_move(
        &mut self,
        game: &mut Match,
        player: Player,
        limit: SearchLimit,
    ) -> Option<(Move, SearchStats)>;
}

/// Wall clock in milliseconds.
pub fn now() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::JsCast;
        if let Some(window) = web_sys::window() {
            return window.performance().map_or(0.0, |p| p.now());
        }
        let global = js_sys::global();
        if let Ok(worker) = global.dyn_into::<web_sys::WorkerGlobalScope>() {
            return worker.performance().map_or(0.0, |p| p.now());
        }
        0.0
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        let since_the_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        #[allow(clippy::cast_precision_loss)]
        let time_ms = (since_the_epoch.as_secs() as f64).mul_add(
            1000.0,
            f64::from(since_the_epoch.subsec_nanos()) / 1_000_000.0,
        );
        time_ms
    }
}
