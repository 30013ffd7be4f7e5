//! Geometric race checks.
//!
//! A pin whose path to an edge looks free can still lose a race against an
//! opponent pin sitting in one of its diagonal corridors. These checks veto
//! such connections before the evaluator accepts them.

use crate::logic::board::{BoardState, Player};

/// Knight steps walked along each corridor.
const RACE_STEPS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Race {
    TopLeftSteep = 1,
    TopLeftGentle = 2,
    TopRightSteep = 3,
    TopRightGentle = 4,
    BottomLeftSteep = 5,
    BottomLeftGentle = 6,
    BottomRightSteep = 7,
    BottomRightGentle = 8,
}

impl Race {
    pub const TOP: [Self; 4] = [
        Self::TopLeftSteep,
        Self::TopLeftGentle,
        Self::TopRightSteep,
        Self::TopRightGentle,
    ];
    pub const BOTTOM: [Self; 4] = [
        Self::BottomLeftSteep,
        Self::BottomLeftGentle,
        Self::BottomRightSteep,
        Self::BottomRightGentle,
    ];

    pub const fn step(self) -> (i32, i32) {
        match self {
            Self::TopLeftSteep => (-1, -2),
            Self::TopLeftGentle => (-2, -1),
            Self::TopRightSteep => (1, -2),
            Self::TopRightGentle => (2, -1),
            Self::BottomLeftSteep => (-1, 2),
            Self::BottomLeftGentle => (-2, 1),
            Self::BottomRightSteep => (1, 2),
            Self::BottomRightGentle => (2, 1),
        }
    }

    const fn towards_top(self) -> bool {
        (self as u8) <= 4
    }

    /// Whether the owner (local `Y`) still wins the race along this corridor from `(x, y)`.
    pub fn holds(self, board: &BoardState, x: i32, y: i32, next: Player) -> bool {
        let (dx, dy) = self.step();
        let border = if self.towards_top() {
            0
        } else {
            board.ysize() - 1
        };

        for k in 1..=RACE_STEPS {
            let (cx, cy) = (x + k * dx, y + k * dy);
            let past_border = if self.towards_top() {
                cy <= border
            } else {
                cy >= border
            };
            if past_border || cx < 1 || cx > board.xsize() - 2 {
                return true;
            }
            match board.get_pin(cx, cy) {
                Some(Player::Y) => return true,
                Some(Player::X) => {
                    // rows we still need to cross against columns they need to close
                    let own_moves = ((cy - border).abs() + 1) / 2;
                    let opp_moves = ((cx - x).abs() + 1) / 2;
                    return own_moves < opp_moves || (own_moves == opp_moves && next == Player::Y);
                }
                None => {}
            }
        }
        true
    }
}

/// Opponent pins left and right of the row between `(x, y)` and the edge.
fn direct_block(board: &BoardState, x: i32, row: i32, next: Player) -> bool {
    let left = board.get_pin(x - 1, row) == Some(Player::X);
    let right = board.get_pin(x + 1, row) == Some(Player::X);
    (left && right) || ((left || right) && next == Player::X)
}

/// A pin at `(x, y)` may be treated as connected to the top edge.
pub fn check_top(board: &BoardState, x: i32, y: i32, next: Player) -> bool {
    !direct_block(board, x, y - 1, next)
        && Race::TOP.iter().all(|race| race.holds(board, x, y, next))
}

/// A pin at `(x, y)` may be treated as connected to the bottom edge.
pub fn check_bottom(board: &BoardState, x: i32, y: i32, next: Player) -> bool {
    !direct_block(board, x, y + 1, next)
        && Race::BOTTOM.iter().all(|race| race.holds(board, x, y, next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_corridors_pass() {
        let board = BoardState::new(24, 24);
        assert!(check_top(&board, 10, 4, Player::X));
        assert!(check_bottom(&board, 10, 19, Player::X));
    }

    #[test]
    fn test_baseline_pin_always_passes() {
        let mut board = BoardState::new(24, 24);
        assert!(board.set_pin(9, 1, Player::X));
        assert!(board.set_pin(11, 1, Player::X));
        assert!(check_top(&board, 10, 0, Player::X));
    }

    #[test]
    fn test_direct_block_depends_on_turn() {
        let mut board = BoardState::new(24, 24);
        assert!(board.set_pin(9, 3, Player::X));
        assert!(check_top(&board, 10, 4, Player::Y));
        assert!(!check_top(&board, 10, 4, Player::X));

        assert!(board.set_pin(11, 3, Player::X));
        assert!(!check_top(&board, 10, 4, Player::Y));
    }

    #[test]
    fn test_close_opponent_wins_race() {
        let mut board = BoardState::new(24, 24);
        // two rows from the edge against one column
        assert!(board.set_pin(8, 4, Player::X));
        assert!(!Race::TopLeftGentle.holds(&board, 10, 5, Player::Y));
        assert!(Race::TopRightGentle.holds(&board, 10, 5, Player::Y));
        assert!(!check_top(&board, 10, 5, Player::Y));
    }

    #[test]
    fn test_tied_race_goes_to_side_to_move() {
        let mut board = BoardState::new(24, 24);
        assert!(board.set_pin(11, 21, Player::X));
        assert!(Race::BottomRightSteep.holds(&board, 10, 19, Player::Y));
        assert!(!Race::BottomRightSteep.holds(&board, 10, 19, Player::X));
    }

    #[test]
    fn test_own_pin_in_corridor_passes() {
        let mut board = BoardState::new(24, 24);
        assert!(board.set_pin(8, 4, Player::Y));
        assert!(board.set_pin(6, 3, Player::X));
        assert!(Race::TopLeftGentle.holds(&board, 10, 5, Player::X));
    }
}
