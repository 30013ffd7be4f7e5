use crate::engine::config::EngineConfig;
use crate::engine::eval::{CriticalPosition, PositionEvaluator};
use crate::engine::zobrist::ZobristKeys;
use crate::engine::Move;
use crate::logic::board::{BoardState, Player, DEFAULTDIM, MAXDIM, MINDIM};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("cell is outside the player's band")]
    OutOfBand,
    #[error("cell is already occupied")]
    Occupied,
    #[error("the game is already over")]
    GameOver,
    #[error("no move to undo")]
    NothingToUndo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("board size {xsize}x{ysize} is outside {}..={}", MINDIM, MAXDIM)]
    InvalidSize { xsize: i32, ysize: i32 },
    #[error("recorded move {index} is illegal: {source}")]
    Replay { index: usize, source: MoveError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Playing,
    Won(Player),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub mv: Move,
    pub player: Player,
}

/// Everything needed to rebuild a match, e.g. on a worker thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub xsize: i32,
    pub ysize: i32,
    pub moves: Vec<MoveRecord>,
}

/// One board orientation plus its evaluator, kept in step on every mutation.
#[derive(Debug, Clone)]
pub struct PlayerBoard {
    owner: Player,
    board: BoardState,
    eval: PositionEvaluator,
}

impl PlayerBoard {
    fn new(owner: Player, xsize: i32, ysize: i32, third_column_recheck: bool) -> Self {
        let board = match owner {
            Player::Y => BoardState::new(xsize, ysize),
            Player::X => BoardState::new(ysize, xsize),
        };
        let mut eval = PositionEvaluator::new(third_column_recheck);
        eval.setup(&board);
        Self { owner, board, eval }
    }

    pub const fn owner(&self) -> Player {
        self.owner
    }

    pub const fn board(&self) -> &BoardState {
        &self.board
    }

    pub const fn evaluator(&self) -> &PositionEvaluator {
        &self.eval
    }

    /// Place `player`'s pin at physical `mv`.
    pub fn set_pin(&mut self, mv: Move, player: Player) -> bool {
        let (x, y) = mv.on_board(self.owner);
        if !self.board.set_pin(x, y, player.local_to(self.owner)) {
            return false;
        }
        self.eval.add_pin(&self.board, x, y);
        true
    }

    pub fn remove_pin(&mut self, mv: Move, player: Player) -> bool {
        let (x, y) = mv.on_board(self.owner);
        let local = player.local_to(self.owner);
        if !self.board.remove_pin(x, y, local) {
            return false;
        }
        self.eval.remove_pin(&self.board, x, y, local);
        true
    }

    /// Distance of the owner to its goal edge with `next` to move.
    pub fn distance(&mut self, compute_critical: bool, next: Player) -> i32 {
        let local = next.local_to(self.owner);
        self.eval.evaluate(&self.board, local);
        self.eval.value_of(&self.board, compute_critical, local)
    }

    /// Critical positions of the last `distance(true, ..)`, in local coordinates.
    pub const fn critical(&self) -> &BTreeSet<CriticalPosition> {
        self.eval.critical()
    }

    fn reset(&mut self) {
        self.board.clear();
        self.eval.setup(&self.board);
    }
}

/// A running match: both player boards, the display mirror and the move history.
#[derive(Debug, Clone)]
pub struct Match {
    xsize: i32,
    ysize: i32,
    y_board: PlayerBoard,
    x_board: PlayerBoard,
    display: BoardState,
    history: Vec<MoveRecord>,
    turn: Player,
    status: MatchStatus,
}

impl Default for Match {
    fn default() -> Self {
        Self::with_keys(DEFAULTDIM, DEFAULTDIM, Arc::new(ZobristKeys::new()))
    }
}

impl Match {
    pub fn new(xsize: i32, ysize: i32) -> Result<Self, MatchError> {
        if !(MINDIM..=MAXDIM).contains(&xsize) || !(MINDIM..=MAXDIM).contains(&ysize) {
            return Err(MatchError::InvalidSize { xsize, ysize });
        }
        Ok(Self::with_keys(xsize, ysize, Arc::new(ZobristKeys::new())))
    }

    fn with_keys(xsize: i32, ysize: i32, keys: Arc<ZobristKeys>) -> Self {
        let mut y_board = PlayerBoard::new(Player::Y, xsize, ysize, true);
        y_board.board.enable_zobrist(keys);
        Self {
            xsize,
            ysize,
            y_board,
            x_board: PlayerBoard::new(Player::X, xsize, ysize, true),
            display: BoardState::new(xsize, ysize),
            history: Vec::new(),
            turn: Player::Y,
            status: MatchStatus::Playing,
        }
    }

    /// Rebuild a match by replaying a record.
    pub fn from_record(record: &MatchRecord) -> Result<Self, MatchError> {
        let mut game = Self::new(record.xsize, record.ysize)?;
        for (index, rec) in record.moves.iter().enumerate() {
            game.make_move(rec.mv, rec.player)
                .map_err(|source| MatchError::Replay { index, source })?;
        }
        Ok(game)
    }

    pub fn record(&self) -> MatchRecord {
        MatchRecord {
            xsize: self.xsize,
            ysize: self.ysize,
            moves: self.history.clone(),
        }
    }

    /// Apply evaluator settings; rebuilds evaluation state when they change.
    pub fn configure(&mut self, config: &EngineConfig) {
        for pb in [&mut self.y_board, &mut self.x_board] {
            if pb.eval.third_column_recheck() != config.third_column_recheck {
                pb.eval.set_third_column_recheck(config.third_column_recheck);
                pb.eval.setup(&pb.board);
            }
        }
    }

    pub const fn xsize(&self) -> i32 {
        self.xsize
    }

    pub const fn ysize(&self) -> i32 {
        self.ysize
    }

    pub const fn turn(&self) -> Player {
        self.turn
    }

    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    pub fn last_move(&self) -> Option<MoveRecord> {
        self.history.last().copied()
    }

    pub const fn board(&self, owner: Player) -> &PlayerBoard {
        match owner {
            Player::Y => &self.y_board,
            Player::X => &self.x_board,
        }
    }

    pub(crate) fn board_mut(&mut self, owner: Player) -> &mut PlayerBoard {
        match owner {
            Player::Y => &mut self.y_board,
            Player::X => &mut self.x_board,
        }
    }

    /// Hash of the primary board.
    pub const fn zobrist_value(&self) -> u64 {
        self.y_board.board.zobrist_value()
    }

    /// Physical legality check for `player` at `mv`.
    pub fn check_move(&self, mv: Move, player: Player) -> Result<(), MoveError> {
        if self.status != MatchStatus::Playing {
            return Err(MoveError::GameOver);
        }
        let board = &self.y_board.board;
        if board.pin_allowed(mv.x, mv.y, player) {
            Ok(())
        } else if board.get_pin(mv.x, mv.y).is_some() {
            Err(MoveError::Occupied)
        } else {
            Err(MoveError::OutOfBand)
        }
    }

    pub fn make_move(&mut self, mv: Move, player: Player) -> Result<(), MoveError> {
        self.check_move(mv, player)?;
        if !self.place(mv, player) {
            return Err(MoveError::OutOfBand);
        }
        if self.board_mut(player).distance(false, player.opposite()) == 0 {
            self.status = MatchStatus::Won(player);
        }
        Ok(())
    }

    pub fn undo_move(&mut self) -> Result<MoveRecord, MoveError> {
        let last = self.history.last().copied().ok_or(MoveError::NothingToUndo)?;
        self.lift(last.mv, last.player);
        self.status = MatchStatus::Playing;
        Ok(last)
    }

    /// Search-side make: Y board first, then the mirrored X board.
    ///
    /// Returns `false` (nothing changed) when the pin is not allowed.
    pub(crate) fn place(&mut self, mv: Move, player: Player) -> bool {
        if !self.y_board.set_pin(mv, player) {
            return false;
        }
        assert!(
            self.x_board.set_pin(mv, player),
            "mirrored board rejected {mv} for {player:?}"
        );
        self.history.push(MoveRecord { mv, player });
        self.turn = player.opposite();
        true
    }

    /// Exact inverse of [`place`](Self::place).
    pub(crate) fn lift(&mut self, mv: Move, player: Player) {
        assert!(
            self.x_board.remove_pin(mv, player) && self.y_board.remove_pin(mv, player),
            "cannot take back {mv} for {player:?}"
        );
        if self.history.last().is_some_and(|r| r.mv == mv) {
            self.history.pop();
        }
        self.turn = player;
    }

    /// Distance of `player` to its goal edge, as shown to the user.
    pub fn value_for(&mut self, player: Player) -> i32 {
        let next = self.turn;
        self.board_mut(player).distance(false, next)
    }

    pub fn clear(&mut self) {
        self.y_board.reset();
        self.x_board.reset();
        self.display.clear();
        self.history.clear();
        self.turn = Player::Y;
        self.status = MatchStatus::Playing;
    }

    /// Refresh the read-only mirror from the primary board.
    pub fn sync_display(&mut self) {
        self.display.copy_from(&self.y_board.board);
    }

    pub const fn display(&self) -> &BoardState {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn y_chain() -> Vec<Move> {
        let mut moves: Vec<Move> = (0..12).map(|k| Move::new(5 + k % 2, 2 * k)).collect();
        moves.push(Move::new(8, 23));
        moves
    }

    #[test]
    fn test_size_validation() {
        assert!(Match::new(24, 24).is_ok());
        assert!(Match::new(12, 36).is_ok());
        assert_eq!(
            Match::new(11, 24).unwrap_err(),
            MatchError::InvalidSize { xsize: 11, ysize: 24 }
        );
        assert!(Match::new(24, 37).is_err());
    }

    #[test]
    fn test_boards_are_mirrored() {
        let mut game = Match::new(24, 24).unwrap();
        game.make_move(Move::new(3, 7), Player::X).unwrap();
        assert_eq!(game.board(Player::Y).board().get_pin(3, 7), Some(Player::X));
        assert_eq!(game.board(Player::X).board().get_pin(7, 3), Some(Player::Y));
        assert_eq!(game.turn(), Player::Y);
    }

    #[test]
    fn test_illegal_moves_rejected() {
        let mut game = Match::new(24, 24).unwrap();
        assert_eq!(game.make_move(Move::new(0, 5), Player::Y), Err(MoveError::OutOfBand));
        assert_eq!(game.make_move(Move::new(5, 0), Player::X), Err(MoveError::OutOfBand));
        game.make_move(Move::new(5, 5), Player::Y).unwrap();
        assert_eq!(game.make_move(Move::new(5, 5), Player::X), Err(MoveError::Occupied));
        assert_eq!(game.move_count(), 1);
    }

    #[test]
    fn test_make_undo_restores_hash() {
        let mut game = Match::new(24, 24).unwrap();
        game.make_move(Move::new(10, 10), Player::Y).unwrap();
        let hash = game.zobrist_value();

        game.make_move(Move::new(12, 11), Player::X).unwrap();
        game.make_move(Move::new(11, 12), Player::Y).unwrap();
        assert_ne!(game.zobrist_value(), hash);

        assert_eq!(game.undo_move().unwrap().mv, Move::new(11, 12));
        game.undo_move().unwrap();
        assert_eq!(game.zobrist_value(), hash);
        assert_eq!(game.move_count(), 1);
        assert_eq!(game.turn(), Player::X);
    }

    #[test]
    fn test_undo_on_empty_match() {
        let mut game = Match::new(24, 24).unwrap();
        assert_eq!(game.undo_move(), Err(MoveError::NothingToUndo));
    }

    #[test]
    fn test_winner_detected() {
        let mut game = Match::new(24, 24).unwrap();
        let chain = y_chain();
        let (last, rest) = chain.split_last().unwrap();
        for mv in rest {
            game.make_move(*mv, Player::Y).unwrap();
        }
        assert_eq!(game.status(), MatchStatus::Playing);
        game.make_move(*last, Player::Y).unwrap();
        assert_eq!(game.status(), MatchStatus::Won(Player::Y));
        assert_eq!(game.value_for(Player::Y), 0);
        assert_eq!(
            game.make_move(Move::new(12, 12), Player::X),
            Err(MoveError::GameOver)
        );

        game.undo_move().unwrap();
        assert_eq!(game.status(), MatchStatus::Playing);
    }

    #[test]
    fn test_x_winner_on_transposed_board() {
        let mut game = Match::new(24, 24).unwrap();
        for mv in y_chain() {
            game.make_move(Move::new(mv.y, mv.x), Player::X).unwrap();
        }
        assert_eq!(game.status(), MatchStatus::Won(Player::X));
    }

    #[test]
    fn test_record_replays() {
        let mut game = Match::new(20, 24).unwrap();
        game.make_move(Move::new(5, 5), Player::Y).unwrap();
        game.make_move(Move::new(8, 6), Player::X).unwrap();
        let record = game.record();

        let json = serde_json::to_string(&record).unwrap();
        let back: MatchRecord = serde_json::from_str(&json).unwrap();
        let replayed = Match::from_record(&back).unwrap();
        assert_eq!(replayed.zobrist_value(), game.zobrist_value());
        assert_eq!(replayed.xsize(), 20);
        assert_eq!(replayed.history(), game.history());

        let mut bad = record;
        bad.moves.push(MoveRecord {
            mv: Move::new(5, 5),
            player: Player::X,
        });
        assert!(matches!(
            Match::from_record(&bad),
            Err(MatchError::Replay { index: 2, source: MoveError::Occupied })
        ));
    }

    #[test]
    fn test_display_mirror_and_clear() {
        let mut game = Match::new(24, 24).unwrap();
        game.make_move(Move::new(5, 0), Player::Y).unwrap();
        game.make_move(Move::new(6, 2), Player::Y).unwrap();
        assert!(game.display().is_empty(5, 0));
        game.sync_display();
        assert!(game.display().is_connected(5, 0, 6, 2));

        game.clear();
        assert_eq!(game.move_count(), 0);
        assert_eq!(game.zobrist_value(), 0);
        assert!(game.board(Player::X).board().is_empty(0, 5));
    }

    #[test]
    fn test_configure_rebuilds_evaluator() {
        let mut game = Match::new(24, 24).unwrap();
        game.make_move(Move::new(10, 12), Player::Y).unwrap();
        let config = EngineConfig {
            third_column_recheck: false,
            ..EngineConfig::default()
        };
        game.configure(&config);
        assert!(!game.board(Player::Y).evaluator().third_column_recheck());
        assert_eq!(game.value_for(Player::Y), 230);
    }
}
