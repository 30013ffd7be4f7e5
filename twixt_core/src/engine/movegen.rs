use crate::engine::eval::{CritDir, CriticalPosition};
use crate::engine::move_list::MoveList;
use crate::engine::patterns::{PatternKind, PatternLibrary};
use crate::engine::Move;
use crate::logic::board::Player;
use crate::logic::game::Match;
use rand::rngs::StdRng;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// Random draws before scanning the board for a legal cell.
const RANDOM_TRIES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Moves(MoveList),
    /// The player who just moved has connected its edges.
    GameOver,
}

pub struct MoveGenContext<'a> {
    pub killers: &'a HashMap<Move, u32>,
    pub rng: &'a mut StdRng,
    /// Valued root moves of the previous pass, replayed instead of generating.
    pub replay: Option<&'a [(Move, i32)]>,
}

pub struct EngineMoveGen<'a> {
    patterns: &'a PatternLibrary,
}

const fn dir_sign(dir: CritDir) -> i32 {
    match dir {
        CritDir::Down => 1,
        CritDir::Up => -1,
    }
}

impl<'a> EngineMoveGen<'a> {
    pub const fn new(patterns: &'a PatternLibrary) -> Self {
        Self { patterns }
    }

    pub fn generate(
        &self,
        game: &mut Match,
        player: Player,
        ctx: &mut MoveGenContext<'_>,
    ) -> Generated {
        if let Some(replay) = ctx.replay.filter(|r| !r.is_empty()) {
            return Generated::Moves(Self::replay_best_first(replay, player));
        }

        let opp = player.opposite();
        if game.board_mut(opp).distance(true, player) == 0 {
            return Generated::GameOver;
        }
        game.board_mut(player).distance(true, player);

        let mut moves = MoveList::new();
        self.own_moves(game, player, &mut moves);
        self.blocking_moves(game, player, &mut moves);

        if moves.is_empty() {
            if let Some(mv) = Self::random_move(game, player, ctx.rng) {
                log::trace!("no candidates for {player:?}, random {mv}");
                moves.push(mv);
            }
        }

        moves.sort_by_key(|mv| Reverse(ctx.killers.get(mv).copied().unwrap_or(0)));
        Generated::Moves(moves)
    }

    /// Root moves of the previous pass, best for `player` first.
    fn replay_best_first(replay: &[(Move, i32)], player: Player) -> MoveList {
        let mut valued = replay.to_vec();
        match player {
            Player::Y => valued.sort_by_key(|&(_, v)| Reverse(v)),
            Player::X => valued.sort_by_key(|&(_, v)| v),
        }
        valued.into_iter().map(|(mv, _)| mv).collect()
    }

    /// Extend own critical pins towards the side they lack, then offensive patterns.
    fn own_moves(&self, game: &Match, player: Player, moves: &mut MoveList) {
        let own = game.board(player);
        let board = own.board();

        let mut crits = own.critical().clone();
        if crits.is_empty() {
            if let Some(last) = game.last_move() {
                let (x, y) = last.mv.on_board(player);
                crits = [CritDir::Down, CritDir::Up]
                    .into_iter()
                    .map(|dir| CriticalPosition { x, y, dir })
                    .collect();
            }
        }

        for crit in &crits {
            let sign = dir_sign(crit.dir);
            for side in [-1, 1] {
                let near = (crit.x + side, crit.y + 2 * sign);
                let far = (crit.x + 2 * side, crit.y + sign);
                let reachable = |(x, y): (i32, i32)| {
                    board.pin_allowed(x, y, Player::Y)
                        && board.is_bridge_allowed(crit.x, crit.y, x, y)
                };
                if reachable(near) {
                    moves.push(Move::from_board(near.0, near.1, player));
                } else if reachable(far) {
                    moves.push(Move::from_board(far.0, far.1, player));
                }
            }
        }

        for (x, y) in self
            .patterns
            .suggest(PatternKind::Offensive, board, &crits, Player::Y)
        {
            moves.push(Move::from_board(x, y, player));
        }
    }

    /// Block the opponent's critical pins four rows ahead, then defensive patterns.
    fn blocking_moves(&self, game: &Match, player: Player, moves: &mut MoveList) {
        let opp = player.opposite();
        let theirs = game.board(opp);
        let board = theirs.board();
        let crits: &BTreeSet<CriticalPosition> = theirs.critical();

        for crit in crits {
            let towards_centre = if crit.x < board.xsize() / 2 { 1 } else { -1 };
            let (x, y) = (crit.x + towards_centre, crit.y + 4 * dir_sign(crit.dir));
            if board.pin_allowed(x, y, Player::X) {
                moves.push(Move::from_board(x, y, opp));
            }
        }

        for (x, y) in self
            .patterns
            .suggest(PatternKind::Defensive, board, crits, Player::X)
        {
            moves.push(Move::from_board(x, y, opp));
        }
    }

    fn random_move(game: &Match, player: Player, rng: &mut StdRng) -> Option<Move> {
        let board = game.board(Player::Y).board();
        for _ in 0..RANDOM_TRIES {
            let mv = Move::new(
                rng.gen_range(0..board.xsize()),
                rng.gen_range(0..board.ysize()),
            );
            if board.pin_allowed(mv.x, mv.y, player) {
                return Some(mv);
            }
        }
        (0..board.ysize())
            .flat_map(|y| (0..board.xsize()).map(move |x| Move::new(x, y)))
            .find(|mv| board.pin_allowed(mv.x, mv.y, player))
    }
}
