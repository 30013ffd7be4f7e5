use crate::engine::races;
use crate::logic::board::{BoardState, BridgeDir, Player, MAXDIM};
use std::collections::BTreeSet;

/// Multiplier applied to row distances.
pub const MULT: i32 = 10;
pub const BLOCKED_FIELD_VAL: i32 = 99;
/// Distance reported for cells and pins that cannot reach their edge.
pub const BLOCKED_FIELD_VAL_MULT: i32 = BLOCKED_FIELD_VAL * MULT;
/// Penalty for stepping around a block one column to the side.
const MALUS_1: i32 = 2 * MULT + 1;
/// Penalty for stepping around a block two columns to the side.
const MALUS_2: i32 = MULT + 3;

const KNIGHT_STEPS: [(i32, i32); 8] = [
    (1, -2),
    (2, -1),
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
];

/// Nearest own pin upwards a cell can connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Father {
    /// An opponent pin or bridge cuts the cell off from above.
    Blocked,
    /// Own pin, or the baseline cell `(x, 0)` when `y == 0`.
    At { x: i32, y: i32 },
}

impl Default for Father {
    fn default() -> Self {
        Self::At { x: 0, y: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CritDir {
    /// towards the start edge
    Up,
    /// towards the goal edge
    Down,
}

/// A pin that the best path depends on, plus the side it needs to be extended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CriticalPosition {
    pub x: i32,
    pub y: i32,
    pub dir: CritDir,
}

#[derive(Debug, Clone, Copy, Default)]
struct FieldData {
    /// Only meaningful for own pins.
    value: i32,
    father: Father,
    relevant: Option<Father>,
    visited: u32,
}

/// Incremental shortest-path evaluation of one board for its owner (local `Y`).
#[derive(Debug, Clone)]
pub struct PositionEvaluator {
    data: Vec<FieldData>,
    own_pins: Vec<Vec<i32>>,
    critical: BTreeSet<CriticalPosition>,
    third_column_recheck: bool,
    visit_stamp: u32,
}

impl Default for PositionEvaluator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PositionEvaluator {
    pub fn new(third_column_recheck: bool) -> Self {
        #[allow(clippy::cast_sign_loss)]
        let side = MAXDIM as usize;
        Self {
            data: vec![FieldData::default(); side * side],
            own_pins: vec![Vec::new(); side],
            critical: BTreeSet::new(),
            third_column_recheck,
            visit_stamp: 0,
        }
    }

    pub const fn third_column_recheck(&self) -> bool {
        self.third_column_recheck
    }

    pub fn set_third_column_recheck(&mut self, enabled: bool) {
        self.third_column_recheck = enabled;
    }

    fn slot(x: i32, y: i32) -> Option<usize> {
        if (0..MAXDIM).contains(&x) && (0..MAXDIM).contains(&y) {
            #[allow(clippy::cast_sign_loss)]
            let idx = (x * MAXDIM + y) as usize;
            Some(idx)
        } else {
            None
        }
    }

    fn field(&self, x: i32, y: i32) -> FieldData {
        Self::slot(x, y)
            .and_then(|i| self.data.get(i))
            .copied()
            .unwrap_or_default()
    }

    fn field_mut(&mut self, x: i32, y: i32) -> Option<&mut FieldData> {
        Self::slot(x, y).and_then(|i| self.data.get_mut(i))
    }

    fn value(&self, x: i32, y: i32) -> i32 {
        self.field(x, y).value
    }

    fn set_value(&mut self, x: i32, y: i32, value: i32) {
        if let Some(f) = self.field_mut(x, y) {
            f.value = value;
        }
    }

    /// Father of an arbitrary cell; used by the move generator and tests.
    pub fn father(&self, x: i32, y: i32) -> Father {
        self.field(x, y).father
    }

    /// Critical positions found by the last `value_of(true, ..)`.
    pub const fn critical(&self) -> &BTreeSet<CriticalPosition> {
        &self.critical
    }

    /// Recompute every row from scratch (new game or new size).
    pub fn setup(&mut self, board: &BoardState) {
        for f in &mut self.data {
            *f = FieldData::default();
        }
        for row in &mut self.own_pins {
            row.clear();
        }
        self.critical.clear();

        for yi in 0..board.ysize() {
            for xi in 0..board.xsize() {
                self.calculate_dist(board, xi, yi);
                if board.get_pin(xi, yi) == Some(Player::Y) {
                    self.push_own_pin(xi, yi);
                }
            }
        }
    }

    fn push_own_pin(&mut self, x: i32, y: i32) {
        if let Some(row) = usize::try_from(y).ok().and_then(|r| self.own_pins.get_mut(r)) {
            row.push(x);
        }
    }

    /// Returns whether a pin (of either player) sits directly above the cell.
    fn calculate_dist(&mut self, board: &BoardState, xi: i32, yi: i32) -> bool {
        if yi < 0 {
            return false;
        }
        if yi == 0 {
            let own = board.get_pin(xi, 0) == Some(Player::Y);
            if let Some(f) = self.field_mut(xi, 0) {
                f.father = Father::At { x: xi, y: 0 };
                if own {
                    f.value = 0;
                }
            }
            return false;
        }

        let mut pin_found = false;
        let mut father = if board.is_bridged(xi - 1, yi, BridgeDir::FarRight)
            || board.is_bridged(xi + 1, yi, BridgeDir::FarLeft)
        {
            Father::Blocked
        } else {
            match board.get_pin(xi, yi - 1) {
                Some(Player::X) => {
                    pin_found = true;
                    Father::Blocked
                }
                Some(Player::Y) => {
                    pin_found = true;
                    Father::At { x: xi, y: yi - 1 }
                }
                None => self.father(xi, yi - 1),
            }
        };

        let knights = [
            (xi - 1, yi - 2, BridgeDir::Left),
            (xi + 1, yi - 2, BridgeDir::Right),
            (xi - 2, yi - 1, BridgeDir::FarLeft),
            (xi + 2, yi - 1, BridgeDir::FarRight),
        ];
        if let Some(&(fx, fy, _)) = knights.iter().find(|&&(fx, fy, dir)| {
            board.get_pin(fx, fy) == Some(Player::Y) && board.bridge_allowed(xi, yi, dir)
        }) {
            father = Father::At { x: fx, y: fy };
        }

        if let Some(f) = self.field_mut(xi, yi) {
            f.father = father;
        }
        pin_found
    }

    /// Incremental update after a pin was set at `(x, y)`.
    pub fn add_pin(&mut self, board: &BoardState, x: i32, y: i32) {
        let Some(player) = board.get_pin(x, y) else {
            return;
        };
        self.update_rows(board, x, y, player);
        if player == Player::Y {
            self.push_own_pin(x, y);
        }
    }

    /// Incremental update after `player`'s pin at `(x, y)` was removed.
    pub fn remove_pin(&mut self, board: &BoardState, x: i32, y: i32, player: Player) {
        self.update_rows(board, x, y, player);
        if player == Player::Y {
            if let Some(row) = usize::try_from(y).ok().and_then(|r| self.own_pins.get_mut(r)) {
                row.retain(|&col| col != x);
            }
        }
    }

    fn update_rows(&mut self, board: &BoardState, xin: i32, yin: i32, player: Player) {
        let (xs, ys) = (board.xsize(), board.ysize());

        for yi in yin..ys {
            if self.calculate_dist(board, xin, yi) && yi > yin + 1 {
                break;
            }
        }
        if xin >= 2 {
            self.calculate_column(board, xin - 1, yin);
        }
        if xin >= 3 {
            self.calculate_column(board, xin - 2, yin);
        }
        if xin < xs - 2 {
            self.calculate_column(board, xin + 1, yin);
        }
        if xin < xs - 3 {
            self.calculate_column(board, xin + 2, yin);
        }

        // an opponent pin may close a gap together with a pin two columns away
        if self.third_column_recheck && player == Player::X {
            let opp_at = |x: i32, y: i32| board.get_pin(x, y) == Some(Player::X);
            if xin < xs - 3 && (opp_at(xin + 2, yin + 1) || opp_at(xin + 2, yin - 1)) {
                self.calculate_column(board, xin + 3, yin);
            }
            if xin >= 3 && (opp_at(xin - 2, yin + 1) || opp_at(xin - 2, yin - 1)) {
                self.calculate_column(board, xin - 3, yin);
            }
        }
    }

    fn calculate_column(&mut self, board: &BoardState, xin: i32, yin: i32) {
        for yi in yin - 1..board.ysize() {
            if self.calculate_dist(board, xin, yi) && yi > yin + 2 {
                break;
            }
        }
    }

    fn dist_value(&self, board: &BoardState, x: i32, y: i32) -> i32 {
        if x < 1 || y < 0 || x >= board.xsize() {
            return BLOCKED_FIELD_VAL_MULT;
        }
        let Father::At { x: fx, y: fy } = self.father(x, y) else {
            return BLOCKED_FIELD_VAL_MULT;
        };
        let dist = if fy == 0 {
            y * MULT
        } else {
            (y - fy) * MULT + self.value(fx, fy)
        };
        dist + match (fx - x).abs() {
            1 => 1,
            2 => 3,
            _ => 0,
        }
    }

    /// Assign every own pin its distance to the start edge.
    pub fn evaluate(&mut self, board: &BoardState, next: Player) {
        let rows = usize::try_from(board.ysize()).unwrap_or(0);

        for (yi, row) in self.own_pins.iter().enumerate().take(rows).skip(1) {
            for &col in row {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let y = yi as i32;
                if let Some(f) = Self::slot(col, y).and_then(|i| self.data.get_mut(i)) {
                    f.value = BLOCKED_FIELD_VAL_MULT;
                    f.relevant = None;
                }
            }
        }

        let mut stack = Vec::with_capacity(200);
        for yi in 0..board.ysize() {
            let cols = usize::try_from(yi)
                .ok()
                .and_then(|r| self.own_pins.get(r))
                .cloned()
                .unwrap_or_default();
            for col in cols {
                let mut pval = self.dist_value(board, col, yi);
                let mut relevant = self.father(col, yi);

                if relevant == Father::Blocked {
                    // step around the block
                    let hops = [
                        (col - 1, yi - 2, BridgeDir::Left, MALUS_1),
                        (col + 1, yi - 2, BridgeDir::Right, MALUS_1),
                    ];
                    for (hx, hy, dir, malus) in hops {
                        let zval = self.dist_value(board, hx, hy) + malus;
                        if board.pin_allowed(hx, hy, Player::Y)
                            && board.bridge_allowed(col, yi, dir)
                            && zval < pval
                        {
                            pval = zval;
                            relevant = self.father(hx, hy);
                        }
                    }
                    let far_left = self.dist_value(board, col - 2, yi - 1) + MALUS_2;
                    if board.pin_allowed(col - 2, yi - 1, Player::Y)
                        && board.bridge_allowed(col, yi, BridgeDir::FarLeft)
                        && far_left < pval
                    {
                        pval = far_left;
                        relevant = self.father(col - 2, yi - 1);
                    } else {
                        let far_right = self.dist_value(board, col + 2, yi - 1) + MALUS_2;
                        if board.pin_allowed(col + 2, yi - 1, Player::Y)
                            && board.bridge_allowed(col, yi, BridgeDir::FarRight)
                            && far_right < pval
                        {
                            pval = far_right;
                            relevant = self.father(col + 2, yi - 1);
                        }
                    }
                }

                // a baseline father has to survive the races towards the top edge
                let accept = match relevant {
                    Father::At { y: 0, .. } => {
                        Self::plausible_top(board, col, relevant, next)
                            && races::check_top(board, col, yi, next)
                    }
                    _ => true,
                };

                if accept && (pval < self.value(col, yi) || yi == 0) {
                    if let Some(f) = self.field_mut(col, yi) {
                        f.relevant = Some(relevant);
                    }
                    stack.push((col, yi));
                    self.spread_value(board, &mut stack, pval);
                }
            }
        }
    }

    /// Give every pin of a bridged group the same (smaller) value.
    fn spread_value(&mut self, board: &BoardState, stack: &mut Vec<(i32, i32)>, val: i32) {
        while let Some((x1, y1)) = stack.pop() {
            self.set_value(x1, y1, val);
            for (dx, dy) in KNIGHT_STEPS {
                let (x2, y2) = (x1 + dx, y1 + dy);
                if board.is_connected(x1, y1, x2, y2) && self.value(x2, y2) > val {
                    stack.push((x2, y2));
                }
            }
        }
    }

    /// Distance of the owner to the goal edge: `0` when connected,
    /// [`BLOCKED_FIELD_VAL_MULT`] when unreachable.
    pub fn value_of(&mut self, board: &BoardState, compute_critical: bool, next: Player) -> i32 {
        let mut best_val = BLOCKED_FIELD_VAL_MULT;
        let mut best_tenth = best_val / 10;
        let last = board.ysize() - 1;
        let mut starting_points = BTreeSet::new();

        for xi in 1..board.xsize() - 1 {
            if board.get_pin(xi, last) == Some(Player::Y) {
                let value = self.value(xi, last);
                best_val = best_val.min(value);
                if compute_critical {
                    note_start(&mut starting_points, &mut best_tenth, value / 10, (xi, last));
                }
            } else {
                let dist = self.dist_value(board, xi, last);
                let Father::At { x: fx, y: fy } = self.father(xi, last) else {
                    continue;
                };
                let tenth = dist / 10;
                if fy > 0
                    && tenth <= best_tenth
                    && Self::plausible_bottom(board, xi, fx, fy, next)
                    && races::check_bottom(board, fx, fy, next)
                {
                    if compute_critical {
                        note_start(&mut starting_points, &mut best_tenth, tenth, (fx, fy));
                    }
                    best_val = best_val.min(dist);
                }
            }
        }

        if compute_critical {
            self.critical.clear();
            self.visit_stamp = self.visit_stamp.wrapping_add(1);
            for (x, y) in starting_points {
                self.compute_critical(board, x, y);
            }
        }
        best_val
    }

    /// Walk from a pin back to the start edge along relevant fathers.
    fn compute_critical(&mut self, board: &BoardState, xin: i32, yin: i32) {
        let (mut xc, mut yc) = (xin, yin);
        let limit = board.xsize() * board.ysize();

        for _ in 0..limit {
            if yc < board.ysize() - 1 && board.get_pin(xc, yc) == Some(Player::Y) {
                self.critical.insert(CriticalPosition {
                    x: xc,
                    y: yc,
                    dir: CritDir::Down,
                });
            }

            let Some((fx, fy)) = self.father_connection(board, xc, yc) else {
                break;
            };
            if fy > 0 {
                self.critical.insert(CriticalPosition {
                    x: fx,
                    y: fy,
                    dir: CritDir::Up,
                });
            }
            match self.field(fx, fy).relevant {
                Some(Father::At { x, y }) if fy > 0 => {
                    if y == 0 {
                        if board.get_pin(x, 0) == Some(Player::Y) {
                            self.critical.insert(CriticalPosition {
                                x,
                                y: 0,
                                dir: CritDir::Down,
                            });
                        }
                        break;
                    }
                    xc = x;
                    yc = y;
                }
                _ => break,
            }
        }
    }

    /// First pin of the bridged group around `(xc, yc)` that has a relevant father.
    fn father_connection(&mut self, board: &BoardState, xc: i32, yc: i32) -> Option<(i32, i32)> {
        let stamp = self.visit_stamp;
        let mut stack = vec![(xc, yc)];
        while let Some((x1, y1)) = stack.pop() {
            if self.field(x1, y1).relevant.is_some() {
                return Some((x1, y1));
            }
            if let Some(f) = self.field_mut(x1, y1) {
                f.visited = stamp;
            }
            for (dx, dy) in KNIGHT_STEPS {
                let (x2, y2) = (x1 + dx, y1 + dy);
                if board.is_connected(x1, y1, x2, y2) && self.field(x2, y2).visited != stamp {
                    stack.push((x2, y2));
                }
            }
        }
        None
    }

    fn plausible_top(board: &BoardState, col: i32, father: Father, next: Player) -> bool {
        let Father::At { x: rx, y: ry } = father else {
            return false;
        };
        let vert = (col - rx).abs();
        if vert == 0 {
            return true;
        }
        if vert >= 2 && next == Player::X {
            return false;
        }
        if ry < 6 {
            return true;
        }
        Self::opponent_column_near(board, col, rx, ry, -1)
    }

    fn plausible_bottom(board: &BoardState, col: i32, rx: i32, ry: i32, next: Player) -> bool {
        let vert = (col - rx).abs();
        if vert == 0 {
            return true;
        }
        if vert >= 2 && next == Player::X {
            return false;
        }
        // rows, not columns: the goal edge is the last row
        if ry > board.ysize() - 6 {
            return true;
        }
        Self::opponent_column_near(board, col, rx, ry, 1)
    }

    /// An opponent pin within four rows of the father, in the column between it and `col`.
    fn opponent_column_near(board: &BoardState, col: i32, rx: i32, ry: i32, sign: i32) -> bool {
        let column = match col - rx {
            -1 | 1 => rx,
            -2 => rx - 1,
            2 => rx + 1,
            _ => return false,
        };
        (1..=4).any(|k| board.get_pin(column, ry + sign * k) == Some(Player::X))
    }
}

/// Keep only the starting points in the best distance bucket.
fn note_start(points: &mut BTreeSet<(i32, i32)>, best_tenth: &mut i32, tenth: i32, at: (i32, i32)) {
    if tenth < *best_tenth {
        points.clear();
        *best_tenth = tenth;
    }
    if tenth <= *best_tenth {
        points.insert(at);
    }
}
