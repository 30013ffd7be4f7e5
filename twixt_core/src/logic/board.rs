use crate::engine::zobrist::ZobristKeys;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Smallest board edge a match may use.
pub const MINDIM: i32 = 12;
/// Largest board edge a match may use.
pub const MAXDIM: i32 = 36;
pub const DEFAULTDIM: i32 = 24;

/// Padding around the playing area so knight-distance lookups never leave the grid.
pub const MARGIN: i32 = 3;
pub const GRID_SIDE: i32 = MAXDIM + 2 * MARGIN;

/// Slot value of a laid bridge. Smaller non-zero values count crossing bridges.
pub const BRIDGED: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    /// Connects the left and right edges.
    X,
    /// Connects the top and bottom edges.
    Y,
}

impl Player {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }

    /// How this player is stored on the board owned by `owner`.
    ///
    /// Every board is oriented so that its owner plays top to bottom, so the
    /// owner is always `Y` there and the other player is `X`.
    #[must_use]
    pub fn local_to(self, owner: Self) -> Self {
        if self == owner {
            Self::Y
        } else {
            Self::X
        }
    }
}

/// Bridge slots, stored at the lower endpoint of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeDir {
    /// towards `(x-2, y-1)`
    FarLeft = 0,
    /// towards `(x-1, y-2)`
    Left = 1,
    /// towards `(x+1, y-2)`
    Right = 2,
    /// towards `(x+2, y-1)`
    FarRight = 3,
}

type Crossing = (i32, i32, BridgeDir);

// The 9 slots a bridge in each direction crosses, relative to its lower endpoint.
const CROSS_FAR_LEFT: [Crossing; 9] = [
    (0, 1, BridgeDir::Left),
    (-1, 1, BridgeDir::Right),
    (-2, 1, BridgeDir::Right),
    (-1, 0, BridgeDir::FarRight),
    (-1, 0, BridgeDir::Right),
    (-1, 0, BridgeDir::Left),
    (-2, 0, BridgeDir::FarRight),
    (-2, 0, BridgeDir::Right),
    (-3, 0, BridgeDir::FarRight),
];
const CROSS_LEFT: [Crossing; 9] = [
    (-1, 1, BridgeDir::Right),
    (1, 0, BridgeDir::FarLeft),
    (-1, 0, BridgeDir::FarRight),
    (-1, 0, BridgeDir::Right),
    (-2, 0, BridgeDir::FarRight),
    (0, -1, BridgeDir::FarLeft),
    (-1, -1, BridgeDir::FarRight),
    (-1, -1, BridgeDir::Right),
    (-2, -1, BridgeDir::FarRight),
];
const CROSS_RIGHT: [Crossing; 9] = [
    (1, 1, BridgeDir::Left),
    (-1, 0, BridgeDir::FarRight),
    (1, 0, BridgeDir::FarLeft),
    (1, 0, BridgeDir::Left),
    (2, 0, BridgeDir::FarLeft),
    (0, -1, BridgeDir::FarRight),
    (1, -1, BridgeDir::FarLeft),
    (1, -1, BridgeDir::Left),
    (2, -1, BridgeDir::FarLeft),
];
const CROSS_FAR_RIGHT: [Crossing; 9] = [
    (0, 1, BridgeDir::Right),
    (1, 1, BridgeDir::Left),
    (2, 1, BridgeDir::Left),
    (1, 0, BridgeDir::FarLeft),
    (1, 0, BridgeDir::Left),
    (1, 0, BridgeDir::Right),
    (2, 0, BridgeDir::FarLeft),
    (2, 0, BridgeDir::Left),
    (3, 0, BridgeDir::FarLeft),
];

impl BridgeDir {
    pub const ALL: [Self; 4] = [Self::FarLeft, Self::Left, Self::Right, Self::FarRight];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Panics for anything outside `0..4`: such a value can only come from a caller bug.
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => Self::FarLeft,
            1 => Self::Left,
            2 => Self::Right,
            3 => Self::FarRight,
            _ => panic!("bridge direction {index} is not allowed"),
        }
    }

    /// Offset from the lower endpoint to the upper endpoint.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::FarLeft => (-2, -1),
            Self::Left => (-1, -2),
            Self::Right => (1, -2),
            Self::FarRight => (2, -1),
        }
    }

    const fn crossings(self) -> &'static [Crossing; 9] {
        match self {
            Self::FarLeft => &CROSS_FAR_LEFT,
            Self::Left => &CROSS_LEFT,
            Self::Right => &CROSS_RIGHT,
            Self::FarRight => &CROSS_FAR_RIGHT,
        }
    }
}

/// Lower endpoint and slot of the bridge between two cells a knight's move apart.
///
/// Panics when the cells are not a bridge distance apart.
pub fn bridge_slot_between(xa: i32, ya: i32, xb: i32, yb: i32) -> (i32, i32, BridgeDir) {
    let (dx, dy) = ((xa - xb).abs(), (ya - yb).abs());
    assert!(
        dx < 3 && dy < 3 && dx + dy == 3,
        "({xa}, {ya}) and ({xb}, {yb}) are not a bridge distance apart"
    );
    if ya < yb {
        let dir = if xa < xb { xa - xb + 2 } else { xa - xb + 1 };
        (xb, yb, BridgeDir::from_index(dir))
    } else {
        let dir = if xb < xa { xb - xa + 2 } else { xb - xa + 1 };
        (xa, ya, BridgeDir::from_index(dir))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Node {
    pin: Option<Player>,
    bridge: [u8; 4],
}

/// Pins and bridges of one board orientation.
///
/// Coordinates are logical (zero based); the margin is added internally.
#[derive(Debug, Clone)]
pub struct BoardState {
    xsize: i32,
    ysize: i32,
    field: Vec<Node>,
    zobrist: Option<Arc<ZobristKeys>>,
    zobrist_value: u64,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(DEFAULTDIM, DEFAULTDIM)
    }
}

impl BoardState {
    #[must_use]
    pub fn new(xsize: i32, ysize: i32) -> Self {
        #[allow(clippy::cast_sign_loss)]
        let cells = (GRID_SIDE * GRID_SIDE) as usize;
        let mut board = Self {
            xsize: DEFAULTDIM,
            ysize: DEFAULTDIM,
            field: vec![Node::default(); cells],
            zobrist: None,
            zobrist_value: 0,
        };
        board.set_size(xsize, ysize);
        board
    }

    /// Not allowed during a game; the caller clears the board afterwards.
    pub fn set_size(&mut self, xsize: i32, ysize: i32) {
        assert!(
            (MINDIM..=MAXDIM).contains(&xsize) && (MINDIM..=MAXDIM).contains(&ysize),
            "size has to be between {MINDIM} and {MAXDIM}"
        );
        self.xsize = xsize;
        self.ysize = ysize;
    }

    pub const fn xsize(&self) -> i32 {
        self.xsize
    }

    pub const fn ysize(&self) -> i32 {
        self.ysize
    }

    /// Turn on incremental hashing. Only the primary search board pays for it.
    pub fn enable_zobrist(&mut self, keys: Arc<ZobristKeys>) {
        self.zobrist = Some(keys);
    }

    pub const fn zobrist_value(&self) -> u64 {
        self.zobrist_value
    }

    pub fn clear(&mut self) {
        for node in &mut self.field {
            *node = Node::default();
        }
        self.zobrist_value = 0;
    }

    /// Copy size, pins and bridges from another board (used for the display mirror).
    pub fn copy_from(&mut self, source: &Self) {
        self.xsize = source.xsize;
        self.ysize = source.ysize;
        self.field.clone_from(&source.field);
    }

    fn index(x: i32, y: i32) -> Option<usize> {
        let (gx, gy) = (x + MARGIN, y + MARGIN);
        if (0..GRID_SIDE).contains(&gx) && (0..GRID_SIDE).contains(&gy) {
            #[allow(clippy::cast_sign_loss)]
            let idx = (gx * GRID_SIDE + gy) as usize;
            Some(idx)
        } else {
            None
        }
    }

    fn node(&self, x: i32, y: i32) -> Option<&Node> {
        Self::index(x, y).and_then(|i| self.field.get(i))
    }

    fn node_mut(&mut self, x: i32, y: i32) -> &mut Node {
        match Self::index(x, y).and_then(|i| self.field.get_mut(i)) {
            Some(node) => node,
            None => panic!("cell ({x}, {y}) is outside the board grid"),
        }
    }

    /// Owner of the pin at `(x, y)`; `None` for empty cells and cells off the grid.
    pub fn get_pin(&self, x: i32, y: i32) -> Option<Player> {
        self.node(x, y).and_then(|n| n.pin)
    }

    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.get_pin(x, y).is_none()
    }

    /// Whether `(x, y)` lies inside the playing area (not the margin).
    pub const fn on_board(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.xsize && y < self.ysize
    }

    /// Raw slot value: `0` free, `1..BRIDGED` crossed, `BRIDGED` bridged.
    pub fn bridge_slot(&self, x: i32, y: i32, dir: BridgeDir) -> u8 {
        self.node(x, y).map_or(0, |n| n.bridge[dir.index()])
    }

    pub fn pin_allowed(&self, x: i32, y: i32, player: Player) -> bool {
        let in_band = match player {
            Player::X => y >= 1 && y <= self.ysize - 2 && x >= 0 && x <= self.xsize - 1,
            Player::Y => y >= 0 && y <= self.ysize - 1 && x >= 1 && x <= self.xsize - 2,
        };
        in_band && self.is_empty(x, y)
    }

    /// Place a pin and lay every bridge it can make. Returns `false` if the pin is not allowed.
    pub fn set_pin(&mut self, x: i32, y: i32, player: Player) -> bool {
        if !self.pin_allowed(x, y, player) {
            return false;
        }
        if let Some(keys) = &self.zobrist {
            self.zobrist_value ^= keys.pin_key(x, y, player);
        }
        self.node_mut(x, y).pin = Some(player);

        for dir in BridgeDir::ALL {
            let (dx, dy) = dir.offset();
            // new pin as lower endpoint
            if self.get_pin(x + dx, y + dy) == Some(player) {
                self.set_bridge(x, y, dir);
            }
            // new pin as upper endpoint
            if self.get_pin(x - dx, y - dy) == Some(player) {
                self.set_bridge(x - dx, y - dy, dir);
            }
        }
        true
    }

    /// Exact inverse of [`set_pin`](Self::set_pin). Returns `false` for an empty cell
    /// or a pin of the other player.
    pub fn remove_pin(&mut self, x: i32, y: i32, player: Player) -> bool {
        if self.get_pin(x, y) != Some(player) {
            return false;
        }
        if let Some(keys) = &self.zobrist {
            self.zobrist_value ^= keys.pin_key(x, y, player);
        }
        self.node_mut(x, y).pin = None;

        for dir in BridgeDir::ALL {
            let (dx, dy) = dir.offset();
            self.remove_bridge(x, y, dir);
            self.remove_bridge(x - dx, y - dy, dir);
        }
        true
    }

    fn set_bridge(&mut self, x: i32, y: i32, dir: BridgeDir) {
        if self.node_mut(x, y).bridge[dir.index()] > 0 {
            return; // something is crossing this slot
        }
        self.node_mut(x, y).bridge[dir.index()] = BRIDGED;
        if let Some(keys) = &self.zobrist {
            self.zobrist_value ^= keys.link_key(x, y, dir);
        }
        for &(dx, dy, cross) in dir.crossings() {
            self.node_mut(x + dx, y + dy).bridge[cross.index()] += 1;
        }
    }

    fn remove_bridge(&mut self, x: i32, y: i32, dir: BridgeDir) {
        if self.bridge_slot(x, y, dir) < BRIDGED {
            return; // there was no bridge
        }
        self.node_mut(x, y).bridge[dir.index()] = 0;
        if let Some(keys) = &self.zobrist {
            self.zobrist_value ^= keys.link_key(x, y, dir);
        }
        for &(dx, dy, cross) in dir.crossings() {
            self.node_mut(x + dx, y + dy).bridge[cross.index()] -= 1;
        }
    }

    pub fn is_bridged(&self, x: i32, y: i32, dir: BridgeDir) -> bool {
        self.bridge_slot(x, y, dir) >= BRIDGED
    }

    /// The slot is neither bridged nor crossed. Cells off the grid allow nothing.
    pub fn bridge_allowed(&self, x: i32, y: i32, dir: BridgeDir) -> bool {
        self.node(x, y).is_some_and(|n| n.bridge[dir.index()] == 0)
    }

    /// Whether a bridge joins two cells. Panics if they are not a knight's move apart.
    pub fn is_connected(&self, xa: i32, ya: i32, xb: i32, yb: i32) -> bool {
        let (x, y, dir) = bridge_slot_between(xa, ya, xb, yb);
        self.is_bridged(x, y, dir)
    }

    /// Whether a bridge could still be laid between two cells a knight's move apart.
    pub fn is_bridge_allowed(&self, xa: i32, ya: i32, xb: i32, yb: i32) -> bool {
        let (x, y, dir) = bridge_slot_between(xa, ya, xb, yb);
        self.bridge_allowed(x, y, dir)
    }

    /// A pin is strong if at least one bridge touches it.
    pub fn is_strong(&self, x: i32, y: i32) -> bool {
        BridgeDir::ALL.iter().any(|&dir| {
            let (dx, dy) = dir.offset();
            self.is_bridged(x, y, dir) || self.is_bridged(x - dx, y - dy, dir)
        })
    }

    /// Upper endpoint of the bridge anchored at `(x, y)`.
    pub const fn bridge_end(x: i32, y: i32, dir: BridgeDir) -> (i32, i32) {
        let (dx, dy) = dir.offset();
        (x + dx, y + dy)
    }

    /// Number of pins of `player` currently on the board.
    pub fn pin_count(&self, player: Player) -> usize {
        self.field.iter().filter(|n| n.pin == Some(player)).count()
    }
}
