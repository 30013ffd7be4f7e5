use crate::engine::eval::{CritDir, CriticalPosition};
use crate::logic::board::{BoardState, Player};
use std::collections::BTreeSet;
use std::path::Path;

const BUILTIN_PATTERNS: &str = include_str!("../../resources/patterns.txt");

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("cannot read pattern file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: unknown keyword `{keyword}`")]
    UnknownKeyword { line: usize, keyword: String },

    #[error("line {line}: `{keyword}` expects {expected} numbers")]
    ArgumentCount {
        line: usize,
        keyword: String,
        expected: usize,
    },

    #[error("line {line}: `{token}` is not a number")]
    BadNumber { line: usize, token: String },

    #[error("line {line}: bridge cells must be a knight's move apart")]
    InvalidBridgeDistance { line: usize },

    #[error("line {line}: condition outside of a pattern")]
    ConditionOutsidePattern { line: usize },

    #[error("line {line}: pattern `{name}` has no SET cell")]
    MissingSet { line: usize, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Extends own critical pins.
    Offensive,
    /// Blocks the opponent's critical pins.
    Defensive,
}

/// One test of a pattern, offsets relative to the critical pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Free(i32, i32),
    Own(i32, i32),
    Opp(i32, i32),
    Set(i32, i32),
    Strong(i32, i32),
    NotStrong(i32, i32),
    BridgePossible((i32, i32), (i32, i32)),
    BridgeExists((i32, i32), (i32, i32)),
}

impl Condition {
    const fn mirrored(self) -> Self {
        match self {
            Self::Free(x, y) => Self::Free(-x, y),
            Self::Own(x, y) => Self::Own(-x, y),
            Self::Opp(x, y) => Self::Opp(-x, y),
            Self::Set(x, y) => Self::Set(-x, y),
            Self::Strong(x, y) => Self::Strong(-x, y),
            Self::NotStrong(x, y) => Self::NotStrong(-x, y),
            Self::BridgePossible((x1, y1), (x2, y2)) => {
                Self::BridgePossible((-x1, y1), (-x2, y2))
            }
            Self::BridgeExists((x1, y1), (x2, y2)) => Self::BridgeExists((-x1, y1), (-x2, y2)),
        }
    }

    /// Evaluate against `board` around `crit`; `own` is the pattern user's local colour.
    pub fn holds(&self, board: &BoardState, crit: &CriticalPosition, own: Player) -> bool {
        let at = |(dx, dy): (i32, i32)| anchor(crit, dx, dy);
        match *self {
            Self::Free(dx, dy) => {
                let (x, y) = at((dx, dy));
                board.on_board(x, y) && board.is_empty(x, y)
            }
            Self::Own(dx, dy) => {
                let (x, y) = at((dx, dy));
                board.get_pin(x, y) == Some(own)
            }
            Self::Opp(dx, dy) => {
                let (x, y) = at((dx, dy));
                board.get_pin(x, y) == Some(own.opposite())
            }
            Self::Set(dx, dy) => {
                let (x, y) = at((dx, dy));
                board.pin_allowed(x, y, own)
            }
            Self::Strong(dx, dy) => {
                let (x, y) = at((dx, dy));
                board.get_pin(x, y).is_some() && board.is_strong(x, y)
            }
            Self::NotStrong(dx, dy) => {
                let (x, y) = at((dx, dy));
                !board.is_strong(x, y)
            }
            Self::BridgePossible(a, b) => {
                let ((xa, ya), (xb, yb)) = (at(a), at(b));
                board.is_bridge_allowed(xa, ya, xb, yb)
            }
            Self::BridgeExists(a, b) => {
                let ((xa, ya), (xb, yb)) = (at(a), at(b));
                board.is_connected(xa, ya, xb, yb)
            }
        }
    }
}

/// Offsets grow towards the edge the critical direction points at.
const fn anchor(crit: &CriticalPosition, dx: i32, dy: i32) -> (i32, i32) {
    let sign = match crit.dir {
        CritDir::Down => 1,
        CritDir::Up => -1,
    };
    (crit.x + dx, crit.y + sign * dy)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub name: String,
    pub kind: PatternKind,
    pub conditions: Vec<Condition>,
}

impl Pattern {
    fn set_cell(&self) -> Option<(i32, i32)> {
        self.conditions.iter().find_map(|c| match *c {
            Condition::Set(x, y) => Some((x, y)),
            _ => None,
        })
    }

    fn mirrored(&self) -> Self {
        Self {
            name: format!("{} (mirrored)", self.name),
            kind: self.kind,
            conditions: self.conditions.iter().map(|c| c.mirrored()).collect(),
        }
    }

    /// The cell to play when every condition holds.
    pub fn matches(
        &self,
        board: &BoardState,
        crit: &CriticalPosition,
        own: Player,
    ) -> Option<(i32, i32)> {
        if self.conditions.iter().all(|c| c.holds(board, crit, own)) {
            self.set_cell().map(|(dx, dy)| anchor(crit, dx, dy))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<Pattern>,
}

struct OpenPattern {
    pattern: Pattern,
    symmetric: bool,
    line: usize,
}

impl PatternLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The pattern set shipped with the crate.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_PATTERNS).unwrap_or_else(|e| {
            log::warn!("built-in patterns rejected: {e}");
            Self::empty()
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PatternError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Load a pattern file, falling back to an empty library on any error.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::from_file(path).unwrap_or_else(|e| {
            log::warn!("patterns from {} not loaded: {e}", path.display());
            Self::empty()
        })
    }

    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let mut library = Self::empty();
        let mut open: Option<OpenPattern> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            let mut tokens = content.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            let args: Vec<&str> = tokens.collect();

            let header = match keyword.to_ascii_uppercase().as_str() {
                "OFF" => Some((PatternKind::Offensive, false)),
                "OFFS" => Some((PatternKind::Offensive, true)),
                "DEF" => Some((PatternKind::Defensive, false)),
                "DEFS" => Some((PatternKind::Defensive, true)),
                _ => None,
            };
            if let Some((kind, symmetric)) = header {
                if let Some(done) = open.take() {
                    library.close_or_skip(done);
                }
                let name = if args.is_empty() {
                    format!("pattern@{line}")
                } else {
                    args.join(" ")
                };
                open = Some(OpenPattern {
                    pattern: Pattern {
                        name,
                        kind,
                        conditions: Vec::new(),
                    },
                    symmetric,
                    line,
                });
                continue;
            }

            let condition = parse_condition(keyword, &args, line)?;
            match open.as_mut() {
                Some(current) => current.pattern.conditions.push(condition),
                None => return Err(PatternError::ConditionOutsidePattern { line }),
            }
        }

        if let Some(done) = open.take() {
            library.close_or_skip(done);
        }
        log::debug!("loaded {} patterns", library.len());
        Ok(library)
    }

    /// A pattern that cannot be used is dropped on its own.
    fn close_or_skip(&mut self, open: OpenPattern) {
        if let Err(e) = self.close(open) {
            log::warn!("skipping pattern: {e}");
        }
    }

    fn close(&mut self, open: OpenPattern) -> Result<(), PatternError> {
        if open.pattern.set_cell().is_none() {
            return Err(PatternError::MissingSet {
                line: open.line,
                name: open.pattern.name,
            });
        }
        if !open.symmetric {
            let mirrored = open.pattern.mirrored();
            self.patterns.push(open.pattern);
            self.patterns.push(mirrored);
        } else {
            self.patterns.push(open.pattern);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Cells suggested by every pattern of `kind` around each critical position.
    ///
    /// Coordinates are local to `board`; `own` is the caller's colour on it.
    pub fn suggest(
        &self,
        kind: PatternKind,
        board: &BoardState,
        crits: &BTreeSet<CriticalPosition>,
        own: Player,
    ) -> Vec<(i32, i32)> {
        let mut cells = Vec::new();
        for crit in crits {
            for pattern in self.patterns.iter().filter(|p| p.kind == kind) {
                if let Some(cell) = pattern.matches(board, crit, own) {
                    if !cells.contains(&cell) {
                        cells.push(cell);
                    }
                }
            }
        }
        cells
    }
}

fn parse_condition(keyword: &str, args: &[&str], line: usize) -> Result<Condition, PatternError> {
    let upper = keyword.to_ascii_uppercase();
    let expected = match upper.as_str() {
        "FREE" | "OWN" | "OPP" | "SET" | "STRONG" | "NSTRONG" => 2,
        "BPOSS" | "BEXIST" => 4,
        _ => {
            return Err(PatternError::UnknownKeyword {
                line,
                keyword: keyword.to_string(),
            })
        }
    };
    if args.len() != expected {
        return Err(PatternError::ArgumentCount {
            line,
            keyword: upper,
            expected,
        });
    }
    let nums = args
        .iter()
        .map(|t| {
            t.parse::<i32>().map_err(|_| PatternError::BadNumber {
                line,
                token: (*t).to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (x, y) = (nums.first().copied().unwrap_or(0), nums.get(1).copied().unwrap_or(0));
    let condition = match upper.as_str() {
        "FREE" => Condition::Free(x, y),
        "OWN" => Condition::Own(x, y),
        "OPP" => Condition::Opp(x, y),
        "SET" => Condition::Set(x, y),
        "STRONG" => Condition::Strong(x, y),
        "NSTRONG" => Condition::NotStrong(x, y),
        _ => {
            let (x2, y2) = (nums.get(2).copied().unwrap_or(0), nums.get(3).copied().unwrap_or(0));
            let (dx, dy) = ((x - x2).abs(), (y - y2).abs());
            if dx >= 3 || dy >= 3 || dx + dy != 3 {
                return Err(PatternError::InvalidBridgeDistance { line });
            }
            if upper == "BPOSS" {
                Condition::BridgePossible((x, y), (x2, y2))
            } else {
                Condition::BridgeExists((x, y), (x2, y2))
            }
        }
    };
    Ok(condition)
}
