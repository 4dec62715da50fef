//! Board model.
//!
//! A fixed 9x9 grid of stones plus the five-in-a-row detection used after
//! every placement. Pure data, no I/O.

use serde::{Deserialize, Serialize};

/// Board dimensions.
pub const BOARD_SIZE: usize = 9;

/// Stones in a row needed to win.
pub const WIN_LENGTH: usize = 5;

/// A seat at the table. Encoded on the wire as `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Role {
    PlayerOne,
    PlayerTwo,
}

impl Role {
    /// Wire number (1 or 2).
    pub fn number(self) -> u8 {
        match self {
            Self::PlayerOne => 1,
            Self::PlayerTwo => 2,
        }
    }

    /// Zero-based index, handy for per-role arrays.
    pub fn index(self) -> usize {
        match self {
            Self::PlayerOne => 0,
            Self::PlayerTwo => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::PlayerOne => Self::PlayerTwo,
            Self::PlayerTwo => Self::PlayerOne,
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.number()
    }
}

impl TryFrom<u8> for Role {
    type Error = InvalidRole;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::PlayerOne),
            2 => Ok(Self::PlayerTwo),
            other => Err(InvalidRole(other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.number())
    }
}

/// A role number outside `1..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid player role {0}, expected 1 or 2")]
pub struct InvalidRole(pub u8);

/// Contents of one intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Stone(Role),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn owner(&self) -> Option<Role> {
        match self {
            Self::Empty => None,
            Self::Stone(role) => Some(*role),
        }
    }
}

/// Board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Check if position is within board bounds.
    pub fn is_valid(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Neighbouring position one step along `(dr, dc)`, if still on the board.
    fn step(&self, dr: isize, dc: isize) -> Option<Position> {
        let next = Position {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        };
        next.is_valid().then_some(next)
    }
}

/// The four line directions, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
    DiagonalDown,
    DiagonalUp,
}

impl Axis {
    pub const ALL: [Axis; 4] = [
        Self::Horizontal,
        Self::Vertical,
        Self::DiagonalDown,
        Self::DiagonalUp,
    ];

    /// Unit step `(row, col)` in the positive direction.
    fn delta(self) -> (isize, isize) {
        match self {
            Self::Horizontal => (0, 1),
            Self::Vertical => (1, 0),
            Self::DiagonalDown => (1, 1),
            Self::DiagonalUp => (-1, 1),
        }
    }
}

/// A completed run of at least [`WIN_LENGTH`] stones.
///
/// Cells are ordered from one end of the run to the other, walking in the
/// axis' positive direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinningLine {
    pub axis: Axis,
    pub cells: Vec<Position>,
}

impl WinningLine {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }
}

/// Board errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("position is off the board")]
    OutOfBounds,
    #[error("cell is already occupied")]
    CellOccupied,
    #[error("cell is empty")]
    CellEmpty,
}

/// 9x9 game board.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cell at position.
    pub fn get(&self, pos: Position) -> Option<Cell> {
        if pos.is_valid() {
            Some(self.cells[pos.row][pos.col])
        } else {
            None
        }
    }

    /// Place a stone for `role` on an empty cell.
    pub fn apply_mark(&mut self, pos: Position, role: Role) -> Result<(), BoardError> {
        let cell = self.cell_mut(pos)?;
        if !cell.is_empty() {
            return Err(BoardError::CellOccupied);
        }
        *cell = Cell::Stone(role);
        Ok(())
    }

    /// Remove the stone at `pos`, returning its owner.
    pub fn apply_clear(&mut self, pos: Position) -> Result<Role, BoardError> {
        let cell = self.cell_mut(pos)?;
        let owner = cell.owner().ok_or(BoardError::CellEmpty)?;
        *cell = Cell::Empty;
        Ok(owner)
    }

    /// Look for a winning run through `origin` for `role`.
    ///
    /// Axes are tried in [`Axis::ALL`] order and the first one holding at
    /// least [`WIN_LENGTH`] contiguous stones is reported, in full.
    pub fn detect_win(&self, origin: Position, role: Role) -> Option<WinningLine> {
        if self.get(origin)? != Cell::Stone(role) {
            return None;
        }

        Axis::ALL.into_iter().find_map(|axis| {
            let cells = self.run_through(origin, role, axis);
            (cells.len() >= WIN_LENGTH).then_some(WinningLine { axis, cells })
        })
    }

    /// Clear every cell.
    pub fn reset(&mut self) {
        self.cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
    }

    /// Count stones owned by `role`.
    pub fn stone_count(&self, role: Role) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| **c == Cell::Stone(role))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Cell::is_empty)
    }

    fn cell_mut(&mut self, pos: Position) -> Result<&mut Cell, BoardError> {
        if !pos.is_valid() {
            return Err(BoardError::OutOfBounds);
        }
        Ok(&mut self.cells[pos.row][pos.col])
    }

    fn owned_by(&self, pos: Position, role: Role) -> bool {
        self.get(pos) == Some(Cell::Stone(role))
    }

    fn run_through(&self, origin: Position, role: Role, axis: Axis) -> Vec<Position> {
        let (dr, dc) = axis.delta();

        let mut start = origin;
        while let Some(prev) = start.step(-dr, -dc).filter(|p| self.owned_by(*p, role)) {
            start = prev;
        }

        let mut cells = vec![start];
        let mut cursor = start;
        while let Some(next) = cursor.step(dr, dc).filter(|p| self.owned_by(*p, role)) {
            cells.push(next);
            cursor = next;
        }
        cells
    }
}
