use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumIter, VariantArray};

/// Move-search opponent built on minimax.
pub mod agent;
/// Boards, destination caches, and mutation.
pub mod board;
/// Error type shared across the crate.
pub mod error;
/// Rectangular grids of any cell type.
pub mod grid;
/// Movement descriptors and their resolution categories.
pub mod motion;
/// Validated moves, ordinary and castling.
pub mod moves;
/// Piece archetypes and the pieces standing on boards.
pub mod piece;
/// Rule documents that configure a game.
pub mod ruleset;
/// Live games with history, special actions, and results.
pub mod session;

/// The two sides of a game. White is always the side standing on the
/// low ranks, whichever side the rules let open the game.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, EnumIter, VariantArray, Serialize, Deserialize,
)]
pub enum Color {
    WHITE = 0,
    BLACK = 1,
}

impl Color {
    /// Opposite color.
    #[inline]
    pub fn opp(self) -> Self {
        unsafe { std::mem::transmute::<u8, Self>(self as u8 ^ 1) }
    }

    /// Use this color as an index into per-color tables.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }

    /// The rank a piece of this color promotes on, on a board with
    /// `rows` ranks.
    #[inline]
    pub fn promotion_rank(self, rows: u8) -> u8 {
        match self {
            Self::WHITE => rows,
            Self::BLACK => 1,
        }
    }
}

/// A square address. Columns and rows are 1-based, column 1 row 1 being
/// white's left corner square, and never exceed 16 on either axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub col: u8,
    pub row: u8,
}

impl Position {
    #[inline]
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// Displace by a signed column and row delta. `None` when the result
    /// leaves the 16x16 addressable range; whether the square exists on
    /// a particular board is the board's business.
    #[inline]
    pub fn offset(self, dc: i16, dr: i16) -> Option<Self> {
        let col = self.col as i16 + dc;
        let row = self.row as i16 + dr;
        if (1..=16).contains(&col) && (1..=16).contains(&row) {
            Some(Self { col: col as u8, row: row as u8 })
        } else {
            None
        }
    }

    /// One king-step toward `other`, moving both axes at once where they
    /// differ. Callers guarantee `self != other`.
    #[inline]
    pub fn step_toward(self, other: Self) -> Self {
        let dc = (other.col as i16 - self.col as i16).signum();
        let dr = (other.row as i16 - self.row as i16).signum();
        Self {
            col: (self.col as i16 + dc) as u8,
            row: (self.row as i16 + dr) as u8,
        }
    }
}

/// Whether a movement may, must, or must not end on an enemy piece.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, EnumIter, VariantArray)]
pub enum CaptureMode {
    None = 0,
    Optional = 1,
    Mandatory = 2,
}

/// Whether a movement may pass over occupied squares, and what happens
/// to the enemy pieces it passes over.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, EnumIter, VariantArray)]
pub enum JumpMode {
    None = 0,
    Jump = 1,
    JumpCapture = 2,
}

/// One axis of a movement descriptor, either an exact signed
/// displacement or a whole family of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum Delta {
    /// Exactly this many squares, the sign giving the direction.
    Fixed(i8),
    /// Any strictly positive count of squares.
    AnyPositive,
    /// Any strictly negative count of squares.
    AnyNegative,
    /// Any nonzero count of squares, either direction.
    AnySigned,
}

impl Delta {
    /// The same axis as seen from the other side of the board.
    #[inline]
    pub fn mirrored(self) -> Self {
        match self {
            Self::Fixed(n) => Self::Fixed(-n),
            Self::AnyPositive => Self::AnyNegative,
            Self::AnyNegative => Self::AnyPositive,
            Self::AnySigned => Self::AnySigned,
        }
    }

    /// Break a two-way axis into its two one-way halves. One-way and
    /// fixed axes come back whole.
    #[inline]
    pub fn split(self) -> (Self, Option<Self>) {
        match self {
            Self::AnySigned => (Self::AnyPositive, Some(Self::AnyNegative)),
            d => (d, None),
        }
    }

    /// Direction of travel along this axis, `0` for a fixed zero.
    /// Meaningless for [`Delta::AnySigned`], which callers split first.
    #[inline]
    pub fn sign(self) -> i16 {
        match self {
            Self::Fixed(n) => n.signum() as i16,
            Self::AnyPositive => 1,
            Self::AnyNegative => -1,
            Self::AnySigned => 0,
        }
    }
}

#[test]
fn opposing_colors() {
    assert_eq!(Color::WHITE.opp(), Color::BLACK);
    assert_eq!(Color::BLACK.opp(), Color::WHITE);
    assert_eq!(Color::WHITE.opp().opp(), Color::WHITE);
}

#[test]
fn promotion_ranks() {
    assert_eq!(Color::WHITE.promotion_rank(8), 8);
    assert_eq!(Color::BLACK.promotion_rank(8), 1);
    assert_eq!(Color::WHITE.promotion_rank(16), 16);
}

#[test]
fn offsets_clip_at_the_addressable_range() {
    let corner = Position::new(1, 1);
    assert_eq!(corner.offset(1, 2), Some(Position::new(2, 3)));
    assert_eq!(corner.offset(-1, 0), None);
    assert_eq!(corner.offset(0, -1), None);
    assert_eq!(Position::new(16, 16).offset(1, 0), None);
    assert_eq!(Position::new(16, 16).offset(0, 1), None);
}

#[test]
fn stepping_toward_a_square_reaches_it() {
    let from = Position::new(2, 2);
    let to = Position::new(5, 5);
    let mut cur = from;
    let mut steps = 0;
    while cur != to {
        cur = cur.step_toward(to);
        steps += 1;
    }
    assert_eq!(steps, 3);
}

#[test]
fn splitting_deltas() {
    assert_eq!(
        Delta::AnySigned.split(),
        (Delta::AnyPositive, Some(Delta::AnyNegative))
    );
    assert_eq!(Delta::Fixed(3).split(), (Delta::Fixed(3), None));
    assert_eq!(Delta::AnyNegative.split(), (Delta::AnyNegative, None));
}

#[test]
fn mirroring_deltas() {
    assert_eq!(Delta::Fixed(2).mirrored(), Delta::Fixed(-2));
    assert_eq!(Delta::AnyPositive.mirrored(), Delta::AnyNegative);
    assert_eq!(Delta::AnySigned.mirrored(), Delta::AnySigned);
    assert_eq!(Delta::Fixed(-1).mirrored().mirrored(), Delta::Fixed(-1));
}
