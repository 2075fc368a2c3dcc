//! # Piece archetypes.
//!
//! A ruleset declares piece types; boards hold instances of them. The
//! archetype is shared, so an instance is an [`Arc`] to its type plus
//! the two things that belong to the individual piece, its color and
//! whether it has moved yet.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::{Color, motion::Motion};

/// A castling agreement between two piece types of one side: both slide
/// along their shared rank toward each other in one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastlingRule {
    /// The type whose landing square anchors the maneuver.
    pub first: String,
    /// The type that lands beside it.
    pub second: String,
    /// Whether both pieces must still be unmoved.
    pub unmoved_only: bool,
    /// Whether every square strictly between them must be vacant.
    pub clear_between: bool,
}

/// Everything a ruleset says about one kind of piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceType {
    pub name: String,
    /// Board-diagram letter, cased per side when printed.
    pub symbol: char,
    /// Material worth for search and for ranking promotions.
    pub value: u32,
    /// Movements always available.
    pub motions: Vec<Motion>,
    /// Movements additionally available until the piece first moves.
    pub initial_motions: Vec<Motion>,
    /// Whether reaching the far rank turns this piece into another type.
    pub promotable: bool,
    /// Whether enemy pieces are forbidden from capturing this one.
    pub invulnerable: bool,
    /// Castling rules this type takes part in, keyed by partner name.
    pub castlings: IndexMap<String, CastlingRule>,
}

/// A piece standing on a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceInstance {
    pub kind: Arc<PieceType>,
    pub color: Color,
    pub moved: bool,
}

impl PieceInstance {
    pub fn new(kind: Arc<PieceType>, color: Color) -> Self {
        Self { kind, color, moved: false }
    }

    /// Diagram letter for this piece, uppercase for white and lowercase
    /// for black.
    #[inline]
    pub fn symbol(&self) -> char {
        match self.color {
            Color::WHITE => self.kind.symbol.to_ascii_uppercase(),
            Color::BLACK => self.kind.symbol.to_ascii_lowercase(),
        }
    }

    /// The movements currently open to this piece: the standing table,
    /// extended with the first-move table until the piece has moved.
    pub fn motions(&self) -> impl Iterator<Item = Motion> + '_ {
        let extra: &[Motion] = if self.moved {
            &[]
        } else {
            &self.kind.initial_motions
        };
        self.kind.motions.iter().chain(extra).copied()
    }

    /// The castling rule this piece shares with the named partner type,
    /// if there is one.
    pub fn castling_with(&self, partner: &str) -> Option<&CastlingRule> {
        self.kind.castlings.get(partner)
    }

    /// Whether this piece takes part in any castling rule at all.
    #[inline]
    pub fn can_castle(&self) -> bool {
        !self.kind.castlings.is_empty()
    }
}

#[cfg(test)]
fn footman() -> Arc<PieceType> {
    use crate::model::{CaptureMode, Delta, JumpMode};
    Arc::new(PieceType {
        name: "FOOTMAN".into(),
        symbol: 'F',
        value: 1,
        motions: vec![Motion {
            row: Delta::Fixed(1),
            col: Delta::Fixed(0),
            capture: CaptureMode::None,
            jump: JumpMode::None,
        }],
        initial_motions: vec![Motion {
            row: Delta::Fixed(2),
            col: Delta::Fixed(0),
            capture: CaptureMode::None,
            jump: JumpMode::None,
        }],
        promotable: true,
        invulnerable: false,
        castlings: IndexMap::new(),
    })
}

#[test]
fn symbols_are_cased_per_side() {
    let white = PieceInstance::new(footman(), Color::WHITE);
    let black = PieceInstance::new(footman(), Color::BLACK);
    assert_eq!(white.symbol(), 'F');
    assert_eq!(black.symbol(), 'f');
}

#[test]
fn first_move_motions_retire_once_moved() {
    let mut piece = PieceInstance::new(footman(), Color::WHITE);
    assert_eq!(piece.motions().count(), 2);
    piece.moved = true;
    assert_eq!(piece.motions().count(), 1);
}

#[test]
fn castling_partners_are_looked_up_by_name() {
    let mut kind = (*footman()).clone();
    kind.castlings.insert(
        "TOWER".into(),
        CastlingRule {
            first: "FOOTMAN".into(),
            second: "TOWER".into(),
            unmoved_only: true,
            clear_between: true,
        },
    );
    let piece = PieceInstance::new(Arc::new(kind), Color::WHITE);
    assert!(piece.can_castle());
    assert!(piece.castling_with("TOWER").is_some());
    assert!(piece.castling_with("FOOTMAN").is_none());
}
