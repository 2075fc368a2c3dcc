//! # Moves.
//!
//! The two things a player can do to the board on their turn. A move is
//! validated against the board's caches before it touches anything, so
//! a rejected move leaves no trace.

use strum::EnumIs;

use crate::model::{Color, Position, board::Board, error::GameResult};

/// A player's move, in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum Move {
    /// One piece travels from one square to another.
    Ordinary { from: Position, to: Position },
    /// Two pieces of one side swing past each other along their rank.
    Castling { first: Position, second: Position },
}

impl Move {
    /// Validate against the board's caches, then apply. `Ok(true)` when
    /// the move captured at least one piece; castlings never capture.
    pub fn perform(self, board: &mut Board, color: Color) -> GameResult<bool> {
        match self {
            Self::Ordinary { from, to } => {
                board.check_ordinary(from, to, color)?;
                Ok(board.apply_ordinary(from, to))
            }
            Self::Castling { first, second } => {
                board.check_castling(first, second, color)?;
                board.apply_castling(first, second);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
fn rider() -> std::sync::Arc<crate::model::piece::PieceType> {
    use crate::model::{CaptureMode, Delta, JumpMode, motion::Motion};
    std::sync::Arc::new(crate::model::piece::PieceType {
        name: "RIDER".into(),
        symbol: 'R',
        value: 5,
        motions: vec![
            Motion {
                row: Delta::AnySigned,
                col: Delta::Fixed(0),
                capture: CaptureMode::Optional,
                jump: JumpMode::None,
            },
            Motion {
                row: Delta::Fixed(0),
                col: Delta::AnySigned,
                capture: CaptureMode::Optional,
                jump: JumpMode::None,
            },
        ],
        initial_motions: Vec::new(),
        promotable: false,
        invulnerable: false,
        castlings: indexmap::IndexMap::new(),
    })
}

#[cfg(test)]
fn two_rider_board() -> Board {
    use crate::model::piece::PieceInstance;
    let mut b = Board::new(8, 8, "KING").unwrap();
    b.place_all(vec![
        (Position::new(1, 1), PieceInstance::new(rider(), Color::WHITE)),
        (Position::new(1, 8), PieceInstance::new(rider(), Color::BLACK)),
    ])
    .unwrap();
    b
}

#[test]
fn rejected_moves_leave_no_trace() {
    let mut b = two_rider_board();
    let before = b.clone();
    // Not this side's piece.
    let mv = Move::Ordinary { from: Position::new(1, 8), to: Position::new(1, 5) };
    assert!(mv.perform(&mut b, Color::WHITE).is_err());
    assert_eq!(b, before);
    // Nothing stands there.
    let mv = Move::Ordinary { from: Position::new(4, 4), to: Position::new(4, 5) };
    assert!(mv.perform(&mut b, Color::WHITE).is_err());
    assert_eq!(b, before);
    // No movement reaches the target.
    let mv = Move::Ordinary { from: Position::new(1, 1), to: Position::new(2, 3) };
    assert!(mv.perform(&mut b, Color::WHITE).is_err());
    assert_eq!(b, before);
    // No castling is on the books.
    let mv = Move::Castling { first: Position::new(1, 1), second: Position::new(1, 8) };
    assert!(mv.perform(&mut b, Color::WHITE).is_err());
    assert_eq!(b, before);
}

#[test]
fn captures_are_reported() {
    let mut b = two_rider_board();
    let quiet = Move::Ordinary { from: Position::new(1, 1), to: Position::new(1, 5) };
    assert_eq!(quiet.perform(&mut b, Color::WHITE).unwrap(), false);
    let taking = Move::Ordinary { from: Position::new(1, 8), to: Position::new(1, 5) };
    assert_eq!(taking.perform(&mut b, Color::BLACK).unwrap(), true);
    assert!(b.piece_at(Position::new(1, 5)).is_some());
    assert_eq!(b.piece_at(Position::new(1, 5)).unwrap().color, Color::BLACK);
    assert!(b.piece_at(Position::new(1, 8)).is_none());
}
