//! # Movement descriptors.
//!
//! A piece's movement table is a list of descriptors. Each descriptor
//! pairs a row axis with a column axis, says whether the movement may
//! or must capture, and whether it leaps over occupied squares. Axes
//! with two-way families are split into one-way halves before a board
//! resolves them; a split descriptor whose axes are both families scans
//! both axes in lockstep, which is what makes it a diagonal.

use strum::EnumIs;

use crate::model::{
    CaptureMode, Delta, JumpMode,
    error::{GameError, GameResult},
};

/// One way a piece may move. Descriptors are written down for white;
/// boards mirror them for black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Motion {
    pub row: Delta,
    pub col: Delta,
    pub capture: CaptureMode,
    pub jump: JumpMode,
}

/// Resolution category of a movement descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum Shape {
    /// One axis pinned to zero; resolves along a rank or file.
    Straight,
    /// Equal travel on both axes; resolves along a diagonal.
    Diagonal,
    /// Unequal travel on both axes; resolves as a leap.
    Combined,
}

impl Motion {
    /// A checked descriptor. Rejects the descriptors no board could
    /// resolve sensibly, see [`Motion::validate`].
    pub fn new(row: Delta, col: Delta, capture: CaptureMode, jump: JumpMode) -> GameResult<Self> {
        let m = Self { row, col, capture, jump };
        m.validate()?;
        Ok(m)
    }

    /// Which category this descriptor resolves under.
    pub fn classify(self) -> Shape {
        match (self.row, self.col) {
            (Delta::Fixed(0), _) | (_, Delta::Fixed(0)) => Shape::Straight,
            (Delta::Fixed(r), Delta::Fixed(c)) => {
                if r.unsigned_abs() == c.unsigned_abs() {
                    Shape::Diagonal
                } else {
                    Shape::Combined
                }
            }
            (Delta::Fixed(_), _) | (_, Delta::Fixed(_)) => Shape::Combined,
            _ => Shape::Diagonal,
        }
    }

    /// Check the descriptor invariants: the piece must actually move,
    /// fixed displacements must fit on a board, and combined movements
    /// must leap cleanly since no squares lie "between" their endpoints.
    pub fn validate(self) -> GameResult<()> {
        if self.row == Delta::Fixed(0) && self.col == Delta::Fixed(0) {
            return Err(GameError::ruleset("a movement must displace the piece"));
        }
        for d in [self.row, self.col] {
            if let Delta::Fixed(n) = d {
                if n.unsigned_abs() > 15 {
                    return Err(GameError::ruleset(format!(
                        "displacement {n} exceeds any board"
                    )));
                }
            }
        }
        if self.classify().is_combined() && self.jump != JumpMode::Jump {
            return Err(GameError::ruleset(
                "a combined movement must jump, without capturing along the way",
            ));
        }
        Ok(())
    }

    /// The descriptor as seen from the other side of the board.
    pub fn mirrored(self) -> Self {
        Self {
            row: self.row.mirrored(),
            col: self.col.mirrored(),
            ..self
        }
    }

    /// Expand two-way axes into every one-way combination. Yields one,
    /// two, or four descriptors, each resolvable in a single pass.
    pub fn split(self) -> Vec<Self> {
        let (r1, r2) = self.row.split();
        let (c1, c2) = self.col.split();
        let mut out = Vec::with_capacity(4);
        for r in std::iter::once(r1).chain(r2) {
            for c in std::iter::once(c1).chain(c2) {
                out.push(Self { row: r, col: c, ..self });
            }
        }
        out
    }

    /// Whether the two descriptors can reach a common destination from
    /// a shared origin on some board. Used to prune redundant movement
    /// table entries.
    pub fn shares_destination(self, other: Self) -> bool {
        self.split()
            .into_iter()
            .any(|a| other.split().into_iter().any(|b| overlap(a, b)))
    }
}

/// Destination coordinates of one split axis as an affine form
/// `scale * k + offset` over the step count `k >= 1`. `None` for the
/// two-way family, which callers have split away.
fn ray_form(d: Delta) -> Option<(i32, i32)> {
    match d {
        Delta::Fixed(n) => Some((0, n as i32)),
        Delta::AnyPositive => Some((1, 0)),
        Delta::AnyNegative => Some((-1, 0)),
        Delta::AnySigned => None,
    }
}

/// Exact intersection test for two split descriptors, over every step
/// count either could take within the addressable range.
fn overlap(a: Motion, b: Motion) -> bool {
    let (Some(ar), Some(ac), Some(br), Some(bc)) =
        (ray_form(a.row), ray_form(a.col), ray_form(b.row), ray_form(b.col))
    else {
        return false;
    };
    for i in 1..=15i32 {
        for j in 1..=15i32 {
            if ar.0 * i + ar.1 == br.0 * j + br.1 && ac.0 * i + ac.1 == bc.0 * j + bc.1 {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
fn quiet(row: Delta, col: Delta) -> Motion {
    Motion {
        row,
        col,
        capture: CaptureMode::Optional,
        jump: JumpMode::None,
    }
}

#[test]
fn classification_covers_the_taxonomy() {
    use Delta::*;
    assert_eq!(quiet(Fixed(0), AnySigned).classify(), Shape::Straight);
    assert_eq!(quiet(AnyPositive, Fixed(0)).classify(), Shape::Straight);
    assert_eq!(quiet(Fixed(3), Fixed(0)).classify(), Shape::Straight);
    assert_eq!(quiet(AnySigned, AnySigned).classify(), Shape::Diagonal);
    assert_eq!(quiet(AnyPositive, AnyNegative).classify(), Shape::Diagonal);
    assert_eq!(quiet(Fixed(2), Fixed(-2)).classify(), Shape::Diagonal);
    assert_eq!(quiet(Fixed(2), Fixed(1)).classify(), Shape::Combined);
    assert_eq!(quiet(Fixed(12), Fixed(2)).classify(), Shape::Combined);
    assert_eq!(quiet(AnyPositive, Fixed(2)).classify(), Shape::Combined);
}

#[test]
fn combined_movements_must_leap() {
    use Delta::*;
    let err = Motion::new(Fixed(2), Fixed(1), CaptureMode::Optional, JumpMode::None);
    assert!(err.is_err());
    let err = Motion::new(Fixed(2), Fixed(1), CaptureMode::Optional, JumpMode::JumpCapture);
    assert!(err.is_err());
    let ok = Motion::new(Fixed(2), Fixed(1), CaptureMode::Optional, JumpMode::Jump);
    assert!(ok.is_ok());
    let ok = Motion::new(AnyPositive, Fixed(2), CaptureMode::Optional, JumpMode::Jump);
    assert!(ok.is_ok());
}

#[test]
fn degenerate_descriptors_are_rejected() {
    use Delta::*;
    assert!(Motion::new(Fixed(0), Fixed(0), CaptureMode::Optional, JumpMode::None).is_err());
    assert!(Motion::new(Fixed(16), Fixed(0), CaptureMode::Optional, JumpMode::None).is_err());
    assert!(Motion::new(Fixed(0), Fixed(-16), CaptureMode::Optional, JumpMode::None).is_err());
    assert!(Motion::new(Fixed(15), Fixed(0), CaptureMode::Optional, JumpMode::None).is_ok());
}

#[test]
fn splitting_expands_every_two_way_axis() {
    use Delta::*;
    assert_eq!(quiet(Fixed(1), Fixed(1)).split().len(), 1);
    assert_eq!(quiet(AnySigned, Fixed(0)).split().len(), 2);
    assert_eq!(quiet(AnySigned, AnySigned).split().len(), 4);
    let rays = quiet(AnySigned, AnySigned).split();
    assert!(rays.contains(&quiet(AnyPositive, AnyNegative)));
    assert!(rays.contains(&quiet(AnyNegative, AnyPositive)));
}

#[test]
fn mirroring_turns_the_descriptor_around() {
    use Delta::*;
    let m = quiet(Fixed(1), AnyPositive).mirrored();
    assert_eq!(m, quiet(Fixed(-1), AnyNegative));
    assert_eq!(m.mirrored(), quiet(Fixed(1), AnyPositive));
}

#[test]
fn destination_sharing_is_exact() {
    use Delta::*;
    // A one-way ray is subsumed by the two-way family along the same file.
    assert!(quiet(AnyPositive, Fixed(0)).shares_destination(quiet(AnySigned, Fixed(0))));
    // A fixed landing on a diagonal is reachable by the diagonal family.
    assert!(quiet(Fixed(3), Fixed(3)).shares_destination(quiet(AnySigned, AnySigned)));
    assert!(!quiet(Fixed(3), Fixed(2)).shares_destination(quiet(AnySigned, AnySigned)));
    // Two-digit displacements still land on the ray.
    assert!(quiet(Fixed(10), Fixed(0)).shares_destination(quiet(AnyPositive, Fixed(0))));
    // Scanning leaps with the same pinned axis overlap only when their
    // scan directions can agree.
    assert!(quiet(AnyPositive, Fixed(2)).shares_destination(quiet(Fixed(5), Fixed(2))));
    assert!(!quiet(AnyPositive, Fixed(2)).shares_destination(quiet(AnyNegative, Fixed(2))));
    // Perpendicular rays from one origin never meet again.
    assert!(!quiet(AnyPositive, Fixed(0)).shares_destination(quiet(Fixed(0), AnyPositive)));
    // A knight leap is not on any queen line.
    assert!(!quiet(Fixed(2), Fixed(1)).shares_destination(quiet(Fixed(1), Fixed(1))));
    assert!(quiet(Fixed(2), Fixed(1)).shares_destination(quiet(Fixed(2), Fixed(1))));
}
