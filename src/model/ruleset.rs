//! # Rule documents.
//!
//! A [`RuleSet`] is the validated form of a rules file: board size,
//! piece catalogue, one side's initial placement, and the two draw
//! limits. Everything a session or board needs to know about the game
//! being played comes from here, so validation happens once, up front,
//! and the rest of the crate trusts the result.

use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use tracing::warn;

use crate::model::{
    CaptureMode, Delta, JumpMode,
    error::{GameError, GameResult},
    motion::Motion,
    piece::{CastlingRule, PieceType},
};

/// Hard ceiling on the piece catalogue, inherited from the rules file
/// format.
pub const MAX_PIECE_TYPES: usize = 25;

/// A validated rule document.
///
/// The fields are public for reading; build one through [`RuleSet::new`]
/// so the cross-checks below have run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    /// Where the rules came from, echoed into session snapshots.
    pub source: String,
    pub rows: u8,
    pub cols: u8,
    /// Name of the royal type, the piece checks and mates are about.
    pub royal: String,
    /// Piece catalogue in declaration order.
    pub types: IndexMap<String, Arc<PieceType>>,
    /// White's initial placement, walked row-major from white's left
    /// corner. Empty names leave their square vacant. Black receives the
    /// same placement mirrored.
    pub placement: Vec<String>,
    /// Consecutive checks by one side that force a draw.
    pub check_limit: u32,
    /// Turns without a capture that force a draw.
    pub idle_limit: u32,
}

impl RuleSet {
    /// Validate a rule document and build the catalogue.
    ///
    /// Movement tables are pruned on the way in: an entry that can only
    /// reach squares an earlier entry already reaches is dropped with a
    /// warning, and first-move entries already covered by the standing
    /// table are dropped quietly.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: impl Into<String>,
        rows: u8,
        cols: u8,
        royal: impl Into<String>,
        types: Vec<PieceType>,
        placement: Vec<String>,
        check_limit: u32,
        idle_limit: u32,
    ) -> GameResult<Self> {
        let source = source.into();
        let royal = royal.into();

        if !(4..=16).contains(&rows) || !(4..=16).contains(&cols) {
            return Err(GameError::ruleset(format!(
                "boards run 4 to 16 squares per side, got {cols}x{rows}"
            )));
        }
        if check_limit <= 1 || idle_limit <= 1 {
            return Err(GameError::ruleset(
                "the check and inactivity limits must both exceed one",
            ));
        }
        if types.is_empty() {
            return Err(GameError::ruleset("at least one piece type is required"));
        }
        if types.len() > MAX_PIECE_TYPES {
            return Err(GameError::ruleset(format!(
                "at most {MAX_PIECE_TYPES} piece types are supported, got {}",
                types.len()
            )));
        }

        let mut table: IndexMap<String, Arc<PieceType>> = IndexMap::with_capacity(types.len());
        for mut t in types {
            for m in t.motions.iter().chain(&t.initial_motions) {
                m.validate()?;
            }
            if t.value == 0 {
                return Err(GameError::ruleset(format!(
                    "piece type {} needs a positive value",
                    t.name
                )));
            }
            if t.name == royal {
                if t.invulnerable {
                    return Err(GameError::ruleset("the royal type may not be invulnerable"));
                }
                if t.promotable {
                    return Err(GameError::ruleset("the royal type may not promote"));
                }
            }
            t.motions = prune_overlaps(&t.name, t.motions);
            t.initial_motions = prune_overlaps(&t.name, t.initial_motions);
            {
                let standing = &t.motions;
                t.initial_motions
                    .retain(|m| !standing.iter().any(|k| k.shares_destination(*m)));
            }
            if t.motions.is_empty() {
                return Err(GameError::ruleset(format!(
                    "piece type {} has no movements",
                    t.name
                )));
            }
            let name = t.name.clone();
            if table.insert(name.clone(), Arc::new(t)).is_some() {
                return Err(GameError::ruleset(format!(
                    "piece type {name} is declared twice"
                )));
            }
        }

        let Some(crown) = table.get(&royal).map(|t| t.value) else {
            return Err(GameError::ruleset(format!(
                "royal type {royal} is not declared"
            )));
        };
        for (name, t) in &table {
            if *name != royal && t.value >= crown {
                return Err(GameError::ruleset(format!(
                    "the royal type must strictly outrank {name} in value"
                )));
            }
        }
        for (name, t) in &table {
            for (partner, rule) in &t.castlings {
                if rule.first != *name && rule.second != *name {
                    return Err(GameError::ruleset(format!(
                        "castling rule on {name} does not involve it"
                    )));
                }
                let other = if rule.first == *name { &rule.second } else { &rule.first };
                if other != partner {
                    return Err(GameError::ruleset(format!(
                        "castling rule on {name} is keyed by {partner} but names {other}"
                    )));
                }
                if !table.contains_key(other.as_str()) {
                    return Err(GameError::ruleset(format!(
                        "castling on {name} names unknown type {other}"
                    )));
                }
                // The board builds its castling cache from each piece's
                // own table, so the pair must agree on the rule.
                if table.get(other.as_str()).and_then(|p| p.castlings.get(name.as_str()))
                    != Some(rule)
                {
                    return Err(GameError::ruleset(format!(
                        "castling between {name} and {other} must be declared identically on both types"
                    )));
                }
            }
        }

        let squares = rows as usize * cols as usize;
        if placement.len() > squares {
            return Err(GameError::ruleset("the placement list walks off the board"));
        }
        let mut royals = 0usize;
        let mut soldiers = 0usize;
        for n in &placement {
            if n.is_empty() {
                continue;
            }
            if !table.contains_key(n.as_str()) {
                return Err(GameError::ruleset(format!(
                    "the placement names unknown type {n}"
                )));
            }
            if *n == royal { royals += 1 } else { soldiers += 1 }
        }
        if royals != 1 {
            return Err(GameError::ruleset(format!(
                "the placement must field exactly one royal piece, got {royals}"
            )));
        }
        if squares <= 2 * soldiers {
            return Err(GameError::ruleset("the two armies do not fit on the board"));
        }

        Ok(Self {
            source,
            rows,
            cols,
            royal,
            types: table,
            placement,
            check_limit,
            idle_limit,
        })
    }

    /// Look up a piece type by name.
    #[inline]
    pub fn kind(&self, name: &str) -> Option<&Arc<PieceType>> {
        self.types.get(name)
    }

    #[inline]
    pub fn squares(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Names a promoting piece may choose from, in declaration order.
    /// The royal type is never on offer.
    pub fn promotion_names(&self) -> Vec<String> {
        self.types
            .keys()
            .filter(|n| **n != self.royal)
            .cloned()
            .collect()
    }

    /// Orthodox chess on an 8x8 board: the six familiar piece types,
    /// king-rook castling both ways, a three-check perpetual limit and
    /// a fifty-turn inactivity limit.
    pub fn standard() -> &'static Self {
        static STANDARD: LazyLock<RuleSet> = LazyLock::new(RuleSet::build_standard);
        &STANDARD
    }

    // The preset data is known-good by the round trip through `new` in
    // the tests below, so the static builds it without re-validation.
    fn build_standard() -> Self {
        let mut types = IndexMap::new();
        for t in Self::standard_types() {
            types.insert(t.name.clone(), Arc::new(t));
        }
        Self {
            source: "standard-chess".into(),
            rows: 8,
            cols: 8,
            royal: "KING".into(),
            types,
            placement: standard_placement(),
            check_limit: 3,
            idle_limit: 50,
        }
    }

    fn standard_types() -> Vec<PieceType> {
        use Delta::{AnySigned, Fixed};

        let step = |row: i8, col: i8| Motion {
            row: Fixed(row),
            col: Fixed(col),
            capture: CaptureMode::Optional,
            jump: JumpMode::None,
        };
        let leap = |row: i8, col: i8| Motion {
            row: Fixed(row),
            col: Fixed(col),
            capture: CaptureMode::Optional,
            jump: JumpMode::Jump,
        };
        let slide = |row: Delta, col: Delta| Motion {
            row,
            col,
            capture: CaptureMode::Optional,
            jump: JumpMode::None,
        };
        let advance = |row: i8| Motion {
            row: Fixed(row),
            col: Fixed(0),
            capture: CaptureMode::None,
            jump: JumpMode::None,
        };
        let strike = |col: i8| Motion {
            row: Fixed(1),
            col: Fixed(col),
            capture: CaptureMode::Mandatory,
            jump: JumpMode::None,
        };
        let plain = |name: &str, symbol: char, value: u32, motions: Vec<Motion>| PieceType {
            name: name.into(),
            symbol,
            value,
            motions,
            initial_motions: Vec::new(),
            promotable: false,
            invulnerable: false,
            castlings: IndexMap::new(),
        };

        let tower_accord = CastlingRule {
            first: "KING".into(),
            second: "ROOK".into(),
            unmoved_only: true,
            clear_between: true,
        };

        let mut pawn = plain("PAWN", 'P', 1, vec![advance(1), strike(1), strike(-1)]);
        pawn.initial_motions = vec![advance(2)];
        pawn.promotable = true;

        let knight = plain(
            "KNIGHT",
            'N',
            3,
            vec![
                leap(2, 1),
                leap(2, -1),
                leap(-2, 1),
                leap(-2, -1),
                leap(1, 2),
                leap(1, -2),
                leap(-1, 2),
                leap(-1, -2),
            ],
        );
        let bishop = plain("BISHOP", 'B', 3, vec![slide(AnySigned, AnySigned)]);

        let mut rook = plain(
            "ROOK",
            'R',
            5,
            vec![slide(AnySigned, Fixed(0)), slide(Fixed(0), AnySigned)],
        );
        rook.castlings.insert("KING".into(), tower_accord.clone());

        let queen = plain(
            "QUEEN",
            'Q',
            9,
            vec![
                slide(AnySigned, Fixed(0)),
                slide(Fixed(0), AnySigned),
                slide(AnySigned, AnySigned),
            ],
        );

        let mut king = plain(
            "KING",
            'K',
            20,
            vec![
                step(1, 0),
                step(1, 1),
                step(0, 1),
                step(-1, 1),
                step(-1, 0),
                step(-1, -1),
                step(0, -1),
                step(1, -1),
            ],
        );
        king.castlings.insert("ROOK".into(), tower_accord);

        vec![pawn, knight, bishop, rook, queen, king]
    }
}

/// Drop every movement that only reaches squares an earlier entry of
/// the same list already reaches.
fn prune_overlaps(name: &str, motions: Vec<Motion>) -> Vec<Motion> {
    let mut kept: Vec<Motion> = Vec::with_capacity(motions.len());
    for m in motions {
        if let Some(prior) = kept.iter().find(|k| k.shares_destination(m)) {
            warn!(
                piece = %name,
                kept = ?prior,
                dropped = ?m,
                "movement overlaps an earlier entry, dropping it"
            );
        } else {
            kept.push(m);
        }
    }
    kept
}

fn standard_placement() -> Vec<String> {
    [
        "ROOK", "KNIGHT", "BISHOP", "QUEEN", "KING", "BISHOP", "KNIGHT", "ROOK", "PAWN", "PAWN",
        "PAWN", "PAWN", "PAWN", "PAWN", "PAWN", "PAWN",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
fn simple_rules(types: Vec<PieceType>, placement: Vec<String>) -> GameResult<RuleSet> {
    RuleSet::new("test", 8, 8, "KING", types, placement, 3, 50)
}

#[cfg(test)]
fn tower(name: &str, value: u32) -> PieceType {
    PieceType {
        name: name.into(),
        symbol: 'T',
        value,
        motions: vec![Motion {
            row: Delta::AnySigned,
            col: Delta::Fixed(0),
            capture: CaptureMode::Optional,
            jump: JumpMode::None,
        }],
        initial_motions: Vec::new(),
        promotable: false,
        invulnerable: false,
        castlings: IndexMap::new(),
    }
}

#[cfg(test)]
fn small_army() -> Vec<String> {
    ["TOWER", "KING", "TOWER"].iter().map(|s| s.to_string()).collect()
}

#[test]
fn the_standard_preset_passes_its_own_validation() {
    let rebuilt = RuleSet::new(
        "standard-chess",
        8,
        8,
        "KING",
        RuleSet::standard_types(),
        standard_placement(),
        3,
        50,
    )
    .unwrap();
    assert_eq!(&rebuilt, RuleSet::standard());
    assert_eq!(rebuilt.types.len(), 6);
    assert_eq!(rebuilt.kind("PAWN").unwrap().initial_motions.len(), 1);
    assert!(rebuilt.kind("KING").unwrap().castlings.contains_key("ROOK"));
}

#[test]
fn board_dimensions_are_bounded() {
    let t = vec![tower("TOWER", 5), tower("KING", 9)];
    assert!(RuleSet::new("t", 3, 8, "KING", t.clone(), small_army(), 3, 50).is_err());
    assert!(RuleSet::new("t", 8, 17, "KING", t.clone(), small_army(), 3, 50).is_err());
    assert!(RuleSet::new("t", 4, 4, "KING", t, small_army(), 3, 50).is_ok());
}

#[test]
fn draw_limits_must_exceed_one() {
    let t = vec![tower("TOWER", 5), tower("KING", 9)];
    assert!(RuleSet::new("t", 8, 8, "KING", t.clone(), small_army(), 1, 50).is_err());
    assert!(RuleSet::new("t", 8, 8, "KING", t, small_army(), 3, 1).is_err());
}

#[test]
fn duplicate_and_worthless_types_are_rejected() {
    let dup = vec![tower("TOWER", 5), tower("TOWER", 4), tower("KING", 9)];
    assert!(simple_rules(dup, small_army()).is_err());
    let zero = vec![tower("TOWER", 0), tower("KING", 9)];
    assert!(simple_rules(zero, small_army()).is_err());
}

#[test]
fn royal_constraints_hold() {
    // Not declared at all.
    assert!(simple_rules(vec![tower("TOWER", 5)], small_army()).is_err());
    // Must strictly outrank everyone.
    let level = vec![tower("TOWER", 9), tower("KING", 9)];
    assert!(simple_rules(level, small_army()).is_err());
    // May not be invulnerable.
    let mut armored = vec![tower("TOWER", 5), tower("KING", 9)];
    armored[1].invulnerable = true;
    assert!(simple_rules(armored, small_army()).is_err());
    // May not promote.
    let mut climbing = vec![tower("TOWER", 5), tower("KING", 9)];
    climbing[1].promotable = true;
    assert!(simple_rules(climbing, small_army()).is_err());
}

#[test]
fn castling_rules_bind_both_partners() {
    let accord = |first: &str, second: &str| CastlingRule {
        first: first.into(),
        second: second.into(),
        unmoved_only: true,
        clear_between: true,
    };
    let mut mutual = vec![tower("TOWER", 5), tower("KING", 9)];
    mutual[0].castlings.insert("KING".into(), accord("KING", "TOWER"));
    mutual[1].castlings.insert("TOWER".into(), accord("KING", "TOWER"));
    assert!(simple_rules(mutual, small_army()).is_ok());

    // Declared on one type only.
    let mut lone = vec![tower("TOWER", 5), tower("KING", 9)];
    lone[1].castlings.insert("TOWER".into(), accord("KING", "TOWER"));
    assert!(simple_rules(lone, small_army()).is_err());

    // Partner type nobody declared.
    let mut ghostly = vec![tower("TOWER", 5), tower("KING", 9)];
    ghostly[1].castlings.insert("GHOST".into(), accord("KING", "GHOST"));
    assert!(simple_rules(ghostly, small_army()).is_err());

    // Keyed by one name, naming another.
    let mut confused = vec![tower("TOWER", 5), tower("KING", 9)];
    confused[1].castlings.insert("TOWER".into(), accord("KING", "KING"));
    assert!(simple_rules(confused, small_army()).is_err());
}

#[test]
fn the_catalogue_is_capped() {
    let mut crowd: Vec<PieceType> = (0..MAX_PIECE_TYPES)
        .map(|i| tower(&format!("T{i}"), 1))
        .collect();
    crowd.push(tower("KING", 9));
    let placement: Vec<String> = ["T0", "KING", "T1"].iter().map(|s| s.to_string()).collect();
    assert!(RuleSet::new("t", 8, 8, "KING", crowd, placement, 3, 50).is_err());
}

#[test]
fn a_piece_must_keep_at_least_one_movement() {
    let mut lame = vec![tower("TOWER", 5), tower("KING", 9)];
    lame[0].motions = Vec::new();
    assert!(simple_rules(lame, small_army()).is_err());
}

#[test]
fn overlapping_movements_are_pruned() {
    use Delta::{AnyPositive, AnySigned, Fixed};
    let slide = |row, col| Motion {
        row,
        col,
        capture: CaptureMode::Optional,
        jump: JumpMode::None,
    };
    let mut t = vec![tower("TOWER", 5), tower("KING", 9)];
    // The one-way file ray is inside the two-way one and must go.
    t[0].motions = vec![slide(AnySigned, Fixed(0)), slide(AnyPositive, Fixed(0))];
    // A first-move entry covered by the standing table goes quietly.
    t[0].initial_motions = vec![slide(AnyPositive, Fixed(0)), slide(Fixed(0), AnySigned)];
    let rules = simple_rules(t, small_army()).unwrap();
    let kept = rules.kind("TOWER").unwrap();
    assert_eq!(kept.motions.len(), 1);
    assert_eq!(kept.initial_motions.len(), 1);
    assert_eq!(kept.initial_motions[0], slide(Fixed(0), AnySigned));
}

#[test]
fn placement_lists_are_checked() {
    let t = || vec![tower("TOWER", 5), tower("KING", 9)];
    let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert!(simple_rules(t(), names(&["GHOST", "KING"])).is_err());
    assert!(simple_rules(t(), names(&["KING", "TOWER", "KING"])).is_err());
    // A bare royal pair is a legal, if dull, army.
    assert!(simple_rules(t(), names(&["KING"])).is_ok());
    assert!(simple_rules(t(), names(&["TOWER", "", "KING"])).is_ok());
    // Sixty-five entries cannot walk an 8x8 board.
    let long = vec![String::new(); 65];
    assert!(simple_rules(t(), long).is_err());
    // Thirty-two escorts a side leave no breathing room on sixty-four
    // squares; thirty-one still pass.
    let mut packed = names(&["KING"]);
    packed.extend(std::iter::repeat_n("TOWER".to_string(), 32));
    assert!(simple_rules(t(), packed.clone()).is_err());
    packed.pop();
    assert!(simple_rules(t(), packed).is_ok());
}

#[test]
fn promotion_names_skip_the_royal_type() {
    let names = RuleSet::standard().promotion_names();
    assert_eq!(names, ["PAWN", "KNIGHT", "BISHOP", "ROOK", "QUEEN"]);
}
