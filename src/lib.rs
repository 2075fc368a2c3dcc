//! A rules engine for chess and its configurable cousins. Rule
//! documents choose the board size, the piece types and their movement
//! grammars, the opening placement, and the draw limits; sessions then
//! run whole games over any such rules, with histories, draw offers,
//! and a search opponent included.

/// Modeling boards, rules, games, and the search opponent.
pub mod model;
/// Text forms of positions, moves, and boards.
pub mod notation;

#[test]
fn a_parsed_game_plays_out_to_mate() {
    use crate::model::{
        moves::Move,
        ruleset::RuleSet,
        session::{self, GameSession},
    };
    use crate::notation::Parsable;

    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    for text in ["f2 f3", "e7 e5", "g2 g4"] {
        let mv = Move::parse_text(text).unwrap();
        assert!(!game.play(mv).unwrap());
    }
    let mate = Move::parse_text("d8 h4").unwrap();
    assert!(game.play(mate).unwrap());
    assert_eq!(game.result(), session::BLACK_WIN);
    assert_eq!(game.log().last().unwrap().outcome, "CHECKMATE");
}
