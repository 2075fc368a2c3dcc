//! # Game sessions.
//!
//! A session owns the authoritative board and everything that makes a
//! game more than a position: whose turn it is, the draw counters, the
//! move log, the undo and redo histories, and the final result once
//! there is one. Play flows through here; the board only ever sees
//! moves the session has accepted, and every accepted action leaves
//! exactly one snapshot behind it, so undo and redo are whole-state
//! swaps rather than move inversion.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs};
use tracing::debug;

use crate::model::{
    Color, Position,
    agent::SearchAgent,
    board::{Board, RoyalState},
    error::{GameError, GameResult},
    moves::Move,
    piece::PieceInstance,
    ruleset::RuleSet,
};

/// Result text for a game white won.
pub const WHITE_WIN: &str = "WHITE WIN";
/// Result text for a game black won.
pub const BLACK_WIN: &str = "BLACK WIN";
/// Result text for a drawn game, whatever brought the draw about.
pub const DRAW: &str = "DRAW";
/// Result text for a game suspended by adjournment.
pub const ADJOURNED: &str = "GAME ADJOURNED";

/// Where in its lifecycle a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum Phase {
    /// The player to move may play, offer a draw, resign, or adjourn.
    InProgress,
    /// A draw offer awaits the answer of the player to move.
    DrawOfferPending,
    /// The game is over; the result text says how.
    Finished,
}

/// The turn actions that move no piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum SpecialAction {
    /// Propose a draw and pass play to the opponent for an answer.
    OfferDraw,
    /// Agree to the standing draw offer, ending the game.
    AcceptDraw,
    /// Turn the standing draw offer down. The offer is erased from the
    /// log and the history, as if it had never been made.
    DeclineDraw,
    /// Suspend the game, to be taken up again another day.
    Adjourn,
    /// Concede the game to the opponent.
    Resign,
}

/// How one move or action affected the game. The display form is the
/// label written into the move log, empty for a move that changed
/// nothing but the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs, Display)]
pub enum Outcome {
    #[strum(to_string = "")]
    Quiet,
    #[strum(to_string = "CHECK")]
    Check,
    #[strum(to_string = "CHECKMATE")]
    Checkmate,
    #[strum(to_string = "DRAW BY STALEMATE")]
    SmotheredDraw,
    #[strum(to_string = "DRAW BY INACTIVITY")]
    InactivityDraw,
    #[strum(to_string = "DRAW BY PERPETUAL CHECK")]
    PerpetualDraw,
    #[strum(to_string = "DRAW OFFERED")]
    DrawOffered,
    #[strum(to_string = "DRAW ACCEPTED")]
    DrawAccepted,
    #[strum(to_string = "ADJOURNMENT")]
    Adjournment,
    #[strum(to_string = "RESIGNATION")]
    Resignation,
}

/// One line of the move log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Who acted.
    pub turn: Color,
    /// Origin square, both origins as `e1 - h1` for a castling, or
    /// empty for a special action.
    pub origin: String,
    /// Target square, with the same castling and special-action shapes;
    /// a castling's targets are the landing squares.
    pub target: String,
    /// Outcome label, carrying an `OLD-NEW` annotation once the move's
    /// promotion is settled.
    pub outcome: String,
}

/// One initially placed piece, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub position: String,
    pub kind: String,
    pub moved: bool,
}

/// Everything a host needs to write a game down and set it up again.
/// The session is only concerned with the content; encoding it to some
/// file format is the host's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// The `source` reference of the rules the game runs under.
    pub rules: String,
    pub white_placement: Vec<PlacementRecord>,
    pub black_placement: Vec<PlacementRecord>,
    /// Who had the first turn.
    pub opening_turn: Color,
    /// The moves still standing, oldest first; undone moves are gone.
    pub turns: Vec<TurnRecord>,
    /// Final result text, empty while the game is unfinished.
    pub result: String,
}

/// The per-turn mutable state. Undo and redo swap the whole thing, so
/// anything a turn may change has to live here.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionState {
    board: Board,
    turn: Color,
    /// Consecutive checks delivered, indexed by the checking color.
    checks: [u32; 2],
    /// Turns played since the last capture.
    idle_turns: u32,
    phase: Phase,
    result: String,
}

/// A live game: the current state, the rules it runs under, and the
/// stacks of prior states and log records that back undo and redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    rules: RuleSet,
    current: SessionState,
    past: Vec<SessionState>,
    future: VecDeque<SessionState>,
    log_past: Vec<TurnRecord>,
    log_future: VecDeque<TurnRecord>,
    opening: Color,
    placed: Vec<(Position, String, Color, bool)>,
}

impl GameSession {
    /// A fresh game under `rules`: the arrangement list is dealt out
    /// symmetrically to both sides and white opens.
    pub fn new(rules: RuleSet) -> GameResult<Self> {
        let mut session = Self::bare(rules, Color::WHITE)?;
        session.place_opening()?;
        Ok(session)
    }

    /// Resume a game from explicit placements, each piece with its
    /// square, type name, color, and moved flag. `turn` opens.
    pub fn resume(
        rules: RuleSet,
        placements: impl IntoIterator<Item = (Position, String, Color, bool)>,
        turn: Color,
    ) -> GameResult<Self> {
        let mut session = Self::bare(rules, turn)?;
        let mut royals = [0usize; 2];
        let mut pieces = Vec::new();
        for (pos, name, color, moved) in placements {
            let Some(kind) = session.rules.kind(&name) else {
                return Err(GameError::ruleset(format!(
                    "the placement names unknown type {name}"
                )));
            };
            if name == session.rules.royal {
                royals[color.ix()] += 1;
            }
            let mut piece = PieceInstance::new(kind.clone(), color);
            piece.moved = moved;
            session.placed.push((pos, name, color, moved));
            pieces.push((pos, piece));
        }
        if royals != [1, 1] {
            return Err(GameError::ruleset(
                "each side must field exactly one royal piece",
            ));
        }
        session.current.board.place_all(pieces)?;
        Ok(session)
    }

    fn bare(rules: RuleSet, turn: Color) -> GameResult<Self> {
        let board = Board::new(rules.rows, rules.cols, rules.royal.clone())?;
        Ok(Self {
            rules,
            current: SessionState {
                board,
                turn,
                checks: [0; 2],
                idle_turns: 0,
                phase: Phase::InProgress,
                result: String::new(),
            },
            past: Vec::new(),
            future: VecDeque::new(),
            log_past: Vec::new(),
            log_future: VecDeque::new(),
            opening: turn,
            placed: Vec::new(),
        })
    }

    /// Walk the arrangement names across the board from white's left
    /// corner, columns first, placing each name for white where the
    /// walk stands and for black on the mirrored rank.
    fn place_opening(&mut self) -> GameResult<()> {
        let rows = self.rules.rows;
        let cols = self.rules.cols;
        let mut pieces = Vec::new();
        let (mut col, mut row) = (1u8, 1u8);
        for name in &self.rules.placement {
            if !name.is_empty() {
                let Some(kind) = self.rules.types.get(name) else {
                    return Err(GameError::ruleset(format!(
                        "the placement names unknown type {name}"
                    )));
                };
                pieces.push((
                    Position::new(col, row),
                    PieceInstance::new(kind.clone(), Color::WHITE),
                ));
                pieces.push((
                    Position::new(col, rows - row + 1),
                    PieceInstance::new(kind.clone(), Color::BLACK),
                ));
            }
            col += 1;
            if col > cols {
                col = 1;
                row += 1;
            }
        }
        for (pos, piece) in &pieces {
            self.placed
                .push((*pos, piece.kind.name.clone(), piece.color, piece.moved));
        }
        self.current.board.place_all(pieces)
    }

    /// The rules this game runs under.
    #[inline]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The authoritative board.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.current.board
    }

    /// Whose turn it is.
    #[inline]
    pub fn turn(&self) -> Color {
        self.current.turn
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.current.phase
    }

    /// Final result text, empty while the game is unfinished.
    #[inline]
    pub fn result(&self) -> &str {
        &self.current.result
    }

    /// The move log as it stands, oldest record first.
    #[inline]
    pub fn log(&self) -> &[TurnRecord] {
        &self.log_past
    }

    /// Legal landing squares of the piece on `pos`, for suggesting
    /// moves to a player. Empty when the square is empty.
    pub fn destinations_of(&self, pos: Position) -> Vec<Position> {
        self.current
            .board
            .destinations_from(pos)
            .map(|d| d.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Squares of the pieces `pos` may castle with right now.
    pub fn castling_partners_of(&self, pos: Position) -> Vec<Position> {
        self.current
            .board
            .castling_options(pos)
            .map(|c| c.keys().copied().collect())
            .unwrap_or_default()
    }

    /// The square awaiting a promotion choice, if the last move left
    /// one. Asking does not dismiss it.
    pub fn promotion_pending(&self) -> Option<Position> {
        self.current.board.promotion_pending()
    }

    /// Type names a promotion may choose from.
    pub fn promotion_names(&self) -> Vec<String> {
        self.rules.promotion_names()
    }

    /// Play one move for the side to move. On success the turn passes;
    /// the return says whether the game thereby ended.
    pub fn play(&mut self, mv: Move) -> GameResult<bool> {
        self.require_in_progress()?;
        let mover = self.current.turn;
        let (origin, target) = self.record_fields(mv);
        let checkpoint = self.current.clone();
        let captured = mv.perform(&mut self.current.board, mover)?;
        if captured {
            self.current.idle_turns = 0;
        } else {
            self.current.idle_turns += 1;
        }
        let (outcome, over) = self.evaluate(mover);
        self.past.push(checkpoint);
        self.future.clear();
        self.log_past.push(TurnRecord {
            turn: mover,
            origin,
            target,
            outcome: outcome.to_string(),
        });
        self.log_future.clear();
        if over {
            self.finish(outcome, mover);
        }
        self.current.turn = mover.opp();
        debug!(turn = %mover, %mv, %outcome, over, "move played");
        Ok(over)
    }

    /// Exchange the piece standing on the promotion square for a fresh
    /// one of the named type, then judge the move that put it there
    /// again, as the player who made it. The amended verdict lands on
    /// that move's log record as `OLD-NEW`.
    pub fn promote(&mut self, pos: Position, name: &str) -> GameResult<bool> {
        if self.current.phase.is_draw_offer_pending() {
            return Err(GameError::illegal("a draw offer awaits an answer"));
        }
        let Some(pending) = self.current.board.promotion_pending() else {
            return Err(GameError::illegal("no promotion is pending"));
        };
        if pending != pos {
            return Err(GameError::illegal(format!(
                "the pending promotion stands on {pending}, not {pos}"
            )));
        }
        if name == self.rules.royal {
            return Err(GameError::illegal(
                "a piece may not promote to the royal type",
            ));
        }
        let Some(kind) = self.rules.kind(name).cloned() else {
            return Err(GameError::illegal(format!("no piece type is named {name}")));
        };
        let Some(old) = self.current.board.piece_at(pos).map(|p| p.kind.name.clone()) else {
            return Err(GameError::illegal(format!("no piece stands on {pos}")));
        };
        if old == name {
            return Err(GameError::illegal(format!(
                "the piece on {pos} already is a {name}"
            )));
        }
        let Some(mover) = self.log_past.last().map(|r| r.turn) else {
            return Err(GameError::illegal("no move precedes the promotion"));
        };
        self.current.board.promote(pos, kind)?;
        // The move is being re-judged, so the check counters go back to
        // what they were before it.
        if let Some(before) = self.past.last() {
            self.current.checks = before.checks;
        }
        let (outcome, over) = self.evaluate(mover);
        let label = outcome.to_string();
        let note = format!("{old}-{name}");
        if let Some(record) = self.log_past.last_mut() {
            record.outcome = if label.is_empty() {
                note.clone()
            } else {
                format!("{label}, {note}")
            };
        }
        if over {
            self.finish(outcome, mover);
        } else {
            self.current.result.clear();
            self.current.phase = Phase::InProgress;
        }
        debug!(%pos, %note, %outcome, over, "promoted");
        Ok(over)
    }

    /// Perform a turn action that moves no piece. Returns whether the
    /// game thereby ended.
    pub fn special(&mut self, action: SpecialAction) -> GameResult<bool> {
        let actor = self.current.turn;
        let outcome = match action {
            SpecialAction::OfferDraw => {
                self.require_in_progress()?;
                Outcome::DrawOffered
            }
            SpecialAction::AcceptDraw => {
                self.require_offer_pending()?;
                Outcome::DrawAccepted
            }
            SpecialAction::DeclineDraw => {
                self.require_offer_pending()?;
                self.past.pop();
                self.log_past.pop();
                self.current.phase = Phase::InProgress;
                self.current.turn = actor.opp();
                debug!(turn = %actor, "draw offer declined");
                return Ok(false);
            }
            SpecialAction::Adjourn => {
                self.require_in_progress()?;
                Outcome::Adjournment
            }
            SpecialAction::Resign => {
                self.require_in_progress()?;
                Outcome::Resignation
            }
        };
        let over = !outcome.is_draw_offered();
        self.past.push(self.current.clone());
        self.future.clear();
        self.log_past.push(TurnRecord {
            turn: actor,
            origin: String::new(),
            target: String::new(),
            outcome: outcome.to_string(),
        });
        self.log_future.clear();
        if over {
            self.finish(outcome, actor);
        } else {
            self.current.phase = Phase::DrawOfferPending;
        }
        self.current.turn = actor.opp();
        debug!(turn = %actor, %outcome, over, "special action");
        Ok(over)
    }

    /// Step back to before the last action. The undone action waits on
    /// the redo side until a new one replaces it.
    pub fn undo(&mut self) -> GameResult<()> {
        let (Some(state), Some(record)) = (self.past.pop(), self.log_past.pop()) else {
            return Err(GameError::NothingToUndo);
        };
        let now = std::mem::replace(&mut self.current, state);
        self.future.push_front(now);
        self.log_future.push_front(record);
        debug!("turn undone");
        Ok(())
    }

    /// Step forward again over the last undone action.
    pub fn redo(&mut self) -> GameResult<()> {
        let (Some(state), Some(record)) = (self.future.pop_front(), self.log_future.pop_front())
        else {
            return Err(GameError::NothingToRedo);
        };
        let now = std::mem::replace(&mut self.current, state);
        self.past.push(now);
        self.log_past.push(record);
        debug!("turn redone");
        Ok(())
    }

    /// Let `agent` take the current turn: it picks a move on a private
    /// copy of the board, the session plays it, and any promotion the
    /// move leaves behind goes back to the agent to settle. An agent
    /// that keeps the promoting piece's type dismisses the promotion.
    pub fn play_engine_turn(&mut self, agent: &mut SearchAgent) -> GameResult<bool> {
        self.require_in_progress()?;
        let color = self.current.turn;
        let scout = self.current.board.clone();
        let Some(mv) = agent.choose_move(&scout, color) else {
            return Err(GameError::illegal(format!("{color} has no move to play")));
        };
        let mut over = self.play(mv)?;
        if let Some(pos) = self.current.board.promotion_pending() {
            let Some(old) = self.current.board.piece_at(pos).map(|p| p.kind.name.clone()) else {
                return Err(GameError::illegal(format!("no piece stands on {pos}")));
            };
            let candidates: Vec<_> = self
                .rules
                .types
                .values()
                .filter(|k| k.name != self.rules.royal)
                .cloned()
                .collect();
            let scout = self.current.board.clone();
            match agent.choose_promotion(&scout, pos, &candidates, color) {
                Some(name) if name != old => over = self.promote(pos, &name)?,
                _ => self.current.board.clear_promotion(),
            }
        }
        Ok(over)
    }

    /// Let `agent` answer the standing draw offer on a private copy of
    /// the board, and perform whichever answer it gives.
    pub fn respond_draw(&mut self, agent: &SearchAgent) -> GameResult<bool> {
        self.require_offer_pending()?;
        let color = self.current.turn;
        let scout = self.current.board.clone();
        let action = if agent.decide_draw(&scout, color) {
            SpecialAction::AcceptDraw
        } else {
            SpecialAction::DeclineDraw
        };
        self.special(action)
    }

    /// The persistable view of the game: the rules reference, both
    /// sides' initial placement, the opening turn, the standing move
    /// log, and the result so far.
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut white_placement = Vec::new();
        let mut black_placement = Vec::new();
        for (pos, name, color, moved) in &self.placed {
            let record = PlacementRecord {
                position: pos.to_string(),
                kind: name.clone(),
                moved: *moved,
            };
            match color {
                Color::WHITE => white_placement.push(record),
                Color::BLACK => black_placement.push(record),
            }
        }
        SessionSnapshot {
            rules: self.rules.source.clone(),
            white_placement,
            black_placement,
            opening_turn: self.opening,
            turns: self.log_past.clone(),
            result: self.current.result.clone(),
        }
    }

    /// Classify the position `mover` just left behind, bumping the draw
    /// counters on the way, and say whether it ends the game. The
    /// inactivity limit is tested before the board is even looked at.
    fn evaluate(&mut self, mover: Color) -> (Outcome, bool) {
        if self.current.idle_turns >= self.rules.idle_limit {
            return (Outcome::InactivityDraw, true);
        }
        let (outcome, over) = match self.current.board.royal_state(mover.opp()) {
            RoyalState::Checkmate => (Outcome::Checkmate, true),
            RoyalState::Check => {
                self.current.checks[mover.ix()] += 1;
                (Outcome::Check, false)
            }
            RoyalState::Smothered => (Outcome::SmotheredDraw, true),
            RoyalState::Safe => {
                self.current.checks[mover.ix()] = 0;
                (Outcome::Quiet, false)
            }
        };
        if !over && self.current.checks.iter().any(|&c| c >= self.rules.check_limit) {
            return (Outcome::PerpetualDraw, true);
        }
        (outcome, over)
    }

    fn finish(&mut self, outcome: Outcome, mover: Color) {
        self.current.result = match outcome {
            Outcome::Checkmate => win_text(mover).into(),
            Outcome::Resignation => win_text(mover.opp()).into(),
            Outcome::Adjournment => ADJOURNED.into(),
            _ => DRAW.into(),
        };
        self.current.phase = Phase::Finished;
        debug!(result = %self.current.result, "game over");
    }

    /// The log's origin and target fields for `mv`, written down before
    /// the move is applied since a castling's landing squares come from
    /// the cache entry the move will consume.
    fn record_fields(&self, mv: Move) -> (String, String) {
        match mv {
            Move::Ordinary { from, to } => (from.to_string(), to.to_string()),
            Move::Castling { first, second } => {
                let target = self
                    .current
                    .board
                    .castling_landings(first, second)
                    .map(|(a, b)| format!("{a} - {b}"))
                    .unwrap_or_default();
                (format!("{first} - {second}"), target)
            }
        }
    }

    fn require_in_progress(&self) -> GameResult<()> {
        match self.current.phase {
            Phase::InProgress => Ok(()),
            Phase::DrawOfferPending => Err(GameError::illegal("a draw offer awaits an answer")),
            Phase::Finished => Err(GameError::illegal(format!(
                "the game is over: {}",
                self.current.result
            ))),
        }
    }

    fn require_offer_pending(&self) -> GameResult<()> {
        if self.current.phase.is_draw_offer_pending() {
            Ok(())
        } else {
            Err(GameError::illegal("no draw offer awaits an answer"))
        }
    }
}

fn win_text(color: Color) -> &'static str {
    match color {
        Color::WHITE => WHITE_WIN,
        Color::BLACK => BLACK_WIN,
    }
}

#[cfg(test)]
fn quiet_motion(row: crate::model::Delta, col: crate::model::Delta) -> crate::model::motion::Motion {
    use crate::model::{CaptureMode, JumpMode};
    crate::model::motion::Motion {
        row,
        col,
        capture: CaptureMode::Optional,
        jump: JumpMode::None,
    }
}

/// Three-piece test catalogue: a one-step royal KING, a sliding TOWER
/// that castles with the king, and a promotable forward-walking FOOT.
#[cfg(test)]
fn kit() -> Vec<crate::model::piece::PieceType> {
    use crate::model::{CaptureMode, Delta::*, JumpMode};
    use crate::model::motion::Motion;
    use crate::model::piece::{CastlingRule, PieceType};
    use indexmap::IndexMap;

    let accord = CastlingRule {
        first: "KING".into(),
        second: "TOWER".into(),
        unmoved_only: true,
        clear_between: true,
    };

    let mut king = PieceType {
        name: "KING".into(),
        symbol: 'K',
        value: 9,
        motions: vec![
            quiet_motion(Fixed(1), Fixed(0)),
            quiet_motion(Fixed(1), Fixed(1)),
            quiet_motion(Fixed(0), Fixed(1)),
            quiet_motion(Fixed(-1), Fixed(1)),
            quiet_motion(Fixed(-1), Fixed(0)),
            quiet_motion(Fixed(-1), Fixed(-1)),
            quiet_motion(Fixed(0), Fixed(-1)),
            quiet_motion(Fixed(1), Fixed(-1)),
        ],
        initial_motions: Vec::new(),
        promotable: false,
        invulnerable: false,
        castlings: IndexMap::new(),
    };
    king.castlings.insert("TOWER".into(), accord.clone());

    let mut tower = PieceType {
        name: "TOWER".into(),
        symbol: 'T',
        value: 5,
        motions: vec![
            quiet_motion(AnySigned, Fixed(0)),
            quiet_motion(Fixed(0), AnySigned),
        ],
        initial_motions: Vec::new(),
        promotable: false,
        invulnerable: false,
        castlings: IndexMap::new(),
    };
    tower.castlings.insert("KING".into(), accord);

    let foot = PieceType {
        name: "FOOT".into(),
        symbol: 'F',
        value: 1,
        motions: vec![Motion {
            row: Fixed(1),
            col: Fixed(0),
            capture: CaptureMode::None,
            jump: JumpMode::None,
        }],
        initial_motions: Vec::new(),
        promotable: true,
        invulnerable: false,
        castlings: IndexMap::new(),
    };

    vec![king, tower, foot]
}

#[cfg(test)]
fn kit_rules(check_limit: u32, idle_limit: u32) -> RuleSet {
    let placement = ["TOWER", "KING", "FOOT"].iter().map(|s| s.to_string()).collect();
    RuleSet::new("kit", 8, 8, "KING", kit(), placement, check_limit, idle_limit).unwrap()
}

#[cfg(test)]
fn place(name: &str, col: u8, row: u8, color: Color) -> (Position, String, Color, bool) {
    (Position::new(col, row), name.into(), color, false)
}

#[cfg(test)]
fn at(col: u8, row: u8) -> Position {
    Position::new(col, row)
}

#[cfg(test)]
fn ord(from: Position, to: Position) -> Move {
    Move::Ordinary { from, to }
}

#[test]
fn fresh_games_deal_both_sides_symmetrically() {
    let game = GameSession::new(RuleSet::standard().clone()).unwrap();
    assert_eq!(game.turn(), Color::WHITE);
    assert_eq!(game.phase(), Phase::InProgress);
    assert_eq!(game.result(), "");
    assert_eq!(game.board().pieces().count(), 32);
    let corner = game.board().piece_at(at(1, 1)).unwrap();
    assert_eq!(corner.kind.name, "ROOK");
    assert_eq!(corner.color, Color::WHITE);
    assert!(!corner.moved);
    let mirrored = game.board().piece_at(at(1, 8)).unwrap();
    assert_eq!(mirrored.kind.name, "ROOK");
    assert_eq!(mirrored.color, Color::BLACK);
    assert_eq!(game.board().piece_at(at(5, 1)).unwrap().kind.name, "KING");
    assert_eq!(game.board().piece_at(at(5, 8)).unwrap().kind.name, "KING");
    assert_eq!(game.board().piece_at(at(3, 2)).unwrap().kind.name, "PAWN");
}

#[test]
fn rejected_moves_change_nothing_about_the_session() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    let before = game.clone();
    // Not white's piece.
    assert!(game.play(ord(at(5, 7), at(5, 5))).is_err());
    // Empty origin.
    assert!(game.play(ord(at(5, 4), at(5, 5))).is_err());
    // No movement reaches the target.
    assert!(game.play(ord(at(5, 2), at(5, 5))).is_err());
    assert_eq!(game, before);
}

#[test]
fn a_short_game_runs_to_checkmate() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    assert!(!game.play(ord(at(6, 2), at(6, 3))).unwrap());
    assert!(!game.play(ord(at(5, 7), at(5, 5))).unwrap());
    assert!(!game.play(ord(at(7, 2), at(7, 4))).unwrap());
    // The queen falls on h4 and the white king has nowhere left.
    assert!(game.play(ord(at(4, 8), at(8, 4))).unwrap());
    assert_eq!(game.phase(), Phase::Finished);
    assert_eq!(game.result(), BLACK_WIN);
    let last = game.log().last().unwrap();
    assert_eq!(last.turn, Color::BLACK);
    assert_eq!(last.origin, "d8");
    assert_eq!(last.target, "h4");
    assert_eq!(last.outcome, "CHECKMATE");
    // Nothing more may be played.
    assert!(game.play(ord(at(2, 1), at(3, 3))).is_err());
}

#[test]
fn the_inactivity_limit_draws_before_the_board_is_inspected() {
    let rules = kit_rules(3, 2);
    let mut game = GameSession::resume(
        rules,
        [
            place("KING", 1, 1, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("TOWER", 4, 4, Color::WHITE),
            place("TOWER", 5, 5, Color::BLACK),
        ],
        Color::WHITE,
    )
    .unwrap();
    assert!(!game.play(ord(at(4, 4), at(4, 5))).unwrap());
    // Black's reply even gives check, but the idle count reaches the
    // limit first.
    assert!(game.play(ord(at(5, 5), at(5, 1))).unwrap());
    assert_eq!(game.result(), DRAW);
    assert_eq!(game.log().last().unwrap().outcome, "DRAW BY INACTIVITY");
}

#[test]
fn captures_push_the_inactivity_draw_away() {
    let rules = kit_rules(3, 2);
    let mut game = GameSession::resume(
        rules,
        [
            place("KING", 1, 1, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("TOWER", 4, 4, Color::WHITE),
            place("TOWER", 4, 6, Color::BLACK),
        ],
        Color::WHITE,
    )
    .unwrap();
    // A capture on the second-to-last allowed turn resets the count.
    assert!(!game.play(ord(at(4, 4), at(4, 6))).unwrap());
    assert!(!game.play(ord(at(8, 8), at(8, 7))).unwrap());
    assert!(game.play(ord(at(4, 6), at(4, 5))).unwrap());
    assert_eq!(game.log().last().unwrap().outcome, "DRAW BY INACTIVITY");
}

#[test]
fn repeated_checks_by_one_side_force_the_draw() {
    let rules = kit_rules(2, 50);
    let mut game = GameSession::resume(
        rules,
        [
            place("KING", 1, 1, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("TOWER", 7, 1, Color::WHITE),
        ],
        Color::WHITE,
    )
    .unwrap();
    assert!(!game.play(ord(at(7, 1), at(7, 8))).unwrap());
    assert_eq!(game.log().last().unwrap().outcome, "CHECK");
    assert!(!game.play(ord(at(8, 8), at(8, 7))).unwrap());
    // The second consecutive check by white reaches the limit.
    assert!(game.play(ord(at(7, 8), at(7, 7))).unwrap());
    assert_eq!(game.result(), DRAW);
    assert_eq!(game.log().last().unwrap().outcome, "DRAW BY PERPETUAL CHECK");
}

#[test]
fn a_walker_cannot_step_back_to_where_it_came_from() {
    let rules = kit_rules(3, 50);
    let mut game = GameSession::resume(
        rules,
        [
            place("KING", 1, 1, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("FOOT", 4, 4, Color::WHITE),
        ],
        Color::WHITE,
    )
    .unwrap();
    assert!(!game.play(ord(at(4, 4), at(4, 5))).unwrap());
    let dests = game.destinations_of(at(4, 5));
    assert!(!dests.contains(&at(4, 4)));
    assert_eq!(dests, vec![at(4, 6)]);
}

#[test]
fn draw_offers_can_be_accepted() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    assert!(!game.special(SpecialAction::OfferDraw).unwrap());
    assert_eq!(game.phase(), Phase::DrawOfferPending);
    assert_eq!(game.turn(), Color::BLACK);
    let offer = game.log().last().unwrap();
    assert_eq!(offer.turn, Color::WHITE);
    assert_eq!(offer.origin, "");
    assert_eq!(offer.outcome, "DRAW OFFERED");
    // Only an answer is allowed now.
    assert!(game.play(ord(at(5, 7), at(5, 5))).is_err());
    assert!(game.special(SpecialAction::OfferDraw).is_err());

    assert!(game.special(SpecialAction::AcceptDraw).unwrap());
    assert_eq!(game.phase(), Phase::Finished);
    assert_eq!(game.result(), DRAW);
    let accept = game.log().last().unwrap();
    assert_eq!(accept.turn, Color::BLACK);
    assert_eq!(accept.outcome, "DRAW ACCEPTED");
}

#[test]
fn declined_offers_leave_no_trace() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    game.play(ord(at(5, 2), at(5, 4))).unwrap();
    let before = game.clone();
    assert!(!game.special(SpecialAction::OfferDraw).unwrap());
    assert!(!game.special(SpecialAction::DeclineDraw).unwrap());
    assert_eq!(game, before);
    // An answer without an offer is turned away.
    assert!(game.special(SpecialAction::AcceptDraw).is_err());
    assert!(game.special(SpecialAction::DeclineDraw).is_err());
}

#[test]
fn resignation_awards_the_opponent() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    assert!(game.special(SpecialAction::Resign).unwrap());
    assert_eq!(game.result(), BLACK_WIN);
    assert_eq!(game.phase(), Phase::Finished);
    let last = game.log().last().unwrap();
    assert_eq!(last.turn, Color::WHITE);
    assert_eq!(last.outcome, "RESIGNATION");
}

#[test]
fn adjournment_suspends_with_its_own_result() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    game.play(ord(at(5, 2), at(5, 4))).unwrap();
    assert!(game.special(SpecialAction::Adjourn).unwrap());
    assert_eq!(game.result(), ADJOURNED);
    assert_eq!(game.log().last().unwrap().outcome, "ADJOURNMENT");
}

#[test]
fn undo_then_redo_restores_everything() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    game.play(ord(at(5, 2), at(5, 4))).unwrap();
    game.play(ord(at(5, 7), at(5, 5))).unwrap();
    let settled = game.clone();
    game.undo().unwrap();
    assert_ne!(game, settled);
    assert_eq!(game.turn(), Color::BLACK);
    assert_eq!(game.log().len(), 1);
    game.redo().unwrap();
    assert_eq!(game, settled);
    // Undoing everything walks back to the opening position.
    game.undo().unwrap();
    game.undo().unwrap();
    assert_eq!(game.turn(), Color::WHITE);
    assert!(game.log().is_empty());
    assert_eq!(game.board().piece_at(at(5, 2)).unwrap().kind.name, "PAWN");
}

#[test]
fn history_errors_are_explicit() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    assert!(matches!(game.undo(), Err(GameError::NothingToUndo)));
    assert!(matches!(game.redo(), Err(GameError::NothingToRedo)));
    game.play(ord(at(5, 2), at(5, 4))).unwrap();
    game.undo().unwrap();
    assert!(matches!(game.undo(), Err(GameError::NothingToUndo)));
}

#[test]
fn new_moves_erase_the_undone_future() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    game.play(ord(at(5, 2), at(5, 4))).unwrap();
    game.play(ord(at(5, 7), at(5, 5))).unwrap();
    game.undo().unwrap();
    game.play(ord(at(4, 7), at(4, 5))).unwrap();
    assert!(matches!(game.redo(), Err(GameError::NothingToRedo)));
}

#[test]
fn undoing_a_finished_game_reopens_it() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    game.special(SpecialAction::Resign).unwrap();
    assert_eq!(game.phase(), Phase::Finished);
    game.undo().unwrap();
    assert_eq!(game.phase(), Phase::InProgress);
    assert_eq!(game.result(), "");
    assert_eq!(game.turn(), Color::WHITE);
    assert!(!game.play(ord(at(5, 2), at(5, 4))).unwrap());
}

#[test]
fn castling_is_played_and_logged_with_its_landings() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    game.play(ord(at(7, 1), at(6, 3))).unwrap(); // knight out
    game.play(ord(at(1, 7), at(1, 6))).unwrap();
    game.play(ord(at(7, 2), at(7, 3))).unwrap(); // open the diagonal
    game.play(ord(at(1, 6), at(1, 5))).unwrap();
    game.play(ord(at(6, 1), at(7, 2))).unwrap(); // bishop aside
    game.play(ord(at(1, 5), at(1, 4))).unwrap();
    // The king's only castling partner is the kingside rook; the
    // queenside corridor is still full.
    assert_eq!(game.castling_partners_of(at(5, 1)), vec![at(8, 1)]);
    assert!(!game
        .play(Move::Castling { first: at(5, 1), second: at(8, 1) })
        .unwrap());
    let king = game.board().piece_at(at(7, 1)).unwrap();
    assert_eq!(king.kind.name, "KING");
    assert!(king.moved);
    assert_eq!(game.board().piece_at(at(6, 1)).unwrap().kind.name, "ROOK");
    let last = game.log().last().unwrap();
    assert_eq!(last.origin, "e1 - h1");
    assert_eq!(last.target, "g1 - f1");
    assert_eq!(last.outcome, "");
}

#[test]
fn promotion_is_validated_settled_and_logged() {
    let rules = kit_rules(3, 50);
    let mut game = GameSession::resume(
        rules,
        [
            place("KING", 5, 1, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("FOOT", 1, 7, Color::WHITE),
        ],
        Color::WHITE,
    )
    .unwrap();
    assert!(!game.play(ord(at(1, 7), at(1, 8))).unwrap());
    // Asking twice dismisses nothing.
    assert_eq!(game.promotion_pending(), Some(at(1, 8)));
    assert_eq!(game.promotion_pending(), Some(at(1, 8)));
    assert_eq!(game.promotion_names(), vec!["TOWER", "FOOT"]);

    assert!(game.promote(at(2, 8), "TOWER").is_err());
    assert!(game.promote(at(1, 8), "GHOST").is_err());
    assert!(game.promote(at(1, 8), "KING").is_err());
    assert!(game.promote(at(1, 8), "FOOT").is_err());
    assert_eq!(game.promotion_pending(), Some(at(1, 8)));

    // The fresh tower checks along the back rank, so the move's record
    // is re-judged on top of the promotion note.
    assert!(!game.promote(at(1, 8), "TOWER").unwrap());
    let crowned = game.board().piece_at(at(1, 8)).unwrap();
    assert_eq!(crowned.kind.name, "TOWER");
    assert_eq!(crowned.color, Color::WHITE);
    assert!(crowned.moved);
    assert_eq!(game.promotion_pending(), None);
    assert_eq!(game.log().last().unwrap().outcome, "CHECK, FOOT-TOWER");
    assert!(matches!(
        game.promote(at(1, 8), "FOOT"),
        Err(GameError::IllegalMove(_))
    ));

    // Black answers the check as usual.
    assert!(!game.play(ord(at(8, 8), at(8, 7))).unwrap());
}

#[test]
fn snapshots_carry_the_whole_story() {
    let mut game = GameSession::new(RuleSet::standard().clone()).unwrap();
    game.play(ord(at(5, 2), at(5, 4))).unwrap();
    game.play(ord(at(5, 7), at(5, 5))).unwrap();
    let snap = game.snapshot();
    assert_eq!(snap.rules, "standard-chess");
    assert_eq!(snap.opening_turn, Color::WHITE);
    assert_eq!(snap.white_placement.len(), 16);
    assert_eq!(snap.black_placement.len(), 16);
    assert_eq!(snap.white_placement[0].position, "a1");
    assert_eq!(snap.white_placement[0].kind, "ROOK");
    assert!(!snap.white_placement[0].moved);
    assert_eq!(snap.black_placement[0].position, "a8");
    assert_eq!(snap.turns.len(), 2);
    assert_eq!(snap.turns[0].origin, "e2");
    assert_eq!(snap.turns[0].target, "e4");
    assert_eq!(snap.result, "");

    // Undone moves drop out of the story.
    game.undo().unwrap();
    assert_eq!(game.snapshot().turns.len(), 1);

    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["rules"], "standard-chess");
    assert_eq!(json["opening_turn"], "WHITE");
    assert_eq!(json["turns"][1]["turn"], "BLACK");
    assert_eq!(json["turns"][1]["origin"], "e7");
}

#[test]
fn resumed_games_are_validated_and_played_on() {
    let rules = kit_rules(3, 50);
    // Unknown piece type.
    assert!(GameSession::resume(
        rules.clone(),
        [place("GHOST", 1, 1, Color::WHITE)],
        Color::WHITE
    )
    .is_err());
    // Both royals on one side.
    assert!(GameSession::resume(
        rules.clone(),
        [
            place("KING", 1, 1, Color::WHITE),
            place("KING", 2, 1, Color::WHITE),
        ],
        Color::WHITE
    )
    .is_err());
    // The same square twice.
    assert!(GameSession::resume(
        rules.clone(),
        [
            place("KING", 1, 1, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("TOWER", 4, 4, Color::WHITE),
            place("TOWER", 4, 4, Color::BLACK),
        ],
        Color::WHITE
    )
    .is_err());

    // A valid mid-game state opens on whoever is given the turn, and
    // moved pieces have lost their castling rights.
    let mut game = GameSession::resume(
        rules,
        [
            place("KING", 5, 1, Color::WHITE),
            (at(8, 1), "TOWER".into(), Color::WHITE, true),
            place("KING", 5, 8, Color::BLACK),
            place("TOWER", 1, 8, Color::BLACK),
        ],
        Color::BLACK,
    )
    .unwrap();
    assert_eq!(game.turn(), Color::BLACK);
    assert!(game.castling_partners_of(at(5, 1)).is_empty());
    assert_eq!(game.castling_partners_of(at(5, 8)), vec![at(1, 8)]);
    assert!(!game.play(ord(at(1, 8), at(1, 7))).unwrap());
    assert_eq!(game.turn(), Color::WHITE);
}

#[test]
fn the_engine_finishes_a_won_position() {
    let rules = kit_rules(3, 50);
    let mut game = GameSession::resume(
        rules,
        [
            place("KING", 5, 1, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("TOWER", 1, 7, Color::WHITE),
            place("TOWER", 2, 2, Color::WHITE),
        ],
        Color::WHITE,
    )
    .unwrap();
    let mut agent = SearchAgent::seeded(11);
    assert!(game.play_engine_turn(&mut agent).unwrap());
    assert_eq!(game.result(), WHITE_WIN);
    let last = game.log().last().unwrap();
    assert_eq!(last.origin, "b2");
    assert_eq!(last.target, "b8");
    assert_eq!(last.outcome, "CHECKMATE");
}

#[test]
fn the_engine_answers_draw_offers() {
    let rules = kit_rules(3, 50);
    // Black is a tower down; its engine takes the way out.
    let mut game = GameSession::resume(
        rules.clone(),
        [
            place("KING", 1, 1, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("TOWER", 4, 4, Color::WHITE),
        ],
        Color::WHITE,
    )
    .unwrap();
    game.special(SpecialAction::OfferDraw).unwrap();
    let agent = SearchAgent::seeded(3);
    assert!(game.respond_draw(&agent).unwrap());
    assert_eq!(game.result(), DRAW);

    // A tower up, the same engine declines and play goes on.
    let mut game = GameSession::resume(
        rules,
        [
            place("KING", 1, 1, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("TOWER", 4, 4, Color::BLACK),
        ],
        Color::WHITE,
    )
    .unwrap();
    game.special(SpecialAction::OfferDraw).unwrap();
    assert!(!game.respond_draw(&agent).unwrap());
    assert_eq!(game.phase(), Phase::InProgress);
    assert_eq!(game.turn(), Color::WHITE);
    assert!(game.log().is_empty());
}

#[test]
fn engine_self_play_always_settles_promotions() {
    let rules = kit_rules(3, 12);
    let mut game = GameSession::resume(
        rules,
        [
            place("KING", 1, 1, Color::WHITE),
            place("FOOT", 4, 6, Color::WHITE),
            place("KING", 8, 8, Color::BLACK),
            place("FOOT", 5, 3, Color::BLACK),
        ],
        Color::WHITE,
    )
    .unwrap();
    let mut agent = SearchAgent::seeded(5);
    for _ in 0..100 {
        if game.phase().is_finished() {
            break;
        }
        game.play_engine_turn(&mut agent).unwrap();
        assert_eq!(game.promotion_pending(), None);
    }
    assert_eq!(game.phase(), Phase::Finished);
    assert!(!game.result().is_empty());
}
