//! # Boards.
//!
//! A board owns the grid of pieces plus two caches rebuilt after every
//! mutation: for each occupied square, the legal destinations of the
//! piece standing there, and the castling maneuvers open to it. Having
//! the caches always current makes legality a lookup, and makes "this
//! side has no moves" a statement about the caches alone.
//!
//! Legality filtering plays candidate moves out on the live grid and
//! takes them back through a small undo log, rather than cloning the
//! whole board per candidate.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use strum::EnumIs;
use tracing::debug;

use crate::model::{
    CaptureMode, Color, Delta, JumpMode, Position,
    error::{GameError, GameResult},
    grid::Grid,
    motion::{Motion, Shape},
    piece::{PieceInstance, PieceType},
};

/// How a side's royal piece is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum RoyalState {
    /// Not attacked, and the side still has moves.
    Safe,
    /// Attacked, and the side still has moves.
    Check,
    /// Attacked, with nothing left that resolves it.
    Checkmate,
    /// Not attacked, yet the side has no move at all.
    Smothered,
}

/// Undo log for a legality probe: every touched cell with its prior
/// contents, and the royal-position cache.
struct ProbeUndo {
    cells: Vec<(Position, Option<PieceInstance>)>,
    royals: [Option<Position>; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: u8,
    cols: u8,
    royal_name: String,
    grid: Grid<Option<PieceInstance>>,
    royals: [Option<Position>; 2],
    destinations: HashMap<Position, IndexMap<Position, Motion>>,
    castlings: HashMap<Position, IndexMap<Position, Position>>,
    promotion: Option<Position>,
}

impl Board {
    /// An empty board. Side lengths run 4 to 16; `royal_name` is the
    /// piece type checks and mates will be about.
    pub fn new(rows: u8, cols: u8, royal_name: impl Into<String>) -> GameResult<Self> {
        if !(4..=16).contains(&rows) || !(4..=16).contains(&cols) {
            return Err(GameError::ruleset(format!(
                "boards run 4 to 16 squares per side, got {cols}x{rows}"
            )));
        }
        Ok(Self {
            rows,
            cols,
            royal_name: royal_name.into(),
            grid: Grid::filled(cols, rows, None),
            royals: [None; 2],
            destinations: HashMap::new(),
            castlings: HashMap::new(),
            promotion: None,
        })
    }

    #[inline]
    pub fn rows(&self) -> u8 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u8 {
        self.cols
    }

    #[inline]
    pub fn royal_name(&self) -> &str {
        &self.royal_name
    }

    /// Whether the address names a square of this board.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        self.grid.contains(pos)
    }

    /// The piece standing on `pos`, if the square exists and is taken.
    pub fn piece_at(&self, pos: Position) -> Option<&PieceInstance> {
        self.grid.get(pos).and_then(|cell| cell.as_ref())
    }

    /// Every piece on the board with its square, row by row.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, &PieceInstance)> {
        self.grid
            .positions()
            .filter_map(|pos| self.piece_at(pos).map(|p| (pos, p)))
    }

    /// Where `color`'s royal piece stands, if it is on the board.
    pub fn royal_position(&self, color: Color) -> Option<Position> {
        self.royals[color.ix()]
    }

    /// Put pieces down and rebuild the caches once at the end. Rejects
    /// addresses off the board and squares already taken.
    pub fn place_all(
        &mut self,
        pieces: impl IntoIterator<Item = (Position, PieceInstance)>,
    ) -> GameResult<()> {
        for (pos, piece) in pieces {
            if !self.contains(pos) {
                return Err(GameError::ruleset(format!("{pos} is not on this board")));
            }
            if self.piece_at(pos).is_some() {
                return Err(GameError::ruleset(format!("{pos} is already occupied")));
            }
            if piece.kind.name == self.royal_name {
                self.royals[piece.color.ix()] = Some(pos);
            }
            self.grid[pos] = Some(piece);
        }
        self.recompute();
        Ok(())
    }

    /// The cached legal destinations of the piece on `origin`, keyed by
    /// landing square with the movement that reaches it. `None` when the
    /// square is empty.
    pub fn destinations_from(&self, origin: Position) -> Option<&IndexMap<Position, Motion>> {
        self.destinations.get(&origin)
    }

    /// The cached castling maneuvers open to the piece on `origin`:
    /// partner square mapped to this piece's landing square.
    pub fn castling_options(&self, origin: Position) -> Option<&IndexMap<Position, Position>> {
        self.castlings.get(&origin)
    }

    /// Landing squares of a cached castling, first piece then second.
    pub fn castling_landings(
        &self,
        first: Position,
        second: Position,
    ) -> Option<(Position, Position)> {
        let a = *self.castlings.get(&first)?.get(&second)?;
        let b = *self.castlings.get(&second)?.get(&first)?;
        Some((a, b))
    }

    /// The square awaiting a promotion decision, if the last mutation
    /// left one.
    pub fn promotion_pending(&self) -> Option<Position> {
        self.promotion
    }

    /// Dismiss a pending promotion without touching the board.
    pub(crate) fn clear_promotion(&mut self) {
        self.promotion = None;
    }

    /// Whether an ordinary move is legal for `color` right now. Leaves
    /// the board untouched either way.
    pub fn check_ordinary(&self, from: Position, to: Position, color: Color) -> GameResult<()> {
        if !self.contains(from) || !self.contains(to) {
            return Err(GameError::illegal(format!("{from} to {to} leaves the board")));
        }
        let Some(piece) = self.piece_at(from) else {
            return Err(GameError::illegal(format!("no piece stands on {from}")));
        };
        if piece.color != color {
            return Err(GameError::illegal(format!(
                "the piece on {from} does not belong to {color}"
            )));
        }
        if self.destinations.get(&from).is_some_and(|d| d.contains_key(&to)) {
            Ok(())
        } else {
            Err(GameError::illegal(format!("no movement takes {from} to {to}")))
        }
    }

    /// Whether the castling between the pieces on `first` and `second`
    /// is open to `color` right now.
    pub fn check_castling(&self, first: Position, second: Position, color: Color) -> GameResult<()> {
        for pos in [first, second] {
            if !self.contains(pos) {
                return Err(GameError::illegal(format!("{pos} is not on this board")));
            }
            let Some(piece) = self.piece_at(pos) else {
                return Err(GameError::illegal(format!("no piece stands on {pos}")));
            };
            if piece.color != color {
                return Err(GameError::illegal(format!(
                    "the piece on {pos} does not belong to {color}"
                )));
            }
        }
        if self.castlings.get(&first).is_some_and(|c| c.contains_key(&second)) {
            Ok(())
        } else {
            Err(GameError::illegal(format!(
                "no castling joins {first} and {second}"
            )))
        }
    }

    /// Apply a validated ordinary move and report whether it captured
    /// anything. The caches are rebuilt before returning. Behavior on an
    /// unvalidated move is unspecified; run [`Board::check_ordinary`]
    /// first.
    pub fn apply_ordinary(&mut self, from: Position, to: Position) -> bool {
        let motion = self.destinations.get(&from).and_then(|d| d.get(&to)).copied();
        let captures = match motion {
            Some(m) => self.capture_set(from, to, m),
            None => self.piece_at(to).map(|_| to).into_iter().collect(),
        };
        let captured = !captures.is_empty();
        for &c in &captures {
            self.grid[c] = None;
        }
        let Some(mut piece) = self.grid[from].take() else {
            return false;
        };
        if piece.kind.name == self.royal_name {
            self.royals[piece.color.ix()] = Some(to);
        }
        let promoted = piece.kind.promotable
            && to.row != from.row
            && to.row == piece.color.promotion_rank(self.rows);
        piece.moved = true;
        debug!(%from, %to, captured, "applied ordinary move");
        self.grid[to] = Some(piece);
        self.promotion = promoted.then_some(to);
        self.recompute();
        captured
    }

    /// Apply a validated castling. Castlings never capture. Behavior on
    /// an unvalidated pair is unspecified; run [`Board::check_castling`]
    /// first.
    pub fn apply_castling(&mut self, first: Position, second: Position) {
        let Some((first_land, second_land)) = self.castling_landings(first, second) else {
            return;
        };
        let a = self.grid[first].take();
        let b = self.grid[second].take();
        for (piece, landing) in [(a, first_land), (b, second_land)] {
            let Some(mut piece) = piece else { continue };
            if piece.kind.name == self.royal_name {
                self.royals[piece.color.ix()] = Some(landing);
            }
            piece.moved = true;
            self.grid[landing] = Some(piece);
        }
        debug!(%first, %second, "applied castling");
        self.promotion = None;
        self.recompute();
    }

    /// Swap the piece on `pos` for a fresh one of the given type with
    /// the same color. The newcomer counts as having moved.
    pub(crate) fn promote(&mut self, pos: Position, kind: Arc<PieceType>) -> GameResult<()> {
        let Some(old) = self.piece_at(pos) else {
            return Err(GameError::illegal(format!("no piece stands on {pos}")));
        };
        let color = old.color;
        debug!(%pos, from = %old.kind.name, to = %kind.name, "promoted");
        self.grid[pos] = Some(PieceInstance { kind, color, moved: true });
        self.promotion = None;
        self.recompute();
        Ok(())
    }

    /// Whether `color`'s royal piece is under attack. Resolved against
    /// the raw movement tables, so the answer does not depend on the
    /// caches. A side with no royal piece is never in check.
    pub fn in_check(&self, color: Color) -> bool {
        let Some(target) = self.royals[color.ix()] else {
            return false;
        };
        for (pos, piece) in self.pieces() {
            if piece.color == color {
                continue;
            }
            for (to, motion) in self.raw_destinations(pos, piece) {
                if self.capture_set(pos, to, motion).contains(&target) {
                    return true;
                }
            }
        }
        false
    }

    /// The verdict for `color`'s royal piece on the current position.
    /// Cache construction already dropped every move that leaves the
    /// royal attacked, so "no moves" here means exactly that.
    pub fn royal_state(&self, color: Color) -> RoyalState {
        match (self.in_check(color), self.side_has_moves(color)) {
            (true, true) => RoyalState::Check,
            (true, false) => RoyalState::Checkmate,
            (false, false) => RoyalState::Smothered,
            (false, true) => RoyalState::Safe,
        }
    }

    fn side_has_moves(&self, color: Color) -> bool {
        self.pieces().any(|(pos, piece)| {
            piece.color == color
                && (self.destinations.get(&pos).is_some_and(|d| !d.is_empty())
                    || self.castlings.get(&pos).is_some_and(|c| !c.is_empty()))
        })
    }

    /// The squares a movement would clear when played: sweep victims of
    /// a capturing leap, and the destination's occupant.
    fn capture_set(&self, from: Position, to: Position, motion: Motion) -> Vec<Position> {
        let mut out = Vec::new();
        if motion.jump == JumpMode::JumpCapture {
            if let Some(mover) = self.piece_at(from) {
                let mut cur = from.step_toward(to);
                while cur != to {
                    if let Some(p) = self.piece_at(cur) {
                        if p.color != mover.color && !p.kind.invulnerable {
                            out.push(cur);
                        }
                    }
                    cur = cur.step_toward(to);
                }
            }
        }
        if self.piece_at(to).is_some() {
            out.push(to);
        }
        out
    }

    /// Resolve a piece's movement table from `origin` with no regard to
    /// royal safety. Yields each destination with the movement reaching
    /// it.
    fn raw_destinations(&self, origin: Position, piece: &PieceInstance) -> Vec<(Position, Motion)> {
        let mut out = Vec::new();
        for m in piece.motions() {
            let m = if piece.color.is_black() { m.mirrored() } else { m };
            for part in m.split() {
                self.resolve_part(origin, piece.color, part, &mut out);
            }
        }
        out
    }

    fn resolve_part(&self, origin: Position, color: Color, m: Motion, out: &mut Vec<(Position, Motion)>) {
        if let (Delta::Fixed(dr), Delta::Fixed(dc)) = (m.row, m.col) {
            let Some(dest) = origin.offset(dc as i16, dr as i16) else {
                return;
            };
            if self.contains(dest) && self.arrival_ok(origin, dest, color, m) {
                out.push((dest, m));
            }
            return;
        }
        match m.classify() {
            Shape::Straight | Shape::Diagonal => self.walk_ray(origin, color, m, out),
            Shape::Combined => self.scan_leap(origin, color, m, out),
        }
    }

    /// Walk a ray square by square. A non-jumping ray ends on the first
    /// occupant, which it may still capture; a jumping one scans to the
    /// board's edge.
    fn walk_ray(&self, origin: Position, color: Color, m: Motion, out: &mut Vec<(Position, Motion)>) {
        let (dr, dc) = (m.row.sign(), m.col.sign());
        let mut cur = origin;
        loop {
            let Some(next) = cur.offset(dc, dr) else { return };
            if !self.contains(next) {
                return;
            }
            if self.arrival_ok(origin, next, color, m) {
                out.push((next, m));
            }
            if self.piece_at(next).is_some() && m.jump == JumpMode::None {
                return;
            }
            cur = next;
        }
    }

    /// Resolve a combined movement: the family axis scans outward while
    /// the fixed axis stays put, every landing tried independently.
    fn scan_leap(&self, origin: Position, color: Color, m: Motion, out: &mut Vec<(Position, Motion)>) {
        for k in 1..=16i16 {
            let dr = match m.row {
                Delta::Fixed(n) => n as i16,
                d => d.sign() * k,
            };
            let dc = match m.col {
                Delta::Fixed(n) => n as i16,
                d => d.sign() * k,
            };
            let Some(dest) = origin.offset(dc, dr) else { return };
            if !self.contains(dest) {
                return;
            }
            if self.arrival_ok(origin, dest, color, m) {
                out.push((dest, m));
            }
        }
    }

    /// Whether the movement may end on `dest`: occupancy against the
    /// capture mode, invulnerability, and a clear path when the movement
    /// cannot jump.
    fn arrival_ok(&self, origin: Position, dest: Position, color: Color, m: Motion) -> bool {
        match self.piece_at(dest) {
            Some(_) if m.capture == CaptureMode::None => return false,
            Some(p) if p.color == color => return false,
            Some(p) if p.kind.invulnerable => return false,
            None if m.capture == CaptureMode::Mandatory => return false,
            _ => {}
        }
        m.jump != JumpMode::None || self.path_clear(origin, dest)
    }

    /// Whether every square strictly between the endpoints is vacant.
    fn path_clear(&self, from: Position, to: Position) -> bool {
        let mut cur = from.step_toward(to);
        while cur != to {
            if self.piece_at(cur).is_some() {
                return false;
            }
            cur = cur.step_toward(to);
        }
        true
    }

    /// Rebuild both caches from the grid. Every mutation ends here.
    fn recompute(&mut self) {
        self.destinations = self.legal_destinations();
        self.castlings = self.legal_castlings();
    }

    fn legal_destinations(&mut self) -> HashMap<Position, IndexMap<Position, Motion>> {
        let mut raw = Vec::new();
        for pos in self.grid.positions() {
            if let Some(piece) = self.piece_at(pos) {
                raw.push((pos, piece.color, self.raw_destinations(pos, piece)));
            }
        }
        let mut dests = HashMap::with_capacity(raw.len());
        for (origin, color, candidates) in raw {
            let mut map = IndexMap::new();
            for (to, m) in candidates {
                if self.would_take_royal(origin, to, m, color) {
                    continue;
                }
                if self.probe_exposes_royal(origin, to, m, color) {
                    continue;
                }
                map.insert(to, m);
            }
            dests.insert(origin, map);
        }
        dests
    }

    fn legal_castlings(&mut self) -> HashMap<Position, IndexMap<Position, Position>> {
        let mut seats = Vec::new();
        for pos in self.grid.positions() {
            if let Some(piece) = self.piece_at(pos) {
                if piece.can_castle() {
                    seats.push((pos, piece.color));
                }
            }
        }
        let mut cache = HashMap::with_capacity(seats.len());
        for (origin, color) in seats {
            let mut map = IndexMap::new();
            for col in 1..=self.cols {
                let partner = Position::new(col, origin.row);
                if partner.col == origin.col {
                    continue;
                }
                if let Some(landing) = self.viable_castling(origin, partner, color) {
                    map.insert(partner, landing);
                }
            }
            cache.insert(origin, map);
        }
        cache
    }

    /// Check one ordered castling pairing, returning `origin`'s landing
    /// square when the maneuver is available.
    fn viable_castling(&mut self, origin: Position, partner: Position, color: Color) -> Option<Position> {
        let (rule, origin_is_first, any_moved) = {
            let a = self.piece_at(origin)?;
            let b = self.piece_at(partner)?;
            if a.color != color || b.color != color {
                return None;
            }
            let rule = a.castling_with(&b.kind.name)?.clone();
            let origin_is_first = a.kind.name == rule.first;
            (rule, origin_is_first, a.moved || b.moved)
        };
        if rule.unmoved_only && any_moved {
            return None;
        }
        let sep = partner.col as i16 - origin.col as i16;
        if sep.abs() <= 1 {
            return None;
        }
        let (first_pos, second_pos) = if origin_is_first {
            (origin, partner)
        } else {
            (partner, origin)
        };
        let lands = castling_lands(first_pos, second_pos);
        for land in [lands.0, lands.1] {
            // the movers' own squares still count as occupied here
            if !self.contains(land) || self.piece_at(land).is_some() {
                return None;
            }
        }
        if rule.clear_between && !self.path_clear(origin, partner) {
            return None;
        }
        let undo = self.apply_probe_castling(first_pos, second_pos, lands);
        let exposed = self.in_check(color);
        self.restore(undo);
        if exposed {
            return None;
        }
        Some(if origin_is_first { lands.0 } else { lands.1 })
    }

    /// Whether the movement would capture the enemy royal piece, which
    /// no legal move may do.
    fn would_take_royal(&self, from: Position, to: Position, m: Motion, color: Color) -> bool {
        let Some(enemy) = self.royals[color.opp().ix()] else {
            return false;
        };
        self.capture_set(from, to, m).contains(&enemy)
    }

    /// Play the movement out on the live grid, ask whether the mover's
    /// royal is attacked, and put everything back.
    fn probe_exposes_royal(&mut self, from: Position, to: Position, m: Motion, color: Color) -> bool {
        let undo = self.apply_probe(from, to, m);
        let exposed = self.in_check(color);
        self.restore(undo);
        exposed
    }

    fn apply_probe(&mut self, from: Position, to: Position, m: Motion) -> ProbeUndo {
        let mut undo = ProbeUndo {
            cells: Vec::with_capacity(4),
            royals: self.royals,
        };
        for c in self.capture_set(from, to, m) {
            if c != to {
                undo.cells.push((c, self.grid[c].take()));
            }
        }
        undo.cells.push((to, self.grid[to].take()));
        let moved = self.grid[from].take();
        undo.cells.push((from, moved.clone()));
        if let Some(mut piece) = moved {
            if piece.kind.name == self.royal_name {
                self.royals[piece.color.ix()] = Some(to);
            }
            piece.moved = true;
            self.grid[to] = Some(piece);
        }
        undo
    }

    fn apply_probe_castling(
        &mut self,
        first: Position,
        second: Position,
        lands: (Position, Position),
    ) -> ProbeUndo {
        let mut undo = ProbeUndo {
            cells: Vec::with_capacity(4),
            royals: self.royals,
        };
        let a = self.grid[first].take();
        undo.cells.push((first, a.clone()));
        let b = self.grid[second].take();
        undo.cells.push((second, b.clone()));
        for land in [lands.0, lands.1] {
            if land != first && land != second {
                undo.cells.push((land, self.grid[land].take()));
            }
        }
        for (piece, landing) in [(a, lands.0), (b, lands.1)] {
            let Some(mut piece) = piece else { continue };
            if piece.kind.name == self.royal_name {
                self.royals[piece.color.ix()] = Some(landing);
            }
            piece.moved = true;
            self.grid[landing] = Some(piece);
        }
        undo
    }

    fn restore(&mut self, undo: ProbeUndo) {
        self.royals = undo.royals;
        for (pos, cell) in undo.cells.into_iter().rev() {
            self.grid[pos] = cell;
        }
    }
}

/// Landing squares of a castling pair, first piece then second. The
/// first piece crosses half the separation, rounded away from where it
/// started, and the second settles one square to the near side of it.
fn castling_lands(first: Position, second: Position) -> (Position, Position) {
    let sep = second.col as i16 - first.col as i16;
    let half = if sep % 2 == 0 { sep / 2 } else { sep / 2 + sep.signum() };
    let first_land = Position::new((first.col as i16 + half) as u8, first.row);
    let second_land = Position::new(
        (first_land.col as i16 - sep.signum()) as u8,
        first.row,
    );
    (first_land, second_land)
}

#[cfg(test)]
fn kind(name: &str, symbol: char, value: u32, motions: Vec<Motion>) -> Arc<PieceType> {
    Arc::new(PieceType {
        name: name.into(),
        symbol,
        value,
        motions,
        initial_motions: Vec::new(),
        promotable: false,
        invulnerable: false,
        castlings: IndexMap::new(),
    })
}

#[cfg(test)]
fn slide(row: Delta, col: Delta) -> Motion {
    Motion { row, col, capture: CaptureMode::Optional, jump: JumpMode::None }
}

#[cfg(test)]
fn leap(row: i8, col: i8) -> Motion {
    Motion {
        row: Delta::Fixed(row),
        col: Delta::Fixed(col),
        capture: CaptureMode::Optional,
        jump: JumpMode::Jump,
    }
}

#[cfg(test)]
fn knight_kind() -> Arc<PieceType> {
    kind(
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
    )
}

#[cfg(test)]
fn king_kind() -> Arc<PieceType> {
    kind(
        "KING",
        'K',
        20,
        vec![
            slide(Delta::Fixed(1), Delta::Fixed(0)),
            slide(Delta::Fixed(1), Delta::Fixed(1)),
            slide(Delta::Fixed(0), Delta::Fixed(1)),
            slide(Delta::Fixed(-1), Delta::Fixed(1)),
            slide(Delta::Fixed(-1), Delta::Fixed(0)),
            slide(Delta::Fixed(-1), Delta::Fixed(-1)),
            slide(Delta::Fixed(0), Delta::Fixed(-1)),
            slide(Delta::Fixed(1), Delta::Fixed(-1)),
        ],
    )
}

#[cfg(test)]
fn rook_kind() -> Arc<PieceType> {
    kind(
        "ROOK",
        'R',
        5,
        vec![
            slide(Delta::AnySigned, Delta::Fixed(0)),
            slide(Delta::Fixed(0), Delta::AnySigned),
        ],
    )
}

#[cfg(test)]
fn board_with(rows: u8, cols: u8, pieces: Vec<(Position, Arc<PieceType>, Color)>) -> Board {
    let mut b = Board::new(rows, cols, "KING").unwrap();
    b.place_all(
        pieces
            .into_iter()
            .map(|(pos, k, color)| (pos, PieceInstance::new(k, color))),
    )
    .unwrap();
    b
}

#[cfg(test)]
fn at(col: u8, row: u8) -> Position {
    Position::new(col, row)
}

#[test]
fn a_cornered_knight_keeps_two_moves() {
    let b = board_with(8, 8, vec![(at(1, 1), knight_kind(), Color::WHITE)]);
    let dests = b.destinations_from(at(1, 1)).unwrap();
    assert_eq!(dests.len(), 2);
    assert!(dests.contains_key(&at(2, 3)));
    assert!(dests.contains_key(&at(3, 2)));
}

#[test]
fn adjacent_royals_stand_in_check() {
    let b = board_with(
        4,
        4,
        vec![
            (at(2, 1), king_kind(), Color::WHITE),
            (at(3, 1), king_kind(), Color::BLACK),
        ],
    );
    assert!(b.in_check(Color::WHITE));
    assert!(b.in_check(Color::BLACK));
    assert_eq!(b.royal_state(Color::WHITE), RoyalState::Check);
    assert_eq!(b.royal_state(Color::BLACK), RoyalState::Check);
}

#[test]
fn royals_keep_their_distance_even_on_a_cramped_board() {
    let b = board_with(
        4,
        4,
        vec![
            (at(1, 1), king_kind(), Color::WHITE),
            (at(3, 1), king_kind(), Color::BLACK),
        ],
    );
    let white = b.destinations_from(at(1, 1)).unwrap();
    assert!(!white.contains_key(&at(2, 1)));
    assert!(!white.contains_key(&at(2, 2)));
    assert!(white.contains_key(&at(1, 2)));
    let black = b.destinations_from(at(3, 1)).unwrap();
    assert!(!black.contains_key(&at(2, 1)));
    assert!(!black.contains_key(&at(2, 2)));
    assert!(black.contains_key(&at(4, 1)));
    assert!(black.contains_key(&at(3, 2)));
}

#[test]
fn sliders_stop_at_the_first_occupant_but_may_take_it() {
    let friendly = board_with(
        8,
        8,
        vec![
            (at(1, 1), rook_kind(), Color::WHITE),
            (at(1, 3), rook_kind(), Color::WHITE),
        ],
    );
    let dests = friendly.destinations_from(at(1, 1)).unwrap();
    assert!(dests.contains_key(&at(1, 2)));
    assert!(!dests.contains_key(&at(1, 3)));
    assert!(!dests.contains_key(&at(1, 4)));

    let hostile = board_with(
        8,
        8,
        vec![
            (at(1, 1), rook_kind(), Color::WHITE),
            (at(1, 3), rook_kind(), Color::BLACK),
        ],
    );
    let dests = hostile.destinations_from(at(1, 1)).unwrap();
    assert!(dests.contains_key(&at(1, 2)));
    assert!(dests.contains_key(&at(1, 3)));
    assert!(!dests.contains_key(&at(1, 4)));
}

#[test]
fn mandatory_captures_need_a_victim() {
    let striker = kind(
        "STRIKER",
        'S',
        2,
        vec![Motion {
            row: Delta::Fixed(1),
            col: Delta::Fixed(1),
            capture: CaptureMode::Mandatory,
            jump: JumpMode::None,
        }],
    );
    let empty = board_with(8, 8, vec![(at(4, 4), striker.clone(), Color::WHITE)]);
    assert!(empty.destinations_from(at(4, 4)).unwrap().is_empty());

    let fed = board_with(
        8,
        8,
        vec![
            (at(4, 4), striker, Color::WHITE),
            (at(5, 5), rook_kind(), Color::BLACK),
        ],
    );
    assert!(fed.destinations_from(at(4, 4)).unwrap().contains_key(&at(5, 5)));
}

#[test]
fn invulnerable_pieces_cannot_be_captured() {
    let mut shielded = (*rook_kind()).clone();
    shielded.name = "WARD".into();
    shielded.invulnerable = true;
    let b = board_with(
        8,
        8,
        vec![
            (at(1, 1), rook_kind(), Color::WHITE),
            (at(1, 3), Arc::new(shielded), Color::BLACK),
        ],
    );
    let dests = b.destinations_from(at(1, 1)).unwrap();
    assert!(dests.contains_key(&at(1, 2)));
    assert!(!dests.contains_key(&at(1, 3)));
}

#[test]
fn no_move_returns_to_its_own_origin() {
    let b = board_with(
        8,
        8,
        vec![
            (at(1, 1), rook_kind(), Color::WHITE),
            (at(4, 4), knight_kind(), Color::WHITE),
            (at(5, 5), king_kind(), Color::BLACK),
        ],
    );
    for (pos, _) in b.pieces() {
        assert!(!b.destinations_from(pos).unwrap().contains_key(&pos));
    }
}

#[test]
fn the_enemy_royal_is_never_a_destination() {
    let b = board_with(
        8,
        8,
        vec![
            (at(1, 1), rook_kind(), Color::WHITE),
            (at(1, 8), king_kind(), Color::BLACK),
            (at(8, 1), rook_kind(), Color::BLACK),
        ],
    );
    let dests = b.destinations_from(at(1, 1)).unwrap();
    assert!(!dests.contains_key(&at(1, 8)));
    assert!(dests.contains_key(&at(1, 7)));
    assert!(dests.contains_key(&at(8, 1)));
}

#[test]
fn pinned_pieces_stay_on_the_pin_line() {
    let b = board_with(
        8,
        8,
        vec![
            (at(5, 1), king_kind(), Color::WHITE),
            (at(5, 4), rook_kind(), Color::WHITE),
            (at(5, 8), rook_kind(), Color::BLACK),
        ],
    );
    let dests = b.destinations_from(at(5, 4)).unwrap();
    assert!(dests.contains_key(&at(5, 5)));
    assert!(dests.contains_key(&at(5, 8)));
    assert!(!dests.contains_key(&at(4, 4)));
    assert!(!dests.contains_key(&at(6, 4)));
}

#[test]
fn probing_never_leaves_a_mark() {
    let mut b = board_with(
        8,
        8,
        vec![
            (at(5, 1), king_kind(), Color::WHITE),
            (at(5, 4), rook_kind(), Color::WHITE),
            (at(5, 8), rook_kind(), Color::BLACK),
            (at(2, 2), knight_kind(), Color::BLACK),
        ],
    );
    let before = b.clone();
    b.recompute();
    assert_eq!(b, before);
}

#[test]
fn castling_appears_with_its_landing_squares() {
    let accord = crate::model::piece::CastlingRule {
        first: "KING".into(),
        second: "ROOK".into(),
        unmoved_only: true,
        clear_between: true,
    };
    let mut king = (*king_kind()).clone();
    king.castlings.insert("ROOK".into(), accord.clone());
    let mut rook = (*rook_kind()).clone();
    rook.castlings.insert("KING".into(), accord);
    let king = Arc::new(king);
    let rook = Arc::new(rook);

    let b = board_with(
        8,
        8,
        vec![
            (at(5, 1), king.clone(), Color::WHITE),
            (at(8, 1), rook.clone(), Color::WHITE),
        ],
    );
    assert_eq!(b.castling_options(at(5, 1)).unwrap().get(&at(8, 1)), Some(&at(7, 1)));
    assert_eq!(b.castling_options(at(8, 1)).unwrap().get(&at(5, 1)), Some(&at(6, 1)));
    assert_eq!(b.castling_landings(at(5, 1), at(8, 1)), Some((at(7, 1), at(6, 1))));

    // A piece standing between them closes the corridor.
    let blocked = board_with(
        8,
        8,
        vec![
            (at(5, 1), king.clone(), Color::WHITE),
            (at(8, 1), rook.clone(), Color::WHITE),
            (at(6, 1), knight_kind(), Color::WHITE),
        ],
    );
    assert!(blocked.castling_options(at(5, 1)).unwrap().is_empty());

    // A watched landing square closes it too.
    let watched = board_with(
        8,
        8,
        vec![
            (at(5, 1), king.clone(), Color::WHITE),
            (at(8, 1), rook.clone(), Color::WHITE),
            (at(7, 8), rook_kind(), Color::BLACK),
        ],
    );
    assert!(watched.castling_options(at(5, 1)).unwrap().is_empty());

    // Moved participants forfeit the right.
    let mut stale = board_with(8, 8, vec![(at(8, 1), rook, Color::WHITE)]);
    let mut worn = PieceInstance::new(king, Color::WHITE);
    worn.moved = true;
    stale.place_all(vec![(at(5, 1), worn)]).unwrap();
    assert!(stale.castling_options(at(5, 1)).unwrap().is_empty());
}

#[test]
fn capturing_leaps_sweep_enemies_along_the_way() {
    let cannon = kind(
        "CANNON",
        'C',
        4,
        vec![Motion {
            row: Delta::Fixed(0),
            col: Delta::AnySigned,
            capture: CaptureMode::Optional,
            jump: JumpMode::JumpCapture,
        }],
    );
    let mut b = board_with(
        8,
        8,
        vec![
            (at(1, 1), cannon, Color::WHITE),
            (at(3, 1), rook_kind(), Color::BLACK),
            (at(4, 1), rook_kind(), Color::WHITE),
            (at(5, 1), rook_kind(), Color::BLACK),
        ],
    );
    assert!(b.destinations_from(at(1, 1)).unwrap().contains_key(&at(6, 1)));
    let captured = b.apply_ordinary(at(1, 1), at(6, 1));
    assert!(captured);
    assert!(b.piece_at(at(3, 1)).is_none());
    assert!(b.piece_at(at(5, 1)).is_none());
    assert_eq!(b.piece_at(at(4, 1)).unwrap().color, Color::WHITE);
    assert_eq!(b.piece_at(at(6, 1)).unwrap().kind.name, "CANNON");
}

#[test]
fn quiet_moves_report_no_capture() {
    let mut b = board_with(8, 8, vec![(at(1, 1), rook_kind(), Color::WHITE)]);
    assert!(!b.apply_ordinary(at(1, 1), at(1, 5)));
    assert!(b.piece_at(at(1, 5)).unwrap().moved);
}

#[test]
fn promotion_marks_are_set_and_spent() {
    let mut footman = (*rook_kind()).clone();
    footman.name = "FOOTMAN".into();
    footman.promotable = true;
    let footman = Arc::new(footman);
    let mut b = board_with(
        8,
        8,
        vec![
            (at(1, 7), footman, Color::WHITE),
            (at(8, 1), rook_kind(), Color::WHITE),
        ],
    );
    b.apply_ordinary(at(1, 7), at(1, 8));
    assert_eq!(b.promotion_pending(), Some(at(1, 8)));

    // Any later mutation clears a marker that was not acted on.
    b.apply_ordinary(at(8, 1), at(8, 4));
    assert_eq!(b.promotion_pending(), None);
}

#[test]
fn promoting_swaps_the_archetype_in_place() {
    let mut footman = (*rook_kind()).clone();
    footman.name = "FOOTMAN".into();
    footman.promotable = true;
    let mut b = board_with(8, 8, vec![(at(1, 7), Arc::new(footman), Color::WHITE)]);
    b.apply_ordinary(at(1, 7), at(1, 8));
    b.promote(at(1, 8), knight_kind()).unwrap();
    let piece = b.piece_at(at(1, 8)).unwrap();
    assert_eq!(piece.kind.name, "KNIGHT");
    assert_eq!(piece.color, Color::WHITE);
    assert!(piece.moved);
    assert_eq!(b.promotion_pending(), None);
}

#[test]
fn placement_rejects_collisions_and_stray_squares() {
    let mut b = Board::new(8, 8, "KING").unwrap();
    assert!(b
        .place_all(vec![(at(9, 1), PieceInstance::new(rook_kind(), Color::WHITE))])
        .is_err());
    let mut b = Board::new(8, 8, "KING").unwrap();
    assert!(b
        .place_all(vec![
            (at(1, 1), PieceInstance::new(rook_kind(), Color::WHITE)),
            (at(1, 1), PieceInstance::new(rook_kind(), Color::BLACK)),
        ])
        .is_err());
}

#[test]
fn mate_check_and_smother_are_told_apart() {
    // Back-rank mate: the king is boxed in by its own rank-locked
    // pieces, which can neither interpose nor clear the way.
    let crab = kind("CRAB", 'C', 2, vec![slide(Delta::Fixed(0), Delta::AnySigned)]);
    let mated = board_with(
        8,
        8,
        vec![
            (at(8, 8), king_kind(), Color::BLACK),
            (at(7, 7), crab.clone(), Color::BLACK),
            (at(8, 7), crab, Color::BLACK),
            (at(1, 8), rook_kind(), Color::WHITE),
        ],
    );
    assert!(mated.in_check(Color::BLACK));
    assert_eq!(mated.royal_state(Color::BLACK), RoyalState::Checkmate);

    let checked = board_with(
        8,
        8,
        vec![
            (at(8, 8), king_kind(), Color::BLACK),
            (at(1, 8), rook_kind(), Color::WHITE),
        ],
    );
    assert_eq!(checked.royal_state(Color::BLACK), RoyalState::Check);

    // The classic two-rook smother: not attacked, nowhere to go.
    let smothered = board_with(
        8,
        8,
        vec![
            (at(1, 8), king_kind(), Color::BLACK),
            (at(2, 1), rook_kind(), Color::WHITE),
            (at(8, 7), rook_kind(), Color::WHITE),
        ],
    );
    assert!(!smothered.in_check(Color::BLACK));
    assert_eq!(smothered.royal_state(Color::BLACK), RoyalState::Smothered);
    assert_eq!(smothered.royal_state(Color::WHITE), RoyalState::Safe);
}
