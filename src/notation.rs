//! # Reading and writing the game in plain text.
//!
//! Positions print as a file letter and a rank number, moves as two
//! positions separated by a space, or by ` - ` for a castling. Boards
//! print as framed diagrams with white's first rank at the bottom.
//! Parsing is the same vocabulary in reverse, one [`Parsable`]
//! implementation per type.

use std::fmt::{self, Display};

use chumsky::{Parser, prelude::*};

use crate::model::{Color, Position, board::Board, moves::Move};

/// Types with a text form that can be read back.
pub trait Parsable: Sized {
    /// The grammar of this type, without any end-of-input anchor, so
    /// implementations compose into larger grammars.
    fn parser<'s>() -> impl Parser<'s, &'s str, Self>;

    /// Read a whole string as this type. `None` when the text does not
    /// parse or parses with leftovers.
    fn parse_text(text: &str) -> Option<Self> {
        Self::parser().then_ignore(end()).parse(text).into_output()
    }
}

/// Lowercase letter naming `col`, column 1 being `a`.
fn file_letter(col: u8) -> char {
    (b'a' + col - 1) as char
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::WHITE => "WHITE",
            Color::BLACK => "BLACK",
        })
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", file_letter(self.col), self.row)
    }
}

impl Parsable for Position {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        group((
            one_of('a'..='p')
                .map(|c| (c as u32 - 'a' as u32) as u8 + 1)
                .labelled("expected a file letter a ... p"),
            text::int(10)
                .try_map(|raw: &str, _| match raw.parse::<u8>() {
                    Ok(row @ 1..=16) => Ok(row),
                    _ => Err(EmptyErr::default()),
                })
                .labelled("expected a rank number 1 ... 16"),
        ))
        .map_group(Self::new)
        .labelled("expected a board square such as e4")
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Ordinary { from, to } => write!(f, "{from} {to}"),
            Move::Castling { first, second } => write!(f, "{first} - {second}"),
        }
    }
}

impl Parsable for Move {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        choice((
            group((Position::parser(), just(" - "), Position::parser()))
                .map(|(first, _, second)| Self::Castling { first, second }),
            group((Position::parser(), just(' '), Position::parser()))
                .map(|(from, _, to)| Self::Ordinary { from, to }),
        ))
        .labelled("expected coordinates such as e2 e4, or e1 - h1 to castle")
    }
}

impl Display for Board {
    /// Framed diagram, one letter per piece, white uppercase and black
    /// lowercase, the highest rank printed first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rule = String::from("   ");
        for _ in 0..self.cols() {
            rule.push_str("+---");
        }
        rule.push('+');
        for row in (1..=self.rows()).rev() {
            writeln!(f, "{rule}")?;
            write!(f, "{row:>2} |")?;
            for col in 1..=self.cols() {
                let sym = self
                    .piece_at(Position::new(col, row))
                    .map_or(' ', |p| p.symbol());
                write!(f, " {sym} |")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{rule}")?;
        write!(f, "  ")?;
        for col in 1..=self.cols() {
            write!(f, "   {}", file_letter(col))?;
        }
        writeln!(f)
    }
}

#[test]
fn positions_round_trip_across_the_whole_range() {
    for col in 1..=16 {
        for row in 1..=16 {
            let pos = Position::new(col, row);
            assert_eq!(Position::parse_text(&pos.to_string()), Some(pos));
        }
    }
}

#[test]
fn malformed_positions_are_rejected() {
    for text in ["", "q1", "a0", "a17", "4a", "e", "e4 ", " e4", "e04"] {
        assert_eq!(Position::parse_text(text), None, "{text:?} must not parse");
    }
}

#[test]
fn moves_read_both_shapes() {
    assert_eq!(
        Move::parse_text("e2 e4"),
        Some(Move::Ordinary {
            from: Position::new(5, 2),
            to: Position::new(5, 4),
        })
    );
    assert_eq!(
        Move::parse_text("e1 - h1"),
        Some(Move::Castling {
            first: Position::new(5, 1),
            second: Position::new(8, 1),
        })
    );
    assert_eq!(
        Move::parse_text("p16 a1"),
        Some(Move::Ordinary {
            from: Position::new(16, 16),
            to: Position::new(1, 1),
        })
    );
    for text in ["e2e4", "e2 - ", "e2  e4", "e2 e4 e5", "- e1 h1"] {
        assert_eq!(Move::parse_text(text), None, "{text:?} must not parse");
    }
}

#[test]
fn moves_print_the_way_they_parse() {
    let ordinary = Move::Ordinary {
        from: Position::new(5, 2),
        to: Position::new(5, 4),
    };
    let castling = Move::Castling {
        first: Position::new(5, 1),
        second: Position::new(8, 1),
    };
    assert_eq!(ordinary.to_string(), "e2 e4");
    assert_eq!(castling.to_string(), "e1 - h1");
    assert_eq!(Move::parse_text(&ordinary.to_string()), Some(ordinary));
    assert_eq!(Move::parse_text(&castling.to_string()), Some(castling));
}

#[test]
fn colors_and_positions_print_plainly() {
    assert_eq!(Color::WHITE.to_string(), "WHITE");
    assert_eq!(Color::BLACK.to_string(), "BLACK");
    assert_eq!(Position::new(8, 4).to_string(), "h4");
    assert_eq!(Position::new(16, 16).to_string(), "p16");
}

#[test]
fn diagrams_draw_the_whole_board() {
    use std::sync::Arc;

    use crate::model::piece::{PieceInstance, PieceType};

    let royal = Arc::new(PieceType {
        name: "KING".into(),
        symbol: 'K',
        value: 9,
        motions: Vec::new(),
        initial_motions: Vec::new(),
        promotable: false,
        invulnerable: false,
        castlings: indexmap::IndexMap::new(),
    });
    let mut board = Board::new(4, 4, "KING").unwrap();
    board
        .place_all([
            (Position::new(1, 1), PieceInstance::new(royal.clone(), Color::WHITE)),
            (Position::new(3, 3), PieceInstance::new(royal, Color::BLACK)),
        ])
        .unwrap();
    let expected = concat!(
        "   +---+---+---+---+\n",
        " 4 |   |   |   |   |\n",
        "   +---+---+---+---+\n",
        " 3 |   |   | k |   |\n",
        "   +---+---+---+---+\n",
        " 2 |   |   |   |   |\n",
        "   +---+---+---+---+\n",
        " 1 | K |   |   |   |\n",
        "   +---+---+---+---+\n",
        "     a   b   c   d\n",
    );
    assert_eq!(board.to_string(), expected);
}
