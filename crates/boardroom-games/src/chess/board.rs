//! Chess board model read from FEN.
//!
//! Only the fields the move hints need are parsed: piece placement, the
//! side to move and the en-passant target. Castling rights and the move
//! clocks are skipped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::FenError;

/// Side of a chess piece. White sits at seat 0, black at seat 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// The roster seat playing this colour.
    pub fn seat(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }

    /// Rank direction pawns of this colour move in.
    pub(crate) fn forward(self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    /// Reads a FEN piece letter: upper case is white, lower case black.
    pub fn from_fen_char(c: char) -> Result<Self, FenError> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return Err(FenError::Piece(c)),
        };
        Ok(Self { color, kind })
    }
}

/// A board square. `file` 0..8 is a..h, `rank` 0..8 is 1..8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}

impl Square {
    /// Creates a square, or `None` off the board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    /// The square `(df, dr)` away, or `None` off the board.
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file as i8 + df;
        let rank = self.rank as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Self {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }
}

impl FromStr for Square {
    type Err = FenError;

    /// Parses algebraic names like `"e4"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(FenError::Square(s.to_owned()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Self::new(file, rank).ok_or_else(|| FenError::Square(s.to_owned()))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

/// A parsed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Indexed `[rank][file]`.
    squares: [[Option<Piece>; 8]; 8],
    pub active: Color,
    pub en_passant: Option<Square>,
}

impl Board {
    /// Parses the placement, active colour and en-passant fields of a FEN.
    ///
    /// # Example
    ///
    /// ```rust
    /// use boardroom_games::chess::{Board, Color, Square};
    ///
    /// let board = Board::from_fen(
    ///     "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
    /// ).unwrap();
    /// assert_eq!(board.active, Color::White);
    /// assert_eq!(board.en_passant, Some("e6".parse::<Square>().unwrap()));
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingField("placement"))?;
        let active = match fields.next() {
            Some("w") => Color::White,
            Some("b") => Color::Black,
            Some(other) => return Err(FenError::Color(other.to_owned())),
            None => return Err(FenError::MissingField("active colour")),
        };
        let _castling = fields.next();
        let en_passant = match fields.next() {
            None | Some("-") => None,
            Some(sq) => Some(sq.parse()?),
        };

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }

        let mut squares = [[None; 8]; 8];
        // FEN lists rank 8 first.
        for (i, row) in ranks.iter().enumerate() {
            let rank = 7 - i;
            let mut file = 0usize;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    if file >= 8 {
                        return Err(FenError::FileCount {
                            rank: rank + 1,
                            files: file + 1,
                        });
                    }
                    squares[rank][file] = Some(Piece::from_fen_char(c)?);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::FileCount {
                    rank: rank + 1,
                    files: file,
                });
            }
        }

        Ok(Self {
            squares,
            active,
            en_passant,
        })
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.rank as usize][square.file as usize]
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.piece_at(square).map(|p| p.color)
    }
}
