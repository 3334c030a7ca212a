use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::corruption::CorruptionSet;
use crate::error::{EngineError, MoveRejection, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn name(&self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    fn symbol(&self, side: Side) -> char {
        let c = match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        };
        match side {
            Side::White => c,
            Side::Black => c.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Rank step of a forward pawn move.
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    /// 0-based rank pawns start on (row 2 for white, row 7 for black).
    pub fn pawn_home_rank(&self) -> u8 {
        match self {
            Side::White => 1,
            Side::Black => 6,
        }
    }

    fn back_rank(&self) -> u8 {
        match self {
            Side::White => 0,
            Side::Black => 7,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

/// A board square packed as `rank * 8 + file`, both 0-based.
///
/// Squares print and parse as two-character labels, column `A`..`H`
/// followed by row `1`..`8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub const COUNT: usize = 64;

    pub fn new(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    pub fn from_index(index: u8) -> Option<Square> {
        if (index as usize) < Self::COUNT {
            Some(Square(index))
        } else {
            None
        }
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn file(&self) -> u8 {
        self.0 % 8
    }

    pub fn rank(&self) -> u8 {
        self.0 / 8
    }

    /// The square `df` files and `dr` ranks away, if it is on the board.
    pub fn offset(&self, df: i8, dr: i8) -> Option<Square> {
        let file = self.file() as i16 + df as i16;
        let rank = self.rank() as i16 + dr as i16;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square((rank * 8 + file) as u8))
        } else {
            None
        }
    }

    pub fn checked_offset(&self, df: i8, dr: i8) -> Result<Square> {
        self.offset(df, dr).ok_or(EngineError::SquareOutOfRange {
            file: self.file() as i16 + df as i16,
            rank: self.rank() as i16 + dr as i16,
        })
    }

    /// All 64 squares in board order: rank 1 to 8, file A to H within a rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Self::COUNT as u8).map(Square)
    }

    /// The 3x3 block centred on this square, clipped to the board.
    pub fn block(&self) -> impl Iterator<Item = Square> {
        let centre = *self;
        (-1..=1).flat_map(move |df| (-1..=1).filter_map(move |dr| centre.offset(df, dr)))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.file()) as char, self.rank() + 1)
    }
}

impl FromStr for Square {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidCoordinate(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(invalid());
        }

        let file = match bytes[0].to_ascii_uppercase() {
            c @ b'A'..=b'H' => c - b'A',
            _ => return Err(invalid()),
        };
        let rank = match bytes[1] {
            c @ b'1'..=b'8' => c - b'1',
            _ => return Err(invalid()),
        };

        Ok(Square(rank * 8 + file))
    }
}

/// Home square of the black king, where corruption first appears.
pub const BLACK_KING_HOME: Square = Square(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u32);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub kind: PieceKind,
    pub side: Side,
    pub square: Square,
    /// Set once corruption has transformed this piece.
    pub corrupted: bool,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Square occupancy plus the set of corrupted squares.
///
/// Every stored piece's `square` equals the key it is filed under; all
/// mutation goes through `place`/`remove`/`move_piece` to keep it that way.
#[derive(Debug, Clone, Default)]
pub struct Board {
    squares: HashMap<Square, Piece>,
    corruption: CorruptionSet,
    next_id: u32,
}

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Standard starting position, no corruption yet.
    pub fn standard() -> Self {
        let mut board = Self::empty();
        for side in [Side::White, Side::Black] {
            for (file, &kind) in BACK_RANK.iter().enumerate() {
                if let Some(sq) = Square::new(file as u8, side.back_rank()) {
                    board.spawn(kind, side, sq);
                }
            }
            for file in 0..8 {
                if let Some(sq) = Square::new(file, side.pawn_home_rank()) {
                    board.spawn(PieceKind::Pawn, side, sq);
                }
            }
        }
        board
    }

    pub fn occupant(&self, square: Square) -> Option<&Piece> {
        self.squares.get(&square)
    }

    pub fn occupant_side(&self, square: Square) -> Option<Side> {
        self.squares.get(&square).map(|p| p.side)
    }

    pub fn is_empty(&self, square: Square) -> bool {
        !self.squares.contains_key(&square)
    }

    /// Files `piece` under `square`, returning whatever was there.
    pub fn place(&mut self, square: Square, mut piece: Piece) -> Option<Piece> {
        piece.square = square;
        self.squares.insert(square, piece)
    }

    /// Instantiates a fresh, uncorrupted piece with a new id.
    pub fn spawn(&mut self, kind: PieceKind, side: Side, square: Square) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        self.place(
            square,
            Piece {
                id,
                kind,
                side,
                square,
                corrupted: false,
            },
        );
        id
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        self.squares.remove(&square)
    }

    /// Relocates the occupant of `from` to `to` and returns the piece it
    /// displaced. Chess legality is the caller's business.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Result<Option<Piece>> {
        let piece = self
            .squares
            .remove(&from)
            .ok_or(MoveRejection::EmptySource { from })?;
        Ok(self.place(to, piece))
    }

    pub fn mark_corrupted(&mut self, square: Square) {
        if let Some(piece) = self.squares.get_mut(&square) {
            piece.corrupted = true;
        }
    }

    pub fn find(&self, id: PieceId) -> Option<&Piece> {
        self.squares.values().find(|p| p.id == id)
    }

    /// Pieces in board order.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        Square::all().filter_map(move |sq| self.squares.get(&sq))
    }

    pub fn pieces_of(&self, side: Side) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces().filter(move |p| p.side == side)
    }

    pub fn count(&self, side: Side) -> usize {
        self.squares.values().filter(|p| p.side == side).count()
    }

    pub fn empty_squares(&self) -> Vec<Square> {
        Square::all().filter(|&sq| self.is_empty(sq)).collect()
    }

    pub fn is_corrupted(&self, square: Square) -> bool {
        self.corruption.contains(square)
    }

    pub fn corruption(&self) -> &CorruptionSet {
        &self.corruption
    }

    pub fn corruption_mut(&mut self) -> &mut CorruptionSet {
        &mut self.corruption
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let square = Square(rank * 8 + file);
                let c = match self.occupant(square) {
                    Some(piece) => piece.kind.symbol(piece.side),
                    None if self.is_corrupted(square) => '*',
                    None => '.',
                };
                write!(f, "{}", c)?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "  A B C D E F G H")
    }
}
