use crate::board::{Board, Piece, PieceId, PieceKind, Side, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub id: PieceId,
    pub piece: PieceKind,
    pub side: Side,
    pub from: Square,
    pub to: Square,
    pub captured_piece: Option<PieceKind>,
}

impl Move {
    pub fn new(piece: &Piece, to: Square) -> Self {
        Self {
            id: piece.id,
            piece: piece.kind,
            side: piece.side,
            from: piece.square,
            to,
            captured_piece: None,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }
}

const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ALL_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// How a piece kind moves.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    Pawn,
    /// Single jumps by fixed (file, rank) offsets.
    Leaper(&'static [(i8, i8)]),
    /// Rays along each direction until blocked.
    Slider(&'static [(i8, i8)]),
}

fn pattern(kind: PieceKind) -> Pattern {
    match kind {
        PieceKind::Pawn => Pattern::Pawn,
        PieceKind::Knight => Pattern::Leaper(&KNIGHT_JUMPS),
        PieceKind::King => Pattern::Leaper(&ALL_DIRECTIONS),
        PieceKind::Bishop => Pattern::Slider(&DIAGONALS),
        PieceKind::Rook => Pattern::Slider(&ORTHOGONALS),
        PieceKind::Queen => Pattern::Slider(&ALL_DIRECTIONS),
    }
}

/// Destination squares for one piece. Borrows the board, so it is always
/// computed against the current position and never outlives a mutation.
pub type LegalMoves<'a> = Box<dyn Iterator<Item = Square> + 'a>;

/// Walks one direction square by square. Empty squares are yielded and the
/// walk continues; an opponent is yielded and ends it; an own piece ends it
/// without being yielded.
struct Ray<'a> {
    board: &'a Board,
    side: Side,
    cursor: Square,
    step: (i8, i8),
    done: bool,
}

impl<'a> Iterator for Ray<'a> {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.done {
            return None;
        }
        let Some(next) = self.cursor.offset(self.step.0, self.step.1) else {
            self.done = true;
            return None;
        };
        self.cursor = next;
        match self.board.occupant_side(next) {
            None => Some(next),
            Some(side) if side == self.side => {
                self.done = true;
                None
            }
            Some(_) => {
                self.done = true;
                Some(next)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveRules;

impl MoveRules {
    pub fn new() -> Self {
        Self
    }

    /// Every square `piece` may move to on `board`.
    pub fn legal_moves<'a>(&self, board: &'a Board, piece: &Piece) -> LegalMoves<'a> {
        let from = piece.square;
        let side = piece.side;
        match pattern(piece.kind) {
            Pattern::Pawn => Self::pawn_moves(board, from, side),
            Pattern::Leaper(offsets) => Box::new(
                offsets
                    .iter()
                    .filter_map(move |&(df, dr)| from.offset(df, dr))
                    .filter(move |&sq| board.occupant_side(sq) != Some(side)),
            ),
            Pattern::Slider(directions) => {
                Box::new(directions.iter().flat_map(move |&step| Ray {
                    board,
                    side,
                    cursor: from,
                    step,
                    done: false,
                }))
            }
        }
    }

    /// Like [`MoveRules::legal_moves`] but addressed by a square label. A
    /// malformed label or an empty square gives no moves.
    pub fn legal_moves_at<'a>(&self, board: &'a Board, label: &str) -> LegalMoves<'a> {
        let piece = label
            .parse::<Square>()
            .ok()
            .and_then(|sq| board.occupant(sq));
        match piece {
            Some(piece) => self.legal_moves(board, piece),
            None => Box::new(std::iter::empty()),
        }
    }

    fn pawn_moves(board: &Board, from: Square, side: Side) -> LegalMoves<'_> {
        let dr = side.pawn_direction();

        let single = from.offset(0, dr).filter(|&sq| board.is_empty(sq));
        let double = single
            .filter(|_| from.rank() == side.pawn_home_rank())
            .and_then(|_| from.offset(0, 2 * dr))
            .filter(|&sq| board.is_empty(sq));
        let captures = [-1, 1]
            .into_iter()
            .filter_map(move |df| from.offset(df, dr))
            .filter(move |&sq| board.occupant_side(sq) == Some(side.opposite()));

        Box::new(single.into_iter().chain(double).chain(captures))
    }

    /// The gate every move goes through before it touches the board.
    pub fn is_legal_move(&self, board: &Board, piece: &Piece, to: Square) -> bool {
        board.occupant_side(to) != Some(piece.side)
            && self.legal_moves(board, piece).any(|sq| sq == to)
    }

    /// All moves for `side`, pieces in board order, with captures filled in.
    pub fn generate_moves(&self, board: &Board, side: Side) -> Vec<Move> {
        let mut moves = Vec::new();
        for piece in board.pieces_of(side) {
            moves.extend(self.moves_for(board, piece));
        }
        moves
    }

    pub fn moves_for(&self, board: &Board, piece: &Piece) -> Vec<Move> {
        self.legal_moves(board, piece)
            .filter(|&to| board.occupant_side(to) != Some(piece.side))
            .map(|to| {
                let mut mv = Move::new(piece, to);
                mv.captured_piece = board.occupant(to).map(|p| p.kind);
                mv
            })
            .collect()
    }
}
