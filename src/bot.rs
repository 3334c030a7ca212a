use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Board, Piece, Side};
use crate::movegen::{Move, MoveRules};

/// Picks moves for the computer side: any capture on the board first,
/// otherwise a random move of a random piece.
#[derive(Debug, Clone, Default)]
pub struct Bot {
    move_rules: MoveRules,
}

impl Bot {
    pub fn new() -> Self {
        Self {
            move_rules: MoveRules::new(),
        }
    }

    /// `None` means `side` has no legal move at all.
    pub fn choose_move<R: Rng + ?Sized>(
        &self,
        board: &Board,
        side: Side,
        rng: &mut R,
    ) -> Option<Move> {
        let moves = self.move_rules.generate_moves(board, side);

        let captures: Vec<Move> = moves.iter().copied().filter(Move::is_capture).collect();
        if let Some(mv) = captures.choose(rng) {
            return Some(*mv);
        }

        let mut pieces: Vec<&Piece> = board.pieces_of(side).collect();
        pieces.shuffle(rng);
        for piece in pieces {
            let options = self.move_rules.moves_for(board, piece);
            if let Some(mv) = options.choose(rng) {
                return Some(*mv);
            }
        }

        None
    }
}
