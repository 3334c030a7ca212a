use std::fmt;

use rand::Rng;

use crate::board::{Board, PieceId, PieceKind, Side, Square};
use crate::event::{GameEvent, Reversion};

/// Corrupted squares as a 64-bit mask, bit `n` for square index `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorruptionSet(u64);

impl CorruptionSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn contains(&self, square: Square) -> bool {
        self.0 & (1u64 << square.index()) != 0
    }

    /// Returns `false` if the square was already corrupted.
    pub fn insert(&mut self, square: Square) -> bool {
        let fresh = !self.contains(square);
        self.0 |= 1u64 << square.index();
        fresh
    }

    pub fn remove(&mut self, square: Square) -> bool {
        let present = self.contains(square);
        self.0 &= !(1u64 << square.index());
        present
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Square> {
        let bits = self.0;
        Square::all().filter(move |sq| bits & (1u64 << sq.index()) != 0)
    }
}

impl FromIterator<Square> for CorruptionSet {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        let mut set = CorruptionSet::new();
        for sq in iter {
            set.insert(sq);
        }
        set
    }
}

/// Growth rule used by one spread step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadPattern {
    /// Orthogonal neighbours of every corrupted square.
    Plus,
    /// Diagonal neighbours whose two flanking orthogonal squares are both
    /// already corrupted.
    Cross,
}

impl SpreadPattern {
    /// Pattern used by the `n`th spread (0-based).
    pub fn for_spread(n: u32) -> Self {
        if n % 2 == 0 {
            SpreadPattern::Plus
        } else {
            SpreadPattern::Cross
        }
    }
}

impl fmt::Display for SpreadPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpreadPattern::Plus => f.write_str("plus"),
            SpreadPattern::Cross => f.write_str("x"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionEffect {
    /// Replaced in place by the same kind on the other side.
    SideSwitch,
    /// Replaced in place by a fresh white pawn.
    DowngradeToPawn,
    /// Replaced by the same piece on a random empty square.
    Teleport,
}

impl CorruptionEffect {
    pub const ALL: [CorruptionEffect; 3] = [
        CorruptionEffect::SideSwitch,
        CorruptionEffect::DowngradeToPawn,
        CorruptionEffect::Teleport,
    ];
}

impl fmt::Display for CorruptionEffect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorruptionEffect::SideSwitch => f.write_str("side-switch"),
            CorruptionEffect::DowngradeToPawn => f.write_str("downgrade"),
            CorruptionEffect::Teleport => f.write_str("teleport"),
        }
    }
}

const ORTHOGONALS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Spreads, applies and cleanses corruption on a [`Board`].
///
/// The corrupted squares themselves live on the board; the engine only
/// keeps the spread counter that decides the next pattern.
#[derive(Debug, Clone, Default)]
pub struct CorruptionEngine {
    spreads: u32,
}

impl CorruptionEngine {
    pub fn new() -> Self {
        Self { spreads: 0 }
    }

    pub fn spreads(&self) -> u32 {
        self.spreads
    }

    pub fn next_pattern(&self) -> SpreadPattern {
        SpreadPattern::for_spread(self.spreads)
    }

    /// Seeds `origin` plus one random square on `seed_rank`.
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        board: &mut Board,
        origin: Square,
        seed_rank: u8,
        rng: &mut R,
    ) -> Vec<GameEvent> {
        let mut events = self.corrupt(board, origin, rng);
        if let Some(random) = Square::new(rng.gen_range(0..8), seed_rank) {
            events.extend(self.corrupt(board, random, rng));
        }
        events
    }

    /// Corrupts a single square. A white piece standing there is hit at
    /// once. Already corrupted squares are left alone.
    pub fn corrupt<R: Rng + ?Sized>(
        &mut self,
        board: &mut Board,
        square: Square,
        rng: &mut R,
    ) -> Vec<GameEvent> {
        if !board.corruption_mut().insert(square) {
            return Vec::new();
        }
        let mut events = vec![GameEvent::CorruptionSeeded {
            squares: vec![square],
        }];
        if let Some(id) = board.occupant(square).map(|p| p.id) {
            events.extend(self.apply_corruption(board, id, rng));
        }
        events
    }

    /// Grows the corrupted area by one step and flips the pattern.
    pub fn spread(&mut self, board: &mut Board) -> GameEvent {
        let pattern = self.next_pattern();
        self.spreads += 1;

        let current = *board.corruption();
        let frontier = match pattern {
            SpreadPattern::Plus => plus_frontier(&current),
            SpreadPattern::Cross => cross_frontier(&current),
        };
        for sq in frontier.iter() {
            board.corruption_mut().insert(sq);
        }

        GameEvent::CorruptionSpread {
            pattern,
            squares: frontier.iter().collect(),
        }
    }

    /// Hits a white piece that has not been corrupted before. Pawns always
    /// switch sides; other kinds get a uniformly random effect. Anything
    /// else, including a missing piece, is a no-op.
    pub fn apply_corruption<R: Rng + ?Sized>(
        &self,
        board: &mut Board,
        id: PieceId,
        rng: &mut R,
    ) -> Option<GameEvent> {
        let piece = *board.find(id)?;
        if piece.side != Side::White || piece.corrupted {
            return None;
        }
        let effect = if piece.kind == PieceKind::Pawn {
            CorruptionEffect::SideSwitch
        } else {
            CorruptionEffect::ALL[rng.gen_range(0..CorruptionEffect::ALL.len())]
        };
        self.apply_effect(board, id, effect, rng)
    }

    pub fn apply_effect<R: Rng + ?Sized>(
        &self,
        board: &mut Board,
        id: PieceId,
        effect: CorruptionEffect,
        rng: &mut R,
    ) -> Option<GameEvent> {
        let piece = *board.find(id)?;
        let square = piece.square;

        let landed = match effect {
            CorruptionEffect::SideSwitch => {
                board.remove(square);
                board.spawn(piece.kind, piece.side.opposite(), square);
                board.mark_corrupted(square);
                square
            }
            CorruptionEffect::DowngradeToPawn => {
                board.remove(square);
                board.spawn(PieceKind::Pawn, Side::White, square);
                square
            }
            CorruptionEffect::Teleport => {
                let empty = board.empty_squares();
                if empty.is_empty() {
                    board.mark_corrupted(square);
                    square
                } else {
                    let target = empty[rng.gen_range(0..empty.len())];
                    board.remove(square);
                    board.spawn(piece.kind, piece.side, target);
                    board.mark_corrupted(target);
                    target
                }
            }
        };

        let result = *board.occupant(landed)?;
        Some(GameEvent::CorruptionApplied {
            piece: piece.id,
            kind: piece.kind,
            square,
            effect,
            result,
        })
    }

    /// Applies corruption to every uncorrupted white piece standing on a
    /// corrupted square.
    pub fn sweep<R: Rng + ?Sized>(&self, board: &mut Board, rng: &mut R) -> Vec<GameEvent> {
        let exposed: Vec<PieceId> = board
            .pieces_of(Side::White)
            .filter(|p| !p.corrupted && board.is_corrupted(p.square))
            .map(|p| p.id)
            .collect();

        exposed
            .into_iter()
            .filter_map(|id| self.apply_corruption(board, id, rng))
            .collect()
    }

    /// Clears corruption from the 3x3 block around `king` and turns every
    /// black piece in it into a fresh white piece of the same kind.
    pub fn cleanse(&self, board: &mut Board, king: Square) -> Option<GameEvent> {
        let mut squares = Vec::new();
        let mut reverted = Vec::new();

        for sq in king.block() {
            if board.corruption_mut().remove(sq) {
                squares.push(sq);
            }
            let black = board.occupant(sq).copied().filter(|p| p.side == Side::Black);
            if let Some(black) = black {
                board.remove(sq);
                let id = board.spawn(black.kind, Side::White, sq);
                reverted.push(Reversion {
                    from: black.id,
                    to: id,
                    kind: black.kind,
                    square: sq,
                });
            }
        }

        if squares.is_empty() && reverted.is_empty() {
            return None;
        }
        Some(GameEvent::Cleansed {
            king,
            squares,
            reverted,
        })
    }
}

fn plus_frontier(set: &CorruptionSet) -> CorruptionSet {
    set.iter()
        .flat_map(|sq| ORTHOGONALS.into_iter().filter_map(move |(df, dr)| sq.offset(df, dr)))
        .filter(|&sq| !set.contains(sq))
        .collect()
}

fn cross_frontier(set: &CorruptionSet) -> CorruptionSet {
    let mut frontier = CorruptionSet::new();
    for sq in set.iter() {
        for &(df, dr) in &DIAGONALS {
            let (Some(target), Some(side_a), Some(side_b)) =
                (sq.offset(df, dr), sq.offset(df, 0), sq.offset(0, dr))
            else {
                continue;
            };
            if set.contains(side_a) && set.contains(side_b) && !set.contains(target) {
                frontier.insert(target);
            }
        }
    }
    frontier
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sq(label: &str) -> Square {
        label.parse().unwrap()
    }

    fn set(labels: &[&str]) -> CorruptionSet {
        labels.iter().map(|l| sq(l)).collect()
    }

    fn board_with(labels: &[&str]) -> Board {
        let mut board = Board::empty();
        *board.corruption_mut() = set(labels);
        board
    }

    #[test]
    fn test_set_basics() {
        let mut s = CorruptionSet::new();
        assert!(s.is_empty());
        assert!(s.insert(sq("E8")));
        assert!(!s.insert(sq("E8")));
        assert!(s.insert(sq("A1")));
        assert_eq!(s.len(), 2);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![sq("A1"), sq("E8")]);
        assert!(s.remove(sq("A1")));
        assert!(!s.remove(sq("A1")));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_corrupt_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut engine = CorruptionEngine::new();
        let mut board = Board::empty();

        assert_eq!(engine.corrupt(&mut board, sq("E8"), &mut rng).len(), 1);
        assert_eq!(engine.corrupt(&mut board, sq("F5"), &mut rng).len(), 1);
        assert_eq!(board.corruption().len(), 2);

        assert!(engine.corrupt(&mut board, sq("E8"), &mut rng).is_empty());
        assert_eq!(board.corruption().len(), 2);
    }

    #[test]
    fn test_initialize_seeds_origin_and_fifth_row() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut engine = CorruptionEngine::new();
            let mut board = Board::standard();
            engine.initialize(&mut board, sq("E8"), 4, &mut rng);

            let corrupted: Vec<Square> = board.corruption().iter().collect();
            assert_eq!(corrupted.len(), 2);
            assert!(board.is_corrupted(sq("E8")));
            assert!(corrupted.iter().any(|s| s.rank() == 4));
        }
    }

    #[test]
    fn test_corrupting_occupied_square_hits_white_piece() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut engine = CorruptionEngine::new();
        let mut board = Board::empty();
        board.spawn(PieceKind::Pawn, Side::White, sq("C5"));

        let events = engine.corrupt(&mut board, sq("C5"), &mut rng);
        assert_eq!(events.len(), 2);
        let pawn = board.occupant(sq("C5")).unwrap();
        assert_eq!((pawn.kind, pawn.side), (PieceKind::Pawn, Side::Black));
    }

    #[test]
    fn test_plus_spread() {
        let mut board = board_with(&["E8", "F5"]);
        let mut engine = CorruptionEngine::new();

        let event = engine.spread(&mut board);
        let GameEvent::CorruptionSpread { pattern, squares } = event else {
            panic!("expected a spread event");
        };
        assert_eq!(pattern, SpreadPattern::Plus);
        assert_eq!(
            squares.iter().copied().collect::<CorruptionSet>(),
            set(&["D8", "F8", "E7", "F6", "F4", "E5", "G5"])
        );
        assert_eq!(board.corruption().len(), 9);
    }

    #[test]
    fn test_plus_spread_adds_shared_neighbour_once() {
        let mut board = board_with(&["D4", "F4"]);
        let mut engine = CorruptionEngine::new();
        let GameEvent::CorruptionSpread { squares, .. } = engine.spread(&mut board) else {
            panic!("expected a spread event");
        };
        assert_eq!(squares.len(), 7);
        assert_eq!(board.corruption().len(), 9);
    }

    #[test]
    fn test_cross_spread_needs_both_flanks() {
        assert!(cross_frontier(&set(&["D4"])).is_empty());
        assert!(cross_frontier(&set(&["D4", "D5"])).is_empty());
        assert_eq!(cross_frontier(&set(&["D4", "D5", "E4"])), set(&["E5"]));
        assert_eq!(
            cross_frontier(&set(&["D4", "D5", "E4", "C4", "D3"])),
            set(&["E5", "C5", "C3", "E3"])
        );
        assert_eq!(cross_frontier(&set(&["A1", "A2", "B1"])), set(&["B2"]));
    }

    #[test]
    fn test_spread_pattern_alternates() {
        let mut board = board_with(&["D4"]);
        let mut engine = CorruptionEngine::new();
        let mut patterns = Vec::new();
        for _ in 0..4 {
            if let GameEvent::CorruptionSpread { pattern, .. } = engine.spread(&mut board) {
                patterns.push(pattern);
            }
        }
        assert_eq!(
            patterns,
            vec![
                SpreadPattern::Plus,
                SpreadPattern::Cross,
                SpreadPattern::Plus,
                SpreadPattern::Cross
            ]
        );
        assert_eq!(engine.spreads(), 4);
        // D4 plus 4, 4, 12 and 4 new squares: the 5x5 block around D4.
        assert_eq!(board.corruption().len(), 9 + 12 + 4);
    }

    #[test]
    fn test_spread_never_shrinks() {
        let mut board = board_with(&["A1", "H8"]);
        let mut engine = CorruptionEngine::new();
        let mut last = board.corruption().len();
        for _ in 0..14 {
            engine.spread(&mut board);
            let now = board.corruption().len();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 64);
    }

    #[test]
    fn test_pawn_always_switches_sides() {
        let engine = CorruptionEngine::new();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut board = board_with(&["B4"]);
            let id = board.spawn(PieceKind::Pawn, Side::White, sq("B4"));
            let event = engine.apply_corruption(&mut board, id, &mut rng).unwrap();
            let GameEvent::CorruptionApplied { effect, result, .. } = event else {
                panic!("expected a corruption event");
            };
            assert_eq!(effect, CorruptionEffect::SideSwitch);
            assert_eq!(result.side, Side::Black);
            assert_eq!(result.square, sq("B4"));
            assert!(board.find(id).is_none());
        }
    }

    #[test]
    fn test_no_op_cases() {
        let mut rng = StdRng::seed_from_u64(3);
        let engine = CorruptionEngine::new();
        let mut board = board_with(&["B4", "C4"]);
        let black = board.spawn(PieceKind::Rook, Side::Black, sq("B4"));
        let white = board.spawn(PieceKind::Rook, Side::White, sq("C4"));
        board.mark_corrupted(sq("C4"));

        assert!(engine.apply_corruption(&mut board, PieceId(999), &mut rng).is_none());
        assert!(engine.apply_corruption(&mut board, black, &mut rng).is_none());
        assert!(engine.apply_corruption(&mut board, white, &mut rng).is_none());
        assert_eq!(board.pieces().count(), 2);
    }

    #[test]
    fn test_side_switch_keeps_kind() {
        let mut rng = StdRng::seed_from_u64(0);
        let engine = CorruptionEngine::new();
        let mut board = Board::empty();
        let id = board.spawn(PieceKind::Queen, Side::White, sq("D5"));
        engine.apply_effect(&mut board, id, CorruptionEffect::SideSwitch, &mut rng);

        let queen = board.occupant(sq("D5")).unwrap();
        assert_eq!((queen.kind, queen.side), (PieceKind::Queen, Side::Black));
        assert_ne!(queen.id, id);
    }

    #[test]
    fn test_downgrade_leaves_fresh_white_pawn() {
        let mut rng = StdRng::seed_from_u64(0);
        let engine = CorruptionEngine::new();
        let mut board = board_with(&["D5"]);
        let id = board.spawn(PieceKind::Knight, Side::White, sq("D5"));
        engine.apply_effect(&mut board, id, CorruptionEffect::DowngradeToPawn, &mut rng);

        let pawn = board.occupant(sq("D5")).unwrap();
        assert_eq!((pawn.kind, pawn.side), (PieceKind::Pawn, Side::White));
        assert!(!pawn.corrupted);
    }

    #[test]
    fn test_teleport_lands_on_empty_square() {
        let engine = CorruptionEngine::new();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut board = Board::standard();
            let bishop = board.occupant(sq("C1")).unwrap().id;
            let before = board.empty_squares();

            let event = engine
                .apply_effect(&mut board, bishop, CorruptionEffect::Teleport, &mut rng)
                .unwrap();
            let GameEvent::CorruptionApplied { result, .. } = event else {
                panic!("expected a corruption event");
            };
            assert!(before.contains(&result.square));
            assert_eq!((result.kind, result.side), (PieceKind::Bishop, Side::White));
            assert!(result.corrupted);
            assert!(board.is_empty(sq("C1")));
            assert_eq!(board.count(Side::White), 16);
        }
    }

    #[test]
    fn test_teleport_with_no_empty_square_stays_put() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut board = Board::empty();
        for square in Square::all() {
            board.spawn(PieceKind::Pawn, Side::Black, square);
        }
        board.remove(sq("D4"));
        let rook = board.spawn(PieceKind::Rook, Side::White, sq("D4"));
        assert!(board.empty_squares().is_empty());

        let event = CorruptionEngine::new()
            .apply_effect(&mut board, rook, CorruptionEffect::Teleport, &mut rng)
            .unwrap();
        let GameEvent::CorruptionApplied { square, result, .. } = event else {
            panic!("expected a corruption event");
        };
        assert_eq!(square, sq("D4"));
        assert_eq!(result.id, rook);
        assert_eq!(result.square, sq("D4"));
        assert!(result.corrupted);
        assert!(board.find(rook).unwrap().corrupted);
        assert_eq!(board.count(Side::White), 1);
    }

    #[test]
    fn test_random_effect_is_one_of_three() {
        let engine = CorruptionEngine::new();
        let mut seen = Vec::new();
        for seed in 0..60 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut board = board_with(&["E4"]);
            let id = board.spawn(PieceKind::Rook, Side::White, sq("E4"));
            if let Some(GameEvent::CorruptionApplied { effect, .. }) =
                engine.apply_corruption(&mut board, id, &mut rng)
            {
                if !seen.contains(&effect) {
                    seen.push(effect);
                }
            }
            assert_eq!(board.pieces().count(), 1);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_sweep_hits_only_exposed_white_pieces() {
        let mut rng = StdRng::seed_from_u64(11);
        let engine = CorruptionEngine::new();
        let mut board = board_with(&["A2", "B2", "C7"]);
        board.spawn(PieceKind::Pawn, Side::White, sq("A2"));
        board.spawn(PieceKind::Pawn, Side::White, sq("B2"));
        board.spawn(PieceKind::Pawn, Side::White, sq("C2"));
        board.spawn(PieceKind::Pawn, Side::Black, sq("C7"));

        let events = engine.sweep(&mut board, &mut rng);
        assert_eq!(events.len(), 2);
        assert_eq!(board.occupant_side(sq("A2")), Some(Side::Black));
        assert_eq!(board.occupant_side(sq("B2")), Some(Side::Black));
        assert_eq!(board.occupant_side(sq("C2")), Some(Side::White));
        assert_eq!(board.occupant_side(sq("C7")), Some(Side::Black));

        assert!(engine.sweep(&mut board, &mut rng).is_empty());
    }

    #[test]
    fn test_cleanse_reverts_black_neighbours() {
        let engine = CorruptionEngine::new();
        let mut board = board_with(&["D5", "H8"]);
        board.spawn(PieceKind::King, Side::White, sq("D4"));
        let pawn = board.spawn(PieceKind::Pawn, Side::Black, sq("D5"));
        board.spawn(PieceKind::Knight, Side::Black, sq("F4"));

        let event = engine.cleanse(&mut board, sq("D4")).unwrap();
        assert!(!board.is_corrupted(sq("D5")));
        assert!(board.is_corrupted(sq("H8")));

        let reverted = board.occupant(sq("D5")).unwrap();
        assert_eq!((reverted.kind, reverted.side), (PieceKind::Pawn, Side::White));
        assert!(!reverted.corrupted);
        assert_eq!(board.occupant_side(sq("F4")), Some(Side::Black));

        let GameEvent::Cleansed {
            squares, reverted, ..
        } = event
        else {
            panic!("expected a cleanse event");
        };
        assert_eq!(squares, vec![sq("D5")]);
        assert_eq!(reverted.len(), 1);
        assert_eq!(reverted[0].from, pawn);

        assert!(engine.cleanse(&mut board, sq("D4")).is_none());
    }

    #[test]
    fn test_cleanse_in_corner() {
        let engine = CorruptionEngine::new();
        let mut board = board_with(&["A1", "B2", "C3"]);
        engine.cleanse(&mut board, sq("A1"));
        assert_eq!(board.corruption().iter().collect::<Vec<_>>(), vec![sq("C3")]);
    }
}
