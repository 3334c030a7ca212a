use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, Piece, PieceId, PieceKind, Side, Square};
use crate::bot::Bot;
use crate::config::GameConfig;
use crate::corruption::CorruptionEngine;
use crate::error::{EngineError, MoveRejection, Result};
use crate::event::GameEvent;
use crate::movegen::{Move, MoveRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    WhiteToMove,
    BlackToMove,
    GameOver(Side),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    pub to_move: Side,
    /// Completed black turns; drives the spread cadence.
    pub black_turns: u32,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            to_move: Side::White,
            black_turns: 0,
        }
    }
}

/// The outcome of one committed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub mv: Move,
    pub events: Vec<GameEvent>,
}

/// One game session: board, corruption, turn state and the RNG behind
/// every random decision.
///
/// Every accepted move is committed in full before the call returns, after
/// which the game stays busy until the front-end calls [`Game::settle`].
pub struct Game<R: Rng = StdRng> {
    board: Board,
    corruption: CorruptionEngine,
    move_rules: MoveRules,
    bot: Bot,
    turn: TurnState,
    winner: Option<Side>,
    busy: bool,
    config: GameConfig,
    rng: R,
    journal: Vec<GameEvent>,
}

impl Game<StdRng> {
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Game<R> {
    /// Standard setup with the opening corruption already seeded.
    pub fn with_rng(config: GameConfig, rng: R) -> Self {
        let mut game = Self::from_board(config, Board::standard(), rng);
        let origin = game.config.corruption_origin;
        let rank = game.config.corruption_seed_rank;
        let events = game
            .corruption
            .initialize(&mut game.board, origin, rank, &mut game.rng);
        game.journal.extend(events);
        game
    }

    /// Starts from an arbitrary position, white to move. Corruption
    /// already on `board` is kept and nothing new is seeded.
    pub fn from_board(config: GameConfig, board: Board, rng: R) -> Self {
        Self {
            board,
            corruption: CorruptionEngine::new(),
            move_rules: MoveRules::new(),
            bot: Bot::new(),
            turn: TurnState::default(),
            winner: None,
            busy: false,
            config,
            rng,
            journal: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_turn(&self) -> Side {
        self.turn.to_move
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn
    }

    pub fn spreads(&self) -> u32 {
        self.corruption.spreads()
    }

    pub fn status(&self) -> GameStatus {
        match (self.winner, self.turn.to_move) {
            (Some(winner), _) => GameStatus::GameOver(winner),
            (None, Side::White) => GameStatus::WhiteToMove,
            (None, Side::Black) => GameStatus::BlackToMove,
        }
    }

    /// The winner, once one side has been wiped out.
    pub fn is_game_over(&self) -> Option<Side> {
        self.winner
    }

    /// True between a committed move and the matching [`Game::settle`].
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Marks the last move's visible effects as finished.
    pub fn settle(&mut self) {
        self.busy = false;
    }

    /// Black is to move and the bot is expected to play it.
    pub fn bot_pending(&self) -> bool {
        self.winner.is_none() && self.turn.to_move == Side::Black && self.config.bot_plays_black
    }

    pub fn piece(&self, id: PieceId) -> Result<&Piece> {
        self.board.find(id).ok_or(EngineError::NoSuchPiece(id))
    }

    pub fn request_legal_moves(&self, id: PieceId) -> Result<Vec<Square>> {
        let piece = self.piece(id)?;
        Ok(self.move_rules.legal_moves(&self.board, piece).collect())
    }

    /// Legal moves of whatever stands on `label`; empty if nothing does.
    pub fn legal_moves_at(&self, label: &str) -> Result<Vec<Square>> {
        let square: Square = label.parse()?;
        Ok(match self.board.occupant(square) {
            Some(piece) => self.move_rules.legal_moves(&self.board, piece).collect(),
            None => Vec::new(),
        })
    }

    /// Every event produced so far, oldest first.
    pub fn events(&self) -> &[GameEvent] {
        &self.journal
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.journal)
    }

    fn check_open(&self) -> Result<()> {
        if let Some(winner) = self.winner {
            return Err(MoveRejection::GameOver { winner }.into());
        }
        if self.busy {
            return Err(MoveRejection::TransactionInFlight.into());
        }
        Ok(())
    }

    /// Validates and commits a move for the side to move, then hands the
    /// turn over. Nothing changes if the move is rejected.
    pub fn submit_move(&mut self, id: PieceId, to: Square) -> Result<MoveReport> {
        self.check_open()?;
        let piece = *self.piece(id)?;
        if piece.side != self.turn.to_move {
            return Err(MoveRejection::WrongTurn {
                to_move: self.turn.to_move,
            }
            .into());
        }
        if piece.side == Side::Black && self.config.bot_plays_black {
            return Err(MoveRejection::BotControlled.into());
        }
        if !self.move_rules.is_legal_move(&self.board, &piece, to) {
            return Err(MoveRejection::IllegalDestination { piece: id, to }.into());
        }

        let mut mv = Move::new(&piece, to);
        mv.captured_piece = self.board.occupant(to).map(|p| p.kind);
        let events = self.commit(mv)?;
        Ok(MoveReport { mv, events })
    }

    /// Lets the bot play black's turn. Returns `None` when black had no
    /// legal move and passed.
    pub fn play_bot_turn(&mut self) -> Result<Option<MoveReport>> {
        self.check_open()?;
        if self.turn.to_move != Side::Black {
            return Err(MoveRejection::WrongTurn {
                to_move: self.turn.to_move,
            }
            .into());
        }

        match self.bot.choose_move(&self.board, Side::Black, &mut self.rng) {
            Some(mv) => {
                let events = self.commit(mv)?;
                Ok(Some(MoveReport { mv, events }))
            }
            None => {
                // A pass skips the black-turn count and the spread.
                self.journal.push(GameEvent::Passed { side: Side::Black });
                self.switch_turn();
                Ok(None)
            }
        }
    }

    fn commit(&mut self, mv: Move) -> Result<Vec<GameEvent>> {
        let mut events = Vec::new();

        let captured = self.board.move_piece(mv.from, mv.to)?;
        events.push(GameEvent::Moved {
            piece: mv.id,
            kind: mv.piece,
            side: mv.side,
            from: mv.from,
            to: mv.to,
        });
        if let Some(captured) = captured {
            events.push(GameEvent::Captured {
                piece: captured.id,
                kind: captured.kind,
                side: captured.side,
                square: captured.square,
            });
        }

        if mv.side == Side::White {
            if mv.piece == PieceKind::King {
                events.extend(self.corruption.cleanse(&mut self.board, mv.to));
            }
            if self.board.is_corrupted(mv.to) {
                events.extend(
                    self.corruption
                        .apply_corruption(&mut self.board, mv.id, &mut self.rng),
                );
            }
        }
        self.busy = true;
        self.journal.extend(events.iter().cloned());

        if mv.side == Side::Black {
            events.extend(self.end_turn());
        }
        events.extend(self.switch_turn());
        Ok(events)
    }

    /// Bookkeeping after black completes a move: counts the turn and
    /// spreads corruption every `spread_every` turns.
    pub fn end_turn(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.turn.to_move != Side::Black {
            return events;
        }
        self.turn.black_turns += 1;
        if self.turn.black_turns % self.config.spread_every.max(1) == 0 {
            events.push(self.corruption.spread(&mut self.board));
        }
        self.journal.extend(events.iter().cloned());
        events
    }

    /// Hands the move to the other side. White pieces already standing on
    /// corruption are hit as white's turn begins; then the win check runs.
    pub fn switch_turn(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.winner.is_some() {
            return events;
        }

        self.turn.to_move = self.turn.to_move.opposite();
        events.push(GameEvent::TurnSwitched {
            to_move: self.turn.to_move,
            black_turns: self.turn.black_turns,
        });
        if self.turn.to_move == Side::White {
            events.extend(self.corruption.sweep(&mut self.board, &mut self.rng));
        }

        if let Some(winner) = self.winner_by_annihilation() {
            self.winner = Some(winner);
            events.push(GameEvent::GameOver { winner });
        }
        self.journal.extend(events.iter().cloned());
        events
    }

    fn winner_by_annihilation(&self) -> Option<Side> {
        if self.board.count(Side::White) == 0 {
            Some(Side::Black)
        } else if self.board.count(Side::Black) == 0 {
            Some(Side::White)
        } else {
            None
        }
    }

    /// Idle-time update: every white king cleanses its neighbourhood.
    /// Does nothing while a move is in flight or after the game ended.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        if self.busy || self.winner.is_some() {
            return Vec::new();
        }
        let kings: Vec<Square> = self
            .board
            .pieces_of(Side::White)
            .filter(|p| p.kind == PieceKind::King)
            .map(|p| p.square)
            .collect();

        let mut events = Vec::new();
        for king in kings {
            events.extend(self.corruption.cleanse(&mut self.board, king));
        }
        self.journal.extend(events.iter().cloned());
        events
    }
}
