pub mod board;
pub mod bot;
pub mod config;
pub mod console;
pub mod corruption;
pub mod error;
pub mod event;
pub mod game;
pub mod movegen;

pub use board::{Board, Piece, PieceId, PieceKind, Side, Square};
pub use config::GameConfig;
pub use corruption::{CorruptionEffect, CorruptionEngine, CorruptionSet, SpreadPattern};
pub use error::{EngineError, MoveRejection, Result};
pub use event::GameEvent;
pub use game::{Game, GameStatus};
pub use movegen::{Move, MoveRules};
