use std::time::Duration;

use crate::board::{Square, BLACK_KING_HOME};

/// Knobs for one game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// RNG seed; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Completed black turns between corruption spreads.
    pub spread_every: u32,
    /// Square corrupted at the start of every game.
    pub corruption_origin: Square,
    /// 0-based rank that receives the random second seed square.
    pub corruption_seed_rank: u8,
    pub bot_plays_black: bool,
    /// How long a front-end should let the bot "think". The engine itself
    /// never waits.
    pub bot_delay: (Duration, Duration),
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            spread_every: 2,
            corruption_origin: BLACK_KING_HOME,
            corruption_seed_rank: 4,
            bot_plays_black: true,
            bot_delay: (Duration::from_secs(3), Duration::from_secs(6)),
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Values below 1 are clamped to 1.
    pub fn set_spread_every(mut self, turns: u32) -> Self {
        self.spread_every = turns.max(1);
        self
    }

    pub fn set_corruption_origin(mut self, square: Square) -> Self {
        self.corruption_origin = square;
        self
    }

    /// Ranks past the board are clamped to the last rank.
    pub fn set_corruption_seed_rank(mut self, rank: u8) -> Self {
        self.corruption_seed_rank = rank.min(7);
        self
    }

    pub fn set_bot_plays_black(mut self, enabled: bool) -> Self {
        self.bot_plays_black = enabled;
        self
    }

    pub fn set_bot_delay(mut self, min: Duration, max: Duration) -> Self {
        self.bot_delay = if min <= max { (min, max) } else { (max, min) };
        self
    }
}
