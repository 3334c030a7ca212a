use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use rand::Rng;

use crate::board::{PieceId, Side, Square};
use crate::config::GameConfig;
use crate::error::EngineError;
use crate::game::{Game, GameStatus};

/// The piece the console user is about to move, with its highlighted
/// targets. Owned by the front-end; the engine never sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub piece: PieceId,
    pub square: Square,
    pub targets: Vec<Square>,
}

/// Line-based front-end on stdin/stdout. Plays white against the bot by
/// default and prints every engine event as an `info` line.
pub struct ConsoleHandler {
    game: Game,
    config: GameConfig,
    selection: Option<Selection>,
}

impl ConsoleHandler {
    pub fn new(config: GameConfig) -> Self {
        ConsoleHandler {
            game: Game::new(config.clone()),
            config,
            selection: None,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = stdin.lock();
        let mut line = String::new();

        print!("{}", self.drain_events());
        while reader.read_line(&mut line)? > 0 {
            let command = line.trim();
            if command == "quit" {
                break;
            }
            let response = self.handle_command(command)?;
            print!("{}", response);
            stdout.flush()?;
            line.clear();
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        let response = match parts[0] {
            "new" => self.handle_new(&parts[1..]),
            "board" => format!("{}\n", self.game.board()),
            "select" => self.handle_select(&parts[1..]),
            "to" => self.handle_to(&parts[1..]),
            "move" => self.handle_move(&parts[1..]),
            "bot" => self.handle_bot(),
            "tick" => {
                self.game.tick();
                self.drain_events()
            }
            "corruption" => self.handle_corruption(),
            "status" => self.handle_status(),
            "quit" => String::new(),
            "help" => HELP.to_string(),
            other => format!("error unknown command {}\n", other),
        };
        Ok(response)
    }

    fn handle_new(&mut self, parts: &[&str]) -> String {
        if let Some(label) = parts.first() {
            match label.parse::<u64>() {
                Ok(seed) => self.config = self.config.clone().set_seed(seed),
                Err(_) => return format!("error bad seed {:?}\n", label),
            }
        }
        self.game = Game::new(self.config.clone());
        self.selection = None;
        self.drain_events()
    }

    fn handle_select(&mut self, parts: &[&str]) -> String {
        let Some(label) = parts.first() else {
            return "error select needs a square\n".to_string();
        };
        let square = match label.parse::<Square>() {
            Ok(square) => square,
            Err(e) => return format!("error {}\n", e),
        };
        let Some(piece) = self.game.board().occupant(square).copied() else {
            return format!("error no piece on {}\n", square);
        };
        if piece.side != self.game.current_turn() {
            return format!("error it is {}'s turn\n", self.game.current_turn());
        }

        if self.selection.as_ref().map(|s| s.piece) == Some(piece.id) {
            self.selection = None;
            return format!("deselected {}\n", square);
        }

        let targets = match self.game.request_legal_moves(piece.id) {
            Ok(targets) => targets,
            Err(e) => return format!("error {}\n", e),
        };
        let listed: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        let response = format!(
            "selected {} {} on {} targets {}\n",
            piece.side,
            piece.kind,
            square,
            if listed.is_empty() {
                "-".to_string()
            } else {
                listed.join(" ")
            }
        );
        self.selection = Some(Selection {
            piece: piece.id,
            square,
            targets,
        });
        response
    }

    fn handle_to(&mut self, parts: &[&str]) -> String {
        let Some(selection) = self.selection.clone() else {
            return "error nothing selected\n".to_string();
        };
        let Some(label) = parts.first() else {
            return "error to needs a square\n".to_string();
        };
        match label.parse::<Square>() {
            Ok(to) => self.play(selection.piece, to),
            Err(e) => format!("error {}\n", e),
        }
    }

    fn handle_move(&mut self, parts: &[&str]) -> String {
        if parts.len() < 2 {
            return "error move needs two squares\n".to_string();
        }
        let squares = parts[0]
            .parse::<Square>()
            .and_then(|from| parts[1].parse::<Square>().map(|to| (from, to)));
        let (from, to) = match squares {
            Ok(pair) => pair,
            Err(e) => return format!("error {}\n", e),
        };
        match self.game.board().occupant(from).map(|p| p.id) {
            Some(id) => self.play(id, to),
            None => format!("error no piece on {}\n", from),
        }
    }

    /// Submits a human move and, if the bot owns the reply, plays it too.
    fn play(&mut self, id: PieceId, to: Square) -> String {
        if let Err(e) = self.game.submit_move(id, to) {
            return self.report_error(e);
        }
        self.selection = None;
        self.game.settle();
        self.game.tick();
        let mut response = self.drain_events();

        if self.game.bot_pending() {
            response.push_str(&self.handle_bot());
        }
        response
    }

    fn handle_bot(&mut self) -> String {
        if !self.game.bot_pending() {
            return "error the bot is not to move\n".to_string();
        }
        self.think();
        if let Err(e) = self.game.play_bot_turn() {
            return self.report_error(e);
        }
        self.game.settle();
        self.game.tick();
        self.drain_events()
    }

    /// Waits out the configured bot delay.
    fn think(&self) {
        let (min, max) = self.config.bot_delay;
        if max.is_zero() {
            return;
        }
        let pause: Duration = rand::thread_rng().gen_range(min..=max);
        thread::sleep(pause);
    }

    fn handle_corruption(&self) -> String {
        let squares: Vec<String> = self
            .game
            .board()
            .corruption()
            .iter()
            .map(|sq| sq.to_string())
            .collect();
        format!(
            "corruption count={} squares={}\n",
            squares.len(),
            if squares.is_empty() {
                "-".to_string()
            } else {
                squares.join(",")
            }
        )
    }

    fn handle_status(&self) -> String {
        let board = self.game.board();
        let state = self.game.turn_state();
        let head = match self.game.status() {
            GameStatus::GameOver(winner) => format!("game-over winner={}", winner),
            GameStatus::WhiteToMove | GameStatus::BlackToMove => {
                format!("turn={}", state.to_move)
            }
        };
        format!(
            "status {} black-turns={} spreads={} white={} black={} corrupted={}\n",
            head,
            state.black_turns,
            self.game.spreads(),
            board.count(Side::White),
            board.count(Side::Black),
            board.corruption().len()
        )
    }

    fn report_error(&mut self, e: EngineError) -> String {
        eprintln!("rejected: {}", e);
        format!("error {}\n", e)
    }

    fn drain_events(&mut self) -> String {
        self.game
            .take_events()
            .iter()
            .map(|event| format!("info {}\n", event))
            .collect()
    }
}

const HELP: &str = "\
commands:
  new [seed]        start a new game
  board             print the board
  select <sq>       select a piece and list its targets (again to deselect)
  to <sq>           move the selected piece
  move <from> <to>  move a piece directly
  bot               let the bot play black's turn
  tick              run the idle cleanse
  corruption        list corrupted squares
  status            turn, counters and piece counts
  quit
";

/// Builds a [`GameConfig`] from `key value` argument pairs:
/// `seed N`, `spread N`, `delay-ms N`, and the flag `human-black`.
pub fn config_from_args(args: &[String]) -> Result<GameConfig> {
    let mut config = GameConfig::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "seed" => {
                config = config.set_seed(number_after(args, i)?);
                i += 2;
            }
            "spread" => {
                let turns = number_after(args, i)?;
                let turns = u32::try_from(turns)
                    .map_err(|_| anyhow!("spread {} does not fit in 32 bits", turns))?;
                config = config.set_spread_every(turns);
                i += 2;
            }
            "delay-ms" => {
                let ms = number_after(args, i)?;
                let delay = Duration::from_millis(ms);
                config = config.set_bot_delay(delay, delay);
                i += 2;
            }
            "human-black" => {
                config = config.set_bot_plays_black(false);
                i += 1;
            }
            other => bail!("unknown option {:?}", other),
        }
    }
    Ok(config)
}

fn number_after(args: &[String], i: usize) -> Result<u64> {
    let value = args
        .get(i + 1)
        .ok_or_else(|| anyhow!("{} needs a value", args[i]))?;
    value
        .parse::<u64>()
        .map_err(|_| anyhow!("{} expects a number, got {:?}", args[i], value))
}
