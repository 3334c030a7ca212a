use std::env;

use anyhow::Result;
use corruption_chess::console::{config_from_args, ConsoleHandler};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = config_from_args(&args)?;
    let mut console = ConsoleHandler::new(config);
    console.run()
}
