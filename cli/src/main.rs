mod commands;
mod terminal;

use commands::{CommandLine, analyze};
use terminal::logging;

fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();
    logging::init_logging(commands.verbose, commands.quiet)?;

    let cfg = commands.to_config();
    analyze::analyze(&commands.file, &cfg)
}
