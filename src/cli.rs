//! Run configuration. A frontend binary parses `std::env::args()` into this
//! struct with `clap`'s derive API; the core only defines the shape of the
//! flags, not the parsing call site.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "pebble", about = "A cycle-accurate Game Boy core")]
pub struct Cli {
    /// Path to the ROM file to load.
    pub rom: PathBuf,

    /// Start with the on-screen debug overlay enabled.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Start paused, waiting for a step/resume input before running.
    #[arg(long)]
    pub paused: bool,

    /// Increase log verbosity (stacks: -v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file instead of stderr.
    #[arg(long = "log", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rom_path_and_flags() {
        let cli = Cli::parse_from(["pebble_app", "game.gb", "--debug", "--paused", "-vv"]);
        assert_eq!(cli.rom, PathBuf::from("game.gb"));
        assert!(cli.debug);
        assert!(cli.paused);
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn defaults_are_off() {
        let cli = Cli::parse_from(["pebble_app", "game.gb"]);
        assert!(!cli.debug);
        assert!(!cli.paused);
        assert_eq!(cli.verbose, 0);
    }
}
