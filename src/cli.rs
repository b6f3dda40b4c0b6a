//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. The config file path is the only configuration that
//! lives here; everything else comes from the TOML file and environment
//! variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Watches live trade search feeds and raises paced alerts for new listings.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "tradewatch.toml")]
    pub config: PathBuf,

    /// Skip the "press enter to exit" pause at shutdown.
    #[arg(long)]
    pub no_wait: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to every configured live search and watch for new listings.
    /// This is the default when no subcommand is given.
    Run,
    /// Replay a recorded feed capture through the alert pipeline, for
    /// debugging translation and pacing without a live connection.
    Replay {
        /// Path to a JSON capture file.
        capture: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tradewatch"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("tradewatch.toml"));
        assert!(!cli.no_wait);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_replay_subcommand() {
        let cli = Cli::try_parse_from(["tradewatch", "replay", "capture.json"]).unwrap();
        match cli.command {
            Some(Command::Replay { capture }) => {
                assert_eq!(capture, PathBuf::from("capture.json"));
            }
            other => panic!("expected replay subcommand, got {other:?}"),
        }
    }
}
