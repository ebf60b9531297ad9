//! Clap CLI definitions for Hermod.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
\x1b[1;36mExamples:\x1b[0m
  hermod check                          Validate the configuration
  hermod nicks list                     Show every stored nickname
  hermod nicks set 31612345678@s.whatsapp.net Alice
  hermod nicks resolve 31612345678@s.whatsapp.net

The configuration is read from /etc/hermod.toml unless --config is given.";

/// Hermod: bridges a group chat to files and a Telegram chat.
#[derive(Parser)]
#[command(name = "hermod", version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate the configuration, then print a summary.
    Check,
    /// Administer the nickname store [*].
    #[command(subcommand)]
    Nicks(NicksCommands),
}

#[derive(Subcommand)]
pub enum NicksCommands {
    /// List every sender with a chosen nickname.
    List,
    /// Set a sender's nickname.
    Set {
        /// Sender identifier, e.g. 31612345678@s.whatsapp.net.
        sender: String,
        /// New nickname.
        name: String,
    },
    /// Show the name a sender is relayed under.
    Resolve {
        /// Sender identifier.
        sender: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["hermod", "nicks", "list", "--config", "/srv/h.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/srv/h.toml")));
        assert!(matches!(cli.command, Commands::Nicks(NicksCommands::List)));
    }

    #[test]
    fn test_nicks_set_takes_sender_and_name() {
        let cli = Cli::try_parse_from(["hermod", "nicks", "set", "316@s.whatsapp.net", "Al"])
            .unwrap();
        match cli.command {
            Commands::Nicks(NicksCommands::Set { sender, name }) => {
                assert_eq!(sender, "316@s.whatsapp.net");
                assert_eq!(name, "Al");
            }
            _ => panic!("expected nicks set"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["hermod"]).is_err());
    }
}
