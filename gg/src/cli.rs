//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gourmet Grill - server-rendered restaurant site
#[derive(Parser)]
#[command(name = "gg", version, about = "Server-rendered restaurant site for Gourmet Grill")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the site over HTTP
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Reload templates on every request
        #[arg(long)]
        dev: bool,
    },

    /// Render every page into a static snapshot
    Publish,

    /// Parse every page template and report errors
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["gg"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from(["gg", "-l", "debug", "serve", "--port", "9000", "--dev"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Command::Serve { port, dev }) => {
                assert_eq!(port, Some(9000));
                assert!(dev);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["gg", "publish", "--config", "site.yml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("site.yml")));
        assert!(matches!(cli.command, Some(Command::Publish)));
    }
}
