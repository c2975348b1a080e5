//! Command-line interface for turnstile.

use clap::{Parser, Subcommand, ValueEnum};
use turnstile::TimeoutPolicy;

/// Turnstile - server-authoritative two-player tic-tac-toe
#[derive(Parser, Debug)]
#[command(name = "turnstile")]
#[command(about = "Two-player tic-tac-toe rooms over WebSocket", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Milliseconds per countdown second (overrides config)
        #[arg(long)]
        tick_millis: Option<u64>,

        /// What happens when a turn times out (overrides config)
        #[arg(long, value_enum)]
        timeout_policy: Option<PolicyArg>,
    },

    /// Play one game between two in-process bots
    Demo {
        /// Milliseconds per countdown second
        #[arg(long, default_value = "200")]
        tick_millis: u64,

        /// What happens when a turn times out
        #[arg(long, value_enum, default_value = "skip-turn")]
        timeout_policy: PolicyArg,
    },
}

/// Timeout policy as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Pass the turn to the opponent
    SkipTurn,
    /// The player who timed out loses
    Forfeit,
}

impl From<PolicyArg> for TimeoutPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::SkipTurn => TimeoutPolicy::SkipTurn,
            PolicyArg::Forfeit => TimeoutPolicy::Forfeit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_accepts_timeout_policy() {
        let cli = Cli::try_parse_from([
            "turnstile",
            "serve",
            "--timeout-policy",
            "forfeit",
            "--tick-millis",
            "500",
        ])
        .unwrap();
        match cli.command {
            Command::Serve {
                timeout_policy,
                tick_millis,
                port,
                ..
            } => {
                assert_eq!(timeout_policy, Some(PolicyArg::Forfeit));
                assert_eq!(tick_millis, Some(500));
                assert_eq!(port, None);
            }
            other => panic!("expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_serve_defaults_leave_config_alone() {
        let cli = Cli::try_parse_from(["turnstile", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve {
                timeout_policy: None,
                tick_millis: None,
                ..
            }
        ));
    }

    #[test]
    fn test_policy_arg_maps_to_timeout_policy() {
        assert_eq!(
            TimeoutPolicy::from(PolicyArg::SkipTurn),
            TimeoutPolicy::SkipTurn
        );
        assert_eq!(TimeoutPolicy::from(PolicyArg::Forfeit), TimeoutPolicy::Forfeit);
    }
}
