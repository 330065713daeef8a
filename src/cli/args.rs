//! CLI argument definitions using Clap

use clap::{Args, Parser, Subcommand};

use crate::domain::analysis::Locale;
use crate::domain::config::CaptureBackend;
use crate::domain::recording::Duration;

/// CrySense - listen to a baby's cry and suggest what it may need
#[derive(Parser, Debug)]
#[command(name = "crysense")]
#[command(version)]
#[command(about = "Record a baby's cry, classify it and keep a local history")]
#[command(long_about = None)]
pub struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Options for the default `listen` command
    #[command(flatten)]
    pub listen: ListenArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a cry and classify it (default)
    Listen(ListenArgs),
    /// Show past analyses, newest first
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show patterns across recent analyses
    Insights {
        /// Print insights as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which capture backend and services would be used
    Probe,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for a recording
#[derive(Args, Debug, Clone, Default)]
pub struct ListenArgs {
    /// Maximum recording length (e.g., 10s, 1m, 2m30s). Ctrl-C stops sooner.
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Classifier service base URL
    #[arg(short = 'u', long, value_name = "URL")]
    pub classifier_url: Option<String>,

    /// Classifier request timeout (e.g., 10s)
    #[arg(short = 't', long, value_name = "TIME")]
    pub timeout: Option<String>,

    /// Capture backend (auto, native, ffmpeg)
    #[arg(short = 'b', long, value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Language stamped on the result (en, hi, ta, te, bn)
    #[arg(short = 'l', long, value_name = "LANG")]
    pub language: Option<String>,

    /// Do not save the result to history
    #[arg(long)]
    pub no_history: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed listen options
#[derive(Debug, Clone)]
pub struct ListenOptions {
    pub duration: Duration,
    pub timeout: Duration,
    pub classifier_url: String,
    pub backend: CaptureBackend,
    pub language: Locale,
    pub history: bool,
    pub mirror_url: Option<String>,
    pub json: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "classifier_url",
    "timeout",
    "duration",
    "backend",
    "language",
    "mirror_url",
    "history",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["crysense"]);
        assert!(cli.command.is_none());
        assert!(cli.listen.duration.is_none());
        assert!(cli.listen.classifier_url.is_none());
        assert!(!cli.listen.no_history);
        assert!(!cli.listen.json);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn cli_parses_top_level_listen_flags() {
        let cli = Cli::parse_from(["crysense", "-d", "30s", "-l", "ta", "--json"]);
        assert_eq!(cli.listen.duration.as_deref(), Some("30s"));
        assert_eq!(cli.listen.language.as_deref(), Some("ta"));
        assert!(cli.listen.json);
    }

    #[test]
    fn cli_parses_listen_subcommand() {
        let cli = Cli::parse_from(["crysense", "listen", "--duration", "5s", "--no-history"]);
        match cli.command {
            Some(Commands::Listen(args)) => {
                assert_eq!(args.duration.as_deref(), Some("5s"));
                assert!(args.no_history);
            }
            other => panic!("expected listen, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_history_limit() {
        let cli = Cli::parse_from(["crysense", "history", "--limit", "3", "--json"]);
        assert!(matches!(
            cli.command,
            Some(Commands::History {
                limit: 3,
                json: true
            })
        ));
    }

    #[test]
    fn history_limit_defaults_to_ten() {
        let cli = Cli::parse_from(["crysense", "history"]);
        assert!(matches!(
            cli.command,
            Some(Commands::History { limit: 10, .. })
        ));
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["crysense", "insights", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["crysense", "config", "set", "language", "hi"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "language");
            assert_eq!(value, "hi");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("classifier_url"));
        assert!(is_valid_config_key("mirror_url"));
        assert!(is_valid_config_key("history"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
