//! CLI argument definitions using Clap

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::recording::{Duration, Encoding};

/// AudioPrint - identify the song playing around you
#[derive(Parser, Debug)]
#[command(name = "audioprint")]
#[command(version)]
#[command(about = "Record a short sample from the microphone and identify the song")]
#[command(long_about = None)]
pub struct Cli {
    /// Identification endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Recording length, at most 10s (e.g., 5s, 10s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Preferred recording encoding
    #[arg(long, value_name = "ENCODING")]
    pub encoding: Option<EncodingArg>,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Keep listening: Enter starts another identification, q quits
    #[arg(long)]
    pub repeat: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
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

/// Encoding argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    Flac,
    Wav,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Flac => Encoding::Flac,
            EncodingArg::Wav => Encoding::Wav,
        }
    }
}

/// Parsed identify options
#[derive(Debug, Clone)]
pub struct IdentifyOptions {
    pub endpoint: String,
    pub duration: Duration,
    pub encoding: Encoding,
    pub request_timeout: Duration,
    pub notify: bool,
    pub repeat: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["endpoint", "duration", "encoding", "request_timeout", "notify"];

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
        let cli = Cli::parse_from(["audioprint"]);
        assert!(cli.endpoint.is_none());
        assert!(cli.duration.is_none());
        assert!(cli.encoding.is_none());
        assert!(!cli.notify);
        assert!(!cli.repeat);
        assert_eq!(cli.verbose, 0);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_endpoint_and_duration() {
        let cli = Cli::parse_from(["audioprint", "-e", "http://localhost:8000/identify", "-d", "5s"]);
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:8000/identify"));
        assert_eq!(cli.duration.as_deref(), Some("5s"));
    }

    #[test]
    fn cli_parses_encoding() {
        let cli = Cli::parse_from(["audioprint", "--encoding", "wav"]);
        assert_eq!(cli.encoding, Some(EncodingArg::Wav));
        assert_eq!(Encoding::from(EncodingArg::Wav), Encoding::Wav);
    }

    #[test]
    fn cli_counts_verbosity() {
        let cli = Cli::parse_from(["audioprint", "-vv", "-n", "--repeat"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.notify);
        assert!(cli.repeat);
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["audioprint", "config", "set", "encoding", "wav"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "encoding");
            assert_eq!(value, "wav");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("endpoint"));
        assert!(is_valid_config_key("request_timeout"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
