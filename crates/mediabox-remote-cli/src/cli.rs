//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// MediaBox remote - find MediaBox players and control them from a terminal
#[derive(Parser, Debug)]
#[command(name = "mediabox-remote")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Connection timeout in milliseconds
    #[arg(long, global = true, default_value = "5000", env = "MEDIABOX_TIMEOUT")]
    pub timeout: u64,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the preferences store
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover players on the network
    Discover(DiscoverArgs),

    /// Choose the device commands are sent to
    Select(SelectArgs),

    /// Send command tokens to the selected device
    Send(SendArgs),

    /// Type text on the selected device, one key per character
    Type(TypeArgs),

    /// Open a stream URL on the selected device
    Url(UrlArgs),

    /// Queue a download on the selected device
    Download(UrlArgs),

    /// Broadcast announcements as if this host were a player
    Announce(AnnounceArgs),
}

// ==================== Discover ====================

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Watch mode - keep listening and redraw on every change
    #[arg(short, long)]
    pub watch: bool,

    /// Discovery duration in seconds (ignored in watch mode)
    #[arg(short, long, default_value = "5")]
    pub duration: u64,

    /// Only show devices whose name matches this glob (`*` and `?`)
    #[arg(long)]
    pub name: Option<String>,
}

// ==================== Select ====================

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Device id or address from `discover`
    #[arg(required_unless_present_any = ["short_range", "show"])]
    pub target: Option<String>,

    /// Use the short-range link instead of the network
    #[arg(long, conflicts_with_all = ["target", "show", "raw"])]
    pub short_range: bool,

    /// Print the current selection
    #[arg(long, conflicts_with_all = ["target", "raw"])]
    pub show: bool,

    /// Store the target as a host name without running discovery
    #[arg(long)]
    pub raw: bool,

    /// How long to listen for the device in seconds
    #[arg(short, long, default_value = "5")]
    pub duration: u64,
}

// ==================== Send ====================

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Tokens such as MENU, PLAY, VOLUP or KEY:A
    #[arg(required = true)]
    pub tokens: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TypeArgs {
    /// Text to type
    pub text: String,

    /// Press ENTER after the text
    #[arg(long)]
    pub enter: bool,
}

#[derive(Args, Debug)]
pub struct UrlArgs {
    pub url: String,
}

// ==================== Announce ====================

#[derive(Args, Debug)]
pub struct AnnounceArgs {
    /// Device id
    #[arg(long)]
    pub id: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Address controllers should connect to
    #[arg(long)]
    pub address: String,

    /// Comma-separated capabilities
    #[arg(long, default_value = "PLAYER", value_delimiter = ',')]
    pub features: Vec<String>,

    /// Seconds between announcement bursts
    #[arg(long, default_value = "10")]
    pub interval: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send_tokens() {
        let cli = Cli::try_parse_from(["mediabox-remote", "send", "MENU", "KEY:A"]).unwrap();
        match cli.command {
            Commands::Send(args) => assert_eq!(args.tokens, vec!["MENU", "KEY:A"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_select_requires_a_mode() {
        assert!(Cli::try_parse_from(["mediabox-remote", "select"]).is_err());
        assert!(Cli::try_parse_from(["mediabox-remote", "select", "--short-range"]).is_ok());
        assert!(
            Cli::try_parse_from(["mediabox-remote", "select", "box1", "--short-range"]).is_err()
        );
    }

    #[test]
    fn test_announce_features_split_on_comma() {
        let cli = Cli::try_parse_from([
            "mediabox-remote",
            "announce",
            "--id",
            "A1",
            "--name",
            "Den",
            "--address",
            "10.0.0.9",
            "--features",
            "PLAYER,DVR",
        ])
        .unwrap();
        match cli.command {
            Commands::Announce(args) => assert_eq!(args.features, vec!["PLAYER", "DVR"]),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
