use crate::config::{ApiConfig, Config, ConfigError, required};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use std::time::Duration;

/// Contactless payment terminal: reads NFC tokens and books them against the accounting API.
///
/// Every option can also be supplied through the environment variable shown in `--help`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Option<Mode>,

    /// Base URL of the accounting API
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Key sent in the X-API-Key header
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Terminal name submitted with every transaction
    #[arg(long = "name", env = "MY_NAME", default_value = "nfc-kiosk")]
    pub terminal_name: String,

    /// Seconds before the same tap may be booked again
    #[arg(long, env = "TOKEN_DELAY", default_value_t = 5)]
    pub token_delay: u64,

    /// Silence the reader's own beep at startup
    #[arg(
        long,
        env = "DISABLE_BUZZER",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub disable_buzzer: bool,

    /// Pause between two read cycles, in milliseconds
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 200)]
    pub poll_interval_ms: u64,

    /// Timeout of every API request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout: u64,

    /// Path of the transaction endpoint below the API URL
    #[arg(long, env = "TRANSACTION_PATH", default_value = "nfc-transaktion")]
    pub transaction_path: String,

    /// Accepted reader name fragments, first match wins
    #[arg(
        long = "reader-family",
        env = "READER_FAMILIES",
        value_delimiter = ',',
        default_values = ["ACR122U", "ACR1252"]
    )]
    pub reader_families: Vec<String>,

    /// Program invoked as `<program> <cue> [message]` for audible feedback
    #[arg(long, env = "FEEDBACK_COMMAND")]
    pub feedback_command: Option<String>,

    /// Seconds a feedback player may run before it is killed
    #[arg(long, env = "FEEDBACK_TIMEOUT", default_value_t = 10)]
    pub feedback_timeout: u64,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Poll the reader and book every new tap (default)
    Run,
    /// Check API health and version, then exit
    Check,
    /// Book a single token given as hex, without a reader
    Dispatch {
        /// Token in hex, spaces allowed (e.g. "04 A1 B2 C3")
        #[arg(long)]
        token: String,
    },
}

impl Cli {
    pub fn mode(&self) -> Mode {
        self.mode.clone().unwrap_or(Mode::Run)
    }
}

impl TryFrom<&Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let base_url = required("API_URL", cli.api_url.clone())?;
        let api_key = required("API_KEY", cli.api_key.clone())?;

        if cli.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("POLL_INTERVAL_MS".to_string()));
        }
        if cli.request_timeout == 0 {
            return Err(ConfigError::InvalidValue("REQUEST_TIMEOUT".to_string()));
        }
        if cli.feedback_timeout == 0 {
            return Err(ConfigError::InvalidValue("FEEDBACK_TIMEOUT".to_string()));
        }

        let reader_families: Vec<String> = cli
            .reader_families
            .iter()
            .map(|family| family.trim().to_string())
            .filter(|family| !family.is_empty())
            .collect();
        if reader_families.is_empty() {
            return Err(ConfigError::InvalidValue("READER_FAMILIES".to_string()));
        }

        let mut api = ApiConfig::new(&base_url, &api_key);
        api.transaction_path = cli.transaction_path.trim_matches('/').to_string();
        api.request_timeout = Duration::from_secs(cli.request_timeout);

        Ok(Config {
            api,
            terminal_name: cli.terminal_name.clone(),
            token_delay: Duration::from_secs(cli.token_delay),
            poll_interval: Duration::from_millis(cli.poll_interval_ms),
            disable_buzzer: cli.disable_buzzer,
            reader_families,
            feedback_command: cli.feedback_command.clone().filter(|c| !c.trim().is_empty()),
            feedback_timeout: Duration::from_secs(cli.feedback_timeout),
        })
    }
}
