use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};
use tinylink_shortener::DEFAULT_MAX_ATTEMPTS;

pub const STORAGE_BACKEND_ENV: &str = "TINYLINK_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "TINYLINK_MYSQL_DSN";
pub const BASE_URL_ENV: &str = "TINYLINK_BASE_URL";
pub const MAX_ATTEMPTS_ENV: &str = "TINYLINK_MAX_ATTEMPTS";
pub const TIMEOUT_MS_ENV: &str = "TINYLINK_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "TINYLINK_LOG_FORMAT";

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    /// Process-local store, discarded on exit.
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "tinylink", about = "Shorten URLs and resolve short codes")]
pub struct CLI {
    /// Where short urls are kept. The in-memory store starts empty on every
    /// run, so `resolve` only finds codes with the mysql backend.
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    /// Public base URL printed in front of new codes.
    #[arg(long, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Candidate codes tried per URL before giving up. Must be at least 1.
    #[arg(
        long,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_attempts: usize,

    /// Deadline for each shorten or resolve call, in milliseconds.
    #[arg(long, env = TIMEOUT_MS_ENV, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten one or more URLs, printing one code per line.
    Shorten {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print the original URL behind a short code.
    Resolve {
        code: String,
        /// Print the full stored record as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = CLI::try_parse_from(["tinylink", "shorten", "https://example.com"]).unwrap();
        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert_eq!(cli.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(cli.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(matches!(cli.command, Command::Shorten { ref urls } if urls.len() == 1));
    }

    #[test]
    fn mysql_requires_dsn() {
        let result = CLI::try_parse_from(["tinylink", "--storage", "mysql", "resolve", "abc123"]);
        assert!(result.is_err());

        let cli = CLI::try_parse_from([
            "tinylink",
            "--storage",
            "mysql",
            "--mysql-dsn",
            "mysql://u:p@localhost/tinylink",
            "resolve",
            "abc123",
            "--json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Resolve { json: true, .. }));
    }

    #[test]
    fn max_attempts_must_be_positive() {
        let result = CLI::try_parse_from([
            "tinylink",
            "--max-attempts",
            "0",
            "shorten",
            "https://example.com",
        ]);
        assert!(result.is_err());

        let cli = CLI::try_parse_from([
            "tinylink",
            "--max-attempts",
            "1",
            "shorten",
            "https://example.com",
        ])
        .unwrap();
        assert_eq!(cli.max_attempts, 1);
    }

    #[test]
    fn storage_help_warns_about_in_memory_resolve() {
        use clap::CommandFactory;

        let command = CLI::command();
        let storage = command
            .get_arguments()
            .find(|arg| arg.get_id() == "storage")
            .unwrap();
        let help = storage.get_help().unwrap().to_string();
        assert!(help.contains("starts empty on every run"));
    }
}
