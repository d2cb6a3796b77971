mod cli;

use crate::cli::{Command, LogFormat, StorageBackendArg, CLI};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tinylink_core::{Repository, ShortCode, Shortener, ShortenerError};
use tinylink_generator::RandomCodeGenerator;
use tinylink_shortener::{validate_destination, ShortenerConfig, ShortenerService};
use tinylink_storage::{InMemoryRepository, MySqlRepository};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_NOT_FOUND: u8 = 2;
const EXIT_TEMPORARY: u8 = 3;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = CLI::try_parse()?;
    init_tracing(config.log_format);

    info!(
        storage_backend = %config.storage,
        max_attempts = config.max_attempts,
        timeout_ms = config.timeout_ms,
        "starting tinylink"
    );

    match config.storage {
        StorageBackendArg::InMemory => run(&config, InMemoryRepository::new()).await,
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .ok_or("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(mysql_dsn).await?;
            repository.ensure_schema().await?;
            run(&config, repository).await
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run<R: Repository>(
    config: &CLI,
    repository: R,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let service = ShortenerService::with_config(
        repository,
        RandomCodeGenerator::os(),
        ShortenerConfig::builder()
            .max_attempts(config.max_attempts)
            .build(),
    );
    let deadline = Duration::from_millis(config.timeout_ms);

    match &config.command {
        Command::Shorten { urls } => {
            for url in urls {
                let result = tokio::time::timeout(deadline, async {
                    validate_destination(url).await?;
                    service.shorten(url).await
                })
                .await?;

                let code = match result {
                    Ok(code) => code,
                    Err(err) => return Ok(report(err)),
                };

                match &config.base_url {
                    Some(base_url) => println!("{}\t{}", code, code.to_url(base_url)),
                    None => println!("{}", code),
                }
            }
        }
        Command::Resolve { code, json } => {
            let code = match ShortCode::new(code.as_str()) {
                Ok(code) => code,
                Err(err) => return Ok(report(err)),
            };

            let record = match tokio::time::timeout(deadline, service.resolve(&code)).await? {
                Ok(record) => record,
                Err(err) => return Ok(report(err)),
            };

            if *json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", record.original_url);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report(err: ShortenerError) -> ExitCode {
    error!(error = %err, "request failed");

    match err {
        ShortenerError::NotFound(_) => ExitCode::from(EXIT_NOT_FOUND),
        err if err.is_temporary() => ExitCode::from(EXIT_TEMPORARY),
        _ => ExitCode::FAILURE,
    }
}
