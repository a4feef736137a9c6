use clap::Parser;
use spend_dash::args::{Args, Command};
use spend_dash::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();
    let api_url = args.common().api_url();

    // This allows for running the program without a backend server. When SPEND_DASH_IN_TEST_MODE
    // is set and non-zero in length, then the mode will be Mode::Testing, otherwise it will be
    // Mode::Http.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init => commands::init(home, api_url).await?.print(),

        Command::Summary(summary_args) => {
            let config = load_config(home, api_url).await?;
            commands::summary(config, mode, summary_args.clone())
                .await?
                .print()
        }

        Command::Transactions(transactions_args) => {
            let config = load_config(home, api_url).await?;
            commands::transactions(config, mode, transactions_args.clone())
                .await?
                .print()
        }

        Command::Categories(categories_args) => {
            let config = load_config(home, api_url).await?;
            commands::categories(config, mode, categories_args.clone())
                .await?
                .print()
        }

        Command::Trend(trend_args) => {
            let config = load_config(home, api_url).await?;
            commands::trend(config, mode, trend_args.clone())
                .await?
                .print()
        }

        Command::Upload(upload_args) => {
            let config = load_config(home, api_url).await?;
            commands::upload(config, mode, upload_args.clone())
                .await?
                .print()
        }

        Command::Export(export_args) => {
            let config = load_config(home, api_url).await?;
            commands::export(config, mode, export_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Loads the config from `home` and applies the `--api-url` override, if any.
async fn load_config(home: &std::path::Path, api_url: Option<&str>) -> Result<Config> {
    Config::load(home).await?.with_api_url(api_url)
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
