//! CrySense CLI entry point

use std::process::ExitCode;

use clap::Parser;

use crysense::application::HistorySink;
use crysense::cli::{
    app::{listen_options, load_merged_config, run_listen, run_probe},
    args::{Cli, Commands, ListenArgs},
    config_cmd::handle_config_command,
    history_cmd::{handle_history, handle_insights},
    logging::init_logging,
    presenter::Presenter,
    EXIT_ERROR, EXIT_USAGE_ERROR,
};
use crysense::domain::config::AppConfig;
use crysense::infrastructure::{JsonFileStore, XdgConfigStore};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let presenter = Presenter::new();

    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Some(Commands::History { limit, json }) => {
            let sink = HistorySink::new(JsonFileStore::new());
            if let Err(e) = handle_history(&sink, limit, json, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Some(Commands::Insights { json }) => {
            let sink = HistorySink::new(JsonFileStore::new());
            if let Err(e) = handle_insights(&sink, json, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Some(Commands::Probe) => {
            let config = load_merged_config(AppConfig::empty()).await;
            run_probe(&config).await
        }
        Some(Commands::Listen(args)) => listen(args, &presenter).await,
        None => listen(cli.listen, &presenter).await,
    }
}

async fn listen(args: ListenArgs, presenter: &Presenter) -> ExitCode {
    // Build CLI config from args
    let cli_config = AppConfig {
        classifier_url: args.classifier_url,
        timeout: args.timeout,
        duration: args.duration,
        backend: args.backend,
        language: args.language,
        mirror_url: None,
        history: args.no_history.then_some(false),
    };

    // Merge config
    let config = load_merged_config(cli_config).await;

    match listen_options(&config, args.json) {
        Ok(options) => run_listen(options).await,
        Err(e) => {
            presenter.error(&e);
            ExitCode::from(EXIT_USAGE_ERROR)
        }
    }
}
