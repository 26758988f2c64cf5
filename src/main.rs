//! AudioPrint CLI entry point

use std::process::ExitCode;

use clap::Parser;

use audioprint::cli::{
    app::{load_merged_config, run_identify, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::{handle_config_command, validate_config_value},
    logging::init_logging,
    presenter::Presenter,
    IdentifyOptions,
};
use audioprint::domain::config::AppConfig;
use audioprint::domain::recording::{Duration, Encoding};
use audioprint::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    if let Err(e) = init_logging(cli.verbose) {
        presenter.warn(&format!("Logging disabled: {}", e));
    }

    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    let cli_config = AppConfig {
        endpoint: cli.endpoint.clone(),
        duration: cli.duration.clone(),
        encoding: cli.encoding.map(|e| Encoding::from(e).name().to_string()),
        request_timeout: None,
        notify: if cli.notify { Some(true) } else { None },
    };

    let config = load_merged_config(cli_config).await;

    // Malformed values fail before the microphone is touched
    for (key, value) in [
        ("endpoint", config.endpoint.as_deref()),
        ("encoding", config.encoding.as_deref()),
        ("request_timeout", config.request_timeout.as_deref()),
    ] {
        if let Some(value) = value {
            if let Err(e) = validate_config_value(key, value) {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        }
    }

    if let Some(duration) = config.duration.as_deref() {
        match duration.parse::<Duration>() {
            Ok(d) if d.exceeds_ceiling() => presenter.warn(&format!(
                "Recording is limited to {}, using that instead of {}",
                Duration::recording_ceiling(),
                d
            )),
            Ok(_) => {}
            Err(e) => {
                presenter.error(&format!("Invalid duration: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        }
    }

    let options = IdentifyOptions {
        endpoint: config.endpoint_or_default().to_string(),
        duration: config.duration_or_default(),
        encoding: config.encoding_or_default(),
        request_timeout: config.request_timeout_or_default(),
        notify: config.notify_or_default(),
        repeat: cli.repeat,
    };

    run_identify(options).await
}
