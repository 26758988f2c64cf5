//! Interactive identify runner

use std::env;
use std::process::ExitCode;
use std::time::Duration as StdDuration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::ports::ConfigStore;
use crate::application::{
    WorkflowConfig, WorkflowController, WorkflowHandle, WorkflowSnapshot, ACCESS_DENIED_MESSAGE,
    FAILURE_MESSAGE,
};
use crate::domain::config::AppConfig;
use crate::domain::workflow::WorkflowState;
use crate::infrastructure::{create_notifier, CpalDevice, HttpIdentifier, XdgConfigStore};

use super::args::IdentifyOptions;
use super::input::{spawn_input, InputEvent};
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment override for the identification endpoint
pub const ENDPOINT_ENV: &str = "AUDIOPRINT_ENDPOINT";

const PROGRESS_TICK: StdDuration = StdDuration::from_millis(100);

/// How the interactive loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Matched,
    Failed,
    Denied,
    Quit,
    Interrupted,
}

impl Outcome {
    fn exit_code(self) -> u8 {
        match self {
            Self::Matched | Self::Quit => EXIT_SUCCESS,
            Self::Failed | Self::Denied | Self::Interrupted => EXIT_ERROR,
        }
    }
}

/// Run identification until a result, or until the user quits in repeat mode
pub async fn run_identify(options: IdentifyOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let identifier =
        match HttpIdentifier::new(&options.endpoint, options.request_timeout.as_std()) {
            Ok(identifier) => identifier,
            Err(e) => {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        };

    info!(
        endpoint = %identifier.endpoint(),
        duration = %options.duration,
        encoding = options.encoding.name(),
        repeat = options.repeat,
        "Starting identification"
    );

    let config = WorkflowConfig {
        max_duration: options.duration,
        preferred_encoding: options.encoding,
    };
    let (controller, handle) = WorkflowController::new(
        CpalDevice::new(),
        identifier,
        create_notifier(options.notify),
        config,
    );
    let controller_task = tokio::spawn(controller.run());

    let mut input = spawn_input();
    let outcome = drive(&handle, &mut presenter, &mut input, &options).await;
    presenter.stop_spinner();
    debug!(?outcome, "Interactive loop finished");

    if handle.shutdown().await.is_err() {
        debug!("Controller already stopped");
    }
    drop(handle);
    if let Err(e) = controller_task.await {
        warn!(error = %e, "Workflow controller task failed");
    }

    ExitCode::from(outcome.exit_code())
}

/// Mirror controller snapshots on the terminal and feed it user input
async fn drive(
    handle: &WorkflowHandle,
    presenter: &mut Presenter,
    input: &mut mpsc::UnboundedReceiver<InputEvent>,
    options: &IdentifyOptions,
) -> Outcome {
    let mut snapshots = handle.subscribe();
    if handle.start().await.is_err() {
        presenter.error("Workflow stopped unexpectedly");
        return Outcome::Failed;
    }

    let mut ticker = time::interval(PROGRESS_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let total_ms = options.duration.clamp_to_ceiling().as_millis();
    let mut shown = WorkflowState::Idle;
    let mut recording_since: Option<Instant> = None;
    let mut input_open = true;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    presenter.spinner_fail("Workflow stopped unexpectedly");
                    return Outcome::Failed;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let state = snapshot.state();
                if state == WorkflowState::Recording && shown != WorkflowState::Recording {
                    recording_since = Some(Instant::now());
                }
                if state != WorkflowState::Recording {
                    recording_since = None;
                }
                let ended = show_snapshot(presenter, &snapshot, shown, options.repeat);
                shown = state;
                if let Some(outcome) = ended {
                    return outcome;
                }
            }
            _ = ticker.tick() => {
                if let Some(since) = recording_since {
                    let elapsed_ms = since.elapsed().as_millis() as u64;
                    presenter.update_recording_progress(elapsed_ms, total_ms);
                }
            }
            event = input.recv(), if input_open => match event {
                Some(InputEvent::Enter) => {
                    let sent = match shown {
                        WorkflowState::Recording => handle.stop().await,
                        WorkflowState::Analyzing => Ok(()),
                        WorkflowState::Idle | WorkflowState::Success | WorkflowState::Error => {
                            if options.repeat { handle.start().await } else { Ok(()) }
                        }
                    };
                    if sent.is_err() {
                        return Outcome::Failed;
                    }
                }
                Some(InputEvent::Quit) => return Outcome::Quit,
                Some(InputEvent::Interrupt) => {
                    presenter.spinner_fail("Interrupted");
                    return Outcome::Interrupted;
                }
                None => input_open = false,
            },
        }
    }
}

/// Render one snapshot. Returns the outcome when the loop should end.
fn show_snapshot(
    presenter: &mut Presenter,
    snapshot: &WorkflowSnapshot,
    previous: WorkflowState,
    repeat: bool,
) -> Option<Outcome> {
    let finished = match snapshot.state() {
        WorkflowState::Recording => {
            if previous != WorkflowState::Recording {
                presenter.start_spinner("Listening...  (Enter to stop)");
            }
            return None;
        }
        WorkflowState::Analyzing => {
            presenter.start_spinner("Identifying...");
            return None;
        }
        WorkflowState::Idle => {
            if !snapshot.access_denied() {
                return None;
            }
            presenter.stop_spinner();
            presenter.error(ACCESS_DENIED_MESSAGE);
            Outcome::Denied
        }
        WorkflowState::Success => match snapshot.result() {
            Some(result) => {
                presenter.spinner_success("Match found");
                presenter.show_match(result);
                Outcome::Matched
            }
            None => {
                presenter.spinner_fail(FAILURE_MESSAGE);
                Outcome::Failed
            }
        },
        WorkflowState::Error => {
            presenter.spinner_fail(FAILURE_MESSAGE);
            Outcome::Failed
        }
    };

    if repeat {
        presenter.info("Press Enter to identify again, q to quit");
        None
    } else {
        Some(finished)
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %store.path().display(), error = %e, "Ignoring unreadable config file");
            AppConfig::empty()
        }
    };

    let env_config = AppConfig {
        endpoint: env::var(ENDPOINT_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}
