//! Main app runner for the listen and probe commands

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::ports::{CaptureProvider, ConfigStore};
use crate::application::{AnalyzeCallbacks, AnalyzeCryUseCase, AnalyzeError, AnalyzeInput};
use crate::domain::analysis::Locale;
use crate::domain::config::{AppConfig, CaptureBackend};
use crate::domain::recording::Duration;
use crate::infrastructure::{
    select_provider, CpalCapture, FfmpegCapture, HttpCryClassifier, HttpHistoryMirror,
    JsonFileStore, XdgConfigStore,
};

use super::args::ListenOptions;
use super::presenter::Presenter;
use super::signals::{spawn_interrupt_handler, InterruptAction};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_MIC_BLOCKED: u8 = 3;

/// Environment variable overriding the classifier URL
pub const CLASSIFIER_URL_ENV: &str = "CRYSENSE_CLASSIFIER_URL";
/// Environment variable enabling the history mirror
pub const MIRROR_URL_ENV: &str = "CRYSENSE_MIRROR_URL";

/// How long pending mirror uploads may delay exit
const MIRROR_GRACE: std::time::Duration = std::time::Duration::from_secs(2);

/// Run one listen-classify-store cycle
pub async fn run_listen(options: ListenOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let classifier = match HttpCryClassifier::new(&options.classifier_url, options.timeout) {
        Ok(classifier) => classifier,
        Err(e) => {
            presenter.error(&format!("Failed to create HTTP client: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let provider = select_provider(options.backend);
    let mut use_case = AnalyzeCryUseCase::new(provider, classifier, JsonFileStore::new());
    if !options.history {
        use_case = use_case.without_history();
    }
    if let Some(url) = options.mirror_url.as_deref() {
        match HttpHistoryMirror::new(url, options.timeout) {
            Ok(mirror) => use_case = use_case.with_mirror(Arc::new(mirror)),
            Err(e) => warn!("history mirror disabled: {}", e),
        }
    }

    presenter.start_spinner("Opening microphone...");
    let callbacks = listen_callbacks(&presenter);

    let interrupt_spinner = presenter.spinner_handle();
    let interrupts = spawn_interrupt_handler(use_case.control(), move |action| match action {
        InterruptAction::StopEarly => {
            interrupt_spinner.set_message("Stopping early, press Ctrl-C again to cancel...")
        }
        InterruptAction::Cancel => interrupt_spinner.set_message("Cancelling..."),
    });

    let input = AnalyzeInput {
        max_duration: options.duration,
        language: options.language,
    };
    let result = use_case.record_and_classify(input, callbacks).await;
    interrupts.abort();

    let code = match result {
        Ok(output) => {
            if output.record.is_fallback() {
                presenter.spinner_fail("Showing a demo result");
            } else {
                presenter.spinner_success("Analysis complete");
            }

            if options.json {
                presenter.json(&output.record);
            } else {
                presenter.analysis(&output.record);
            }

            if options.history && !output.history_saved {
                presenter.warn("The result could not be saved to history");
            }

            match output.capture_blocked {
                Some(e) => {
                    presenter.error(&format!(
                        "{}. Check microphone access and try again",
                        e
                    ));
                    EXIT_MIC_BLOCKED
                }
                None => EXIT_SUCCESS,
            }
        }
        Err(AnalyzeError::Cancelled) => {
            presenter.spinner_fail("Cancelled");
            EXIT_ERROR
        }
    };

    use_case.wait_for_mirror(MIRROR_GRACE).await;
    ExitCode::from(code)
}

/// Wire use case callbacks to the active spinner
fn listen_callbacks(presenter: &Presenter) -> AnalyzeCallbacks {
    let on_start = presenter.spinner_handle();
    let on_progress = presenter.spinner_handle();
    let on_end = presenter.spinner_handle();
    let on_classify = presenter.spinner_handle();
    let on_fallback = presenter.spinner_handle();

    AnalyzeCallbacks {
        on_progress: Some(Box::new(move |elapsed, total| {
            on_progress.set_message(format!(
                "Listening {}",
                Presenter::format_progress(elapsed, total)
            ));
        })),
        on_recording_start: Some(Box::new(move |encoding| {
            debug!(%encoding, "recording started");
            on_start.set_message("Listening...");
        })),
        on_recording_end: Some(Box::new(move |secs| {
            on_end.set_message(format!("Recorded {:.1}s", secs));
        })),
        on_classifying_start: Some(Box::new(move || {
            on_classify.set_message("Analyzing cry...");
        })),
        on_fallback: Some(Box::new(move |reason| {
            on_fallback.set_message(format!("Analysis unavailable: {}", reason));
        })),
    }
}

/// Print the capture backend and services a listen run would use
pub async fn run_probe(config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let backend = config.backend_or_default();

    let (provider, native, ffmpeg) = tokio::task::spawn_blocking(move || {
        (
            select_provider(backend).name(),
            CpalCapture::is_available(),
            FfmpegCapture::is_available(),
        )
    })
    .await
    .unwrap_or(("unknown", false, false));

    let yes_no = |available: bool| if available { "available" } else { "not found" };

    presenter.key_value("backend", backend.as_str());
    presenter.key_value("provider", provider);
    presenter.key_value("native", yes_no(native));
    presenter.key_value("ffmpeg", yes_no(ffmpeg));
    presenter.key_value("classifier", config.classifier_url_or_default());
    presenter.key_value("mirror", config.mirror_url().unwrap_or("(disabled)"));
    presenter.key_value("data_dir", &JsonFileStore::default_dir().to_string_lossy());
    presenter.key_value(
        "config",
        &XdgConfigStore::new().path().to_string_lossy(),
    );

    if !native && !ffmpeg {
        presenter.warn("No way to record audio was found");
        return ExitCode::from(EXIT_MIC_BLOCKED);
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Settings taken from the environment
pub fn env_config() -> AppConfig {
    let var = |name: &str| env::var(name).ok().filter(|s| !s.trim().is_empty());
    AppConfig {
        classifier_url: var(CLASSIFIER_URL_ENV),
        mirror_url: var(MIRROR_URL_ENV),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!("ignoring config file {}: {}", store.path().display(), e);
            AppConfig::empty()
        }
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}

/// Turn a merged config into listen options, rejecting values that do not
/// parse
pub fn listen_options(config: &AppConfig, json: bool) -> Result<ListenOptions, String> {
    let duration = match config.duration.as_deref() {
        Some(s) => {
            let duration = s.parse::<Duration>().map_err(|e| e.to_string())?;
            if !duration.is_valid_recording_length() {
                return Err(format!(
                    "Invalid duration: {} (must be between 1s and 5m)",
                    duration
                ));
            }
            duration
        }
        None => Duration::default_recording(),
    };

    let timeout = match config.timeout.as_deref() {
        Some(s) => {
            let timeout = s
                .parse::<Duration>()
                .map_err(|_| format!("Invalid timeout: \"{}\"", s))?;
            if timeout.as_millis() == 0 {
                return Err("Invalid timeout: must be greater than zero".to_string());
            }
            timeout
        }
        None => Duration::default_timeout(),
    };

    let backend = match config.backend.as_deref() {
        Some(s) => s
            .parse::<CaptureBackend>()
            .map_err(|e| format!("Invalid backend: {}", e))?,
        None => CaptureBackend::default(),
    };

    let language = match config.language.as_deref() {
        Some(s) => s.parse::<Locale>().map_err(|e| e.to_string())?,
        None => Locale::default(),
    };

    Ok(ListenOptions {
        duration,
        timeout,
        classifier_url: config.classifier_url_or_default().to_string(),
        backend,
        language,
        history: config.history_or_default(),
        mirror_url: config.mirror_url().map(str::to_string),
        json,
    })
}
