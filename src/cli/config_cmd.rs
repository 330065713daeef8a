//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::analysis::Locale;
use crate::domain::config::{AppConfig, CaptureBackend};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    }
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(unknown_key(key));
    }

    let mut config = store.load().await?;
    apply_config_value(&mut config, key, value)?;
    store.save(&config).await?;

    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(unknown_key(key));
    }

    let config = store.load().await?;
    let value = config_value(&config, key);
    presenter.output(value.as_deref().unwrap_or(NOT_SET));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = config_value(&config, key);
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Current value of a key as displayed by `get` and `list`
fn config_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "classifier_url" => config.classifier_url.clone(),
        "timeout" => config.timeout.clone(),
        "duration" => config.duration.clone(),
        "backend" => config.backend.clone(),
        "language" => config.language.clone(),
        "mirror_url" => config.mirror_url.clone(),
        "history" => config.history.map(|b| b.to_string()),
        _ => None,
    }
}

/// Validate a value and store it under `key`
fn apply_config_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "classifier_url" | "mirror_url" => {
            let url = validate_url(value).map_err(invalid)?;
            if key == "classifier_url" {
                config.classifier_url = Some(url);
            } else {
                config.mirror_url = Some(url);
            }
        }
        "timeout" => {
            let duration = value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
            if duration.as_millis() == 0 {
                return Err(invalid("Timeout must be greater than zero".to_string()));
            }
            config.timeout = Some(duration.to_string());
        }
        "duration" => {
            let duration = value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
            if !duration.is_valid_recording_length() {
                return Err(invalid(
                    "Recording length must be between 1s and 5m".to_string(),
                ));
            }
            config.duration = Some(duration.to_string());
        }
        "backend" => {
            let backend = value.parse::<CaptureBackend>().map_err(invalid)?;
            config.backend = Some(backend.to_string());
        }
        "language" => {
            let locale = value
                .parse::<Locale>()
                .map_err(|e| invalid(e.to_string()))?;
            config.language = Some(locale.to_string());
        }
        "history" => {
            let enabled = parse_bool(value)
                .map_err(|_| invalid("Value must be 'true' or 'false'".to_string()))?;
            config.history = Some(enabled);
        }
        _ => return Err(unknown_key(key)),
    }

    Ok(())
}

/// Accept http(s) URLs only, without a trailing slash
fn validate_url(value: &str) -> Result<String, String> {
    let trimmed = value.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(trimmed.to_string()),
        _ => Err(format!(
            "Invalid URL '{}'. Expected http://host[:port]",
            value
        )),
    }
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(()),
    }
}
