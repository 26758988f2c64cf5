//! Config command handler

use reqwest::Url;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::{Duration, Encoding};

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
    let path = store.init().await?;
    presenter.success(&format!("Config file created at: {}", path.display()));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;
    match key {
        "endpoint" => config.endpoint = Some(value.to_string()),
        "duration" => config.duration = Some(value.to_string()),
        "encoding" => config.encoding = Some(value.to_lowercase()),
        "request_timeout" => config.request_timeout = Some(value.to_string()),
        "notify" => config.notify = Some(parse_bool(value).map_err(|_| bool_error(key))?),
        _ => return Err(unknown_key(key)),
    }

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;
    let value = config_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
    presenter.output(&value);
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        let value = config_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Stored value for a key, as it would be written back
fn config_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "endpoint" => config.endpoint.clone(),
        "duration" => config.duration.clone(),
        "encoding" => config.encoding.clone(),
        "request_timeout" => config.request_timeout.clone(),
        "notify" => config.notify.map(|b| b.to_string()),
        _ => None,
    }
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(unknown_key(key))
    }
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    }
}

fn bool_error(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: "Value must be 'true' or 'false'".to_string(),
    }
}

/// Validate a config value based on key type
pub fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "endpoint" => {
            let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid(format!(
                    "Unsupported scheme '{}', expected http or https",
                    url.scheme()
                )));
            }
        }
        "duration" => {
            let duration = value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
            if duration.exceeds_ceiling() {
                return Err(invalid(format!(
                    "Recordings are limited to {}",
                    Duration::recording_ceiling()
                )));
            }
        }
        "request_timeout" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        "encoding" => {
            value
                .parse::<Encoding>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        "notify" => {
            parse_bool(value).map_err(|_| bool_error(key))?;
        }
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;
    use tempfile::TempDir;

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert_eq!(parse_bool("yes"), Ok(true));
        assert_eq!(parse_bool("no"), Ok(false));
        assert_eq!(parse_bool("1"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("invalid").is_err());
    }

    #[test]
    fn validate_endpoint() {
        assert!(validate_config_value("endpoint", "http://localhost:8000/identify").is_ok());
        assert!(validate_config_value("endpoint", "https://audio-print.onrender.com/identify").is_ok());
        assert!(validate_config_value("endpoint", "not a url").is_err());
        assert!(validate_config_value("endpoint", "ftp://example.com/identify").is_err());
    }

    #[test]
    fn validate_duration_within_ceiling() {
        assert!(validate_config_value("duration", "5s").is_ok());
        assert!(validate_config_value("duration", "10s").is_ok());
        assert!(validate_config_value("duration", "11s").is_err());
        assert!(validate_config_value("duration", "0s").is_err());
        assert!(validate_config_value("duration", "soon").is_err());
    }

    #[test]
    fn validate_request_timeout_has_no_ceiling() {
        assert!(validate_config_value("request_timeout", "2m").is_ok());
        assert!(validate_config_value("request_timeout", "0s").is_err());
    }

    #[test]
    fn validate_encoding() {
        assert!(validate_config_value("encoding", "flac").is_ok());
        assert!(validate_config_value("encoding", "WAV").is_ok());
        assert!(validate_config_value("encoding", "mp3").is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(validate_config_value("api_key", "secret").is_err());
    }

    #[tokio::test]
    async fn set_then_get_round_trips_through_the_file() {
        let dir = TempDir::new().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        let presenter = Presenter::new();

        handle_set(&store, &presenter, "encoding", "WAV").await.unwrap();
        handle_set(&store, &presenter, "notify", "yes").await.unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.encoding.as_deref(), Some("wav"));
        assert_eq!(config.notify, Some(true));
        assert_eq!(config_value(&config, "duration"), None);
    }

    #[tokio::test]
    async fn set_rejects_bad_value_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let store = XdgConfigStore::with_path(&path);
        let presenter = Presenter::new();

        let result = handle_set(&store, &presenter, "duration", "30s").await;
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
        assert!(!path.exists());
    }
}
