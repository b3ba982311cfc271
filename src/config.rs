//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::leaderboard::DEFAULT_WINNER_COUNT;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "EXAM_HALL_CONFIG_PATH";

const DEFAULT_COUNTDOWN_TICK_MS: u64 = 1_000;
/// Twelve hours.
const DEFAULT_SESSION_TTL_SECS: u64 = 43_200;
const DEFAULT_CONTACT_INBOX: &str = "contact@exam-hall.local";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    winner_count: usize,
    countdown_tick: Duration,
    session_ttl: Duration,
    admin_emails: Vec<String>,
    contact_inbox: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        winner_count = config.winner_count,
                        admins = config.admin_emails.len(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document. Missing keys take their default value.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Number of winners selected when a request does not ask for a specific count.
    pub fn winner_count(&self) -> usize {
        self.winner_count
    }

    /// Period between two countdown re-evaluations.
    pub fn countdown_tick(&self) -> Duration {
        self.countdown_tick
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Whether an account registered under `email` gets the admin role.
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
    }

    /// Address receiving contact form messages.
    pub fn contact_inbox(&self) -> &str {
        &self.contact_inbox
    }

    /// Same configuration with an extra admin email; handy for tests.
    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_emails.push(email.into());
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    winner_count: usize,
    countdown_tick_ms: u64,
    session_ttl_secs: u64,
    admin_emails: Vec<String>,
    contact_inbox: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            winner_count: DEFAULT_WINNER_COUNT,
            countdown_tick_ms: DEFAULT_COUNTDOWN_TICK_MS,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            admin_emails: Vec::new(),
            contact_inbox: DEFAULT_CONTACT_INBOX.to_string(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            winner_count: raw.winner_count,
            // tokio intervals reject a zero period.
            countdown_tick: Duration::from_millis(raw.countdown_tick_ms.max(1)),
            session_ttl: Duration::from_secs(raw.session_ttl_secs),
            admin_emails: raw
                .admin_emails
                .into_iter()
                .map(|email| email.trim().to_lowercase())
                .collect(),
            contact_inbox: raw.contact_inbox,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let config = AppConfig::from_json(r#"{"winner_count": 3}"#).unwrap();
        assert_eq!(config.winner_count(), 3);
        assert_eq!(config.countdown_tick(), Duration::from_secs(1));
        assert_eq!(config.session_ttl(), Duration::from_secs(43_200));
        assert!(!config.is_admin_email("root@example.org"));
        assert_eq!(config.contact_inbox(), "contact@exam-hall.local");
    }

    #[test]
    fn admin_emails_match_case_insensitively() {
        let config =
            AppConfig::from_json(r#"{"admin_emails": [" Proctor@Example.org "]}"#).unwrap();
        assert!(config.is_admin_email("proctor@example.org"));
        assert!(config.is_admin_email("PROCTOR@example.org"));
    }

    #[test]
    fn invalid_documents_are_rejected() {
        assert!(AppConfig::from_json(r#"{"winner_count": "five"}"#).is_err());
    }
}
