//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.chatwidget/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::DisplayMode;
use crate::core::dispatcher::{DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_MESSAGE_CHARS, DispatchSettings};
use crate::core::rate_limiter::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS};
use crate::transport::RetryPolicy;
use crate::transport::retry::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS, DEFAULT_TIMEOUT_MS,
};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WidgetFileConfig {
    #[serde(default)]
    pub widget: WidgetSection,
    #[serde(default)]
    pub transport: TransportSection,
    #[serde(default)]
    pub limits: LimitsSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WidgetSection {
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub webhook_url: Option<String>,
    pub display_mode: Option<DisplayMode>,
    pub auto_open: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TransportSection {
    pub timeout_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LimitsSection {
    pub max_requests: Option<usize>,
    pub window_ms: Option<u64>,
    pub max_message_chars: Option<usize>,
    pub debounce_ms: Option<u64>,
}

/// Values supplied on the command line (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub webhook_url: Option<String>,
    pub display_mode: Option<DisplayMode>,
    pub auto_open: bool,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_CLIENT_NAME: &str = "Support";
/// Placeholder id the embed snippet ships with; never a real client.
const PLACEHOLDER_CLIENT_ID: &str = "default";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub client_id: String,
    pub client_name: String,
    pub webhook_url: String,
    pub display_mode: DisplayMode,
    pub auto_open: bool,
    pub retry: RetryPolicy,
    pub dispatch: DispatchSettings,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window: Duration,
}

impl ResolvedConfig {
    /// Every setting at its default except the two that have none.
    pub fn with_defaults(client_id: String, webhook_url: String) -> Self {
        Self {
            client_id,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            webhook_url,
            display_mode: DisplayMode::default(),
            auto_open: false,
            retry: RetryPolicy::default(),
            dispatch: DispatchSettings::default(),
            rate_limit_max_requests: DEFAULT_MAX_REQUESTS,
            rate_limit_window: Duration::from_millis(DEFAULT_WINDOW_MS),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// A required setting was not supplied by any layer.
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Missing(field) => write!(f, "missing required setting: {field}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.chatwidget/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatwidget").join("config.toml"))
}

/// Load config from `~/.chatwidget/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `WidgetFileConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<WidgetFileConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(WidgetFileConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(WidgetFileConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<WidgetFileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: WidgetFileConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Chat Widget Configuration
# Override hierarchy: defaults → this file → env vars → CLI flags.
# client_id and webhook_url have no default and must be set somewhere.

# [widget]
# client_id = "acme"                 # Or set CHATWIDGET_CLIENT_ID env var
# client_name = "Support"
# webhook_url = "https://example.com/webhook/chat"   # Or CHATWIDGET_WEBHOOK_URL
# display_mode = "floating"          # "floating" or "embedded"
# auto_open = false

# [transport]
# timeout_ms = 30000
# max_attempts = 3
# base_delay_ms = 1000
# max_delay_ms = 10000

# [limits]
# max_requests = 10                  # accepted sends per window
# window_ms = 60000
# max_message_chars = 1000
# debounce_ms = 300
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &WidgetFileConfig, cli: &CliOverrides) -> Result<ResolvedConfig, ConfigError> {
    // Client id: CLI → env → config; the embed placeholder counts as unset
    let client_id = cli
        .client_id
        .clone()
        .or_else(|| std::env::var("CHATWIDGET_CLIENT_ID").ok())
        .or_else(|| config.widget.client_id.clone())
        .filter(|id| !id.is_empty() && id != PLACEHOLDER_CLIENT_ID)
        .ok_or(ConfigError::Missing("client_id"))?;

    // Webhook URL: CLI → env → config
    let webhook_url = cli
        .webhook_url
        .clone()
        .or_else(|| std::env::var("CHATWIDGET_WEBHOOK_URL").ok())
        .or_else(|| config.widget.webhook_url.clone())
        .filter(|url| !url.is_empty())
        .ok_or(ConfigError::Missing("webhook_url"))?;

    // Client name: CLI → env → config → default
    let client_name = cli
        .client_name
        .clone()
        .or_else(|| std::env::var("CHATWIDGET_CLIENT_NAME").ok())
        .or_else(|| config.widget.client_name.clone())
        .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string());

    let transport = &config.transport;
    let retry = RetryPolicy {
        timeout: Duration::from_millis(transport.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
        max_attempts: transport.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1),
        base_delay: Duration::from_millis(transport.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS)),
        max_delay: Duration::from_millis(transport.max_delay_ms.unwrap_or(DEFAULT_MAX_DELAY_MS)),
    };

    let limits = &config.limits;
    let dispatch = DispatchSettings {
        max_message_chars: limits.max_message_chars.unwrap_or(DEFAULT_MAX_MESSAGE_CHARS),
        debounce: Duration::from_millis(limits.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)),
    };

    Ok(ResolvedConfig {
        client_id,
        client_name,
        webhook_url,
        display_mode: cli
            .display_mode
            .or(config.widget.display_mode)
            .unwrap_or_default(),
        auto_open: cli.auto_open || config.widget.auto_open.unwrap_or(false),
        retry,
        dispatch,
        rate_limit_max_requests: limits.max_requests.unwrap_or(DEFAULT_MAX_REQUESTS),
        rate_limit_window: Duration::from_millis(limits.window_ms.unwrap_or(DEFAULT_WINDOW_MS)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_ids() -> WidgetFileConfig {
        WidgetFileConfig {
            widget: WidgetSection {
                client_id: Some("acme".to_string()),
                webhook_url: Some("https://hooks.example.test/chat".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_parses() {
        let config = WidgetFileConfig::default();
        assert!(config.widget.client_id.is_none());
        assert!(config.transport.max_attempts.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_sparse() {
        let resolved = resolve(&with_ids(), &CliOverrides::default()).unwrap();
        assert_eq!(resolved.client_name, DEFAULT_CLIENT_NAME);
        assert_eq!(resolved.display_mode, DisplayMode::Floating);
        assert!(!resolved.auto_open);
        assert_eq!(resolved.retry, RetryPolicy::default());
        assert_eq!(resolved.dispatch, DispatchSettings::default());
        assert_eq!(resolved.rate_limit_max_requests, 10);
        assert_eq!(resolved.rate_limit_window, Duration::from_secs(60));
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let toml_str = r#"
[widget]
client_id = "acme"
client_name = "Acme Help"
webhook_url = "https://hooks.example.test/chat"
display_mode = "embedded"
auto_open = true

[transport]
timeout_ms = 5000
max_attempts = 5
base_delay_ms = 250
max_delay_ms = 2000

[limits]
max_requests = 3
window_ms = 10000
max_message_chars = 200
debounce_ms = 100
"#;
        let config: WidgetFileConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve(&config, &CliOverrides::default()).unwrap();

        assert_eq!(resolved.client_name, "Acme Help");
        assert_eq!(resolved.display_mode, DisplayMode::Embedded);
        assert!(resolved.auto_open);
        assert_eq!(resolved.retry.timeout, Duration::from_millis(5000));
        assert_eq!(resolved.retry.max_attempts, 5);
        assert_eq!(resolved.retry.base_delay, Duration::from_millis(250));
        assert_eq!(resolved.retry.max_delay, Duration::from_millis(2000));
        assert_eq!(resolved.rate_limit_max_requests, 3);
        assert_eq!(resolved.rate_limit_window, Duration::from_secs(10));
        assert_eq!(resolved.dispatch.max_message_chars, 200);
        assert_eq!(resolved.dispatch.debounce, Duration::from_millis(100));
    }

    #[test]
    fn test_resolve_cli_wins() {
        let cli = CliOverrides {
            client_id: Some("cli-client".to_string()),
            webhook_url: Some("http://localhost:5678/webhook".to_string()),
            display_mode: Some(DisplayMode::Embedded),
            ..Default::default()
        };
        let resolved = resolve(&with_ids(), &cli).unwrap();
        assert_eq!(resolved.client_id, "cli-client");
        assert_eq!(resolved.webhook_url, "http://localhost:5678/webhook");
        assert_eq!(resolved.display_mode, DisplayMode::Embedded);
    }

    #[test]
    fn test_placeholder_client_id_is_rejected() {
        let mut config = with_ids();
        config.widget.client_id = Some("default".to_string());
        let err = resolve(&config, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("client_id")));
    }

    #[test]
    fn test_missing_webhook_is_rejected() {
        let mut config = with_ids();
        config.widget.webhook_url = None;
        let cli = CliOverrides {
            webhook_url: None,
            ..Default::default()
        };
        // Only meaningful when the env var is not set in the test environment.
        if std::env::var("CHATWIDGET_WEBHOOK_URL").is_err() {
            let err = resolve(&config, &cli).unwrap_err();
            assert_eq!(err.to_string(), "missing required setting: webhook_url");
        }
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let mut config = with_ids();
        config.transport.max_attempts = Some(0);
        let resolved = resolve(&config, &CliOverrides::default()).unwrap();
        assert_eq!(resolved.retry.max_attempts, 1);
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[limits]
debounce_ms = 500
"#;
        let config: WidgetFileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.limits.debounce_ms, Some(500));
        assert!(config.limits.max_requests.is_none());
        assert!(config.widget.client_id.is_none());
    }

    #[test]
    fn test_load_config_from_reports_parse_errors() {
        let path = std::env::temp_dir().join(format!(
            "chatwidget-bad-config-{}.toml",
            uuid::Uuid::new_v4()
        ));
        fs::write(&path, "[widget\nclient_id = ").unwrap();
        let result = load_config_from(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
