//! Configuration for the spread engine.
//!
//! Loads a YAML file, substitutes `${VAR}` / `${VAR:-default}` from the
//! environment, and validates the result before anything connects.
//!
//! # Usage
//!
//! ```rust,ignore
//! use spread_engine::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! let knobs = config.execution.knobs();
//! let settings = config.structure_settings();
//! ```

mod audit;
mod broker;
mod execution;
mod observability;
mod signal;
mod structure;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::StructureSettings;

pub use audit::AuditConfig;
pub use broker::{BrokerConfig, BrokerKind, PaperFill, PaperSettings, RetrySettings, SchwabSettings};
pub use execution::{ExecutionConfig, TradingWindowConfig};
pub use observability::{LogFormat, LoggingConfig, ObservabilityConfig};
pub use signal::SignalConfig;
pub use structure::{SIZING_MODES, SizingConfig, StructureConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Broker selection and credentials.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Signal provider.
    #[serde(default)]
    pub signal: SignalConfig,
    /// Structure shape.
    #[serde(default)]
    pub structure: StructureConfig,
    /// Contract count.
    #[serde(default)]
    pub sizing: SizingConfig,
    /// Repricing loop.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Run records.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Logging.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Run settings from the structure and sizing sections.
    #[must_use]
    pub fn structure_settings(&self) -> StructureSettings {
        structure::structure_settings(&self.structure, &self.sizing)
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax. Unset or empty
/// variables without a default become empty strings.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.broker.kind == BrokerKind::Schwab
        && config.broker.schwab.access_token.trim().is_empty()
    {
        return Err(invalid("broker.schwab.access_token is required for the schwab broker"));
    }

    let retry = &config.broker.retry;
    if retry.max_attempts == 0 {
        return Err(invalid("broker.retry.max_attempts must be at least 1"));
    }
    if retry.initial_backoff_ms > retry.max_backoff_ms {
        return Err(invalid(
            "broker.retry.initial_backoff_ms must not exceed max_backoff_ms",
        ));
    }

    if config.signal.token.trim().is_empty() {
        return Err(invalid("signal.token is required"));
    }
    if config.signal.max_attempts == 0 {
        return Err(invalid("signal.max_attempts must be at least 1"));
    }

    validate_structure(&config.structure)?;
    validate_sizing(&config.sizing)?;
    validate_execution(&config.execution)?;

    if config
        .audit
        .jsonl_path
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(invalid("audit.jsonl_path must not be empty when set"));
    }

    if config.observability.logging.level.trim().is_empty() {
        return Err(invalid("observability.logging.level must not be empty"));
    }

    Ok(())
}

fn validate_structure(structure: &StructureConfig) -> Result<(), ConfigError> {
    let root = structure.root.trim();
    if root.is_empty() || root.len() > 6 || !root.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid(
            "structure.root must be 1-6 alphanumeric characters",
        ));
    }
    if structure.credit_width.is_some_and(|w| w <= Decimal::ZERO) {
        return Err(invalid("structure.credit_width must be positive"));
    }
    if structure.push_out < Decimal::ZERO {
        return Err(invalid("structure.push_out must not be negative"));
    }
    Ok(())
}

fn validate_sizing(sizing: &SizingConfig) -> Result<(), ConfigError> {
    match sizing.mode.as_str() {
        "fixed" if sizing.quantity == 0 => {
            return Err(invalid("sizing.quantity must be at least 1"));
        }
        "per_equity" if sizing.dollars_per_unit <= Decimal::ZERO => {
            return Err(invalid("sizing.dollars_per_unit must be positive"));
        }
        mode if !SIZING_MODES.contains(&mode) => {
            return Err(invalid(format!(
                "sizing.mode must be one of: {SIZING_MODES:?}"
            )));
        }
        _ => {}
    }
    if sizing.cash_override.is_some_and(|c| c < Decimal::ZERO) {
        return Err(invalid("sizing.cash_override must not be negative"));
    }
    Ok(())
}

fn validate_execution(execution: &ExecutionConfig) -> Result<(), ConfigError> {
    if execution.tick <= Decimal::ZERO {
        return Err(invalid("execution.tick must be positive"));
    }
    if execution.edge < Decimal::ZERO {
        return Err(invalid("execution.edge must not be negative"));
    }
    if execution.min_price <= Decimal::ZERO {
        return Err(invalid("execution.min_price must be positive"));
    }
    if execution
        .max_price
        .is_some_and(|max| max < execution.min_price)
    {
        return Err(invalid("execution.max_price must not be below min_price"));
    }
    if execution.fallback_price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(invalid("execution.fallback_price must be positive"));
    }
    if execution.max_cycles == 0 {
        return Err(invalid("execution.max_cycles must be at least 1"));
    }
    if execution.poll_interval_secs == 0 {
        return Err(invalid("execution.poll_interval_secs must be at least 1"));
    }
    if execution.time_budget_secs < execution.poll_interval_secs {
        return Err(invalid(
            "execution.time_budget_secs must cover at least one poll interval",
        ));
    }
    if execution.max_consecutive_failures == 0 {
        return Err(invalid("execution.max_consecutive_failures must be at least 1"));
    }
    if let Err(err) = execution.trading_window() {
        return Err(invalid(format!("execution.trading_window: {err}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::StructureKind;
    use crate::domain::option_position::{ShortPlacement, Strike};
    use crate::domain::signal::SideOverride;
    use crate::domain::sizing::SizingRule;

    const MINIMAL: &str = r"
signal:
  token: abc
";

    fn load(yaml: &str) -> Config {
        match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load config: {e}"),
        }
    }

    fn rejection(yaml: &str) -> String {
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected validation error");
        };
        err.to_string()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load(MINIMAL);

        assert_eq!(config.broker.kind, BrokerKind::Paper);
        assert_eq!(config.structure.root, "SPXW");
        assert_eq!(config.structure.kind, StructureKind::IronCondor);
        assert_eq!(config.sizing.rule(), SizingRule::Fixed { quantity: 1 });
        assert_eq!(config.execution.order_lookback(), Duration::from_secs(86_400));
        assert_eq!(config.observability.logging.format, LogFormat::Pretty);

        let knobs = config.execution.knobs();
        assert_eq!(knobs.tick, dec!(0.05));
        assert_eq!(knobs.max_cycles, 24);
        assert_eq!(knobs.fallback_price, None);
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "token: ${SPREAD_ENGINE_TEST_NONEXISTENT_VAR:-fallback}";
        assert_eq!(interpolate_env_vars(input), "token: fallback");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);

        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "token: ${SPREAD_ENGINE_TEST_UNLIKELY_TO_EXIST}";
        assert_eq!(interpolate_env_vars(input), "token: ");
    }

    #[test]
    fn test_missing_signal_token_is_rejected() {
        let yaml = "signal:\n  token: ${SPREAD_ENGINE_TEST_UNLIKELY_TO_EXIST}\n";
        assert!(rejection(yaml).contains("signal.token"));
    }

    #[test]
    fn test_schwab_requires_access_token() {
        let yaml = r"
broker:
  kind: schwab
signal:
  token: abc
";
        assert!(rejection(yaml).contains("access_token"));
    }

    #[test]
    fn test_unknown_sizing_mode_is_rejected() {
        let yaml = r"
signal:
  token: abc
sizing:
  mode: kelly
";
        assert!(rejection(yaml).contains("sizing.mode"));
    }

    #[test]
    fn test_inverted_price_bounds_are_rejected() {
        let yaml = r"
signal:
  token: abc
execution:
  min_price: 1.00
  max_price: 0.50
";
        assert!(rejection(yaml).contains("max_price"));
    }

    #[test]
    fn test_trading_window_defaults_to_the_close() {
        assert!(load(MINIMAL).execution.trading_window().unwrap().is_none());

        let yaml = r"
signal:
  token: abc
execution:
  trading_window: {}
";
        let window = load(yaml).execution.trading_window().unwrap().unwrap();
        assert_eq!(window.to_string(), "16:08:00-16:14:00 America/New_York weekdays");
    }

    #[test]
    fn test_bad_trading_window_is_rejected() {
        let yaml = r"
signal:
  token: abc
execution:
  trading_window:
    timezone: Mars/Olympus
";
        assert!(rejection(yaml).contains("execution.trading_window"));
    }

    #[test]
    fn test_bad_root_is_rejected() {
        let yaml = r"
signal:
  token: abc
structure:
  root: TOOLONGROOT
";
        assert!(rejection(yaml).contains("structure.root"));
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
broker:
  kind: schwab
  schwab:
    base_url: "https://example.test/"
    access_token: "tok"
    account_number: "12345678"
  retry:
    max_attempts: 3
    initial_backoff_ms: 100
    max_backoff_ms: 1000

signal:
  token: "Bearer abc"
  timeout_secs: 5

structure:
  root: SPXW
  kind: put_vertical
  credit_width: 15
  push_out: 5
  side: CREDIT

sizing:
  mode: per_equity
  dollars_per_unit: 4000
  cash_override: 20000

execution:
  tick: 0.05
  edge: 0.10
  min_price: 0.10
  max_price: 4.95
  fallback_price: 1.00
  max_cycles: 12
  poll_interval_secs: 5
  time_budget_secs: 60
  order_lookback_hours: 6

audit:
  jsonl_path: logs/audit.jsonl

observability:
  logging:
    level: "spread_engine=debug"
    format: json
"#;

        let config = load(yaml);

        let schwab = config.broker.schwab.to_adapter_config(&config.broker.retry);
        assert_eq!(schwab.base_url, "https://example.test");
        assert_eq!(schwab.account_number.as_deref(), Some("12345678"));
        assert_eq!(schwab.account_hash, None);
        assert_eq!(schwab.retry.max_attempts, 3);

        let settings = config.structure_settings();
        assert_eq!(settings.kind, StructureKind::PutVertical);
        assert_eq!(settings.side_override, SideOverride::Credit);
        assert_eq!(
            settings.placement,
            ShortPlacement::PushedOut {
                offset: Strike::from_points(5)
            }
        );
        assert_eq!(
            settings.sizing,
            SizingRule::PerEquity {
                dollars_per_unit: dec!(4000)
            }
        );
        assert_eq!(settings.cash_override, Some(dec!(20000)));

        let knobs = config.execution.knobs();
        assert_eq!(knobs.edge, dec!(0.10));
        assert_eq!(knobs.max_price, Some(dec!(4.95)));
        assert_eq!(knobs.fallback_price, Some(dec!(1.00)));
        assert_eq!(knobs.time_budget, Duration::from_secs(60));
        assert_eq!(config.execution.order_lookback(), Duration::from_secs(6 * 3600));

        assert_eq!(config.audit.jsonl_path.as_deref(), Some("logs/audit.jsonl"));
        assert_eq!(config.observability.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.signal.token, "abc");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config(Some("/nonexistent/spread-engine.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
