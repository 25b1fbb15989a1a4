//! Form configuration.
//!
//! Loaded from TOML; every section and key is optional.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// ROOT CONFIG
// =============================================================================

/// Behavior knobs for a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Submit-status helper settings.
    pub submit: SubmitConfig,

    /// Log output settings.
    pub logging: LoggingConfig,
}

impl FormConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

// =============================================================================
// SUBMIT
// =============================================================================

/// Settings for [`Submitter`](crate::Submitter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    /// How long a finished submission stays visible before going idle.
    pub reset_after_ms: u64,

    /// Ignore triggers while the form is locked.
    pub skip_when_locked: bool,

    /// Ignore triggers while the form is omitted.
    pub skip_when_omitted: bool,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            reset_after_ms: 1_500,
            skip_when_locked: true,
            skip_when_omitted: true,
        }
    }
}

impl SubmitConfig {
    pub fn reset_after(&self) -> Duration {
        Duration::from_millis(self.reset_after_ms)
    }
}

// =============================================================================
// LOGGING
// =============================================================================

/// Settings for log events emitted by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Include field values in log events. Values may hold personal data, so
    /// they are redacted unless this is set.
    pub log_values: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_gives_defaults() {
        let config = FormConfig::from_toml_str("").unwrap();
        assert_eq!(config, FormConfig::default());
        assert_eq!(config.submit.reset_after(), Duration::from_millis(1_500));
    }

    #[test]
    fn test_partial_sections() {
        let config = FormConfig::from_toml_str(
            r#"
            [submit]
            reset_after_ms = 250

            [logging]
            log_values = true
            "#,
        )
        .unwrap();
        assert_eq!(config.submit.reset_after_ms, 250);
        assert!(config.submit.skip_when_locked);
        assert!(config.logging.log_values);
    }

    #[test]
    fn test_bad_type_is_config_error() {
        let error = FormConfig::from_toml_str("[submit]\nreset_after_ms = \"soon\"").unwrap_err();
        assert!(matches!(error, crate::FormError::Config(_)));
    }
}
