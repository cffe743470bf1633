//! Formatter configuration, loadable from JSON or from environment
//! variables.
//!
//! The formatter types themselves never read the environment; these are
//! helpers for services that want to configure output without code.

use crate::date::DEFAULT_DATE_FORMAT;
use crate::error::ConfigError;
use crate::formatter::{Formatter, JsonFormatter, StandardFormatter};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Output mode: `text` or `json`.
pub const LOG_FORMAT_MODE_ENV: &str = "LOG_FORMAT_MODE";

/// Template used in `text` mode, e.g. `%(levelname)s %(message)s`.
pub const LOG_FORMAT_TEMPLATE_ENV: &str = "LOG_FORMAT_TEMPLATE";

/// JSON object mapping output keys to templates, used in `json` mode.
pub const LOG_FORMAT_FIELDS_ENV: &str = "LOG_FORMAT_FIELDS";

/// strftime pattern for `%(asctime)s`.
pub const LOG_FORMAT_DATE_FORMAT_ENV: &str = "LOG_FORMAT_DATE_FORMAT";

/// `true`/`false`: indent JSON output.
pub const LOG_FORMAT_PRETTY_ENV: &str = "LOG_FORMAT_PRETTY";

pub const DEFAULT_TEMPLATE: &str = "%(asctime)s %(levelname)s %(name)s: %(message)s";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

/// Everything needed to build a [`Formatter`].
///
/// Missing keys fall back to [`FormatterConfig::default`].
///
/// ```json
/// {
///   "mode": "json",
///   "fields": { "time": "%(asctime)s", "msg": "%(message)s" },
///   "date_format": "%H:%M:%S",
///   "pretty": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatterConfig {
    pub mode: OutputMode,
    /// Template for `text` mode.
    pub template: String,
    /// Output key to template, for `json` mode.
    pub fields: BTreeMap<String, String>,
    pub date_format: String,
    pub pretty: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        let fields = [
            ("time", "%(asctime)s"),
            ("level", "%(levelname)s"),
            ("name", "%(name)s"),
            ("message", "%(message)s"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            mode: OutputMode::Text,
            template: DEFAULT_TEMPLATE.to_string(),
            fields,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            pretty: false,
        }
    }
}

impl FormatterConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a configuration from the `LOG_FORMAT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(mode) = lookup(LOG_FORMAT_MODE_ENV) {
            config.mode = match mode.trim().to_ascii_lowercase().as_str() {
                "text" => OutputMode::Text,
                "json" => OutputMode::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: LOG_FORMAT_MODE_ENV,
                        value: mode,
                    })
                }
            };
        }
        if let Some(template) = lookup(LOG_FORMAT_TEMPLATE_ENV) {
            config.template = template;
        }
        if let Some(fields) = lookup(LOG_FORMAT_FIELDS_ENV) {
            config.fields = serde_json::from_str(&fields)?;
        }
        if let Some(date_format) = lookup(LOG_FORMAT_DATE_FORMAT_ENV) {
            config.date_format = date_format;
        }
        if let Some(pretty) = lookup(LOG_FORMAT_PRETTY_ENV) {
            config.pretty = match pretty.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: LOG_FORMAT_PRETTY_ENV,
                        value: pretty,
                    })
                }
            };
        }

        Ok(config)
    }

    /// Compile the configured templates into a shareable [`Formatter`].
    pub fn build(&self) -> Result<Arc<dyn Formatter>, ConfigError> {
        let formatter: Arc<dyn Formatter> = match self.mode {
            OutputMode::Text => Arc::new(StandardFormatter::new(&self.template, &self.date_format)?),
            OutputMode::Json => Arc::new(JsonFormatter::new(
                &self.fields,
                &self.date_format,
                self.pretty,
            )?),
        };
        Ok(formatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use crate::record::{Level, LogRecord};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = FormatterConfig::from_json_str(r#"{"mode": "json", "pretty": true}"#).unwrap();
        assert_eq!(config.mode, OutputMode::Json);
        assert!(config.pretty);
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(config.fields.len(), 4);
    }

    #[test]
    fn unknown_json_keys_are_rejected() {
        assert!(matches!(
            FormatterConfig::from_json_str(r#"{"colour": true}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_defaults() {
        let config = FormatterConfig::from_lookup(lookup(&[
            (LOG_FORMAT_MODE_ENV, "JSON"),
            (LOG_FORMAT_FIELDS_ENV, r#"{"lvl": "%(levelname)s"}"#),
            (LOG_FORMAT_DATE_FORMAT_ENV, "%H"),
            (LOG_FORMAT_PRETTY_ENV, "yes"),
        ]))
        .unwrap();

        assert_eq!(config.mode, OutputMode::Json);
        assert_eq!(config.fields.len(), 1);
        assert_eq!(config.date_format, "%H");
        assert!(config.pretty);
        assert_eq!(config.template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn env_rejects_bad_values() {
        assert!(matches!(
            FormatterConfig::from_lookup(lookup(&[(LOG_FORMAT_PRETTY_ENV, "maybe")])),
            Err(ConfigError::InvalidValue { key: LOG_FORMAT_PRETTY_ENV, .. })
        ));
        assert!(matches!(
            FormatterConfig::from_lookup(lookup(&[(LOG_FORMAT_MODE_ENV, "xml")])),
            Err(ConfigError::InvalidValue { key: LOG_FORMAT_MODE_ENV, .. })
        ));
        assert!(matches!(
            FormatterConfig::from_lookup(lookup(&[(LOG_FORMAT_FIELDS_ENV, "[1, 2]")])),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn build_selects_formatter_by_mode() {
        let mut config = FormatterConfig {
            template: "%(levelname)s %(message)s".to_string(),
            ..FormatterConfig::default()
        };
        let mut record = LogRecord::new(Level::Info, "svc", "up");
        assert_eq!(config.build().unwrap().format(&mut record), "INFO up");

        config.mode = OutputMode::Json;
        config.fields = BTreeMap::from([("m".to_string(), "%(message)s".to_string())]);
        assert_eq!(config.build().unwrap().format(&mut record), r#"{"m":"up"}"#);
    }

    #[test]
    fn build_reports_template_errors() {
        let config = FormatterConfig {
            template: "%(bogus)s".to_string(),
            ..FormatterConfig::default()
        };
        assert!(matches!(
            config.build(),
            Err(ConfigError::Format(FormatError::UnknownField(name))) if name == "bogus"
        ));
    }
}
