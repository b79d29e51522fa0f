//! Configuration types.

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::error::ConfigError;

/// Sender address the helpdesk uses when a ticket is submitted on behalf of a customer.
pub const DEFAULT_CUSTOMER_ALIAS: &str = "bestellung@miomente.de";

/// Length of the preview kept on each ticket record.
pub const DEFAULT_PREVIEW_CHARS: usize = 300;

/// Date-time format used by the export.
pub const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Analyzer configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Identity fragment that marks a known author as the customer.
    pub customer_alias: String,
    /// The "now" every age is measured against.
    pub reference_time: NaiveDateTime,
    /// Characters of the first message kept as a preview.
    pub preview_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            customer_alias: DEFAULT_CUSTOMER_ALIAS.to_string(),
            reference_time: Local::now().naive_local(),
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl AnalyzerConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// - `TICKETS_CUSTOMER_ALIAS` overrides the customer alias
    /// - `TICKETS_NOW` pins the reference time (`YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`)
    /// - `TICKETS_PREVIEW_CHARS` sets the preview length
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(alias) = std::env::var("TICKETS_CUSTOMER_ALIAS")
            && !alias.trim().is_empty()
        {
            config.customer_alias = alias.trim().to_string();
        }

        if let Ok(now) = std::env::var("TICKETS_NOW") {
            config.reference_time = parse_reference_time("TICKETS_NOW", &now)?;
        }

        if let Ok(raw) = std::env::var("TICKETS_PREVIEW_CHARS") {
            config.preview_chars = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "TICKETS_PREVIEW_CHARS".into(),
                message: format!("expected a positive integer, got {raw:?}"),
            })?;
        }

        Ok(config)
    }

    /// Replace the reference time.
    pub fn with_reference_time(mut self, reference_time: NaiveDateTime) -> Self {
        self.reference_time = reference_time;
        self
    }

    /// Replace the customer alias.
    pub fn with_customer_alias(mut self, alias: impl Into<String>) -> Self {
        self.customer_alias = alias.into();
        self
    }
}

/// Parse a reference time given either as a full timestamp or a bare date (midnight).
pub fn parse_reference_time(key: &str, value: &str) -> Result<NaiveDateTime, ConfigError> {
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, EXPORT_DATE_FORMAT) {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS, got {value:?}"),
        })
}
