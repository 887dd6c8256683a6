//! Journal configuration loaded from TOML.
//!
//! ```toml
//! tag = "JOURNAL_MSG_JSON"
//! format_mode = "STRINGY"
//!
//! [subscriber]
//! filter = "journal=info"
//! ansi = false
//!
//! [context]
//! app_version = "0.1.0"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::formatter::{DEFAULT_TAG, FormatMode, JournalFormatter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalSettings {
    /// Tag prepended to every record for downstream filtering.
    pub tag: String,
    pub format_mode: FormatMode,
    /// Log subscriber to install; none leaves subscriber setup to the caller.
    pub subscriber: Option<SubscriberSettings>,
    /// Context used when none is passed to [`init`](crate::init).
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriberSettings {
    /// `EnvFilter` directives.
    pub filter: String,
    pub ansi: bool,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_owned(),
            format_mode: FormatMode::Json,
            subscriber: None,
            context: None,
        }
    }
}

impl Default for SubscriberSettings {
    fn default() -> Self {
        Self {
            filter: "journal=info".to_owned(),
            ansi: false,
        }
    }
}

impl JournalSettings {
    /// Loads settings from `path`, or the defaults if the file does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn formatter(&self) -> JournalFormatter {
        JournalFormatter::new(self.tag.clone(), self.format_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JournalError;
    use serde_json::json;

    #[test]
    fn parses_every_section() {
        let settings = JournalSettings::parse(
            r#"
            tag = "JOURNAL_MSG"
            format_mode = "STRINGY"

            [subscriber]
            filter = "journal=debug"

            [context]
            app_version = "0.1.0"
            "#,
        )
        .unwrap();

        assert_eq!(settings.tag, "JOURNAL_MSG");
        assert_eq!(settings.format_mode, FormatMode::Stringy);
        assert_eq!(
            settings.subscriber,
            Some(SubscriberSettings {
                filter: "journal=debug".into(),
                ansi: false,
            })
        );
        assert_eq!(settings.context, Some(json!({"app_version": "0.1.0"})));
        assert_eq!(settings.formatter().tag(), "JOURNAL_MSG");
    }

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(JournalSettings::parse("").unwrap(), JournalSettings::default());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let settings = JournalSettings::load_from("/nonexistent/journal.toml").unwrap();
        assert_eq!(settings, JournalSettings::default());
    }

    #[test]
    fn unknown_format_mode_is_rejected() {
        let err = JournalSettings::parse(r#"format_mode = "YAML""#).unwrap_err();
        assert!(matches!(err, JournalError::Settings(_)));
    }
}
