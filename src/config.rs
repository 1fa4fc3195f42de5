//! Runtime tuning knobs, optionally loaded from a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::search::SearchEntry;
use crate::timer::Millis;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhanceConfig {
    /// Class of the element whose `h1`–`h4` feed the table of contents.
    pub article_class: String,
    /// Headings at or above this viewport offset count as "current".
    pub highlight_offset: f64,
    /// Space left above an anchor target after smooth scrolling (fixed header).
    pub scroll_offset: f64,
    pub throttle_ms: Millis,
    pub dropdown_grace_ms: Millis,
    pub search_debounce_ms: Millis,
    /// Queries shorter than this clear the results instead of searching.
    pub search_min_chars: usize,
    pub copy_feedback_ms: Millis,
    pub reveal_threshold: f64,
    /// Bottom inset of the reveal observer (`--space-12`).
    pub reveal_margin: String,
    pub theme_key: String,
    pub search_index: Vec<SearchEntry>,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            article_class: "factor-article".to_owned(),
            highlight_offset: 100.0,
            scroll_offset: 80.0,
            throttle_ms: 16,
            dropdown_grace_ms: 100,
            search_debounce_ms: 300,
            search_min_chars: 3,
            copy_feedback_ms: 2000,
            reveal_threshold: 0.1,
            reveal_margin: "48px".to_owned(),
            theme_key: "theme".to_owned(),
            search_index: SearchEntry::builtin(),
        }
    }
}

impl EnhanceConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.article_class.trim().is_empty() {
            return Err(ConfigError::Invalid("article_class must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.reveal_threshold) {
            return Err(ConfigError::Invalid(format!(
                "reveal_threshold {} outside 0..=1",
                self.reveal_threshold
            )));
        }
        if self.theme_key.is_empty() {
            return Err(ConfigError::Invalid("theme_key must not be empty".into()));
        }
        Ok(())
    }
}
