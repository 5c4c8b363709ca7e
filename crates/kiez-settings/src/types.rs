//! Settings types with compiled defaults.

use serde::{Deserialize, Serialize};

use kiez_core::models::Language;

/// Top-level settings for the editorial pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KiezSettings {
    /// City the pipeline scouts and writes about.
    pub city: String,
    /// How far ahead (days) the scout looks for events.
    pub days_ahead: u32,
    /// Languages articles are written in, in publication order.
    pub languages: Vec<Language>,
    /// Root directory for the record store.
    pub data_dir: String,
    /// Public site base URL used in notification links.
    pub site_url: String,
    /// Model selection per pipeline stage.
    pub models: ModelSettings,
    /// Telegram notification settings.
    pub telegram: TelegramSettings,
}

impl Default for KiezSettings {
    fn default() -> Self {
        Self {
            city: "Berlin".to_string(),
            days_ahead: 14,
            languages: vec![Language::En, Language::De, Language::Ru],
            data_dir: "data".to_string(),
            site_url: String::new(),
            models: ModelSettings::default(),
            telegram: TelegramSettings::default(),
        }
    }
}

/// Which model each pipeline stage calls.
///
/// The heavyweight stages (drafting, critique) default to a stronger
/// model than the short title/lede calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Event scouting and selection.
    pub scout: String,
    /// Event curation.
    pub curator: String,
    /// Article drafting and expansion.
    pub author: String,
    /// Critique-and-revise pass.
    pub critic: String,
    /// Title and lede synthesis.
    pub lede: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            scout: "claude-sonnet-4-20250514".to_string(),
            curator: "claude-sonnet-4-20250514".to_string(),
            author: "claude-sonnet-4-20250514".to_string(),
            critic: "claude-sonnet-4-20250514".to_string(),
            lede: "claude-3-5-haiku-20241022".to_string(),
        }
    }
}

/// Telegram delivery settings. Both fields empty means notifications
/// are disabled.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelegramSettings {
    /// Bot API token.
    pub bot_token: String,
    /// Target chat or channel id.
    pub chat_id: String,
}

impl TelegramSettings {
    /// Whether both credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
