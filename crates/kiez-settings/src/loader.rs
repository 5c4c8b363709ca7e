//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`KiezSettings::default()`]
//! 2. If `~/.kiez/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)
//!
//! API credentials (`ANTHROPIC_API_KEY`, `TAVILY_API_KEY`) are never part
//! of the settings file; the clients that need them read the environment
//! directly.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use kiez_core::models::Language;

use crate::errors::Result;
use crate::types::KiezSettings;

/// Resolve the path to the settings file (`~/.kiez/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".kiez").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<KiezSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<KiezSettings> {
    let defaults = serde_json::to_value(KiezSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: KiezSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are silently ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut KiezSettings) {
    if let Some(v) = read_env_string("KIEZ_CITY") {
        settings.city = v;
    }
    if let Some(v) = read_env_u32("KIEZ_DAYS_AHEAD", 1, 365) {
        settings.days_ahead = v;
    }
    if let Some(v) = read_env_string("KIEZ_LANGUAGES") {
        if let Some(langs) = parse_languages(&v) {
            settings.languages = langs;
        }
    }
    if let Some(v) = read_env_string("KIEZ_DATA_DIR") {
        settings.data_dir = v;
    }
    if let Some(v) = read_env_string("KIEZ_SITE_URL") {
        settings.site_url = v;
    }
    if let Some(v) = read_env_string("KIEZ_SCOUT_MODEL") {
        settings.models.scout = v;
    }
    if let Some(v) = read_env_string("KIEZ_CURATOR_MODEL") {
        settings.models.curator = v;
    }
    if let Some(v) = read_env_string("KIEZ_AUTHOR_MODEL") {
        settings.models.author = v;
    }
    if let Some(v) = read_env_string("KIEZ_CRITIC_MODEL") {
        settings.models.critic = v;
    }
    if let Some(v) = read_env_string("KIEZ_LEDE_MODEL") {
        settings.models.lede = v;
    }
    if let Some(v) = read_env_string("TELEGRAM_BOT_TOKEN") {
        settings.telegram.bot_token = v;
    }
    if let Some(v) = read_env_string("TELEGRAM_CHAT_ID") {
        settings.telegram.chat_id = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a comma-separated language list; `None` if any entry is unknown
/// or the list is empty.
pub fn parse_languages(val: &str) -> Option<Vec<Language>> {
    let langs: Option<Vec<Language>> = val
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Language::from_str(s).ok())
        .collect();
    langs.filter(|l| !l.is_empty())
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid integer env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
