//! # kiez-settings
//!
//! Configuration management with layered sources for the kiez pipeline.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`KiezSettings::default()`]
//! 2. **User file** — `~/.kiez/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `KIEZ_*` / `TELEGRAM_*` overrides
//!
//! API credentials are intentionally not settings: `ANTHROPIC_API_KEY`
//! and `TAVILY_API_KEY` come from the environment only.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
