//! Best-effort publication announcements.
//!
//! One channel so far: Telegram. Announcements never fail a publication;
//! every delivery error ends at a warning log.

pub mod errors;
pub mod telegram;

pub use errors::{NotifyError, Result};
pub use telegram::{ArticleAnnouncement, Notifier, TelegramNotifier};
