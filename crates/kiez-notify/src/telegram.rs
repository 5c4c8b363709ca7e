//! Telegram announcement delivery.
//!
//! Delivery errors surface as [`NotifyError`] so callers can log them,
//! but publication never depends on a notification going out.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use kiez_core::models::{Category, Language, StoredArticle};
use kiez_settings::TelegramSettings;

use crate::errors::{NotifyError, Result};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// The fields of a published article that go into an announcement.
#[derive(Clone, Debug, PartialEq)]
pub struct ArticleAnnouncement {
    /// Headline.
    pub title: String,
    /// Lede paragraph.
    pub lead: String,
    /// URL slug of the published article.
    pub slug: String,
    /// Language of the article.
    pub language: Language,
    /// Category of the covered event.
    pub category: Category,
    /// Venue of the covered event, possibly empty.
    pub venue: String,
    /// Start date of the covered event, possibly empty.
    pub start_date: String,
}

impl ArticleAnnouncement {
    /// Build an announcement from a stored article.
    #[must_use]
    pub fn from_article(article: &StoredArticle) -> Self {
        Self {
            title: article.title.clone(),
            lead: article.lead.clone(),
            slug: article.slug.clone(),
            language: article.language,
            category: article.event.category,
            venue: article.event.venue.clone(),
            start_date: article.event.start_date.clone(),
        }
    }
}

/// Something that can announce a published article.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce an article. Errors are for the caller's log, nothing more.
    async fn notify(&self, announcement: &ArticleAnnouncement) -> Result<()>;
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

/// Announces published articles to a Telegram chat via the Bot API.
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
    site_url: String,
}

impl TelegramNotifier {
    /// Build a notifier from settings. `None` when the bot token or chat
    /// id is missing, in which case announcements are skipped entirely.
    #[must_use]
    pub fn from_settings(telegram: &TelegramSettings, site_url: &str) -> Option<Self> {
        if !telegram.is_configured() {
            return None;
        }
        Some(Self {
            http: reqwest::Client::new(),
            api_url: TELEGRAM_API_URL.to_string(),
            bot_token: telegram.bot_token.clone(),
            chat_id: telegram.chat_id.clone(),
            site_url: site_url.trim_end_matches('/').to_string(),
        })
    }

    /// Point the notifier at a different API host (tests).
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn article_url(&self, announcement: &ArticleAnnouncement) -> String {
        format!(
            "{}/article/{}?lang={}",
            self.site_url, announcement.slug, announcement.language
        )
    }

    fn message_text(&self, announcement: &ArticleAnnouncement) -> String {
        let url = self.article_url(announcement);
        let read_label = match announcement.language {
            Language::En => "Read →",
            Language::De => "Lesen →",
            Language::Ru => "Читать →",
        };
        let mut text = format!("<b>{}</b>", escape_html(&announcement.title));
        if !announcement.venue.is_empty() {
            let mut detail = escape_html(&announcement.venue);
            if !announcement.start_date.is_empty() {
                detail.push_str(", ");
                detail.push_str(&announcement.start_date);
            }
            text.push_str(&format!("\n<i>{detail}</i>"));
        }
        text.push_str(&format!(
            "\n\n{}\n\n<a href=\"{url}\">{read_label}</a>",
            escape_html(&announcement.lead)
        ));
        text
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, announcement: &ArticleAnnouncement) -> Result<()> {
        let body = SendMessageBody {
            chat_id: &self.chat_id,
            text: self.message_text(announcement),
            parse_mode: "HTML",
        };
        let response = self
            .http
            .post(format!("{}/bot{}/sendMessage", self.api_url, self.bot_token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("description").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| "unreadable error response".to_string());
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        info!(slug = %announcement.slug, lang = %announcement.language, "article announced");
        Ok(())
    }
}

/// Escape text for Telegram's HTML parse mode.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
