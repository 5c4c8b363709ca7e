//! Pool-level operations over the record store: event dedup, coverage
//! checks, availability filtering, and article analytics.
//!
//! All date comparisons are lexicographic over ISO 8601 strings, which
//! orders correctly without parsing.

use chrono::{Duration, Utc};
use tracing::{debug, info};

use kiez_core::ids::EventId;
use kiez_core::models::{
    Category, EventCandidate, Language, StoredArticle, StoredEvent, StoredReflection,
};

use crate::errors::Result;
use crate::store::RecordStore;

/// Outcome of [`RecordStore::save_event`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventSave {
    /// The candidate was new and a record was created.
    Inserted(EventId),
    /// The candidate matched an existing record, which was left untouched.
    Duplicate(EventId),
}

impl EventSave {
    /// The id of the record the candidate resolved to, either way.
    #[must_use]
    pub fn id(&self) -> &EventId {
        match self {
            EventSave::Inserted(id) | EventSave::Duplicate(id) => id,
        }
    }
}

/// True when two events are the same happening: names match after
/// trimming and case-folding, or both carry a venue and start date and
/// those match (venue case-insensitively, date exactly).
fn same_event(
    a_name: &str,
    a_venue: &str,
    a_start: &str,
    b_name: &str,
    b_venue: &str,
    b_start: &str,
) -> bool {
    if a_name.trim().to_lowercase() == b_name.trim().to_lowercase() {
        return true;
    }
    !a_venue.is_empty()
        && !a_start.is_empty()
        && !b_venue.is_empty()
        && !b_start.is_empty()
        && a_venue.to_lowercase() == b_venue.to_lowercase()
        && a_start == b_start
}

impl RecordStore {
    // ── Event pool ──────────────────────────────────────────────────

    /// Insert a candidate into the pool unless a duplicate already exists.
    ///
    /// Existing records are never modified; a duplicate candidate resolves
    /// to the stored record's id.
    pub fn save_event(&self, candidate: &EventCandidate) -> Result<EventSave> {
        if let Some(existing) = self.find_existing_event(candidate)? {
            debug!(name = %candidate.name, id = %existing.id, "duplicate event, keeping existing record");
            return Ok(EventSave::Duplicate(existing.id));
        }

        let event = StoredEvent {
            id: EventId::new(),
            name: candidate.name.clone(),
            start_date: candidate.start_date.clone(),
            end_date: candidate.end_date.clone(),
            venue: candidate.venue.clone(),
            city: candidate.city.clone(),
            category: candidate.category,
            description: candidate.description.clone(),
            source_url: candidate.source_url.clone(),
            event_url: candidate.event_url.clone(),
            scouted_at: Utc::now().to_rfc3339(),
        };
        let id = self.insert_event(event)?;
        info!(name = %candidate.name, id = %id, "event added to pool");
        Ok(EventSave::Inserted(id))
    }

    /// Find the stored event a candidate would be deduplicated against.
    pub fn find_existing_event(&self, candidate: &EventCandidate) -> Result<Option<StoredEvent>> {
        Ok(self.load_events()?.into_iter().find(|e| {
            same_event(
                &candidate.name,
                &candidate.venue,
                &candidate.start_date,
                &e.name,
                &e.venue,
                &e.start_date,
            )
        }))
    }

    /// Whether an event with this name is already pooled.
    pub fn event_exists(&self, name: &str) -> Result<bool> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .load_events()?
            .iter()
            .any(|e| e.name.trim().to_lowercase() == needle))
    }

    /// Names of every pooled event, for "avoid these" scout prompts.
    pub fn get_all_event_names(&self) -> Result<Vec<String>> {
        Ok(self.load_events()?.into_iter().map(|e| e.name).collect())
    }

    /// Events still worth writing about as of `today` (ISO 8601 date),
    /// excluding those already covered by an article (in the given
    /// language, or in any language when `None`).
    ///
    /// An event stays available while its end date has not passed; with
    /// no end date, while its start date has not passed; with neither
    /// date it never expires. Sorted most recently scouted first.
    pub fn get_available_events(
        &self,
        today: &str,
        language: Option<Language>,
    ) -> Result<Vec<StoredEvent>> {
        let articles = self.load_articles()?;
        let covered = |id: &EventId| {
            articles
                .iter()
                .any(|a| &a.event_id == id && language.is_none_or(|l| a.language == l))
        };

        let mut events: Vec<StoredEvent> = self
            .load_events()?
            .into_iter()
            .filter(|e| !covered(&e.id))
            .filter(|e| {
                if !e.end_date.is_empty() {
                    e.end_date.as_str() >= today
                } else if !e.start_date.is_empty() {
                    e.start_date.as_str() >= today
                } else {
                    true
                }
            })
            .collect();
        events.sort_by(|a, b| b.scouted_at.cmp(&a.scouted_at));
        Ok(events)
    }

    // ── Coverage ────────────────────────────────────────────────────

    /// Whether any stored article's event snapshot matches the given
    /// event identity (same dedup rule as the pool), optionally
    /// restricted to one language.
    ///
    /// Works from name/venue/date rather than an id so callers can check
    /// leads that never entered the pool.
    pub fn is_already_covered(
        &self,
        name: &str,
        venue: &str,
        start_date: &str,
        language: Option<Language>,
    ) -> Result<bool> {
        Ok(self.load_articles()?.iter().any(|a| {
            language.is_none_or(|l| a.language == l)
                && same_event(
                    name,
                    venue,
                    start_date,
                    &a.event.name,
                    &a.event.venue,
                    &a.event.start_date,
                )
        }))
    }

    /// Whether an article in the given language covers the event.
    pub fn has_article_in_language(&self, event_id: &EventId, language: Language) -> Result<bool> {
        Ok(self
            .load_articles()?
            .iter()
            .any(|a| &a.event_id == event_id && a.language == language))
    }

    // ── Analytics ───────────────────────────────────────────────────

    /// Categories of every article written in the trailing `days` window,
    /// newest first, one entry per article (repetition is the signal).
    pub fn get_recent_categories(&self, days: i64) -> Result<Vec<Category>> {
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
        let mut articles: Vec<StoredArticle> = self
            .load_articles()?
            .into_iter()
            .filter(|a| a.written_at >= cutoff)
            .collect();
        articles.sort_by(|a, b| b.written_at.cmp(&a.written_at));
        Ok(articles.into_iter().map(|a| a.event.category).collect())
    }

    /// Articles whose write date falls within `[start, end]` (ISO dates,
    /// inclusive), optionally filtered by language, oldest first.
    pub fn get_articles_in_period(
        &self,
        start: &str,
        end: &str,
        language: Option<Language>,
    ) -> Result<Vec<StoredArticle>> {
        let mut articles: Vec<StoredArticle> = self
            .load_articles()?
            .into_iter()
            .filter(|a| {
                let date = a.written_at.get(..10).unwrap_or("");
                date >= start && date <= end && language.is_none_or(|l| a.language == l)
            })
            .collect();
        articles.sort_by(|a, b| a.written_at.cmp(&b.written_at));
        Ok(articles)
    }

    /// The most recently written reflection, optionally per language.
    pub fn get_latest_reflection(
        &self,
        language: Option<Language>,
    ) -> Result<Option<StoredReflection>> {
        Ok(self
            .load_reflections()?
            .into_iter()
            .filter(|r| language.is_none_or(|l| r.language == l))
            .max_by(|a, b| a.written_at.cmp(&b.written_at)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
