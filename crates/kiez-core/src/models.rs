//! Domain models for the editorial pipeline.
//!
//! Three entity kinds are persisted (events, articles, reflections), each
//! with a candidate/output form produced by the agents and a stored form
//! written by the record store. Timestamps are RFC 3339 strings so records
//! stay human-readable on disk and sort lexicographically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{ArticleId, EventId, ReflectionId};

// ─────────────────────────────────────────────────────────────────────────────
// Category
// ─────────────────────────────────────────────────────────────────────────────

/// Editorial category of a cultural event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Concerts, gigs, album release shows.
    Music,
    /// Screenings, retrospectives, premieres.
    Cinema,
    /// Staged productions with a script, director, and actors.
    Theater,
    /// Gallery and museum shows.
    Exhibition,
    /// Talks, panels, readings.
    Lecture,
    /// Multi-day programmed events.
    Festival,
    /// Performance art, dance, live art, happenings.
    Performance,
    /// Club nights and residencies.
    Club,
}

impl Category {
    /// All categories, in canonical order.
    pub const ALL: [Category; 8] = [
        Category::Music,
        Category::Cinema,
        Category::Theater,
        Category::Exhibition,
        Category::Lecture,
        Category::Festival,
        Category::Performance,
        Category::Club,
    ];

    /// Lowercase wire form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Music => "music",
            Category::Cinema => "cinema",
            Category::Theater => "theater",
            Category::Exhibition => "exhibition",
            Category::Lecture => "lecture",
            Category::Festival => "festival",
            Category::Performance => "performance",
            Category::Club => "club",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Language
// ─────────────────────────────────────────────────────────────────────────────

/// Publication language of an article or reflection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English.
    #[serde(rename = "en")]
    En,
    /// German.
    #[serde(rename = "de")]
    De,
    /// Russian.
    #[serde(rename = "ru")]
    Ru,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 3] = [Language::En, Language::De, Language::Ru];

    /// Two-letter wire form.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
            Language::Ru => "ru",
        }
    }

    /// English name for use inside prompts.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::De => "German",
            Language::Ru => "Russian",
        }
    }

    /// Parse a language code, silently falling back to English for
    /// anything unsupported.
    #[must_use]
    pub fn from_code_lossy(code: &str) -> Language {
        Language::ALL
            .into_iter()
            .find(|l| l.code() == code)
            .unwrap_or(Language::En)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.code() == s)
            .ok_or_else(|| format!("unknown language: {s}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// A discovered cultural happening, as selected by the scout.
///
/// `name`, `venue`, `category`, and `description` are required; every
/// other field defaults to empty. Dates are ISO 8601 (`YYYY-MM-DD`)
/// strings where an empty string means "unknown"; an empty `venue` means
/// "no fixed venue".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventCandidate {
    /// Event name.
    pub name: String,
    /// Start date, ISO 8601 or empty.
    #[serde(default)]
    pub start_date: String,
    /// End date, ISO 8601 or empty.
    #[serde(default)]
    pub end_date: String,
    /// Venue, empty when the event has no single location.
    pub venue: String,
    /// City.
    #[serde(default)]
    pub city: String,
    /// Editorial category.
    pub category: Category,
    /// Short description.
    pub description: String,
    /// URL of the page the event was discovered on.
    #[serde(default)]
    pub source_url: String,
    /// Official event page, empty if not found.
    #[serde(default)]
    pub event_url: String,
    /// Search-engine excerpt; not persisted.
    #[serde(default, skip_serializing)]
    pub raw_snippet: String,
}

/// Stored form of an [`EventCandidate`]: immutable once written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Stable record identifier.
    pub id: EventId,
    /// Event name.
    pub name: String,
    /// Start date, ISO 8601 or empty.
    #[serde(default)]
    pub start_date: String,
    /// End date, ISO 8601 or empty.
    #[serde(default)]
    pub end_date: String,
    /// Venue, possibly empty.
    pub venue: String,
    /// City.
    #[serde(default)]
    pub city: String,
    /// Editorial category.
    pub category: Category,
    /// Short description.
    pub description: String,
    /// Discovery URL.
    #[serde(default)]
    pub source_url: String,
    /// Official event page.
    #[serde(default)]
    pub event_url: String,
    /// When the event entered the pool (RFC 3339).
    pub scouted_at: String,
}

impl StoredEvent {
    /// Convert back into the candidate form consumed by the pipeline.
    #[must_use]
    pub fn to_candidate(&self) -> EventCandidate {
        EventCandidate {
            name: self.name.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            venue: self.venue.clone(),
            city: self.city.clone(),
            category: self.category,
            description: self.description.clone(),
            source_url: self.source_url.clone(),
            event_url: self.event_url.clone(),
            raw_snippet: String::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Research
// ─────────────────────────────────────────────────────────────────────────────

/// Ephemeral enrichment bundle produced by the research aggregator.
///
/// Not persisted, except truncated inside a [`PipelineTrace`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchContext {
    /// Background on the artist or creator.
    #[serde(default)]
    pub artist_background: String,
    /// History and significance of the venue.
    #[serde(default)]
    pub venue_context: String,
    /// Scene and cultural context.
    #[serde(default)]
    pub cultural_context: String,
    /// Related works and press.
    #[serde(default)]
    pub related_works: String,
    /// All source URLs across queries, empties dropped.
    #[serde(default)]
    pub raw_sources: Vec<String>,
}

impl ResearchContext {
    /// True when no text field carries any content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artist_background.is_empty()
            && self.venue_context.is_empty()
            && self.cultural_context.is_empty()
            && self.related_works.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Critique & trace
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of problem the critic flagged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Factual claim not supported by the source material.
    Factual,
    /// Voice or register drift.
    Voice,
    /// Structural problem (pacing, ordering).
    Structure,
    /// Grammar or language-mix problem.
    Language,
    /// Insufficient depth, padding.
    Depth,
}

/// How serious a critique issue is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Cosmetic.
    Minor,
    /// Worth fixing.
    Major,
    /// Blocks publication.
    Critical,
}

/// One issue raised by the critique step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CritiqueIssue {
    /// Issue kind.
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// Severity.
    pub severity: IssueSeverity,
    /// Where in the draft the issue sits.
    #[serde(default)]
    pub location: String,
    /// Suggested fix.
    #[serde(default)]
    pub fix: String,
}

/// Record of how one article's generation pipeline behaved.
///
/// Used only for later analytics; never required for correctness of the
/// article itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineTrace {
    /// The raw draft text.
    pub draft: String,
    /// Whitespace-token count of the draft.
    pub draft_word_count: usize,
    /// Critic's overall assessment.
    #[serde(default)]
    pub assessment: String,
    /// Issues the critic raised.
    #[serde(default)]
    pub issues: Vec<CritiqueIssue>,
    /// The text adopted after critique.
    pub revised: String,
    /// Whether revision actually changed the draft.
    pub revision_changed: bool,
    /// Number of research source URLs consumed.
    pub research_sources_used: usize,
    /// Research context (truncated at the persistence boundary).
    #[serde(default)]
    pub research_context: ResearchContext,
    /// Whether the length-guard expansion pass ran.
    pub expanded: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Articles
// ─────────────────────────────────────────────────────────────────────────────

/// A finished article as produced by the author pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArticleOutput {
    /// Headline.
    pub title: String,
    /// Lede paragraph for cards and previews.
    #[serde(default)]
    pub lead: String,
    /// Body text.
    pub body: String,
    /// Language the article is written in.
    pub language: Language,
    /// Whitespace-token count of the body.
    pub word_count: usize,
    /// Model that wrote the body.
    pub model_used: String,
    /// Generation timestamp (RFC 3339).
    pub written_at: String,
    /// Pipeline trace, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<PipelineTrace>,
}

/// Stored form of an article.
///
/// Embeds a denormalized snapshot of the owning event so historical
/// articles remain self-describing even if the event schema evolves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    /// Stable record identifier.
    pub id: ArticleId,
    /// The event this article covers.
    pub event_id: EventId,
    /// Headline.
    pub title: String,
    /// Unique URL-safe slug.
    pub slug: String,
    /// Lede paragraph.
    #[serde(default)]
    pub lead: String,
    /// Body text.
    pub body: String,
    /// Language.
    pub language: Language,
    /// Whitespace-token count of the body.
    pub word_count: usize,
    /// Model that wrote the body.
    pub model_used: String,
    /// When the article was saved (RFC 3339).
    pub written_at: String,
    /// Denormalized snapshot of the owning event.
    pub event: StoredEvent,
}

// ─────────────────────────────────────────────────────────────────────────────
// Reflections
// ─────────────────────────────────────────────────────────────────────────────

/// Aggregate statistics over the articles of one reflection period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectionAnalysis {
    /// Articles written in the period.
    pub article_count: usize,
    /// Sum of article word counts.
    pub total_words: usize,
    /// Rounded average words per article.
    pub avg_words: usize,
    /// Category distribution, most common first.
    pub categories: Vec<(Category, usize)>,
    /// Top venues (at most ten), most common first.
    pub venues: Vec<(String, usize)>,
}

/// A periodic self-analysis essay over a trailing article window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReflectionOutput {
    /// Headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Language.
    pub language: Language,
    /// Period start date (ISO 8601).
    pub period_start: String,
    /// Period end date (ISO 8601).
    pub period_end: String,
    /// Aggregate statistics for the period.
    pub analysis: ReflectionAnalysis,
    /// Whitespace-token count of the body.
    pub word_count: usize,
    /// Model that wrote the body.
    pub model_used: String,
    /// Generation timestamp (RFC 3339).
    pub written_at: String,
}

/// Stored form of a reflection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredReflection {
    /// Stable record identifier.
    pub id: ReflectionId,
    /// Headline.
    pub title: String,
    /// Unique URL-safe slug.
    pub slug: String,
    /// Body text.
    pub body: String,
    /// Language.
    pub language: Language,
    /// Period start date.
    pub period_start: String,
    /// Period end date.
    pub period_end: String,
    /// Aggregate statistics.
    pub analysis: ReflectionAnalysis,
    /// Whitespace-token count of the body.
    pub word_count: usize,
    /// Model that wrote the body.
    pub model_used: String,
    /// When the reflection was saved (RFC 3339).
    pub written_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent results
// ─────────────────────────────────────────────────────────────────────────────

/// Result of one scouting run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoutReport {
    /// Events the scout selected.
    pub events: Vec<EventCandidate>,
    /// When the search ran (RFC 3339).
    pub searched_at: String,
}

/// Result of one curation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CuratorChoice {
    /// The chosen event.
    pub chosen_event_id: EventId,
    /// 2–3 sentences of rationale.
    pub why_chosen: String,
    /// When the choice was made (RFC 3339).
    pub curated_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> EventCandidate {
        EventCandidate {
            name: "Test Concert".into(),
            start_date: "2026-01-10".into(),
            end_date: String::new(),
            venue: "Club X".into(),
            city: "Berlin".into(),
            category: Category::Music,
            description: "A night of live modular sets.".into(),
            source_url: "https://example.com/listing".into(),
            event_url: String::new(),
            raw_snippet: "not for disk".into(),
        }
    }

    // ── Category / Language ─────────────────────────────────────────

    #[test]
    fn category_serde_is_lowercase() {
        let json = serde_json::to_string(&Category::Exhibition).unwrap();
        assert_eq!(json, "\"exhibition\"");
        let back: Category = serde_json::from_str("\"club\"").unwrap();
        assert_eq!(back, Category::Club);
    }

    #[test]
    fn category_from_str_rejects_unknown() {
        assert!("sports".parse::<Category>().is_err());
        assert_eq!("theater".parse::<Category>().unwrap(), Category::Theater);
    }

    #[test]
    fn language_codes_roundtrip() {
        for lang in Language::ALL {
            let json = serde_json::to_string(&lang).unwrap();
            let back: Language = serde_json::from_str(&json).unwrap();
            assert_eq!(back, lang);
        }
    }

    #[test]
    fn language_lossy_falls_back_to_english() {
        assert_eq!(Language::from_code_lossy("de"), Language::De);
        assert_eq!(Language::from_code_lossy("fr"), Language::En);
        assert_eq!(Language::from_code_lossy(""), Language::En);
    }

    // ── Candidates / stored events ──────────────────────────────────

    #[test]
    fn raw_snippet_is_not_serialized() {
        let json = serde_json::to_value(candidate()).unwrap();
        assert!(json.get("raw_snippet").is_none());
        assert_eq!(json["name"], "Test Concert");
    }

    #[test]
    fn candidate_optional_fields_default() {
        let json = r#"{
            "name": "Quiet Show",
            "venue": "",
            "category": "exhibition",
            "description": "Small group show."
        }"#;
        let c: EventCandidate = serde_json::from_str(json).unwrap();
        assert!(c.start_date.is_empty());
        assert!(c.city.is_empty());
        assert!(c.raw_snippet.is_empty());
    }

    #[test]
    fn stored_event_to_candidate_drops_snippet() {
        let ev = StoredEvent {
            id: EventId::from("e1"),
            name: "Test Concert".into(),
            start_date: "2026-01-10".into(),
            end_date: String::new(),
            venue: "Club X".into(),
            city: "Berlin".into(),
            category: Category::Music,
            description: "desc".into(),
            source_url: String::new(),
            event_url: String::new(),
            scouted_at: "2026-01-01T00:00:00Z".into(),
        };
        let c = ev.to_candidate();
        assert_eq!(c.name, "Test Concert");
        assert!(c.raw_snippet.is_empty());
    }

    // ── Research context ────────────────────────────────────────────

    #[test]
    fn research_context_default_is_empty() {
        let ctx = ResearchContext::default();
        assert!(ctx.is_empty());
        assert!(ctx.raw_sources.is_empty());
    }

    #[test]
    fn research_context_with_any_field_is_not_empty() {
        let ctx = ResearchContext {
            venue_context: "opened in 2004".into(),
            ..ResearchContext::default()
        };
        assert!(!ctx.is_empty());
    }

    // ── Critique issues ─────────────────────────────────────────────

    #[test]
    fn critique_issue_serde_tags() {
        let json = r#"{
            "type": "factual",
            "severity": "critical",
            "location": "paragraph 2",
            "fix": "verify the opening year"
        }"#;
        let issue: CritiqueIssue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.issue_type, IssueType::Factual);
        assert_eq!(issue.severity, IssueSeverity::Critical);
    }

    #[test]
    fn critique_issue_location_and_fix_default() {
        let json = r#"{"type": "voice", "severity": "minor"}"#;
        let issue: CritiqueIssue = serde_json::from_str(json).unwrap();
        assert!(issue.location.is_empty());
        assert!(issue.fix.is_empty());
    }

    // ── Articles ────────────────────────────────────────────────────

    #[test]
    fn article_output_trace_omitted_when_none() {
        let out = ArticleOutput {
            title: "T".into(),
            lead: String::new(),
            body: "b".into(),
            language: Language::En,
            word_count: 1,
            model_used: "m".into(),
            written_at: "2026-01-01T00:00:00Z".into(),
            trace: None,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("trace").is_none());
    }
}
