//! Record store: directory layout, atomic writes, and collection scans.
//!
//! Layout under the data directory:
//!
//! ```text
//! data/
//!   events/<event-id>.json
//!   articles/<slug>.json
//!   articles/<slug>.trace.json   (best-effort sibling)
//!   reflections/<slug>.json
//! ```

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::warn;

use kiez_core::ids::{ArticleId, EventId, ReflectionId};
use kiez_core::models::{
    ArticleOutput, PipelineTrace, ReflectionOutput, StoredArticle, StoredEvent, StoredReflection,
};
use kiez_core::slug::{slugify, unique_slug};
use kiez_core::text::truncate_chars;

use crate::errors::{Result, StoreError};

/// How many characters of each research-context field a persisted trace
/// keeps. A storage-size concern only; the in-memory context that drove
/// generation is never touched.
const TRACE_CONTEXT_MAX_CHARS: usize = 500;

/// File-backed store for the three record collections.
#[derive(Debug)]
pub struct RecordStore {
    events_dir: PathBuf,
    articles_dir: PathBuf,
    reflections_dir: PathBuf,
}

impl RecordStore {
    /// Open (creating if needed) the store under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let store = Self {
            events_dir: data_dir.join("events"),
            articles_dir: data_dir.join("articles"),
            reflections_dir: data_dir.join("reflections"),
        };
        for dir in [&store.events_dir, &store.articles_dir, &store.reflections_dir] {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        Ok(store)
    }

    // ── Atomic write ────────────────────────────────────────────────

    /// Write one record atomically: serialize, write to a temp file in
    /// the destination directory, then rename over the final path. A
    /// crash mid-write never leaves a partial record visible to readers.
    fn write_json<T: Serialize>(dir: &Path, name: &str, record: &T) -> Result<()> {
        let path = dir.join(name);
        let json = serde_json::to_string_pretty(record)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| StoreError::io(&path, e))?;
        let _ = tmp.persist(&path)?;
        Ok(())
    }

    // ── Collection scans ────────────────────────────────────────────

    fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let data = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&data).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn scan_dir<T: DeserializeOwned>(dir: &Path, skip_traces: bool) -> Result<Vec<T>> {
        let mut records = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(dir, e))?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.ends_with(".json") {
                continue;
            }
            if skip_traces && name.ends_with(".trace.json") {
                continue;
            }
            records.push(Self::read_record(&path)?);
        }
        Ok(records)
    }

    /// Load every event in the pool.
    pub fn load_events(&self) -> Result<Vec<StoredEvent>> {
        Self::scan_dir(&self.events_dir, false)
    }

    /// Load every article.
    pub fn load_articles(&self) -> Result<Vec<StoredArticle>> {
        Self::scan_dir(&self.articles_dir, true)
    }

    /// Load every reflection.
    pub fn load_reflections(&self) -> Result<Vec<StoredReflection>> {
        Self::scan_dir(&self.reflections_dir, false)
    }

    // ── Direct lookups ──────────────────────────────────────────────

    /// Fetch one event by id, `None` if no such record exists.
    pub fn get_event(&self, id: &EventId) -> Result<Option<StoredEvent>> {
        let path = self.events_dir.join(format!("{id}.json"));
        if !path.exists() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    /// Fetch the trace saved next to an article, if any.
    pub fn get_trace(&self, slug: &str) -> Result<Option<PipelineTrace>> {
        let path = self.articles_dir.join(format!("{slug}.trace.json"));
        if !path.exists() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    // ── Saves ───────────────────────────────────────────────────────

    /// Persist a new event record with a fresh id and timestamp.
    ///
    /// Dedup lives one level up, in [`RecordStore::save_event`]; this is
    /// the unconditional insert.
    pub(crate) fn insert_event(&self, event: StoredEvent) -> Result<EventId> {
        Self::write_json(&self.events_dir, &format!("{}.json", event.id), &event)?;
        Ok(event.id)
    }

    /// Persist a finished article, keyed to its event.
    ///
    /// Computes a unique slug from the title (falling back to an id-based
    /// slug for unsluggable titles), embeds the owning event snapshot, and
    /// writes the trace best-effort as a sibling record with its research
    /// context truncated at this serialization boundary only.
    pub fn save_article(
        &self,
        event_id: &EventId,
        article: &ArticleOutput,
    ) -> Result<(ArticleId, String)> {
        let event = self
            .get_event(event_id)?
            .ok_or_else(|| StoreError::MissingEvent {
                id: event_id.to_string(),
            })?;

        let article_id = ArticleId::new();
        let slug = unique_slug(
            &slugify(&article.title),
            "article",
            article_id.as_str(),
            &self.existing_slugs(&self.articles_dir)?,
        );

        let record = StoredArticle {
            id: article_id.clone(),
            event_id: event_id.clone(),
            title: article.title.clone(),
            slug: slug.clone(),
            lead: article.lead.clone(),
            body: article.body.clone(),
            language: article.language,
            word_count: article.word_count,
            model_used: article.model_used.clone(),
            written_at: Utc::now().to_rfc3339(),
            event,
        };
        Self::write_json(&self.articles_dir, &format!("{slug}.json"), &record)?;

        if let Some(trace) = &article.trace {
            let name = format!("{slug}.trace.json");
            if let Err(e) = Self::write_json(&self.articles_dir, &name, &truncate_trace(trace)) {
                warn!(slug, error = %e, "failed to persist pipeline trace");
            }
        }

        Ok((article_id, slug))
    }

    /// Persist a reflection with a fresh id and a unique slug.
    pub fn save_reflection(
        &self,
        reflection: &ReflectionOutput,
    ) -> Result<(ReflectionId, String)> {
        let reflection_id = ReflectionId::new();
        let slug = unique_slug(
            &slugify(&reflection.title),
            "reflection",
            reflection_id.as_str(),
            &self.existing_slugs(&self.reflections_dir)?,
        );

        let record = StoredReflection {
            id: reflection_id.clone(),
            title: reflection.title.clone(),
            slug: slug.clone(),
            body: reflection.body.clone(),
            language: reflection.language,
            period_start: reflection.period_start.clone(),
            period_end: reflection.period_end.clone(),
            analysis: reflection.analysis.clone(),
            word_count: reflection.word_count,
            model_used: reflection.model_used.clone(),
            written_at: Utc::now().to_rfc3339(),
        };
        Self::write_json(&self.reflections_dir, &format!("{slug}.json"), &record)?;
        Ok((reflection_id, slug))
    }

    /// Stems of every `*.json` file in a collection directory.
    fn existing_slugs(&self, dir: &Path) -> Result<HashSet<String>> {
        let mut slugs = HashSet::new();
        let entries = std::fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".json") {
                let _ = slugs.insert(stem.to_owned());
            }
        }
        Ok(slugs)
    }
}

/// Clone a trace with its research-context fields truncated for storage.
fn truncate_trace(trace: &PipelineTrace) -> PipelineTrace {
    let mut out = trace.clone();
    let ctx = &mut out.research_context;
    for field in [
        &mut ctx.artist_background,
        &mut ctx.venue_context,
        &mut ctx.cultural_context,
        &mut ctx.related_works,
    ] {
        *field = truncate_chars(field, TRACE_CONTEXT_MAX_CHARS).to_owned();
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use kiez_core::models::{Category, Language, ResearchContext};
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> RecordStore {
        RecordStore::open(dir.path()).unwrap()
    }

    fn article(title: &str) -> ArticleOutput {
        ArticleOutput {
            title: title.into(),
            lead: "Lede.".into(),
            body: "Body of the essay goes here.".into(),
            language: Language::En,
            word_count: 6,
            model_used: "test-model".into(),
            written_at: Utc::now().to_rfc3339(),
            trace: None,
        }
    }

    fn seed_event(store: &RecordStore) -> EventId {
        store
            .insert_event(StoredEvent {
                id: EventId::new(),
                name: "Test Concert".into(),
                start_date: "2026-01-10".into(),
                end_date: String::new(),
                venue: "Club X".into(),
                city: "Berlin".into(),
                category: Category::Music,
                description: "desc".into(),
                source_url: String::new(),
                event_url: String::new(),
                scouted_at: Utc::now().to_rfc3339(),
            })
            .unwrap()
    }

    #[test]
    fn open_creates_collection_dirs() {
        let dir = TempDir::new().unwrap();
        let _ = open_store(&dir);
        assert!(dir.path().join("events").is_dir());
        assert!(dir.path().join("articles").is_dir());
        assert!(dir.path().join("reflections").is_dir());
    }

    #[test]
    fn insert_and_get_event_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let id = seed_event(&store);
        let loaded = store.get_event(&id).unwrap().unwrap();
        assert_eq!(loaded.name, "Test Concert");
        assert_eq!(loaded.category, Category::Music);
    }

    #[test]
    fn get_event_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(store.get_event(&EventId::from("nope")).unwrap().is_none());
    }

    #[test]
    fn malformed_record_fails_the_scan() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let _ = seed_event(&store);
        std::fs::write(dir.path().join("events").join("broken.json"), "{oops").unwrap();

        let err = store.load_events().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }), "got {err}");
    }

    #[test]
    fn non_json_files_are_ignored_by_scans() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let _ = seed_event(&store);
        std::fs::write(dir.path().join("events").join("notes.txt"), "hello").unwrap();
        assert_eq!(store.load_events().unwrap().len(), 1);
    }

    #[test]
    fn save_article_embeds_event_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let event_id = seed_event(&store);

        let (_, slug) = store.save_article(&event_id, &article("A Good Night")).unwrap();
        assert_eq!(slug, "a-good-night");

        let articles = store.load_articles().unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].event.name, "Test Concert");
        assert_eq!(articles[0].event_id, event_id);
    }

    #[test]
    fn save_article_unknown_event_fails() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let err = store
            .save_article(&EventId::from("ghost"), &article("T"))
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingEvent { .. }), "got {err}");
    }

    #[test]
    fn slug_collision_gets_counter() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let event_id = seed_event(&store);

        let (_, first) = store.save_article(&event_id, &article("Same Title")).unwrap();
        let (_, second) = store.save_article(&event_id, &article("Same Title")).unwrap();
        assert_eq!(first, "same-title");
        assert_eq!(second, "same-title-2");
    }

    #[test]
    fn unsluggable_title_falls_back_to_id() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let event_id = seed_event(&store);

        let (id, slug) = store.save_article(&event_id, &article("!!!")).unwrap();
        assert_eq!(slug, format!("article-{id}"));
    }

    #[test]
    fn trace_is_saved_truncated_as_sibling() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let event_id = seed_event(&store);

        let mut out = article("Traced");
        out.trace = Some(PipelineTrace {
            draft: "draft text".into(),
            draft_word_count: 2,
            revised: "draft text".into(),
            research_context: ResearchContext {
                artist_background: "x".repeat(900),
                ..ResearchContext::default()
            },
            ..PipelineTrace::default()
        });

        let (_, slug) = store.save_article(&event_id, &out).unwrap();
        let trace = store.get_trace(&slug).unwrap().unwrap();
        assert_eq!(trace.research_context.artist_background.chars().count(), 500);
        // The article scan must not pick the trace file up.
        assert_eq!(store.load_articles().unwrap().len(), 1);
    }

    #[test]
    fn save_reflection_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let reflection = ReflectionOutput {
            title: "Week One".into(),
            body: "We wrote things.".into(),
            language: Language::En,
            period_start: "2026-01-01".into(),
            period_end: "2026-01-08".into(),
            analysis: Default::default(),
            word_count: 3,
            model_used: "test-model".into(),
            written_at: Utc::now().to_rfc3339(),
        };
        let (_, slug) = store.save_reflection(&reflection).unwrap();
        assert_eq!(slug, "week-one");
        assert_eq!(store.load_reflections().unwrap().len(), 1);
    }
}
