//! Event research: concurrent query fan-out with per-query retry and
//! degrade-to-empty semantics.
//!
//! Research never fails the pipeline. A query that exhausts its retries
//! contributes an empty field; no search client at all yields a default
//! context.

use std::time::Duration;

use tracing::{error, info, warn};

use kiez_core::models::{EventCandidate, ResearchContext};

use crate::tavily::{SearchClient, SearchRequest};

/// Attempts per research query.
const QUERY_ATTEMPTS: u32 = 3;

/// Results requested per query; only the top snippets are kept.
const RESULTS_PER_QUERY: usize = 5;

/// How many snippets of a query feed the context field.
const SNIPPETS_KEPT: usize = 3;

struct FieldResult {
    text: String,
    urls: Vec<String>,
}

/// Gather background on an event across four angles: the artist, the
/// venue, the cultural scene, and related press.
///
/// All four queries run concurrently. `None` for the client (no
/// credential) returns an empty context immediately.
pub async fn research_event(
    client: Option<&dyn SearchClient>,
    event: &EventCandidate,
) -> ResearchContext {
    let Some(client) = client else {
        return ResearchContext::default();
    };

    let queries = build_queries(event);
    info!(event = %event.name, queries = queries.len(), "researching event");

    let (artist, venue, cultural, related) = futures::join!(
        search_one(client, "artist", &queries.artist),
        search_one(client, "venue", &queries.venue),
        search_one(client, "cultural", &queries.cultural),
        search_one(client, "related", &queries.related),
    );

    let mut raw_sources = Vec::new();
    for field in [&artist, &venue, &cultural, &related] {
        raw_sources.extend(field.urls.iter().filter(|u| !u.is_empty()).cloned());
    }

    ResearchContext {
        artist_background: artist.text,
        venue_context: venue.text,
        cultural_context: cultural.text,
        related_works: related.text,
        raw_sources,
    }
}

/// Run one query with bounded retries; exhaustion degrades to empty.
async fn search_one(client: &dyn SearchClient, field: &str, query: &str) -> FieldResult {
    let request = SearchRequest::new(query, RESULTS_PER_QUERY);
    for attempt in 1..=QUERY_ATTEMPTS {
        match client.search(&request).await {
            Ok(results) => {
                let text = results
                    .iter()
                    .take(SNIPPETS_KEPT)
                    .map(|r| r.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                let urls = results.into_iter().map(|r| r.url).collect();
                return FieldResult { text, urls };
            }
            Err(e) => {
                warn!(field, attempt, error = %e, "research query failed");
                if attempt < QUERY_ATTEMPTS {
                    tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                }
            }
        }
    }
    error!(field, "all research retries exhausted");
    FieldResult {
        text: String::new(),
        urls: Vec::new(),
    }
}

struct ResearchQueries {
    artist: String,
    venue: String,
    cultural: String,
    related: String,
}

impl ResearchQueries {
    /// Number of queries held (one per research angle).
    const fn len(&self) -> usize {
        4
    }
}

/// The artist name is the segment before an em-dash separator in the
/// event name, if one is present.
fn artist_name(event_name: &str) -> &str {
    event_name
        .split_once(" — ")
        .map_or(event_name, |(head, _)| head)
        .trim()
}

fn build_queries(event: &EventCandidate) -> ResearchQueries {
    let artist = artist_name(&event.name);
    ResearchQueries {
        artist: format!("{artist} artist biography background career"),
        venue: format!("{} {} venue history significance", event.venue, event.city),
        cultural: format!(
            "{artist} {} cultural context scene significance",
            event.category
        ),
        related: format!("{artist} recent work reviews press {}", event.city),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Result, SearchError};
    use crate::tavily::SearchResult;
    use async_trait::async_trait;
    use kiez_core::models::Category;

    struct ScriptedSearch {
        fail: bool,
    }

    #[async_trait]
    impl SearchClient for ScriptedSearch {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
            if self.fail {
                return Err(SearchError::Api {
                    status: 500,
                    message: "down".into(),
                });
            }
            Ok(vec![
                SearchResult {
                    title: "One".into(),
                    url: format!("https://one.example/{}", request.query.len()),
                    content: format!("snippet for: {}", request.query),
                },
                SearchResult {
                    title: "Two".into(),
                    url: String::new(),
                    content: "second snippet".into(),
                },
            ])
        }
    }

    fn event() -> EventCandidate {
        EventCandidate {
            name: "Moor Mother — Jazz Codes".into(),
            start_date: "2026-03-01".into(),
            end_date: String::new(),
            venue: "Berghain".into(),
            city: "Berlin".into(),
            category: Category::Music,
            description: "desc".into(),
            source_url: String::new(),
            event_url: String::new(),
            raw_snippet: String::new(),
        }
    }

    // ── Query building ──────────────────────────────────────────────

    #[test]
    fn artist_name_splits_on_em_dash() {
        assert_eq!(artist_name("Moor Mother — Jazz Codes"), "Moor Mother");
        assert_eq!(artist_name("Plain Title"), "Plain Title");
    }

    #[test]
    fn queries_cover_four_angles() {
        let q = build_queries(&event());
        assert!(q.artist.starts_with("Moor Mother artist biography"));
        assert!(q.venue.contains("Berghain Berlin"));
        assert!(q.cultural.contains("music cultural context"));
        assert!(q.related.contains("reviews press Berlin"));
    }

    // ── Degradation ─────────────────────────────────────────────────

    #[tokio::test]
    async fn no_client_yields_empty_context() {
        let ctx = research_event(None, &event()).await;
        assert!(ctx.is_empty());
        assert!(ctx.raw_sources.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failing_client_degrades_to_empty() {
        let client = ScriptedSearch { fail: true };
        let ctx = research_event(Some(&client), &event()).await;
        assert!(ctx.is_empty());
        assert!(ctx.raw_sources.is_empty());
    }

    #[tokio::test]
    async fn successful_research_fills_fields_and_sources() {
        let client = ScriptedSearch { fail: false };
        let ctx = research_event(Some(&client), &event()).await;
        assert!(ctx.artist_background.contains("snippet for: Moor Mother artist"));
        assert!(ctx.venue_context.contains("Berghain"));
        assert!(!ctx.cultural_context.is_empty());
        assert!(!ctx.related_works.is_empty());
        // One non-empty URL per query; empty URLs dropped.
        assert_eq!(ctx.raw_sources.len(), 4);
        assert!(ctx.raw_sources.iter().all(|u| !u.is_empty()));
    }
}
