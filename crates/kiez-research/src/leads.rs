//! Scouting source: broad city/date-range searches producing lead rows
//! for the scout prompt.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use kiez_core::text::truncate_chars;

use crate::tavily::{SearchClient, SearchRequest};

/// Results requested per scouting query.
const RESULTS_PER_QUERY: usize = 7;

/// Snippet length shown in the scout prompt.
const SNIPPET_MAX_CHARS: usize = 500;

/// Raw excerpt length kept on the lead.
const RAW_MAX_CHARS: usize = 1000;

/// One search hit a scout may turn into an event.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventLead {
    /// Result page title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Short snippet for the prompt.
    pub snippet: String,
    /// Longer raw excerpt.
    pub raw_snippet: String,
}

/// Fetch event leads for a city over the coming `days_ahead` days.
///
/// Runs five fixed queries (mixed English/German, mainstream and
/// underground angles) sequentially; a failed query is skipped. Results
/// are deduplicated by URL in first-seen order.
pub async fn fetch_event_leads(
    client: &dyn SearchClient,
    city: &str,
    days_ahead: u32,
) -> Vec<EventLead> {
    let tomorrow = Utc::now() + Duration::days(1);
    let end = tomorrow + Duration::days(i64::from(days_ahead));
    let date_range = format!(
        "{} to {}",
        tomorrow.format("%B %d"),
        end.format("%B %d %Y")
    );
    let month = tomorrow.format("%B %Y");

    let queries = [
        format!("{city} cultural events {date_range} concerts exhibitions theater"),
        format!("{city} what to do this week art music cinema"),
        format!("{city} upcoming events {month} gallery performance lecture"),
        format!("{city} Veranstaltungen Konzerte Ausstellung Theater {month}"),
        format!("{city} underground alternative events {date_range} club night festival"),
    ];

    let mut seen = std::collections::HashSet::new();
    let mut leads = Vec::new();
    for query in &queries {
        let results = match client.search(&SearchRequest::new(query, RESULTS_PER_QUERY)).await {
            Ok(results) => results,
            Err(e) => {
                warn!(query, error = %e, "scout query failed, skipping");
                continue;
            }
        };
        for result in results {
            if !seen.insert(result.url.clone()) {
                continue;
            }
            leads.push(EventLead {
                title: result.title,
                url: result.url,
                snippet: truncate_chars(&result.content, SNIPPET_MAX_CHARS).to_owned(),
                raw_snippet: truncate_chars(&result.content, RAW_MAX_CHARS).to_owned(),
            });
        }
    }
    debug!(leads = leads.len(), city, "scouting search done");
    leads
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
