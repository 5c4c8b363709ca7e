//! Scouting: broad web search, lead filtering, and event selection via a
//! forced tool call.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use kiez_core::models::{EventCandidate, ScoutReport};
use kiez_llm::{CompletionRequest, CompletionService, MessageParam, ToolDefinition};
use kiez_research::{EventLead, SearchClient, fetch_event_leads};
use kiez_settings::ModelSettings;
use kiez_store::RecordStore;

use crate::errors::{PipelineError, Result};

const SCOUT_MAX_TOKENS: u32 = 4096;

const SUBMIT_EVENTS_TOOL: &str = "submit_events";

#[derive(Deserialize)]
struct SubmittedEvents {
    events: Vec<EventCandidate>,
}

/// Find up to five essay-worthy events for a city.
///
/// Leads already covered by an article or already pooled are filtered
/// out before the prompt; if that filter removes everything, the
/// unfiltered set is sent instead. The selection comes back through a
/// forced `submit_events` tool call; a missing call is fatal.
pub async fn scout_events(
    llm: &dyn CompletionService,
    search: &dyn SearchClient,
    store: &RecordStore,
    models: &ModelSettings,
    city: &str,
    days_ahead: u32,
) -> Result<ScoutReport> {
    let leads = fetch_event_leads(search, city, days_ahead).await;
    if leads.is_empty() {
        return Err(PipelineError::NoLeads { city: city.into() });
    }

    let mut filtered: Vec<&EventLead> = Vec::new();
    for lead in &leads {
        if store.is_already_covered(&lead.title, "", "", None)? || store.event_exists(&lead.title)?
        {
            continue;
        }
        filtered.push(lead);
    }
    if filtered.is_empty() {
        warn!(
            candidates = leads.len(),
            "all leads already in pool, sending unfiltered"
        );
        filtered = leads.iter().collect();
    }

    let existing_names = store.get_all_event_names()?;
    let prompt = build_prompt(city, &filtered, &existing_names)?;

    info!(leads = filtered.len(), city, "sending leads to scout");
    let request = CompletionRequest::new(
        &models.scout,
        SCOUT_MAX_TOKENS,
        vec![MessageParam::user(prompt)],
    )
    .with_forced_tool(submit_events_tool());
    let response = llm.complete(&request).await?;

    let input = response.tool_input(SUBMIT_EVENTS_TOOL)?;
    let submitted: SubmittedEvents =
        serde_json::from_value(serde_json::Value::Object(input.clone()))?;

    info!(selected = submitted.events.len(), "scout selected events");
    Ok(ScoutReport {
        events: submitted.events,
        searched_at: Utc::now().to_rfc3339(),
    })
}

fn build_prompt(city: &str, leads: &[&EventLead], existing_names: &[String]) -> Result<String> {
    let existing_pool_block = if existing_names.is_empty() {
        String::new()
    } else {
        let names = existing_names
            .iter()
            .map(|n| format!("- {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "\nThese events are already in our pool — do NOT pick them again. \
Find DIFFERENT events:\n{names}\n"
        )
    };
    let leads_json = serde_json::to_string_pretty(leads)?;

    Ok(format!(
        "You are a cultural scout for a publication with the sensibility of i-D \
and Dazed magazines. Your audience is culturally literate, 20-35, interested \
in music, art, cinema, performance, club culture, and the intersection of \
subculture and mainstream. They live in {city}.

You will receive a list of raw event data scraped from the web. Your job is to:

1. Parse the raw data and identify distinct cultural events.

2. Select exactly 5 events that would each make a good subject for a \
long-form essay-review. Pick events that a Dazed editor would greenlight — \
things that have a story behind them, cultural weight, a reason to exist \
beyond entertainment.

Each event should be independently interesting. Do NOT rank them or compare \
them to each other. Just pick 5 solid candidates from different categories \
if possible.

Quality bar for inclusion:
- CULTURAL SIGNIFICANCE: Is there a real story here? A debut, a comeback, \
a collision of scenes, a political dimension, a generational moment?
- DEPTH POTENTIAL: Can a writer spend 1000 words on this without padding?
- TIMELINESS: Happening within the next 1-2 weeks. Prefer events that \
haven't happened yet.
- NON-OBVIOUSNESS: Skip the most predictable picks.

Category guidance — \"theater\" vs \"performance\":
- \"theater\" = a staged production with a script, director, and actors. \
Plays, opera, musical theater, dramatizations, premieres. Even experimental \
or devised theater is still \"theater\" if the core is a dramatic work \
performed for an audience.
- \"performance\" = performance art, dance, live art, multimedia \
installations, happenings, spoken word, body-based work. The distinction: \
theater tells a story through characters; performance uses the \
body/space/time as material.
- When in doubt between the two, prefer \"theater\".

Source credibility — prefer events found on authoritative cultural \
platforms over generic blogs or aggregators. Events from known venues and \
institutions carry more weight.

IMPORTANT:
- If an entry is clearly not a cultural event (news article, restaurant \
listing), skip it.
- If you can find fewer than 5 worthy events, return fewer. Never pad with \
weak picks.
- Do NOT include events that are clearly duplicates of each other.
- If the event has no single specific venue (e.g. \"Various locations\", \
city-wide), set venue to empty string.
{existing_pool_block}
Submit your selected events using the provided tool.

Raw event data:
{leads_json}"
    ))
}

fn submit_events_tool() -> ToolDefinition {
    ToolDefinition {
        name: SUBMIT_EVENTS_TOOL.into(),
        description: "Submit the selected cultural events".into(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "events": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "start_date": {
                                "type": "string",
                                "description": "YYYY-MM-DD or approximate"
                            },
                            "end_date": {
                                "type": "string",
                                "description": "YYYY-MM-DD, same as start for single-day, empty if unknown"
                            },
                            "venue": {
                                "type": "string",
                                "description": "Empty string if non-specific"
                            },
                            "city": {"type": "string"},
                            "category": {
                                "type": "string",
                                "enum": [
                                    "music", "cinema", "theater", "exhibition",
                                    "lecture", "festival", "performance", "club"
                                ]
                            },
                            "description": {
                                "type": "string",
                                "description": "2-3 sentence description"
                            },
                            "source_url": {"type": "string"},
                            "event_url": {
                                "type": "string",
                                "description": "Official event page, empty if not found"
                            }
                        },
                        "required": [
                            "name", "start_date", "venue", "city",
                            "category", "description", "source_url"
                        ]
                    }
                }
            },
            "required": ["events"]
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
