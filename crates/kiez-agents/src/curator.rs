//! Curation: pick the one pooled event most worth an essay today.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use kiez_core::ids::EventId;
use kiez_core::models::{CuratorChoice, Language, StoredEvent};
use kiez_llm::{CompletionRequest, CompletionService, MessageParam, ToolDefinition};
use kiez_settings::ModelSettings;
use kiez_store::RecordStore;

use crate::errors::{PipelineError, Result};

const CURATOR_MAX_TOKENS: u32 = 1024;

const CHOOSE_EVENT_TOOL: &str = "choose_event";

#[derive(Deserialize)]
struct ChosenEvent {
    event_id: String,
    #[serde(default)]
    why_chosen: String,
}

/// Choose the single best available event for today's essay.
///
/// Recent categories (trailing week) are injected into the prompt as a
/// diversity bias. The chosen id must resolve to a pooled event.
pub async fn curate_event(
    llm: &dyn CompletionService,
    store: &RecordStore,
    models: &ModelSettings,
    city: &str,
    language: Option<Language>,
) -> Result<CuratorChoice> {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let available = store.get_available_events(&today, language)?;
    if available.is_empty() {
        return Err(PipelineError::NoAvailableEvents);
    }

    let recent = store.get_recent_categories(7)?;
    let recent_str = if recent.is_empty() {
        "none yet".to_string()
    } else {
        recent
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let prompt = build_prompt(city, &today, &recent_str, &available)?;
    info!(available = available.len(), city, "curating event");

    let request = CompletionRequest::new(
        &models.curator,
        CURATOR_MAX_TOKENS,
        vec![MessageParam::user(prompt)],
    )
    .with_forced_tool(choose_event_tool());
    let response = llm.complete(&request).await?;

    let input = response.tool_input(CHOOSE_EVENT_TOOL)?;
    let chosen: ChosenEvent = serde_json::from_value(serde_json::Value::Object(input.clone()))?;

    let event_id = EventId::from_string(chosen.event_id);
    if store.get_event(&event_id)?.is_none() {
        return Err(PipelineError::UnknownEvent {
            id: event_id.into_inner(),
        });
    }

    info!(id = %event_id, "curator chose event");
    Ok(CuratorChoice {
        chosen_event_id: event_id,
        why_chosen: chosen.why_chosen,
        curated_at: Utc::now().to_rfc3339(),
    })
}

fn build_prompt(
    city: &str,
    today: &str,
    recent_categories: &str,
    available: &[StoredEvent],
) -> Result<String> {
    let events: Vec<serde_json::Value> = available
        .iter()
        .map(|e| {
            json!({
                "id": e.id.as_str(),
                "name": e.name,
                "start_date": e.start_date,
                "end_date": e.end_date,
                "venue": e.venue,
                "city": e.city,
                "category": e.category,
                "description": e.description,
            })
        })
        .collect();
    let events_json = serde_json::to_string_pretty(&events)?;

    Ok(format!(
        "You are a cultural curator for a publication with the editorial \
sensibility of i-D and Dazed magazines. Your audience is culturally \
literate, 20-35, living in {city}.

Today is {today}. You have a pool of upcoming cultural events that haven't \
been written about yet. Your job is to pick THE ONE event that deserves an \
essay today.

The recent categories we've already covered: [{recent_categories}]. \
Try to pick something different if possible, but never sacrifice quality \
for diversity.

Selection criteria (ranked by importance):

1. CULTURAL SIGNIFICANCE: Is there a real story here? A debut, a comeback, \
a collision of scenes, a political dimension, a generational moment? The \
event should have DEPTH — something a writer can spend 1000 words exploring \
without padding.

2. TIMELINESS: Events happening sooner should generally be preferred. An \
event next week beats one in two weeks, all else being equal. But a truly \
remarkable event in two weeks beats a mediocre one tomorrow.

3. NON-OBVIOUSNESS: The sweet spot between obscure and mainstream. A \
residency by an interesting DJ at a small club beats a stadium concert by \
a megastar.

4. ESSAY POTENTIAL: Think about what the essay would actually contain. Is \
there enough material (artist history, venue context, genre evolution, \
scene dynamics, cultural moment) to build a compelling narrative?

5. DIVERSITY: Vary the categories. If we've done music three days in a \
row, pick something else if the quality is comparable.

Submit your choice using the provided tool.

Available events:
{events_json}"
    ))
}

fn choose_event_tool() -> ToolDefinition {
    ToolDefinition {
        name: CHOOSE_EVENT_TOOL.into(),
        description: "Submit the chosen event".into(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "event_id": {
                    "type": "string",
                    "description": "The id of the chosen event"
                },
                "why_chosen": {
                    "type": "string",
                    "description": "2-3 sentences explaining why this is the best pick for today's essay. Be specific."
                }
            },
            "required": ["event_id", "why_chosen"]
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedLlm, tool_response};
    use kiez_core::models::{Category, EventCandidate};
    use tempfile::TempDir;

    fn seed(store: &RecordStore, name: &str) -> EventId {
        store
            .save_event(&EventCandidate {
                name: name.into(),
                start_date: "2099-01-01".into(),
                end_date: String::new(),
                venue: "V".into(),
                city: "Berlin".into(),
                category: Category::Music,
                description: "d".into(),
                source_url: String::new(),
                event_url: String::new(),
                raw_snippet: String::new(),
            })
            .unwrap()
            .id()
            .clone()
    }

    #[tokio::test]
    async fn empty_pool_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let llm = ScriptedLlm::new(vec![]);

        let err = curate_event(&llm, &store, &ModelSettings::default(), "Berlin", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoAvailableEvents));
    }

    #[tokio::test]
    async fn curator_returns_choice_for_known_event() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let id = seed(&store, "Interesting Gig");

        let llm = ScriptedLlm::new(vec![Ok(tool_response(
            CHOOSE_EVENT_TOOL,
            json!({"event_id": id.as_str(), "why_chosen": "It has a real story."}),
        ))]);

        let choice = curate_event(&llm, &store, &ModelSettings::default(), "Berlin", None)
            .await
            .unwrap();
        assert_eq!(choice.chosen_event_id, id);
        assert_eq!(choice.why_chosen, "It has a real story.");

        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.contains("Interesting Gig"));
        assert!(prompt.contains("none yet"));
    }

    #[tokio::test]
    async fn unknown_chosen_id_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let _ = seed(&store, "Real Event");

        let llm = ScriptedLlm::new(vec![Ok(tool_response(
            CHOOSE_EVENT_TOOL,
            json!({"event_id": "made-up-id", "why_chosen": "hallucinated"}),
        ))]);

        let err = curate_event(&llm, &store, &ModelSettings::default(), "Berlin", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownEvent { id } if id == "made-up-id"));
    }

    #[tokio::test]
    async fn recent_categories_appear_in_prompt() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let covered = seed(&store, "Covered Gig");
        let _ = seed(&store, "Fresh Gig");
        let article = kiez_core::models::ArticleOutput {
            title: "T".into(),
            lead: String::new(),
            body: "b".into(),
            language: Language::En,
            word_count: 1,
            model_used: "test-model".into(),
            written_at: Utc::now().to_rfc3339(),
            trace: None,
        };
        let _ = store.save_article(&covered, &article).unwrap();

        let fresh_id = store
            .get_available_events("2026-01-01", None)
            .unwrap()
            .first()
            .unwrap()
            .id
            .clone();
        let llm = ScriptedLlm::new(vec![Ok(tool_response(
            CHOOSE_EVENT_TOOL,
            json!({"event_id": fresh_id.as_str(), "why_chosen": "fresh"}),
        ))]);

        let _ = curate_event(&llm, &store, &ModelSettings::default(), "Berlin", None)
            .await
            .unwrap();
        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.contains("[music]"));
        // The covered event is no longer offered.
        assert!(!prompt.contains("Covered Gig"));
    }
}
