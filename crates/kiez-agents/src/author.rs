//! The article generation pipeline: draft, critique-and-revise, length
//! guard, title and lede synthesis, trace capture.
//!
//! The pipeline is a strictly linear state machine. Only the draft and
//! the late synthesis calls can fail it; the critique stage always
//! degrades to the draft, so a publishable article comes out of every
//! run that produced a draft at all.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use kiez_core::models::{
    ArticleOutput, CritiqueIssue, EventCandidate, Language, PipelineTrace, ResearchContext,
};
use kiez_core::text::{strip_quotes, truncate_chars, word_count};
use kiez_llm::{CompletionRequest, CompletionService, MessageParam, ToolDefinition};
use kiez_settings::ModelSettings;

use crate::errors::Result;
use crate::prompts::{CRITIC_SYSTEM, TITLE_SYSTEM, author_system, lede_system};

const DRAFT_MAX_TOKENS: u32 = 4096;
const CRITIQUE_MAX_TOKENS: u32 = 8192;
const LEDE_MAX_TOKENS: u32 = 512;
const TITLE_MAX_TOKENS: u32 = 128;

/// Bodies under this many words trigger one expansion pass.
const MIN_BODY_WORDS: usize = 400;

/// Revised texts under this many characters (raw, before any stripping)
/// are treated as a failed critique.
const MIN_REVISED_CHARS: usize = 200;

/// Event and research fields are truncated to this many characters in
/// the critique prompt.
const CRITIQUE_FIELD_MAX_CHARS: usize = 1000;

const SUBMIT_CRITIQUE_TOOL: &str = "submit_critique";

/// Write a complete article about an event.
///
/// Research is supplied by the caller (possibly empty) so one research
/// pass can feed several language runs.
pub async fn write_article(
    llm: &dyn CompletionService,
    event: &EventCandidate,
    research: &ResearchContext,
    language: Language,
    models: &ModelSettings,
) -> Result<ArticleOutput> {
    let system = author_system(language);
    let user_message = build_user_message(event, research);

    // 1. Draft. The transport already retried; failure here is fatal.
    let draft_request = CompletionRequest::new(
        &models.author,
        DRAFT_MAX_TOKENS,
        vec![MessageParam::user(&user_message)],
    )
    .with_system(&system);
    let draft = llm.complete(&draft_request).await?.first_text()?.to_owned();
    let draft_word_count = word_count(&draft);
    info!(words = draft_word_count, lang = %language, "draft complete");

    // 2. Critique-and-revise. Never fatal.
    let critique = run_critique(llm, &models.critic, event, research, &draft).await;
    let revision_changed = critique.body != draft;
    let mut body = critique.body;

    // 3. Title, synthesized when the critique did not provide one.
    let title = if critique.title.is_empty() {
        synthesize_title(llm, &models.lede, language, &body).await?
    } else {
        critique.title
    };

    // 4. Length guard: one expansion pass, output adopted without
    //    re-checking.
    let revised = body.clone();
    let mut expanded = false;
    if word_count(&body) < MIN_BODY_WORDS {
        info!(words = word_count(&body), "body too short, expanding");
        let expand_request = CompletionRequest::new(
            &models.author,
            DRAFT_MAX_TOKENS,
            vec![
                MessageParam::user(&user_message),
                MessageParam::assistant(&draft),
                MessageParam::user(
                    "The essay is too short. Please expand it to 800-1200 words \
while maintaining the same voice and quality. Don't pad — add more depth, \
more context, more specific details.",
                ),
            ],
        )
        .with_system(&system);
        body = llm
            .complete(&expand_request)
            .await?
            .first_text()?
            .to_owned();
        expanded = true;
    }

    // 5. Lede.
    let lead = generate_lede(llm, &models.lede, event, language, &title, &body).await?;

    // 6. Trace.
    let trace = PipelineTrace {
        draft,
        draft_word_count,
        assessment: critique.assessment,
        issues: critique.issues,
        revised,
        revision_changed,
        research_sources_used: research.raw_sources.len(),
        research_context: research.clone(),
        expanded,
    };

    let body_word_count = word_count(&body);
    info!(title = %title, words = body_word_count, "article complete");
    Ok(ArticleOutput {
        title,
        lead,
        body,
        language,
        word_count: body_word_count,
        model_used: models.author.clone(),
        written_at: Utc::now().to_rfc3339(),
        trace: Some(trace),
    })
}

// ── Critique ────────────────────────────────────────────────────────

struct CritiqueOutcome {
    assessment: String,
    issues: Vec<CritiqueIssue>,
    title: String,
    body: String,
}

#[derive(Deserialize)]
struct CritiqueInput {
    #[serde(default)]
    assessment: String,
    #[serde(default)]
    issues: Vec<CritiqueIssue>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    revised_text: String,
}

/// Run the critique pass. Any failure — call error, missing tool call,
/// malformed input, suspiciously short revision — falls back to the
/// draft with zero issues.
async fn run_critique(
    llm: &dyn CompletionService,
    model: &str,
    event: &EventCandidate,
    research: &ResearchContext,
    draft: &str,
) -> CritiqueOutcome {
    let fallback = || CritiqueOutcome {
        assessment: String::new(),
        issues: Vec::new(),
        title: String::new(),
        body: draft.to_owned(),
    };

    let request = CompletionRequest::new(
        model,
        CRITIQUE_MAX_TOKENS,
        vec![MessageParam::user(build_critique_message(
            event, research, draft,
        ))],
    )
    .with_system(CRITIC_SYSTEM)
    .with_forced_tool(submit_critique_tool());

    let response = match llm.complete(&request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "critique call failed, keeping draft");
            return fallback();
        }
    };
    let input = match response.tool_input(SUBMIT_CRITIQUE_TOOL) {
        Ok(input) => input.clone(),
        Err(e) => {
            warn!(error = %e, "critique returned no tool call, keeping draft");
            return fallback();
        }
    };
    let parsed: CritiqueInput = match serde_json::from_value(serde_json::Value::Object(input)) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "critique input malformed, keeping draft");
            return fallback();
        }
    };

    // Raw character floor, checked before any stripping.
    if parsed.revised_text.chars().count() < MIN_REVISED_CHARS {
        warn!(
            chars = parsed.revised_text.chars().count(),
            "revised text suspiciously short, keeping draft"
        );
        return fallback();
    }

    CritiqueOutcome {
        assessment: parsed.assessment,
        issues: parsed.issues,
        title: strip_quotes(&parsed.title).to_owned(),
        body: strip_leading_heading(&parsed.revised_text),
    }
}

fn build_critique_message(event: &EventCandidate, research: &ResearchContext, draft: &str) -> String {
    let t = |s: &str| truncate_chars(s, CRITIQUE_FIELD_MAX_CHARS).to_owned();
    let mut parts = vec![
        "Review this draft essay against the material it was written from.".to_owned(),
        String::new(),
        "## Event data".to_owned(),
        format!("Name: {}", t(&event.name)),
        format!("Starts: {}", event.start_date),
        format!("Ends: {}", event.end_date),
        format!("Venue: {}", t(&event.venue)),
        format!("City: {}", event.city),
        format!("Category: {}", event.category),
        format!("Description: {}", t(&event.description)),
    ];
    if !research.is_empty() {
        parts.push(String::new());
        parts.push("## Research material".to_owned());
        for (label, text) in [
            ("Artist background", &research.artist_background),
            ("Venue context", &research.venue_context),
            ("Cultural context", &research.cultural_context),
            ("Related works", &research.related_works),
        ] {
            if !text.is_empty() {
                parts.push(format!("\n### {label}\n{}", t(text)));
            }
        }
    }
    parts.push(String::new());
    parts.push("## Draft".to_owned());
    parts.push(draft.to_owned());
    parts.join("\n")
}

fn submit_critique_tool() -> ToolDefinition {
    ToolDefinition {
        name: SUBMIT_CRITIQUE_TOOL.into(),
        description: "Submit the critique and the revised essay".into(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "assessment": {
                    "type": "string",
                    "description": "One-paragraph overall assessment"
                },
                "issues": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": {
                                "type": "string",
                                "enum": ["factual", "voice", "structure", "language", "depth"]
                            },
                            "severity": {
                                "type": "string",
                                "enum": ["minor", "major", "critical"]
                            },
                            "location": {"type": "string"},
                            "fix": {"type": "string"}
                        },
                        "required": ["type", "severity"]
                    }
                },
                "title": {
                    "type": "string",
                    "description": "Headline for the essay, in its language"
                },
                "revised_text": {
                    "type": "string",
                    "description": "The complete revised essay body"
                }
            },
            "required": ["assessment", "revised_text"]
        }),
    }
}

// ── Synthesis calls ─────────────────────────────────────────────────

async fn synthesize_title(
    llm: &dyn CompletionService,
    model: &str,
    language: Language,
    body: &str,
) -> Result<String> {
    let request = CompletionRequest::new(
        model,
        TITLE_MAX_TOKENS,
        vec![MessageParam::user(format!(
            "Write a title in {} for this essay.\n\nEssay:\n{}",
            language.display_name(),
            truncate_chars(body, 2000)
        ))],
    )
    .with_system(TITLE_SYSTEM);
    let text = llm.complete(&request).await?.first_text()?.to_owned();
    Ok(strip_quotes(&text).to_owned())
}

async fn generate_lede(
    llm: &dyn CompletionService,
    model: &str,
    event: &EventCandidate,
    language: Language,
    title: &str,
    body: &str,
) -> Result<String> {
    let request = CompletionRequest::new(
        model,
        LEDE_MAX_TOKENS,
        vec![MessageParam::user(format!(
            "Write a lede in {} for this essay.\n\n\
Event: {} @ {}, {}\nCategory: {}\nDate: {}\n\nTitle: {title}\n\nEssay:\n{body}",
            language.display_name(),
            event.name,
            event.venue,
            event.city,
            event.category,
            event.start_date,
        ))],
    )
    .with_system(lede_system());
    let text = llm.complete(&request).await?.first_text()?.to_owned();
    Ok(strip_quotes(&text).to_owned())
}

// ── Prompt assembly ─────────────────────────────────────────────────

fn build_user_message(event: &EventCandidate, research: &ResearchContext) -> String {
    let mut parts = vec![
        "Write an essay about this upcoming cultural event.".to_owned(),
        String::new(),
        "## Event details".to_owned(),
        format!("Name: {}", event.name),
        format!("Starts: {}", event.start_date),
    ];
    if !event.end_date.is_empty() && event.end_date != event.start_date {
        parts.push(format!("Ends: {}", event.end_date));
    }
    parts.push(format!("Venue: {}", event.venue));
    parts.push(format!("City: {}", event.city));
    parts.push(format!("Category: {}", event.category));
    parts.push(format!("Description: {}", event.description));

    if !research.is_empty() {
        parts.push(String::new());
        parts.push("## Research context (use as raw material, don't dump verbatim)".to_owned());
        for (label, text) in [
            ("Artist/creator background", &research.artist_background),
            ("Venue context", &research.venue_context),
            ("Cultural context", &research.cultural_context),
            ("Related works and press", &research.related_works),
        ] {
            if !text.is_empty() {
                parts.push(format!("\n### {label}\n{text}"));
            }
        }
    }
    parts.join("\n")
}

/// Drop one leading markdown heading line, if present.
fn strip_leading_heading(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('#') {
        match trimmed.split_once('\n') {
            Some((_, rest)) => rest.trim().to_owned(),
            None => String::new(),
        }
    } else {
        trimmed.to_owned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedLlm, api_error, text_of_words, text_response, tool_response};
    use kiez_core::models::{Category, IssueSeverity, IssueType};
    use kiez_llm::LlmError;

    fn event() -> EventCandidate {
        EventCandidate {
            name: "Test Concert".into(),
            start_date: "2026-01-10".into(),
            end_date: String::new(),
            venue: "Club X".into(),
            city: "Berlin".into(),
            category: Category::Music,
            description: "A night of live modular sets.".into(),
            source_url: String::new(),
            event_url: String::new(),
            raw_snippet: String::new(),
        }
    }

    fn critique_json(title: &str, revised: &str) -> serde_json::Value {
        json!({
            "assessment": "publishable",
            "issues": [],
            "title": title,
            "revised_text": revised,
        })
    }

    // ── Critique fallback ───────────────────────────────────────────

    #[tokio::test]
    async fn critique_call_failure_falls_back_to_draft() {
        let draft = text_of_words(600);
        let llm = ScriptedLlm::new(vec![
            Ok(text_response(&draft)),
            Err(api_error(500)),
            Ok(text_response("Fallback Title")),
            Ok(text_response("A lede.")),
        ]);

        let article = write_article(
            &llm,
            &event(),
            &ResearchContext::default(),
            Language::En,
            &ModelSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(article.body, draft);
        assert_eq!(article.title, "Fallback Title");
        let trace = article.trace.unwrap();
        assert!(trace.issues.is_empty());
        assert!(!trace.revision_changed);
        assert!(!trace.expanded);
    }

    #[tokio::test]
    async fn short_revised_text_falls_back_to_draft() {
        let draft = text_of_words(600);
        let llm = ScriptedLlm::new(vec![
            Ok(text_response(&draft)),
            Ok(tool_response(
                SUBMIT_CRITIQUE_TOOL,
                critique_json("Tiny", "too short to trust"),
            )),
            Ok(text_response("Synthesized")),
            Ok(text_response("A lede.")),
        ]);

        let article = write_article(
            &llm,
            &event(),
            &ResearchContext::default(),
            Language::En,
            &ModelSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(article.body, draft);
        // Fallback discards the critique's title too.
        assert_eq!(article.title, "Synthesized");
        assert!(article.trace.unwrap().issues.is_empty());
    }

    #[tokio::test]
    async fn missing_tool_call_falls_back_instead_of_failing() {
        let draft = text_of_words(500);
        let llm = ScriptedLlm::new(vec![
            Ok(text_response(&draft)),
            Ok(text_response("I critique in prose, no tool")),
            Ok(text_response("T")),
            Ok(text_response("L")),
        ]);

        let article = write_article(
            &llm,
            &event(),
            &ResearchContext::default(),
            Language::En,
            &ModelSettings::default(),
        )
        .await
        .unwrap();
        assert_eq!(article.body, draft);
    }

    // ── Length guard ────────────────────────────────────────────────

    #[tokio::test]
    async fn short_body_triggers_expansion() {
        let draft = text_of_words(350);
        let revised = text_of_words(350);
        let expanded_body = text_of_words(900);
        let llm = ScriptedLlm::new(vec![
            Ok(text_response(&draft)),
            Ok(tool_response(
                SUBMIT_CRITIQUE_TOOL,
                critique_json("A Title", &revised),
            )),
            Ok(text_response(&expanded_body)),
            Ok(text_response("A lede.")),
        ]);

        let article = write_article(
            &llm,
            &event(),
            &ResearchContext::default(),
            Language::En,
            &ModelSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(article.word_count, 900);
        assert_eq!(article.body, expanded_body);
        assert!(article.trace.unwrap().expanded);

        // The expansion replays the draft conversation.
        let requests = llm.requests();
        let expand = &requests[2];
        assert_eq!(expand.messages.len(), 3);
        assert_eq!(expand.messages[1].content, draft);
        assert!(expand.messages[2].content.contains("800-1200 words"));
    }

    #[tokio::test]
    async fn long_body_is_not_expanded() {
        let draft = text_of_words(500);
        let revised = text_of_words(450);
        let llm = ScriptedLlm::new(vec![
            Ok(text_response(&draft)),
            Ok(tool_response(
                SUBMIT_CRITIQUE_TOOL,
                critique_json("A Title", &revised),
            )),
            Ok(text_response("A lede.")),
        ]);

        let article = write_article(
            &llm,
            &event(),
            &ResearchContext::default(),
            Language::En,
            &ModelSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(article.word_count, 450);
        assert!(!article.trace.unwrap().expanded);
        // draft + critique + lede, no expansion call
        assert_eq!(llm.requests().len(), 3);
    }

    // ── End to end ──────────────────────────────────────────────────

    #[tokio::test]
    async fn full_pipeline_produces_article_and_trace() {
        let draft = text_of_words(600);
        let revised = text_of_words(650);
        let llm = ScriptedLlm::new(vec![
            Ok(text_response(&draft)),
            Ok(tool_response(
                SUBMIT_CRITIQUE_TOOL,
                json!({
                    "assessment": "publishable",
                    "issues": [{
                        "type": "voice",
                        "severity": "minor",
                        "location": "paragraph 1",
                        "fix": "tighten the opening"
                    }],
                    "title": "A Good Night",
                    "revised_text": revised,
                }),
            )),
            Ok(text_response("\u{201c}A crisp lede.\u{201d}")),
        ]);

        let article = write_article(
            &llm,
            &event(),
            &ResearchContext::default(),
            Language::En,
            &ModelSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(article.title, "A Good Night");
        assert_eq!(article.word_count, 650);
        assert_eq!(article.language, Language::En);
        assert_eq!(article.lead, "A crisp lede.");

        let trace = article.trace.unwrap();
        assert_eq!(trace.draft_word_count, 600);
        assert!(trace.revision_changed);
        assert_eq!(trace.assessment, "publishable");
        assert_eq!(trace.issues.len(), 1);
        assert_eq!(trace.issues[0].issue_type, IssueType::Voice);
        assert_eq!(trace.issues[0].severity, IssueSeverity::Minor);
        assert_eq!(trace.revised, revised);
    }

    #[tokio::test]
    async fn draft_failure_is_fatal() {
        let llm = ScriptedLlm::new(vec![Err(api_error(500))]);
        let err = write_article(
            &llm,
            &event(),
            &ResearchContext::default(),
            Language::En,
            &ModelSettings::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            crate::errors::PipelineError::Llm(LlmError::Api { status: 500, .. })
        ));
    }

    // ── Prompt assembly ─────────────────────────────────────────────

    #[tokio::test]
    async fn research_sections_appear_only_when_present() {
        let research = ResearchContext {
            venue_context: "Opened in 2004 in a former power plant.".into(),
            raw_sources: vec!["https://a.example".into(), "https://b.example".into()],
            ..ResearchContext::default()
        };
        let draft = text_of_words(500);
        let llm = ScriptedLlm::new(vec![
            Ok(text_response(&draft)),
            Ok(tool_response(
                SUBMIT_CRITIQUE_TOOL,
                critique_json("T", &text_of_words(500)),
            )),
            Ok(text_response("L")),
        ]);

        let article = write_article(
            &llm,
            &event(),
            &research,
            Language::De,
            &ModelSettings::default(),
        )
        .await
        .unwrap();

        let requests = llm.requests();
        let draft_msg = &requests[0].messages[0].content;
        assert!(draft_msg.contains("### Venue context"));
        assert!(!draft_msg.contains("### Artist/creator background"));
        assert!(requests[0].system.as_ref().unwrap().contains("Write in German."));
        assert_eq!(article.trace.unwrap().research_sources_used, 2);
    }

    #[test]
    fn strip_leading_heading_cases() {
        assert_eq!(strip_leading_heading("# Title\n\nBody text"), "Body text");
        assert_eq!(strip_leading_heading("Body without heading"), "Body without heading");
        assert_eq!(strip_leading_heading("# Only a title"), "");
    }
}
