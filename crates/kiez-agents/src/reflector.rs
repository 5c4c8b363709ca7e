//! Reflection: a periodic self-analysis essay over a trailing article
//! window, with computed coverage statistics.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tracing::info;

use kiez_core::models::{
    Category, Language, ReflectionAnalysis, ReflectionOutput, StoredArticle, StoredReflection,
};
use kiez_core::text::{strip_quotes, truncate_chars, word_count};
use kiez_llm::{CompletionRequest, CompletionService, MessageParam};
use kiez_settings::ModelSettings;
use kiez_store::RecordStore;

use crate::errors::{PipelineError, Result};
use crate::prompts::{TITLE_SYSTEM, reflector_system};

const BODY_MAX_TOKENS: u32 = 4096;
const TITLE_MAX_TOKENS: u32 = 128;

/// How much of each article opening goes into the prompt.
const OPENING_MAX_CHARS: usize = 500;
/// How much of the previous reflection goes into the prompt.
const PREVIOUS_BODY_MAX_CHARS: usize = 2000;
/// Venues listed in the analysis, most common first.
const TOP_VENUES: usize = 10;

/// Write a reflection over the articles of the trailing `days_back` days.
pub async fn write_reflection(
    llm: &dyn CompletionService,
    store: &RecordStore,
    models: &ModelSettings,
    language: Language,
    days_back: i64,
) -> Result<ReflectionOutput> {
    let now = Utc::now();
    let period_start = (now - Duration::days(days_back))
        .format("%Y-%m-%d")
        .to_string();
    let period_end = now.format("%Y-%m-%d").to_string();

    let articles = store.get_articles_in_period(&period_start, &period_end, Some(language))?;
    if articles.is_empty() {
        return Err(PipelineError::NoArticlesInPeriod {
            start: period_start,
            end: period_end,
        });
    }

    let analysis = compute_analysis(&articles);
    let previous = store.get_latest_reflection(Some(language))?;
    info!(
        articles = articles.len(),
        lang = %language,
        "writing reflection"
    );

    let user_message = build_user_message(&period_start, &period_end, &analysis, &articles, previous.as_ref());
    let body_request = CompletionRequest::new(
        &models.author,
        BODY_MAX_TOKENS,
        vec![MessageParam::user(user_message)],
    )
    .with_system(&reflector_system(language));
    let raw_body = llm.complete(&body_request).await?.first_text()?.to_owned();
    let body = strip_leading_heading(&raw_body);

    let title = synthesize_title(llm, &models.lede, language, &body).await?;
    let body_word_count = word_count(&body);
    info!(title = %title, words = body_word_count, "reflection complete");

    Ok(ReflectionOutput {
        title,
        body: body.clone(),
        language,
        period_start,
        period_end,
        analysis,
        word_count: body_word_count,
        model_used: models.author.clone(),
        written_at: Utc::now().to_rfc3339(),
    })
}

/// Aggregate category, venue, and length statistics over the period.
fn compute_analysis(articles: &[StoredArticle]) -> ReflectionAnalysis {
    let mut category_counts: HashMap<Category, usize> = HashMap::new();
    let mut venue_counts: HashMap<String, usize> = HashMap::new();
    let mut total_words = 0;
    for article in articles {
        *category_counts.entry(article.event.category).or_default() += 1;
        if !article.event.venue.is_empty() {
            *venue_counts.entry(article.event.venue.clone()).or_default() += 1;
        }
        total_words += article.word_count;
    }

    let mut categories: Vec<(Category, usize)> = category_counts.into_iter().collect();
    categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

    let mut venues: Vec<(String, usize)> = venue_counts.into_iter().collect();
    venues.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    venues.truncate(TOP_VENUES);

    let article_count = articles.len();
    ReflectionAnalysis {
        article_count,
        total_words,
        avg_words: (total_words + article_count / 2) / article_count,
        categories,
        venues,
    }
}

fn build_user_message(
    period_start: &str,
    period_end: &str,
    analysis: &ReflectionAnalysis,
    articles: &[StoredArticle],
    previous: Option<&StoredReflection>,
) -> String {
    let mut parts = vec![
        format!("Reflect on your coverage from {period_start} to {period_end}."),
        String::new(),
        "## Statistics".to_owned(),
        format!("Articles written: {}", analysis.article_count),
        format!(
            "Total words: {} (avg {} per article)",
            analysis.total_words, analysis.avg_words
        ),
        String::new(),
        "## Category breakdown".to_owned(),
    ];
    for (category, count) in &analysis.categories {
        parts.push(format!("- {category}: {count}"));
    }
    if !analysis.venues.is_empty() {
        parts.push(String::new());
        parts.push("## Top venues".to_owned());
        for (venue, count) in &analysis.venues {
            parts.push(format!("- {venue}: {count}"));
        }
    }
    parts.push(String::new());
    parts.push("## Articles written".to_owned());
    for article in articles {
        parts.push(format!(
            "\n### {} ({}, {} @ {})\nOpening: {}",
            article.title,
            article.written_at,
            article.event.category,
            article.event.venue,
            truncate_chars(&article.body, OPENING_MAX_CHARS),
        ));
    }
    if let Some(previous) = previous {
        parts.push(String::new());
        parts.push(format!(
            "## Your previous reflection ({} to {})\n{}",
            previous.period_start,
            previous.period_end,
            truncate_chars(&previous.body, PREVIOUS_BODY_MAX_CHARS),
        ));
        parts.push(
            "Don't repeat the previous reflection. If you called out a pattern \
last time, check whether it changed."
                .to_owned(),
        );
    }
    parts.join("\n")
}

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
            "Write a title in {} for this self-reflection essay.\n\nEssay:\n{}",
            language.display_name(),
            truncate_chars(body, 2000)
        ))],
    )
    .with_system(TITLE_SYSTEM);
    let text = llm.complete(&request).await?.first_text()?.to_owned();
    Ok(strip_quotes(&text).to_owned())
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
