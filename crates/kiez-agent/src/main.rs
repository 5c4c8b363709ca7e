//! # kiez-agent
//!
//! Pipeline binary — wires the real clients into the agents and exposes
//! one subcommand per editorial stage.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kiez_agents::{curate_event, scout_events, write_article, write_reflection};
use kiez_core::ids::EventId;
use kiez_core::models::{EventCandidate, Language, ResearchContext};
use kiez_llm::{AnthropicClient, CompletionService};
use kiez_notify::{ArticleAnnouncement, Notifier, TelegramNotifier};
use kiez_research::{SearchClient, TavilyClient, research_event};
use kiez_settings::{KiezSettings, load_settings};
use kiez_store::{EventSave, RecordStore};

/// kiez editorial pipeline.
#[derive(Parser, Debug)]
#[command(name = "kiez-agent", about = "Autonomous cultural-editorial pipeline", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the web for upcoming events and pool the selection.
    Scout {
        /// City to scout (overrides settings).
        #[arg(long)]
        city: Option<String>,

        /// How many days ahead to look (overrides settings).
        #[arg(long)]
        days: Option<u32>,
    },

    /// Pick the one pooled event most worth an essay today.
    Curate {
        /// City, used for the curator's framing (overrides settings).
        #[arg(long)]
        city: Option<String>,
    },

    /// Research an event and write articles for it.
    Author {
        #[command(flatten)]
        source: AuthorSource,

        /// Languages to write in (defaults to the configured list).
        #[arg(long = "language", value_name = "LANG")]
        languages: Vec<Language>,

        /// Skip the web research pass.
        #[arg(long)]
        skip_research: bool,
    },

    /// Full run: scout, curate, then author.
    Pipeline {
        /// City (overrides settings).
        #[arg(long)]
        city: Option<String>,

        /// Scouting window in days (overrides settings).
        #[arg(long)]
        days: Option<u32>,

        /// Languages to write in (defaults to the configured list).
        #[arg(long = "language", value_name = "LANG")]
        languages: Vec<Language>,
    },

    /// Write a self-reflection over recent coverage.
    Reflect {
        /// Language of the reflection (defaults to the first configured).
        #[arg(long)]
        language: Option<Language>,

        /// Size of the trailing window in days.
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

/// Where the `author` subcommand gets its event from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct AuthorSource {
    /// Run the curator and write about its pick.
    #[arg(long)]
    from_curator: bool,

    /// Write about a specific pooled event.
    #[arg(long, value_name = "ID")]
    event_id: Option<String>,

    /// Write about an event candidate read from a JSON file.
    #[arg(long, value_name = "FILE")]
    event: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("KIEZ_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings().context("failed to load settings")?;
    let store = RecordStore::open(Path::new(&settings.data_dir))
        .with_context(|| format!("failed to open record store at {}", settings.data_dir))?;
    let llm = AnthropicClient::from_env()
        .context("ANTHROPIC_API_KEY is not set")?;
    let search = TavilyClient::from_env();

    match cli.command {
        Command::Scout { city, days } => {
            let city = city.unwrap_or_else(|| settings.city.clone());
            let days = days.unwrap_or(settings.days_ahead);
            let search = require_search(search.as_ref())?;
            cmd_scout(&llm, search, &store, &settings, &city, days).await
        }
        Command::Curate { city } => {
            let city = city.unwrap_or_else(|| settings.city.clone());
            cmd_curate(&llm, &store, &settings, &city).await
        }
        Command::Author {
            source,
            languages,
            skip_research,
        } => {
            let languages = resolve_languages(languages, &settings);
            let (event_id, candidate) =
                resolve_event(&llm, &store, &settings, &source).await?;
            cmd_author(
                &llm,
                search.as_ref(),
                &store,
                &settings,
                &event_id,
                &candidate,
                &languages,
                skip_research,
            )
            .await
        }
        Command::Pipeline {
            city,
            days,
            languages,
        } => {
            let city = city.unwrap_or_else(|| settings.city.clone());
            let days = days.unwrap_or(settings.days_ahead);
            let languages = resolve_languages(languages, &settings);
            let tavily = require_search(search.as_ref())?;

            cmd_scout(&llm, tavily, &store, &settings, &city, days).await?;
            let choice = curate_event(&llm, &store, &settings.models, &city, None).await?;
            let event = store
                .get_event(&choice.chosen_event_id)?
                .context("curated event vanished from the pool")?;
            println!("Curated: {} ({})", event.name, choice.why_chosen);
            cmd_author(
                &llm,
                search.as_ref(),
                &store,
                &settings,
                &choice.chosen_event_id,
                &event.to_candidate(),
                &languages,
                false,
            )
            .await
        }
        Command::Reflect { language, days } => {
            let language = language
                .or_else(|| settings.languages.first().copied())
                .unwrap_or(Language::En);
            cmd_reflect(&llm, &store, &settings, language, days).await
        }
    }
}

fn require_search(search: Option<&TavilyClient>) -> Result<&TavilyClient> {
    search.context("TAVILY_API_KEY is not set")
}

fn resolve_languages(cli_languages: Vec<Language>, settings: &KiezSettings) -> Vec<Language> {
    if cli_languages.is_empty() {
        settings.languages.clone()
    } else {
        cli_languages
    }
}

// ── Subcommands ─────────────────────────────────────────────────────

async fn cmd_scout(
    llm: &dyn CompletionService,
    search: &dyn SearchClient,
    store: &RecordStore,
    settings: &KiezSettings,
    city: &str,
    days_ahead: u32,
) -> Result<()> {
    let report = scout_events(llm, search, store, &settings.models, city, days_ahead).await?;

    let mut inserted = 0;
    let mut duplicates = 0;
    for event in &report.events {
        match store.save_event(event)? {
            EventSave::Inserted(_) => inserted += 1,
            EventSave::Duplicate(_) => duplicates += 1,
        }
        println!(
            "  {} [{}] {} @ {}",
            event.start_date, event.category, event.name, event.venue
        );
    }
    println!(
        "Scouted {} events: {inserted} new, {duplicates} already pooled",
        report.events.len()
    );
    Ok(())
}

async fn cmd_curate(
    llm: &dyn CompletionService,
    store: &RecordStore,
    settings: &KiezSettings,
    city: &str,
) -> Result<()> {
    let choice = curate_event(llm, store, &settings.models, city, None).await?;
    let event = store
        .get_event(&choice.chosen_event_id)?
        .context("curated event vanished from the pool")?;
    println!("Curated: {} @ {} ({})", event.name, event.venue, event.start_date);
    println!("Why: {}", choice.why_chosen);
    Ok(())
}

/// Resolve the `author` event source into a pooled id and candidate.
///
/// A candidate read from a file is pooled first so the article has an
/// event record to reference.
async fn resolve_event(
    llm: &dyn CompletionService,
    store: &RecordStore,
    settings: &KiezSettings,
    source: &AuthorSource,
) -> Result<(EventId, EventCandidate)> {
    if source.from_curator {
        let choice = curate_event(llm, store, &settings.models, &settings.city, None).await?;
        let event = store
            .get_event(&choice.chosen_event_id)?
            .context("curated event vanished from the pool")?;
        println!("Curated: {} ({})", event.name, choice.why_chosen);
        return Ok((choice.chosen_event_id, event.to_candidate()));
    }
    if let Some(id) = &source.event_id {
        let event_id = EventId::from_string(id.clone());
        let event = store
            .get_event(&event_id)?
            .with_context(|| format!("event {id} does not exist in the pool"))?;
        return Ok((event_id, event.to_candidate()));
    }
    let path = source
        .event
        .as_ref()
        .context("one of --from-curator, --event-id, --event is required")?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let candidate: EventCandidate = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid event candidate", path.display()))?;
    let event_id = store.save_event(&candidate)?.id().clone();
    Ok((event_id, candidate))
}

#[allow(clippy::too_many_arguments)]
async fn cmd_author(
    llm: &dyn CompletionService,
    search: Option<&TavilyClient>,
    store: &RecordStore,
    settings: &KiezSettings,
    event_id: &EventId,
    candidate: &EventCandidate,
    languages: &[Language],
    skip_research: bool,
) -> Result<()> {
    // One research pass feeds every language.
    let research = if skip_research {
        ResearchContext::default()
    } else {
        research_event(search.map(|s| s as &dyn SearchClient), candidate).await
    };

    let notifier = TelegramNotifier::from_settings(&settings.telegram, &settings.site_url);
    let mut written = 0;
    for &language in languages {
        if store.has_article_in_language(event_id, language)? {
            info!(id = %event_id, lang = %language, "article already exists, skipping");
            continue;
        }
        let article = write_article(llm, candidate, &research, language, &settings.models).await?;
        let (article_id, slug) = store.save_article(event_id, &article)?;
        println!("[{language}] {} -> {slug} ({} words)", article.title, article.word_count);
        info!(id = %article_id, slug, "article saved");
        written += 1;

        if let Some(notifier) = &notifier {
            let announcement = ArticleAnnouncement {
                title: article.title.clone(),
                lead: article.lead.clone(),
                slug,
                language,
                category: candidate.category,
                venue: candidate.venue.clone(),
                start_date: candidate.start_date.clone(),
            };
            if let Err(e) = notifier.notify(&announcement).await {
                warn!(error = %e, "announcement failed");
            }
        }
    }
    if written == 0 {
        println!("Nothing to write: all requested languages are already covered.");
    }
    Ok(())
}

async fn cmd_reflect(
    llm: &dyn CompletionService,
    store: &RecordStore,
    settings: &KiezSettings,
    language: Language,
    days: i64,
) -> Result<()> {
    let reflection = write_reflection(llm, store, &settings.models, language, days).await?;
    let (id, slug) = store.save_reflection(&reflection)?;
    println!(
        "[{language}] {} -> {slug} ({} articles, {} words)",
        reflection.title, reflection.analysis.article_count, reflection.word_count
    );
    info!(id = %id, "reflection saved");
    Ok(())
}
