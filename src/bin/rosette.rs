//! Rosette CLI
//!
//! Runs the reading core against the live Wikipedia / Wikidata APIs and
//! prints the per-language result instead of driving browser panels.
//!
//! Usage:
//!   cargo run --features cli --bin rosette -- resolve "Tour Eiffel"
//!   cargo run --features cli --bin rosette -- entity Q243 --display en,de,ja
//!   cargo run --features cli --bin rosette -- random --json
//!   cargo run --features cli --bin rosette -- suggest rab

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use rosette::config::RosetteConfig;
use rosette::{
    build_page_url, ArticleResolver, ArticleTarget, LanguageSet, RandomSampler,
    ResolvedArticleSet, SampleOutcome, SuggestionService, WikiApi, WikiClient,
};

#[derive(Parser)]
#[command(name = "rosette")]
#[command(version)]
#[command(about = "Resolve a topic to its Wikipedia article in several languages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Display languages, comma separated (default: en,fr,ja)
    #[arg(long, global = true, value_delimiter = ',')]
    display: Vec<String>,

    /// Search-priority languages, comma separated (default: display order)
    #[arg(long, global = true, value_delimiter = ',')]
    search: Vec<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a free-text term through the search-priority languages
    Resolve { term: String },

    /// Resolve a Wikidata entity id (e.g. Q243)
    Entity { id: String },

    /// Sample a random topic available in every display language
    Random,

    /// Show search suggestions for a partial term
    Suggest { term: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = RosetteConfig::from_env();

    let languages = if cli.display.is_empty() && cli.search.is_empty() {
        LanguageSet::default()
    } else {
        let display = if cli.display.is_empty() {
            LanguageSet::default().display().to_vec()
        } else {
            cli.display.clone()
        };
        LanguageSet::new(display, cli.search.clone()).context("Invalid language selection")?
    };

    let api: Arc<dyn WikiApi> =
        Arc::new(WikiClient::new(config.http.clone()).context("Failed to build HTTP client")?);
    let resolver = ArticleResolver::new(api.clone(), languages.clone());

    match cli.command {
        Commands::Resolve { term } => {
            let set = resolver
                .search(&term)
                .await
                .with_context(|| format!("Resolving \"{}\"", term))?;
            print_set(&set, cli.json)?;
        }
        Commands::Entity { id } => {
            let set = resolver
                .resolve_entity(&id)
                .await
                .with_context(|| format!("Resolving entity {}", id))?;
            print_set(&set, cli.json)?;
        }
        Commands::Random => {
            let sampler = RandomSampler::new(api, resolver, config.random.clone());
            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            match sampler.sample(&cancel).await {
                SampleOutcome::Found(set) => print_set(&set, cli.json)?,
                SampleOutcome::NotFound => anyhow::bail!("No random article found in all display languages"),
                SampleOutcome::Cancelled => eprintln!("Cancelled"),
            }
        }
        Commands::Suggest { term } => {
            let suggestions = SuggestionService::new(api, languages).suggest(&term).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            } else {
                for s in &suggestions {
                    let marker = if s.has_article_in_any_language { ' ' } else { '-' };
                    println!("{} {:<10} {}  {}", marker, s.id, s.label, s.description);
                }
            }
        }
    }

    Ok(())
}

fn print_set(set: &ResolvedArticleSet, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(set)?);
        return Ok(());
    }

    println!(
        "{} ({})",
        set.label,
        set.entity_id.as_deref().unwrap_or("no entity")
    );
    if let Some(source) = &set.source {
        println!("  found via {}: {}", source.lang, source.title);
    }
    for article in &set.articles {
        match &article.target {
            ArticleTarget::Title { title } => {
                println!("  {:<4} {}", article.lang, build_page_url(&article.lang, title))
            }
            ArticleTarget::Missing => println!("  {:<4} (no article)", article.lang),
        }
    }
    Ok(())
}
