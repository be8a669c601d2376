//! bolsa-qa CLI: stock-market question answering over a knowledge graph.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::Result;

use bolsa_qa::config::AppConfig;
use bolsa_qa::format::{self, FormatMode};
use bolsa_qa::graph::store::KnowledgeStore;
use bolsa_qa::nlp;
use bolsa_qa::pipeline::Pipeline;
use bolsa_qa::query::dictionary::SymbolDictionary;
use bolsa_qa::query::template::TemplateRegistry;

#[derive(Parser)]
#[command(name = "bolsa-qa", version, about = "Stock-market question answering")]
struct Cli {
    /// Configuration file (TOML). Defaults apply when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the knowledge graph from the tabular sources and write the
    /// snapshot, ignoring any existing snapshot.
    Build,

    /// Answer a natural-language question.
    Ask {
        /// The question, in Portuguese.
        question: String,

        /// Render multi-row results as a table instead of a list.
        #[arg(long)]
        table: bool,

        /// Also print the synthesized SPARQL query.
        #[arg(long)]
        show_query: bool,
    },

    /// Execute a SPARQL query directly against the graph.
    Query {
        /// The SPARQL SELECT or ASK query text.
        sparql: String,
    },

    /// Show graph state and statistics.
    Info,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let store = Arc::new(KnowledgeStore::new());

    match cli.command {
        Commands::Build => {
            store.rebuild(&config)?;
            println!(
                "Graph built: {} triples, snapshot at {}",
                store.triple_count().unwrap_or(0),
                config.snapshot.display()
            );
        }

        Commands::Ask {
            question,
            table,
            show_query,
        } => {
            store.initialize(&config)?;
            let analyzer = nlp::analyzer_from_config(&config.nlp)?;
            let templates = TemplateRegistry::new(config.templates_dir.clone());
            let dictionary = SymbolDictionary::load(config.dictionary.as_deref())?;
            let mode = if table { FormatMode::Table } else { FormatMode::List };

            let pipeline = Pipeline::new(analyzer, templates, dictionary, store, mode);
            let answer = pipeline.answer(&question);
            if show_query && let Some(sparql) = &answer.sparql_query {
                println!("{sparql}\n");
            }
            println!("{}", answer.result);
        }

        Commands::Query { sparql } => {
            store.initialize(&config)?;
            let rows = store.execute(&sparql);
            println!("{}", format::format_rows(&rows, FormatMode::Table));
        }

        Commands::Info => {
            store.initialize(&config)?;
            println!("state:    {}", store.state_name());
            println!("triples:  {}", store.triple_count().unwrap_or(0));
            println!("snapshot: {}", config.snapshot.display());
        }
    }

    Ok(())
}
