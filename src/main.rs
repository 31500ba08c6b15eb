//! lexigraph CLI: import, augment and query a lexical graph stored in redb.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use lexigraph::augment::GraphAugmentor;
use lexigraph::config::LexiConfig;
use lexigraph::ingest;
use lexigraph::store::{DurableGraphStore, GraphStore};
use lexigraph::traverse::TraversalQueries;

#[derive(Parser)]
#[command(name = "lexigraph", version, about = "Lexical graph augmentation engine")]
struct Cli {
    /// Data directory for the redb database (overrides the config file).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import external edges from a JSON file.
    Ingest {
        /// JSON array of {"source", "target", "rel"} records.
        #[arg(long)]
        file: PathBuf,
    },

    /// Add missing inverses and compute the transitive closure.
    Augment,

    /// Delete every edge inserted by augmentation.
    Purge,

    /// Check whether one synset reaches another.
    Reachable {
        source: String,
        target: String,

        /// Maximum hops; -1 for unbounded.
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        max_depth: i64,

        /// Relation names to follow (repeatable; all relations if omitted).
        #[arg(long = "rel")]
        rels: Vec<String>,
    },

    /// List synsets reachable from a source.
    Neighbors {
        source: String,

        /// Maximum hops; -1 for unbounded.
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        max_depth: i64,

        /// Relation names to follow (repeatable; all relations if omitted).
        #[arg(long = "rel")]
        rels: Vec<String>,
    },

    /// Show store and taxonomy statistics.
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

    let mut config = match &cli.config {
        Some(path) => LexiConfig::load(path)?,
        None => LexiConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    let taxonomy = config.taxonomy()?;
    let mut store = DurableGraphStore::open(&config.data_dir)?;

    match cli.command {
        Commands::Ingest { file } => {
            let records = ingest::read_records(&file)?;
            let report = ingest::ingest(&mut store, &records, &taxonomy)?;
            println!(
                "Ingested {} edges ({} skipped, {} new synsets) from {}",
                report.edges_inserted,
                report.edges_skipped,
                report.synsets_created,
                file.display()
            );
            if report.derived_purged > 0 {
                println!(
                    "Removed {} derived edges; run `lexigraph augment` to recompute them",
                    report.derived_purged
                );
            }
        }

        Commands::Augment => {
            let augmentor = GraphAugmentor::new(&taxonomy, config.augment_config());
            let stats = augmentor.augment(&mut store)?;
            println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);
        }

        Commands::Purge => {
            let augmentor = GraphAugmentor::new(&taxonomy, config.augment_config());
            let removed = augmentor.purge_derived(&mut store)?;
            println!("Removed {removed} derived edges");
        }

        Commands::Reachable {
            source,
            target,
            max_depth,
            rels,
        } => {
            let rels: Vec<&str> = rels.iter().map(String::as_str).collect();
            let queries = TraversalQueries::new(&store, &taxonomy);
            let reachable = queries.is_reachable(&source, &target, max_depth, &rels)?;
            println!("{reachable}");
        }

        Commands::Neighbors {
            source,
            max_depth,
            rels,
        } => {
            let rels: Vec<&str> = rels.iter().map(String::as_str).collect();
            let queries = TraversalQueries::new(&store, &taxonomy);
            for neighbor in queries.transitive_neighbors(&source, max_depth, &rels)? {
                println!("{}", neighbor?);
            }
        }

        Commands::Info => {
            println!("Data dir:    {}", config.data_dir.display());
            println!("Synsets:     {}", store.synset_count()?);
            println!("Edges:       {}", store.edge_count()?);
            println!("Relations:   {}", taxonomy.len());
            println!("Canonical:   {}", taxonomy.canonical_names().join(", "));
            println!("Batch size:  {}", config.batch_size);
        }
    }

    Ok(())
}
