use anyhow::Result;
use clap::{Parser, Subcommand};
use indexer::FileSource;
use search_core::{EngineConfig, SearchEngine, StemmerKind, TfMode};
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a TF-IDF index from JSON/JSONL documents and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and run one query against it
    Search {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Query text
        #[arg(long)]
        q: String,
        /// Number of results
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Stemmer: suffix, snowball or none
        #[arg(long, default_value = "suffix")]
        stemmer: StemmerKind,
        /// Divide term frequency by document length
        #[arg(long, default_value_t = false)]
        length_normalized: bool,
    },
    /// Build the index and print corpus statistics
    Stats {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { input, q, k, stemmer, length_normalized } => {
            let tf_mode = if length_normalized { TfMode::LengthNormalized } else { TfMode::Raw };
            let cfg = EngineConfig { stemmer, tf_mode, max_top_k: k.max(1), top_k_default: k.max(1), ..EngineConfig::default() };
            cfg.validate()?;
            let engine = build(&input, cfg)?;
            let results = engine.query(&q, k)?;
            println!("{} hits for {:?} (index v{})", results.total_hits, q, results.version);
            for (rank, hit) in results.hits.iter().enumerate() {
                println!("{:>3}. {:<24} {:>8.4}  {}", rank + 1, hit.id, hit.score, preview(&hit.document.text));
            }
        }
        Commands::Stats { input } => {
            let engine = build(&input, EngineConfig::default())?;
            let stats = engine.stats();
            let built_at = stats
                .built_at
                .and_then(|t| t.format(&Rfc3339).ok())
                .unwrap_or_default();
            println!("documents: {}", stats.documents);
            println!("terms:     {}", stats.terms);
            println!("built_at:  {built_at}");
        }
    }
    Ok(())
}

fn build(input: &str, cfg: EngineConfig) -> Result<SearchEngine> {
    let docs = FileSource::new(input).load()?;
    let engine = SearchEngine::new(cfg);
    engine.ingest(docs)?;
    Ok(engine)
}

fn preview(text: &str) -> String {
    let mut s: String = text.chars().take(60).collect();
    if text.chars().count() > 60 {
        s.push('…');
    }
    s
}
