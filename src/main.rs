//! Uqureader - annotated reading corpus builder
//!
//! Command-line entry point: annotates raw text into markup, adds
//! dictionary translations to stored corpora, serves the annotation HTTP
//! endpoint, and reports on recorded reading activity.

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "uqureader")]
#[command(about = "Morphologically annotated reading corpora with exposure-aware highlighting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long, env = "UQUREADER_CONFIG")]
    config: Option<PathBuf>,

    /// Database path (overrides UQUREADER_DB_PATH env var and config)
    #[arg(long)]
    db_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate text files, writing <file>.morph.tsv beside each
    Annotate {
        /// Input text files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Maximum characters per analyzer request
        #[arg(short, long)]
        budget: Option<usize>,

        /// Local markup dictionaries (replace the configured ones)
        #[arg(long = "markup")]
        markup_files: Vec<PathBuf>,
    },

    /// Add dictionary translations to every *.jsonl and *.morph.tsv file in a directory
    Augment {
        /// Corpus directory
        corpus_dir: PathBuf,

        /// SQLite bilingual dictionary
        #[arg(short, long)]
        dictionary: PathBuf,
    },

    /// Start the annotation HTTP service
    Serve {
        /// Listen address (defaults to server.addr from config)
        #[arg(long)]
        addr: Option<String>,

        /// Local markup dictionaries (replace the configured ones)
        #[arg(long = "markup")]
        markup_files: Vec<PathBuf>,
    },

    /// Show aggregated usage statistics
    Stats {
        /// Restrict to one corpus (default: all corpora summed)
        #[arg(long)]
        corpus: Option<String>,

        /// Per-feature rows instead of whole-lemma rows
        #[arg(long)]
        features: bool,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show raw events for one lemma over time
    Timeline {
        #[arg(long)]
        lemma: String,

        #[arg(long)]
        pos: String,

        /// Event type (exposure, lookup or feature)
        #[arg(long, default_value = "lookup")]
        event: String,

        /// Restrict to one corpus
        #[arg(long)]
        corpus: Option<String>,

        /// Start of range, epoch milliseconds
        #[arg(long)]
        from: Option<i64>,

        /// End of range, epoch milliseconds
        #[arg(long)]
        to: Option<i64>,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Use the requested level for our crates, WARN for noisy dependencies
    let filter = EnvFilter::new(format!(
        "uqureader={level},uqureader_core={level},tower_http={level},hyper=warn,reqwest=warn",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Uqureader v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli::helpers::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Annotate {
            files,
            budget,
            markup_files,
        } => cli::annotate::handle(files, budget, markup_files, &config).await,
        Commands::Augment {
            corpus_dir,
            dictionary,
        } => cli::augment::handle(corpus_dir, dictionary).await,
        Commands::Serve { addr, markup_files } => {
            cli::serve::handle(addr, markup_files, &config).await
        }
        Commands::Stats {
            corpus,
            features,
            format,
        } => cli::stats::handle(corpus, features, format, &config, cli.db_path).await,
        Commands::Timeline {
            lemma,
            pos,
            event,
            corpus,
            from,
            to,
            format,
        } => {
            cli::timeline::handle(
                lemma,
                pos,
                event,
                corpus,
                from,
                to,
                format,
                &config,
                cli.db_path,
            )
            .await
        }
    }
}
