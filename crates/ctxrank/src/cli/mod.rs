pub mod build;
pub mod split;
pub mod stats;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ctxrank_core::{PipelineConfig, RawArticle, StatsKind};

#[derive(Parser)]
#[command(
    name = "ctxrank",
    about = "Build entity-tuple context datasets from annotated news corpora",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline over a corpus and write the resulting queries
    Build(BuildArgs),
    /// Run the pipeline and print corpus statistics
    Stats(StatsArgs),
    /// Split a query file into train, valid and test sets
    Split(SplitArgs),
}

/// Pipeline settings shared by the commands that run it.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// JSON configuration file (defaults and CTXRANK_* variables otherwise)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Minimum number of articles per tuple
    #[arg(long)]
    pub min_articles: Option<usize>,
    /// Minimum number of queries per tuple
    #[arg(long)]
    pub min_queries: Option<usize>,
    /// Largest number of sentences a context window may cover
    #[arg(long)]
    pub max_span: Option<usize>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Corpus file: a JSON array of annotated articles
    pub corpus: PathBuf,
    /// Where to write the queries
    #[arg(short, long)]
    pub output: PathBuf,
    /// Also write the full corpus snapshot here
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    /// JSON file mapping entity names to enrichment entries, applied to the
    /// entities kept by the article-support filter
    #[arg(long)]
    pub enrichment: Option<PathBuf>,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Corpus file: a JSON array of annotated articles
    pub corpus: PathBuf,
    /// Statistics to print (all if omitted): tuples, contexts or entities
    #[arg(long)]
    pub kind: Option<StatsKind>,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Query file written by `ctxrank build`
    pub queries: PathBuf,
    /// Directory receiving train.json, valid.json and test.json
    #[arg(short, long)]
    pub output: PathBuf,
    /// Fraction of queries in the validation set
    #[arg(long)]
    pub valid: Option<f64>,
    /// Fraction of queries in the test set
    #[arg(long)]
    pub test: Option<f64>,
    /// Shuffle seed
    #[arg(long)]
    pub seed: Option<u64>,
}

impl PipelineArgs {
    /// Configuration file or environment, then command-line overrides.
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => PipelineConfig::from_env()?,
        };
        if let Some(k) = self.min_articles {
            config.min_articles = k;
        }
        if let Some(k) = self.min_queries {
            config.min_queries = k;
        }
        if let Some(span) = self.max_span {
            config.max_span = Some(span);
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn read_articles(path: &Path) -> Result<Vec<RawArticle>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Malformed corpus {}", path.display()))
}
