use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use ctxrank_core::{PipelineConfig, Query};

use super::SplitArgs;

pub fn run(args: &SplitArgs) -> Result<()> {
    let mut config = PipelineConfig::from_env()?.split;
    if let Some(p) = args.valid {
        config.valid_proportion = p;
    }
    if let Some(p) = args.test {
        config.test_proportion = p;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;

    let json = std::fs::read_to_string(&args.queries)
        .with_context(|| format!("Failed to read {}", args.queries.display()))?;
    let queries: Vec<Query> = serde_json::from_str(&json)
        .with_context(|| format!("Malformed query file {}", args.queries.display()))?;

    let split = config.split(queries)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    write_set(&args.output, "train", &split.train)?;
    write_set(&args.output, "valid", &split.valid)?;
    write_set(&args.output, "test", &split.test)?;

    eprintln!(
        "{} Split {} queries: train {}, valid {}, test {}",
        style("✓").green(),
        split.len(),
        split.train.len(),
        split.valid.len(),
        split.test.len()
    );
    Ok(())
}

fn write_set(dir: &Path, name: &str, queries: &[Query]) -> Result<()> {
    let path = dir.join(format!("{name}.json"));
    std::fs::write(&path, serde_json::to_string_pretty(queries)?)
        .with_context(|| format!("Failed to write {}", path.display()))
}
