use anyhow::{Context, Result};
use console::style;
use ctxrank_core::{JsonEnrichmentSource, Pipeline, Query};

use super::{read_articles, BuildArgs};

pub async fn run(args: &BuildArgs) -> Result<()> {
    let config = args.pipeline.resolve()?;
    let articles = read_articles(&args.corpus)?;

    let mut pipeline = Pipeline::new(config)?;
    let report = match &args.enrichment {
        Some(path) => {
            let source = JsonEnrichmentSource::load(path)
                .await
                .with_context(|| format!("Failed to read enrichment file {}", path.display()))?;
            pipeline.run_with_enrichment(articles, &source).await
        }
        None => pipeline.run(articles),
    };

    let queries: Vec<&Query> = pipeline.corpus().queries.values().collect();
    let json = serde_json::to_string_pretty(&queries)?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    tracing::debug!(path = %args.output.display(), queries = queries.len(), "Wrote queries");

    if let Some(path) = &args.snapshot {
        pipeline
            .corpus()
            .save(path)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    }

    eprintln!(
        "{} Built {} queries",
        style("✓").green(),
        style(report.queries).bold()
    );
    eprintln!("  Articles: {} loaded, {} cleaned", report.loaded, report.cleaned);
    eprintln!(
        "  Tuples: {} computed, {} kept",
        report.tuples, report.query_filter.tuples_kept
    );
    if let Some(enrichment) = &report.enrichment {
        eprintln!(
            "  Enrichment: {} found, {} not found, {} failed",
            enrichment.found.len(),
            enrichment.not_found.len(),
            enrichment.failed.len()
        );
    }
    eprintln!("  Contexts: {}", report.contexts);
    eprintln!("  Output: {}", args.output.display());

    Ok(())
}
