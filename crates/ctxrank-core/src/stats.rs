use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::ContextSpan;
use crate::corpus::Corpus;
use crate::entity::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsKind {
    Tuples,
    Contexts,
    Entities,
}

impl StatsKind {
    pub const ALL: [Self; 3] = [Self::Tuples, Self::Contexts, Self::Entities];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tuples => "tuples",
            Self::Contexts => "contexts",
            Self::Entities => "entities",
        }
    }

    #[must_use]
    pub fn compute(self, corpus: &Corpus) -> Stats {
        match self {
            Self::Tuples => Stats::Tuples(TupleStats::compute(corpus)),
            Self::Contexts => Stats::Contexts(ContextStats::compute(corpus)),
            Self::Entities => Stats::Entities(EntityStats::compute(corpus)),
        }
    }
}

impl fmt::Display for StatsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatsKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tuples" => Ok(Self::Tuples),
            "contexts" => Ok(Self::Contexts),
            "entities" => Ok(Self::Entities),
            _ => Err(crate::Error::InvalidConfig(format!("unknown statistics kind: {s}"))),
        }
    }
}

/// Minimum, maximum and mean of a set of counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

impl Summary {
    #[allow(clippy::cast_precision_loss)]
    fn of(values: impl IntoIterator<Item = usize>) -> Self {
        let values: Vec<usize> = values.into_iter().collect();
        if values.is_empty() {
            return Self::default();
        }
        Self {
            min: values.iter().copied().min().unwrap_or(0),
            max: values.iter().copied().max().unwrap_or(0),
            mean: values.iter().sum::<usize>() as f64 / values.len() as f64,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min {} / max {} / mean {:.2}", self.min, self.max, self.mean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TupleStats {
    pub count: usize,
    pub by_type: BTreeMap<EntityType, usize>,
    pub by_size: BTreeMap<usize, usize>,
    pub articles_per_tuple: Summary,
    pub queries_per_tuple: Summary,
}

impl TupleStats {
    fn compute(corpus: &Corpus) -> Self {
        let mut by_type = BTreeMap::new();
        let mut by_size = BTreeMap::new();
        for tuple in &corpus.tuples {
            *by_type.entry(tuple.entity_type).or_insert(0) += 1;
            *by_size.entry(tuple.len()).or_insert(0) += 1;
        }
        Self {
            count: corpus.tuples.len(),
            by_type,
            by_size,
            articles_per_tuple: Summary::of(corpus.tuples.iter().map(|t| t.article_ids.len())),
            queries_per_tuple: Summary::of(corpus.tuples.iter().map(|t| t.query_ids.len())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextStats {
    pub total: usize,
    pub abstracts: usize,
    pub windows: usize,
    /// Window length in sentences to number of windows.
    pub window_lengths: BTreeMap<usize, usize>,
    pub contexts_per_article: Summary,
}

impl ContextStats {
    fn compute(corpus: &Corpus) -> Self {
        let mut abstracts = 0;
        let mut windows = 0;
        let mut window_lengths = BTreeMap::new();

        for context in corpus
            .articles
            .values()
            .flat_map(|a| a.contexts.values())
            .flat_map(BTreeMap::values)
        {
            match context.span {
                ContextSpan::Abstract => abstracts += 1,
                ContextSpan::Sentences { first, last } => {
                    windows += 1;
                    *window_lengths.entry(last - first + 1).or_insert(0) += 1;
                }
            }
        }

        Self {
            total: abstracts + windows,
            abstracts,
            windows,
            window_lengths,
            contexts_per_article: Summary::of(
                corpus
                    .articles
                    .values()
                    .map(|a| a.contexts.values().map(BTreeMap::len).sum()),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityStats {
    pub count: usize,
    pub by_type: BTreeMap<EntityType, usize>,
    pub with_aliases: usize,
    pub enriched: usize,
}

impl EntityStats {
    fn compute(corpus: &Corpus) -> Self {
        let mut by_type = BTreeMap::new();
        let mut with_aliases = 0;
        let mut enriched = 0;
        for entity in corpus.catalog.all() {
            *by_type.entry(entity.entity_type).or_insert(0) += 1;
            if !entity.aliases.is_empty() {
                with_aliases += 1;
            }
            if entity.enrichment.is_some() {
                enriched += 1;
            }
        }
        Self {
            count: corpus.catalog.len(),
            by_type,
            with_aliases,
            enriched,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stats {
    Tuples(TupleStats),
    Contexts(ContextStats),
    Entities(EntityStats),
}

fn write_counts<K: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    counts: &BTreeMap<K, usize>,
) -> fmt::Result {
    writeln!(f, "{label}:")?;
    for (key, n) in counts {
        writeln!(f, "  {key}: {n}")?;
    }
    Ok(())
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tuples(s) => {
                writeln!(f, "Tuples: {}", s.count)?;
                write_counts(f, "By type", &s.by_type)?;
                write_counts(f, "By size", &s.by_size)?;
                writeln!(f, "Articles per tuple: {}", s.articles_per_tuple)?;
                writeln!(f, "Queries per tuple: {}", s.queries_per_tuple)
            }
            Self::Contexts(s) => {
                writeln!(f, "Contexts: {}", s.total)?;
                writeln!(f, "  abstract: {}", s.abstracts)?;
                writeln!(f, "  sentence windows: {}", s.windows)?;
                write_counts(f, "Window lengths", &s.window_lengths)?;
                writeln!(f, "Contexts per article: {}", s.contexts_per_article)
            }
            Self::Entities(s) => {
                writeln!(f, "Entities: {}", s.count)?;
                write_counts(f, "By type", &s.by_type)?;
                writeln!(f, "With aliases: {}", s.with_aliases)?;
                writeln!(f, "Enriched: {}", s.enriched)
            }
        }
    }
}
