use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::ContextKind;
use crate::filter::ArticleCriterion;
use crate::split::SplitConfig;
use crate::{Error, Result};

pub const ENV_MIN_ARTICLES: &str = "CTXRANK_MIN_ARTICLES";
pub const ENV_MIN_QUERIES: &str = "CTXRANK_MIN_QUERIES";
pub const ENV_MAX_SPAN: &str = "CTXRANK_MAX_SPAN";
pub const ENV_SEED: &str = "CTXRANK_SEED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Articles a tuple needs to survive the first filter pass.
    pub min_articles: usize,
    /// Queries a tuple needs to survive the second filter pass.
    pub min_queries: usize,
    /// Longest sentence window, unbounded when `None`.
    pub max_span: Option<usize>,
    pub context_kinds: Vec<ContextKind>,
    /// Criteria applied, in order, before tuples are computed.
    pub article_criteria: Vec<ArticleCriterion>,
    pub split: SplitConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_articles: 1,
            min_queries: 1,
            max_span: None,
            context_kinds: ContextKind::ALL.to_vec(),
            article_criteria: vec![ArticleCriterion::Incomplete, ArticleCriterion::NoSameTypePair],
            split: SplitConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with `CTXRANK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_vars(|key| std::env::var(key).ok())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Overlay values from `get`, which maps a variable name to its value.
    pub fn with_vars(mut self, get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = parse_var(&get, ENV_MIN_ARTICLES)? {
            self.min_articles = v;
        }
        if let Some(v) = parse_var(&get, ENV_MIN_QUERIES)? {
            self.min_queries = v;
        }
        if let Some(v) = parse_var(&get, ENV_MAX_SPAN)? {
            self.max_span = Some(v);
        }
        if let Some(v) = parse_var(&get, ENV_SEED)? {
            self.split.seed = v;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.context_kinds.is_empty() {
            return Err(Error::InvalidConfig("no context kind selected".to_string()));
        }
        if self.max_span == Some(0) {
            return Err(Error::InvalidConfig("max_span must be positive".to_string()));
        }
        self.split.validate()
    }
}

fn parse_var<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    get(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("{key}={raw} is not a valid number")))
        })
        .transpose()
}
