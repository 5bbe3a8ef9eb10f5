use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::catalog::EntityCatalog;
use crate::context::Context;
use crate::error::Result;
use crate::tuple::EntityTuple;

/// One (tuple, article, context) sample for the ranking task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// `"<article_id>_<tuple_id>_<context_id>"`.
    pub id: String,
    pub tuple_id: String,
    pub article_id: String,
    pub entities: Vec<String>,
    pub context: Context,
}

impl Query {
    #[must_use]
    pub fn make_id(article_id: &str, tuple_id: &str, context_id: &str) -> String {
        format!("{article_id}_{tuple_id}_{context_id}")
    }
}

/// Every collection the pipeline works on, serializable as one snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    pub articles: BTreeMap<String, Article>,
    pub catalog: EntityCatalog,
    #[serde(default)]
    pub tuples: Vec<EntityTuple>,
    #[serde(default)]
    pub queries: BTreeMap<String, Query>,
}

impl Corpus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tuple(&self, id: &str) -> Option<&EntityTuple> {
        self.tuples.iter().find(|t| t.id == id)
    }

    /// Write the snapshot as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
