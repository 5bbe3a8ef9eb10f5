use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::catalog::EntityCatalog;
use crate::entity::{EntityId, EntityType};

/// Above this many same-type entities an article only contributes its full
/// set; enumerating every subset would explode.
pub const MAX_ENUMERATED_ENTITIES: usize = 10;

/// Separator between names in a tuple's canonical string form.
const NAME_SEPARATOR: &str = " | ";

/// An unordered same-type set of entities, attested jointly by articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTuple {
    /// Rank-based identifier, `"1"` for the most attested tuple.
    pub id: String,
    pub entity_type: EntityType,
    /// Entities ordered by name.
    pub entities: Vec<EntityId>,
    pub names: Vec<String>,
    pub article_ids: BTreeSet<String>,
    #[serde(default)]
    pub query_ids: BTreeSet<String>,
}

impl EntityTuple {
    #[must_use]
    pub fn canonical_name(&self) -> String {
        canonical_name(&self.names)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl std::fmt::Display for EntityTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_name())
    }
}

#[must_use]
pub fn canonical_name(names: &[String]) -> String {
    names.join(NAME_SEPARATOR)
}

/// Sorted subtuples of size two or more of `names`.
///
/// Sets of two or of more than [`MAX_ENUMERATED_ENTITIES`] yield only
/// themselves. Otherwise every subset of size two or more is returned, the
/// full set included. This is what recursively removing each element and
/// unioning the results produces; enumerating bitmasks gets there without
/// revisiting shared sub-problems.
#[must_use]
pub fn subtuples(names: &BTreeSet<String>) -> BTreeSet<Vec<String>> {
    let n = names.len();
    if n < 2 {
        return BTreeSet::new();
    }
    let sorted: Vec<String> = names.iter().cloned().collect();
    if n == 2 || n > MAX_ENUMERATED_ENTITIES {
        return BTreeSet::from([sorted]);
    }

    (0u32..(1 << n))
        .filter(|mask| mask.count_ones() >= 2)
        .map(|mask| {
            sorted
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, name)| name.clone())
                .collect()
        })
        .collect()
}

/// Corpus-wide aggregation of tuples by the articles that mention them.
#[derive(Debug, Default)]
pub struct TupleIndexer {
    support: BTreeMap<(EntityType, Vec<String>), BTreeSet<String>>,
}

impl TupleIndexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every same-type subtuple of `article`'s entities.
    pub fn add_article(&mut self, article: &Article, catalog: &EntityCatalog) {
        for (entity_type, names) in article.entity_names_by_type(catalog) {
            for tuple in subtuples(&names) {
                self.support
                    .entry((entity_type, tuple))
                    .or_default()
                    .insert(article.id.clone());
            }
        }
    }

    /// Fold another indexer's support into this one.
    pub fn merge(&mut self, other: Self) {
        for (key, ids) in other.support {
            self.support.entry(key).or_default().extend(ids);
        }
    }

    #[must_use]
    pub fn tuple_count(&self) -> usize {
        self.support.len()
    }

    /// Rank by article count, then canonical form, both descending, and
    /// assign ids `"1"`, `"2"`, ... in that order.
    #[must_use]
    pub fn rank(self, catalog: &EntityCatalog) -> Vec<EntityTuple> {
        let mut ranked: Vec<((EntityType, Vec<String>), BTreeSet<String>)> =
            self.support.into_iter().collect();
        ranked.sort_by(|(a_key, a_ids), (b_key, b_ids)| {
            b_ids
                .len()
                .cmp(&a_ids.len())
                .then_with(|| canonical_name(&b_key.1).cmp(&canonical_name(&a_key.1)))
                .then_with(|| b_key.0.cmp(&a_key.0))
        });

        let mut tuples = Vec::with_capacity(ranked.len());
        for ((entity_type, names), article_ids) in ranked {
            let entities: Option<Vec<EntityId>> =
                names.iter().map(|name| catalog.find(name)).collect();
            let Some(entities) = entities else {
                tracing::warn!(tuple = %canonical_name(&names), "Skipping tuple with unknown entity");
                continue;
            };
            tuples.push(EntityTuple {
                id: (tuples.len() + 1).to_string(),
                entity_type,
                entities,
                names,
                article_ids,
                query_ids: BTreeSet::new(),
            });
        }
        tuples
    }
}

/// Build the ranked tuple list for a whole corpus.
pub fn index_corpus<'a>(
    articles: impl IntoIterator<Item = &'a Article>,
    catalog: &EntityCatalog,
) -> Vec<EntityTuple> {
    let mut indexer = TupleIndexer::new();
    for article in articles {
        indexer.add_article(article, catalog);
    }
    tracing::debug!(tuples = indexer.tuple_count(), "indexed corpus tuples");
    indexer.rank(catalog)
}
