use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::article::Mention;
use crate::catalog::EntityCatalog;
use crate::entity::{Entity, EntityId};
use crate::input::RawChain;
use crate::standardize::names_match;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreferenceChain {
    pub mentions: Vec<Mention>,
    pub sentences: BTreeSet<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityId>,
}

impl CoreferenceChain {
    #[must_use]
    pub fn touches(&self, first: usize, last: usize) -> bool {
        self.sentences.range(first..=last).next().is_some()
    }
}

/// Coreference chains of one article, each resolved to at most one of the
/// article's entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreferenceIndex {
    chains: Vec<CoreferenceChain>,
}

impl CoreferenceIndex {
    /// Index the reader's chains against the article's entities.
    ///
    /// Representative mentions are tried first, then the rest in order; the
    /// first mention whose text matches an entity fixes the resolution and
    /// any later candidate is ignored.
    #[must_use]
    pub fn build(raw: Vec<RawChain>, entities: &[EntityId], catalog: &EntityCatalog) -> Self {
        let candidates: Vec<&Entity> = entities.iter().filter_map(|&id| catalog.get(id)).collect();

        let chains = raw
            .into_iter()
            .filter(|chain| !chain.mentions.is_empty())
            .map(|chain| {
                let sentences = chain.mentions.iter().map(|m| m.sentence_index).collect();
                let entity = resolve(&chain.mentions, &candidates);
                CoreferenceChain {
                    mentions: chain.mentions,
                    sentences,
                    entity,
                }
            })
            .collect();

        Self { chains }
    }

    #[must_use]
    pub fn from_chains(chains: Vec<CoreferenceChain>) -> Self {
        Self { chains }
    }

    pub fn chains(&self) -> impl Iterator<Item = &CoreferenceChain> {
        self.chains.iter()
    }

    /// Chains resolved to some entity, paired with it.
    pub fn resolved<'a>(
        &'a self,
        catalog: &'a EntityCatalog,
    ) -> impl Iterator<Item = (&'a CoreferenceChain, &'a Entity)> + 'a {
        self.chains
            .iter()
            .filter_map(move |c| c.entity.and_then(|id| catalog.get(id)).map(|e| (c, e)))
    }

    /// Sentence indices mentioning anything that matches `entity`.
    #[must_use]
    pub fn sentences_of(&self, entity: &Entity, catalog: &EntityCatalog) -> BTreeSet<usize> {
        self.resolved(catalog)
            .filter(|(_, resolved)| resolved.matches(entity))
            .flat_map(|(chain, _)| chain.sentences.iter().copied())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

fn resolve(mentions: &[Mention], candidates: &[&Entity]) -> Option<EntityId> {
    let ordered = mentions
        .iter()
        .filter(|m| m.representative)
        .chain(mentions.iter().filter(|m| !m.representative));

    for mention in ordered {
        let hit = candidates.iter().find(|entity| {
            entity.surface_forms().any(|form| {
                names_match(&mention.text, entity.entity_type, form, entity.entity_type)
            })
        });
        if let Some(entity) = hit {
            return Some(entity.id);
        }
    }
    None
}
