use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::EntityCatalog;
use crate::context::Context;
use crate::coref::CoreferenceIndex;
use crate::entity::{EntityId, EntityType};
use crate::input::{clean_abstract, RawArticle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ner: Option<String>,
}

impl Token {
    #[must_use]
    pub fn word(word: &str) -> Self {
        Self {
            word: word.to_string(),
            lemma: None,
            pos: None,
            ner: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub index: usize,
    pub tokens: Vec<Token>,
}

impl Sentence {
    #[must_use]
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.word.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One textual mention inside a coreference chain. Token offsets are
/// relative to the sentence, end-exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub sentence_index: usize,
    pub token_start: usize,
    pub token_end: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub representative: bool,
}

impl Mention {
    #[must_use]
    pub fn new(sentence_index: usize, token_start: usize, token_end: usize, text: &str) -> Self {
        Self {
            sentence_index,
            token_start,
            token_end,
            text: text.to_string(),
            representative: false,
        }
    }

    #[must_use]
    pub const fn representative(mut self) -> Self {
        self.representative = true;
        self
    }
}

/// Why an article cannot take part in context discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Incompleteness {
    MissingAnnotations,
    EmptyAbstract,
    NoEntities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Sorted, unique handles into the catalog.
    pub entities: Vec<EntityId>,
    pub sentences: BTreeMap<usize, Sentence>,
    pub coreferences: CoreferenceIndex,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub incomplete: BTreeSet<Incompleteness>,
    /// Contexts found for each tuple, keyed by tuple id then context id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, BTreeMap<String, Context>>,
}

impl Article {
    /// Build an article from reader output, registering its entities.
    ///
    /// Entity sightings that conflict with an earlier registration are logged
    /// and dropped; the article keeps the rest.
    pub fn load(raw: RawArticle, catalog: &mut EntityCatalog) -> Self {
        let mut entities = BTreeSet::new();
        for entity in &raw.entities {
            match catalog.register(&entity.name, entity.entity_type) {
                Ok(id) => {
                    entities.insert(id);
                }
                Err(e) => {
                    tracing::warn!(article = %raw.id, "Ignoring entity sighting: {}", e);
                }
            }
        }
        let entities: Vec<EntityId> = entities.into_iter().collect();

        let mut incomplete = BTreeSet::new();

        let abstract_text = raw
            .abstract_text
            .as_deref()
            .map(clean_abstract)
            .filter(|a| !a.is_empty());
        if abstract_text.is_none() {
            incomplete.insert(Incompleteness::EmptyAbstract);
        }
        if entities.is_empty() {
            incomplete.insert(Incompleteness::NoEntities);
        }

        let sentences: BTreeMap<usize, Sentence> = match raw.sentences {
            Some(raw_sentences) => raw_sentences
                .into_iter()
                .map(|s| {
                    let index = s.index;
                    (
                        index,
                        Sentence {
                            index,
                            tokens: s.into_tokens(),
                        },
                    )
                })
                .collect(),
            None => {
                incomplete.insert(Incompleteness::MissingAnnotations);
                BTreeMap::new()
            }
        };

        let coreferences = CoreferenceIndex::build(
            raw.coreference_chains.unwrap_or_default(),
            &entities,
            catalog,
        );

        Self {
            id: raw.id,
            title: raw.title,
            date: raw.date,
            abstract_text,
            entities,
            sentences,
            coreferences,
            incomplete,
            contexts: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }

    /// Whether at least two of the article's entities share a type.
    #[must_use]
    pub fn has_same_type_pair(&self, catalog: &EntityCatalog) -> bool {
        let mut counts: BTreeMap<EntityType, usize> = BTreeMap::new();
        for entity in self.entities.iter().filter_map(|&id| catalog.get(id)) {
            *counts.entry(entity.entity_type).or_default() += 1;
        }
        counts.values().any(|&n| n >= 2)
    }

    /// Group the article's entity names by type, each group sorted.
    #[must_use]
    pub fn entity_names_by_type(&self, catalog: &EntityCatalog) -> BTreeMap<EntityType, BTreeSet<String>> {
        let mut groups: BTreeMap<EntityType, BTreeSet<String>> = BTreeMap::new();
        for entity in self.entities.iter().filter_map(|&id| catalog.get(id)) {
            groups
                .entry(entity.entity_type)
                .or_default()
                .insert(entity.name.clone());
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawChain;

    fn raw_article() -> RawArticle {
        RawArticle::new("a1")
            .with_abstract("Alice and Bob in Paris; photo")
            .with_entity("Alice", EntityType::Person)
            .with_entity("Bob", EntityType::Person)
            .with_entity("Paris", EntityType::Location)
            .with_sentences(&["Alice visited Paris.", "Bob called Alice."])
            .with_chain(RawChain::default().with_mention(Mention::new(0, 0, 1, "Alice")))
    }

    #[test]
    fn test_load_registers_entities_and_sentences() {
        let mut catalog = EntityCatalog::new();
        let article = Article::load(raw_article(), &mut catalog);

        assert_eq!(article.entities.len(), 3);
        assert_eq!(catalog.len(), 3);
        assert_eq!(article.abstract_text.as_deref(), Some("Alice and Bob in Paris"));
        assert_eq!(article.sentences[&1].text(), "Bob called Alice.");
        assert!(article.is_complete());
        assert!(article.has_same_type_pair(&catalog));
    }

    #[test]
    fn test_load_shares_entities_across_articles() {
        let mut catalog = EntityCatalog::new();
        let first = Article::load(raw_article(), &mut catalog);
        let second = Article::load(
            RawArticle::new("a2").with_entity("Paris", EntityType::Location),
            &mut catalog,
        );

        assert_eq!(catalog.len(), 3);
        assert!(first.entities.contains(&second.entities[0]));
    }

    #[test]
    fn test_load_marks_incomplete_data() {
        let mut catalog = EntityCatalog::new();
        let article = Article::load(RawArticle::new("a3"), &mut catalog);

        assert!(!article.is_complete());
        assert!(article.incomplete.contains(&Incompleteness::MissingAnnotations));
        assert!(article.incomplete.contains(&Incompleteness::EmptyAbstract));
        assert!(article.incomplete.contains(&Incompleteness::NoEntities));
    }

    #[test]
    fn test_load_drops_conflicting_sighting() {
        let mut catalog = EntityCatalog::new();
        catalog.register("Jordan", EntityType::Location).unwrap();

        let article = Article::load(
            RawArticle::new("a4")
                .with_entity("Jordan", EntityType::Person)
                .with_entity("Pippen", EntityType::Person),
            &mut catalog,
        );

        assert_eq!(article.entities.len(), 1);
        assert_eq!(catalog.name(article.entities[0]), Some("Pippen"));
        assert!(!article.has_same_type_pair(&catalog));
    }

    #[test]
    fn test_entity_names_by_type() {
        let mut catalog = EntityCatalog::new();
        let article = Article::load(raw_article(), &mut catalog);
        let groups = article.entity_names_by_type(&catalog);

        let persons: Vec<&str> = groups[&EntityType::Person].iter().map(String::as_str).collect();
        assert_eq!(persons, vec!["Alice", "Bob"]);
        assert_eq!(groups[&EntityType::Location].len(), 1);
    }
}
