//! Discovery of the article excerpts that jointly attest every entity of a
//! tuple.
//!
//! Two kinds of context exist. Sentence windows come from a covering search
//! over the sentences each tuple entity is mentioned in (through resolved
//! coreference chains). The abstract context is a separate, lenient check
//! that every entity name appears in the article's abstract.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::article::{Article, Sentence};
use crate::catalog::EntityCatalog;
use crate::coref::CoreferenceChain;
use crate::entity::Entity;
use crate::standardize::contains_flexibly;

/// Identifier of the abstract context within an article.
pub const ABSTRACT_CONTEXT_ID: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Abstract,
    NeighboringSentences,
}

/// Signature shared by every context builder in the dispatch table.
pub type ContextBuilder = fn(&ContextWindowFinder, &ContextRequest<'_>) -> Vec<Context>;

impl ContextKind {
    pub const ALL: [Self; 2] = [Self::Abstract, Self::NeighboringSentences];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::NeighboringSentences => "neighboring_sentences",
        }
    }

    #[must_use]
    pub fn builder(self) -> ContextBuilder {
        match self {
            Self::Abstract => ContextWindowFinder::abstract_contexts,
            Self::NeighboringSentences => ContextWindowFinder::window_contexts,
        }
    }
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContextKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abstract" => Ok(Self::Abstract),
            "neighboring_sentences" | "neigh_sent" => Ok(Self::NeighboringSentences),
            _ => Err(crate::Error::InvalidConfig(format!("unknown context kind: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextSpan {
    Abstract,
    Sentences { first: usize, last: usize },
}

/// An immutable snapshot of the excerpt attesting one tuple in one article.
///
/// Sentences and chains are owned copies: contexts for different tuples may
/// cover the same sentences and never share them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    pub span: ContextSpan,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sentences: BTreeMap<usize, Sentence>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Chains touching the context, keyed by the tuple entity they resolve to.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entity_chains: BTreeMap<String, Vec<CoreferenceChain>>,
}

impl Context {
    #[must_use]
    pub fn text(&self) -> String {
        match self.span {
            ContextSpan::Abstract => self.abstract_text.clone().unwrap_or_default(),
            ContextSpan::Sentences { .. } => self
                .sentences
                .values()
                .map(Sentence::text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// One (tuple, article) pair to search.
#[derive(Debug, Clone, Copy)]
pub struct ContextRequest<'a> {
    pub entities: &'a [&'a Entity],
    pub article: &'a Article,
    pub catalog: &'a EntityCatalog,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextWindowFinder {
    /// Largest number of sentences a window may cover, counted from its
    /// starting sentence. `None` leaves windows unbounded.
    pub max_span: Option<usize>,
}

impl ContextWindowFinder {
    #[must_use]
    pub const fn new() -> Self {
        Self { max_span: None }
    }

    #[must_use]
    pub const fn with_max_span(mut self, max_span: usize) -> Self {
        self.max_span = Some(max_span);
        self
    }

    /// Run every requested builder and key the results by context id.
    #[must_use]
    pub fn contexts(&self, kinds: &[ContextKind], request: &ContextRequest<'_>) -> BTreeMap<String, Context> {
        kinds
            .iter()
            .flat_map(|kind| kind.builder()(self, request))
            .map(|c| (c.id.clone(), c))
            .collect()
    }

    /// Sentence index to the tuple positions mentioned there.
    #[must_use]
    pub fn mention_map(request: &ContextRequest<'_>) -> BTreeMap<usize, BTreeSet<usize>> {
        let mut map: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for (chain, resolved) in request.article.coreferences.resolved(request.catalog) {
            for (position, entity) in request.entities.iter().enumerate() {
                if resolved.matches(entity) {
                    for &sentence in &chain.sentences {
                        map.entry(sentence).or_default().insert(position);
                    }
                }
            }
        }
        map
    }

    /// Minimal covering spans for `arity` tuple positions.
    ///
    /// From every mentioning sentence, walk forward until every position has
    /// been seen. The span runs from the first to the last sentence that
    /// contributed a position not seen before. Starts whose walk never
    /// covers every position yield nothing.
    #[must_use]
    pub fn find_spans(
        &self,
        arity: usize,
        mentions: &BTreeMap<usize, BTreeSet<usize>>,
    ) -> BTreeSet<(usize, usize)> {
        let mut spans = BTreeSet::new();
        if arity == 0 {
            return spans;
        }

        for &start in mentions.keys() {
            let mut unseen: BTreeSet<usize> = (0..arity).collect();
            let mut contributors: Vec<usize> = Vec::new();

            for (&index, positions) in mentions.range(start..) {
                if self.max_span.is_some_and(|max| index - start >= max) {
                    break;
                }
                let before = unseen.len();
                for position in positions {
                    unseen.remove(position);
                }
                if unseen.len() < before {
                    contributors.push(index);
                }
                if unseen.is_empty() {
                    if let (Some(&first), Some(&last)) = (contributors.first(), contributors.last()) {
                        spans.insert((first, last));
                    }
                    break;
                }
            }
        }

        spans
    }

    /// Sentence-window contexts, ids `"<first>_<last>"`.
    #[must_use]
    pub fn window_contexts(&self, request: &ContextRequest<'_>) -> Vec<Context> {
        let mentions = Self::mention_map(request);
        let spans = self.find_spans(request.entities.len(), &mentions);

        spans
            .into_iter()
            .map(|(first, last)| Self::materialize(request, first, last))
            .collect()
    }

    fn materialize(request: &ContextRequest<'_>, first: usize, last: usize) -> Context {
        let sentences: BTreeMap<usize, Sentence> = request
            .article
            .sentences
            .range(first..=last)
            .map(|(&index, sentence)| (index, sentence.clone()))
            .collect();

        let mut entity_chains = BTreeMap::new();
        for entity in request.entities {
            let chains: Vec<CoreferenceChain> = request
                .article
                .coreferences
                .resolved(request.catalog)
                .filter(|(chain, resolved)| resolved.name == entity.name && chain.touches(first, last))
                .map(|(chain, _)| chain.clone())
                .collect();
            entity_chains.insert(entity.name.clone(), chains);
        }

        Context {
            id: format!("{first}_{last}"),
            span: ContextSpan::Sentences { first, last },
            sentences,
            abstract_text: None,
            entity_chains,
        }
    }

    /// The abstract as a context when it names every tuple entity.
    #[must_use]
    pub fn abstract_contexts(&self, request: &ContextRequest<'_>) -> Vec<Context> {
        let Some(text) = request.article.abstract_text.as_deref() else {
            return Vec::new();
        };
        if request.entities.is_empty()
            || !request
                .entities
                .iter()
                .all(|e| contains_flexibly(&e.name, e.entity_type, text))
        {
            return Vec::new();
        }

        vec![Context {
            id: ABSTRACT_CONTEXT_ID.to_string(),
            span: ContextSpan::Abstract,
            sentences: BTreeMap::new(),
            abstract_text: Some(text.to_string()),
            entity_chains: BTreeMap::new(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Mention;
    use crate::entity::EntityType;
    use crate::input::{RawArticle, RawChain};

    fn chain(sentences: &[usize], text: &str) -> RawChain {
        sentences.iter().fold(RawChain::default(), |c, &s| {
            c.with_mention(Mention::new(s, 0, 1, text))
        })
    }

    /// The Alice/Bob/Paris article from the pipeline walkthrough.
    fn scenario() -> (EntityCatalog, Article) {
        let mut catalog = EntityCatalog::new();
        let raw = RawArticle::new("a1")
            .with_abstract("Alice and Bob meet in Paris")
            .with_entity("Alice", EntityType::Person)
            .with_entity("Bob", EntityType::Person)
            .with_entity("Paris", EntityType::Location)
            .with_sentences(&["Alice visited Paris.", "Bob called Alice.", "Paris is a city."])
            .with_chain(chain(&[0, 1], "Alice"))
            .with_chain(chain(&[1], "Bob"))
            .with_chain(chain(&[0, 2], "Paris"));
        let article = Article::load(raw, &mut catalog);
        (catalog, article)
    }

    fn entities<'a>(catalog: &'a EntityCatalog, names: &[&str]) -> Vec<&'a Entity> {
        names
            .iter()
            .map(|n| catalog.get(catalog.find(n).unwrap()).unwrap())
            .collect()
    }

    fn window_ids(finder: &ContextWindowFinder, catalog: &EntityCatalog, article: &Article, names: &[&str]) -> Vec<String> {
        let tuple = entities(catalog, names);
        let request = ContextRequest {
            entities: &tuple,
            article,
            catalog,
        };
        finder
            .window_contexts(&request)
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    fn map(entries: &[(usize, &[usize])]) -> BTreeMap<usize, BTreeSet<usize>> {
        entries
            .iter()
            .map(|(s, ps)| (*s, ps.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn test_scenario_windows() {
        let (catalog, article) = scenario();
        let finder = ContextWindowFinder::new();

        let alice_bob = window_ids(&finder, &catalog, &article, &["Alice", "Bob"]);
        assert_eq!(alice_bob, vec!["0_1", "1_1"]);

        let alice_paris = window_ids(&finder, &catalog, &article, &["Alice", "Paris"]);
        assert_eq!(alice_paris[0], "0_0");
    }

    #[test]
    fn test_window_minimality_and_dedup() {
        let finder = ContextWindowFinder::new();
        // A in {1, 4}, B in {3}
        let mentions = map(&[(1, &[0]), (3, &[1]), (4, &[0])]);
        let spans = finder.find_spans(2, &mentions);
        assert_eq!(spans, BTreeSet::from([(1, 3), (3, 4)]));
    }

    #[test]
    fn test_span_uses_contributing_sentences_only() {
        let finder = ContextWindowFinder::new();
        // Sentence 2 repeats an already-seen position and is not a contributor.
        let mentions = map(&[(0, &[0]), (2, &[0]), (5, &[1])]);
        let spans = finder.find_spans(2, &mentions);
        assert!(spans.contains(&(0, 5)));
        assert!(spans.contains(&(2, 5)));
    }

    #[test]
    fn test_identical_covers_are_deduplicated() {
        let finder = ContextWindowFinder::new();
        let mentions = map(&[(3, &[0, 1]), (4, &[0, 1])]);
        let spans = finder.find_spans(2, &mentions);
        assert_eq!(spans, BTreeSet::from([(3, 3), (4, 4)]));
    }

    #[test]
    fn test_max_span_bounds_the_walk() {
        let mentions = map(&[(1, &[0]), (3, &[1])]);
        let bounded = ContextWindowFinder::new().with_max_span(2);
        assert!(bounded.find_spans(2, &mentions).is_empty());

        let wide = ContextWindowFinder::new().with_max_span(3);
        assert_eq!(wide.find_spans(2, &mentions), BTreeSet::from([(1, 3)]));
    }

    #[test]
    fn test_unmentioned_entity_yields_no_windows() {
        let mut catalog = EntityCatalog::new();
        let raw = RawArticle::new("a2")
            .with_entity("Alice", EntityType::Person)
            .with_entity("Zoe", EntityType::Person)
            .with_sentences(&["Alice spoke.", "Alice left."])
            .with_chain(chain(&[0, 1], "Alice"));
        let article = Article::load(raw, &mut catalog);

        let ids = window_ids(&ContextWindowFinder::new(), &catalog, &article, &["Alice", "Zoe"]);
        assert!(ids.is_empty());
    }

    #[test]
    fn test_materialized_context_owns_sentences_and_chains() {
        let (catalog, mut article) = scenario();
        let tuple = entities(&catalog, &["Alice", "Bob"]);
        let request = ContextRequest {
            entities: &tuple,
            article: &article,
            catalog: &catalog,
        };
        let contexts = ContextWindowFinder::new().window_contexts(&request);
        let context = contexts.into_iter().find(|c| c.id == "0_1").unwrap();

        assert_eq!(context.span, ContextSpan::Sentences { first: 0, last: 1 });
        assert_eq!(context.sentences.len(), 2);
        assert_eq!(context.entity_chains["Alice"].len(), 1);
        assert_eq!(context.entity_chains["Bob"].len(), 1);
        assert_eq!(context.text(), "Alice visited Paris. Bob called Alice.");

        article.sentences.get_mut(&0).unwrap().tokens.clear();
        assert_eq!(context.sentences[&0].text(), "Alice visited Paris.");
    }

    #[test]
    fn test_window_keeps_sentences_between_contributors() {
        let mut catalog = EntityCatalog::new();
        let raw = RawArticle::new("a5")
            .with_entity("Alice", EntityType::Person)
            .with_entity("Bob", EntityType::Person)
            .with_sentences(&[
                "Alice arrived.",
                "It rained.",
                "Bob waited.",
                "Nothing happened.",
                "Still nothing.",
                "Alice returned.",
            ])
            .with_chain(chain(&[0], "Alice"))
            .with_chain(chain(&[2], "Bob"))
            .with_chain(chain(&[5], "Alice"));
        let article = Article::load(raw, &mut catalog);
        let tuple = entities(&catalog, &["Alice", "Bob"]);
        let request = ContextRequest {
            entities: &tuple,
            article: &article,
            catalog: &catalog,
        };

        let contexts = ContextWindowFinder::new().window_contexts(&request);
        let context = contexts.into_iter().find(|c| c.id == "0_2").unwrap();

        assert_eq!(context.span, ContextSpan::Sentences { first: 0, last: 2 });
        assert_eq!(context.sentences.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(context.text(), "Alice arrived. It rained. Bob waited.");

        let alice = &context.entity_chains["Alice"];
        assert_eq!(alice.len(), 1);
        assert!(alice[0].touches(0, 2));
        assert!(!alice[0].touches(5, 5));
        assert_eq!(context.entity_chains["Bob"].len(), 1);
    }

    #[test]
    fn test_abstract_context() {
        let (catalog, article) = scenario();
        let finder = ContextWindowFinder::new();

        let tuple = entities(&catalog, &["Alice", "Bob"]);
        let request = ContextRequest {
            entities: &tuple,
            article: &article,
            catalog: &catalog,
        };
        let contexts = finder.abstract_contexts(&request);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].id, ABSTRACT_CONTEXT_ID);
        assert_eq!(contexts[0].text(), "Alice and Bob meet in Paris");
    }

    #[test]
    fn test_abstract_context_requires_every_entity() {
        let mut catalog = EntityCatalog::new();
        let article = Article::load(
            RawArticle::new("a3")
                .with_abstract("Alice speaks")
                .with_entity("Alice", EntityType::Person)
                .with_entity("Bob", EntityType::Person),
            &mut catalog,
        );
        let tuple = entities(&catalog, &["Alice", "Bob"]);
        let request = ContextRequest {
            entities: &tuple,
            article: &article,
            catalog: &catalog,
        };
        assert!(ContextWindowFinder::new().abstract_contexts(&request).is_empty());
    }

    #[test]
    fn test_dispatch_over_kinds() {
        let (catalog, article) = scenario();
        let tuple = entities(&catalog, &["Alice", "Bob"]);
        let request = ContextRequest {
            entities: &tuple,
            article: &article,
            catalog: &catalog,
        };
        let contexts = ContextWindowFinder::new().contexts(&ContextKind::ALL, &request);
        let ids: Vec<&str> = contexts.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["0", "0_1", "1_1"]);

        let only_windows = ContextWindowFinder::new().contexts(&[ContextKind::NeighboringSentences], &request);
        assert!(!only_windows.contains_key(ABSTRACT_CONTEXT_ID));
    }

    #[test]
    fn test_context_kind_parsing() {
        assert_eq!("abstract".parse::<ContextKind>().unwrap(), ContextKind::Abstract);
        assert_eq!(
            "neigh_sent".parse::<ContextKind>().unwrap(),
            ContextKind::NeighboringSentences
        );
        assert!("paragraph".parse::<ContextKind>().is_err());
    }
}
