//! Pruning of articles, tuples and entities against a support threshold.
//!
//! [`CorpusFilter::apply`] is a single consistency pass. Tuples are kept on
//! their counts before the pass; articles and entities are kept when some
//! surviving tuple references them. Removing articles does not re-check the
//! surviving tuples, so a later stage may leave a tuple below a threshold it
//! once met. Run the filter again after each stage that changes support.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::catalog::EntityCatalog;
use crate::corpus::Corpus;
use crate::entity::EntityId;
use crate::tuple::EntityTuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by", content = "min")]
pub enum SupportThreshold {
    MinArticles(usize),
    MinQueries(usize),
}

impl SupportThreshold {
    #[must_use]
    pub const fn minimum(&self) -> usize {
        match self {
            Self::MinArticles(k) | Self::MinQueries(k) => *k,
        }
    }

    #[must_use]
    pub fn support(&self, tuple: &EntityTuple) -> usize {
        match self {
            Self::MinArticles(_) => tuple.article_ids.len(),
            Self::MinQueries(_) => tuple.query_ids.len(),
        }
    }

    #[must_use]
    pub fn is_met(&self, tuple: &EntityTuple) -> bool {
        self.support(tuple) >= self.minimum()
    }
}

impl std::fmt::Display for SupportThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MinArticles(k) => write!(f, "min_articles={k}"),
            Self::MinQueries(k) => write!(f, "min_queries={k}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub threshold: SupportThreshold,
    pub tuples_kept: usize,
    pub tuples_removed: usize,
    pub articles_kept: usize,
    pub articles_removed: usize,
    pub entities_kept: usize,
    pub entities_removed: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct CorpusFilter {
    threshold: SupportThreshold,
}

impl CorpusFilter {
    #[must_use]
    pub const fn new(threshold: SupportThreshold) -> Self {
        Self { threshold }
    }

    pub fn apply(&self, corpus: &mut Corpus) -> FilterReport {
        let tuples_before = corpus.tuples.len();
        let articles_before = corpus.articles.len();

        corpus.tuples.retain(|t| self.threshold.is_met(t));

        let mut keep_tuples: BTreeSet<&str> = BTreeSet::new();
        let mut keep_articles: BTreeSet<String> = BTreeSet::new();
        let mut keep_entities: BTreeSet<EntityId> = BTreeSet::new();
        for tuple in &corpus.tuples {
            keep_tuples.insert(tuple.id.as_str());
            keep_articles.extend(tuple.article_ids.iter().cloned());
            keep_entities.extend(tuple.entities.iter().copied());
        }

        corpus.articles.retain(|id, _| keep_articles.contains(id));
        for article in corpus.articles.values_mut() {
            article.contexts.retain(|tuple_id, _| keep_tuples.contains(tuple_id.as_str()));
        }
        corpus.queries.retain(|_, q| {
            keep_tuples.contains(q.tuple_id.as_str()) && keep_articles.contains(&q.article_id)
        });
        let entities_removed = corpus.catalog.retain(&keep_entities);

        let report = FilterReport {
            threshold: self.threshold,
            tuples_kept: corpus.tuples.len(),
            tuples_removed: tuples_before - corpus.tuples.len(),
            articles_kept: corpus.articles.len(),
            articles_removed: articles_before - corpus.articles.len(),
            entities_kept: corpus.catalog.len(),
            entities_removed,
        };
        tracing::info!(
            threshold = %self.threshold,
            tuples = report.tuples_kept,
            articles = report.articles_kept,
            entities = report.entities_kept,
            "Filtered corpus"
        );
        report
    }
}

/// Reasons to drop an article before tuples are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleCriterion {
    /// Missing annotations, empty abstract or no entities.
    Incomplete,
    /// No two entities share a type, so no tuple can come from it.
    NoSameTypePair,
}

impl ArticleCriterion {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::NoSameTypePair => "no_same_type_pair",
        }
    }

    #[must_use]
    pub fn applies(self, article: &Article, catalog: &EntityCatalog) -> bool {
        match self {
            Self::Incomplete => !article.is_complete(),
            Self::NoSameTypePair => !article.has_same_type_pair(catalog),
        }
    }
}

/// Remove every article meeting `criterion`, returning how many went.
pub fn clean_articles(corpus: &mut Corpus, criterion: ArticleCriterion) -> usize {
    let before = corpus.articles.len();
    let catalog = &corpus.catalog;
    corpus.articles.retain(|id, article| {
        let drop = criterion.applies(article, catalog);
        if drop {
            tracing::debug!(article = %id, criterion = criterion.as_str(), "Dropping article");
        }
        !drop
    });
    let removed = before - corpus.articles.len();
    tracing::info!(criterion = criterion.as_str(), removed, "Cleaned articles");
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::input::RawArticle;
    use crate::tuple::index_corpus;

    fn corpus() -> Corpus {
        let mut corpus = Corpus::new();
        let raws = vec![
            RawArticle::new("1")
                .with_entity("Alice", EntityType::Person)
                .with_entity("Bob", EntityType::Person),
            RawArticle::new("2")
                .with_entity("Alice", EntityType::Person)
                .with_entity("Bob", EntityType::Person),
            RawArticle::new("3")
                .with_entity("Carol", EntityType::Person)
                .with_entity("Dave", EntityType::Person),
            RawArticle::new("4").with_entity("Paris", EntityType::Location),
        ];
        for raw in raws {
            let article = Article::load(raw, &mut corpus.catalog);
            corpus.articles.insert(article.id.clone(), article);
        }
        corpus.tuples = index_corpus(corpus.articles.values(), &corpus.catalog);
        corpus
    }

    #[test]
    fn test_min_articles_prunes_all_three_collections() {
        let mut corpus = corpus();
        let report = CorpusFilter::new(SupportThreshold::MinArticles(2)).apply(&mut corpus);

        assert_eq!(report.tuples_kept, 1);
        assert_eq!(report.tuples_removed, 1);
        assert_eq!(report.articles_removed, 2);
        assert_eq!(report.entities_removed, 3);
        assert_eq!(corpus.tuples[0].canonical_name(), "Alice | Bob");
        assert_eq!(corpus.articles.keys().collect::<Vec<_>>(), vec!["1", "2"]);
        assert!(corpus.catalog.find("Carol").is_none());
    }

    #[test]
    fn test_filter_consistency() {
        let mut corpus = corpus();
        let k = 2;
        CorpusFilter::new(SupportThreshold::MinArticles(k)).apply(&mut corpus);

        for tuple in &corpus.tuples {
            assert!(tuple.article_ids.len() >= k);
        }
        for id in corpus.articles.keys() {
            assert!(corpus.tuples.iter().any(|t| t.article_ids.contains(id)));
        }
        for entity in corpus.catalog.all() {
            assert!(corpus.tuples.iter().any(|t| t.entities.contains(&entity.id)));
        }
    }

    #[test]
    fn test_min_queries_uses_query_support() {
        let mut corpus = corpus();
        corpus.tuples[1].query_ids.insert("3_2_0".to_string());

        let report = CorpusFilter::new(SupportThreshold::MinQueries(1)).apply(&mut corpus);

        assert_eq!(report.tuples_kept, 1);
        assert_eq!(corpus.tuples[0].canonical_name(), "Carol | Dave");
        assert_eq!(corpus.articles.keys().collect::<Vec<_>>(), vec!["3"]);
    }

    #[test]
    fn test_zero_threshold_keeps_tuples_and_drops_orphans() {
        let mut corpus = corpus();
        let report = CorpusFilter::new(SupportThreshold::MinArticles(0)).apply(&mut corpus);

        assert_eq!(report.tuples_removed, 0);
        // Article 4 has no tuple.
        assert_eq!(report.articles_removed, 1);
        assert!(corpus.catalog.find("Paris").is_none());
    }

    #[test]
    fn test_clean_articles_by_criterion() {
        let mut corpus = corpus();
        let removed = clean_articles(&mut corpus, ArticleCriterion::NoSameTypePair);
        assert_eq!(removed, 1);
        assert!(!corpus.articles.contains_key("4"));

        // None of the fixture articles carry annotations.
        let removed = clean_articles(&mut corpus, ArticleCriterion::Incomplete);
        assert_eq!(removed, 3);
        assert!(corpus.articles.is_empty());
    }

    #[test]
    fn test_threshold_display() {
        assert_eq!(SupportThreshold::MinArticles(3).to_string(), "min_articles=3");
        assert_eq!(SupportThreshold::MinQueries(1).minimum(), 1);
    }
}
