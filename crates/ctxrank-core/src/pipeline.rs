//! Stage orchestration from reader output to ranking-task queries.
//!
//! Stages run in this order: load, clean articles, compute tuples, filter on
//! article support, enrich (optional), compute contexts, filter on query
//! support, compute queries. Each stage can also be called on its own, e.g. to enrich the
//! catalog between stages or to resume from a saved [`Corpus`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::article::Article;
use crate::config::PipelineConfig;
use crate::context::{Context, ContextRequest, ContextWindowFinder};
use crate::corpus::{Corpus, Query};
use crate::enrich::{enrich_catalog, EnrichmentReport, EnrichmentSource};
use crate::entity::Entity;
use crate::filter::{clean_articles, CorpusFilter, FilterReport, SupportThreshold};
use crate::input::RawArticle;
use crate::split::Split;
use crate::tuple::index_corpus;
use crate::Result;

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub loaded: usize,
    pub cleaned: usize,
    pub tuples: usize,
    pub article_filter: FilterReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentReport>,
    pub contexts: usize,
    pub query_filter: FilterReport,
    pub queries: usize,
}

/// Counts from the stages before context computation.
struct EarlyStages {
    loaded: usize,
    cleaned: usize,
    tuples: usize,
    article_filter: FilterReport,
}

pub struct Pipeline {
    config: PipelineConfig,
    finder: ContextWindowFinder,
    corpus: Corpus,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_corpus(config, Corpus::new())
    }

    /// Resume from a saved snapshot.
    pub fn with_corpus(config: PipelineConfig, corpus: Corpus) -> Result<Self> {
        config.validate()?;
        let finder = ContextWindowFinder {
            max_span: config.max_span,
        };
        Ok(Self {
            config,
            finder,
            corpus,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub const fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[must_use]
    pub fn into_corpus(self) -> Corpus {
        self.corpus
    }

    /// Run every stage up to query computation.
    pub fn run(&mut self, articles: impl IntoIterator<Item = RawArticle>) -> PipelineReport {
        let early = self.run_until_contexts(articles);
        self.run_from_contexts(early, None)
    }

    /// Like [`Pipeline::run`], enriching the entities that survive the
    /// article-support filter before contexts are computed.
    pub async fn run_with_enrichment(
        &mut self,
        articles: impl IntoIterator<Item = RawArticle>,
        source: &dyn EnrichmentSource,
    ) -> PipelineReport {
        let early = self.run_until_contexts(articles);
        let enrichment = self.enrich(source).await;
        self.run_from_contexts(early, Some(enrichment))
    }

    fn run_until_contexts(&mut self, articles: impl IntoIterator<Item = RawArticle>) -> EarlyStages {
        let loaded = self.load(articles);
        let cleaned = self.clean_articles();
        let tuples = self.compute_tuples();
        let article_filter = self.filter(SupportThreshold::MinArticles(self.config.min_articles));
        EarlyStages {
            loaded,
            cleaned,
            tuples,
            article_filter,
        }
    }

    fn run_from_contexts(
        &mut self,
        early: EarlyStages,
        enrichment: Option<EnrichmentReport>,
    ) -> PipelineReport {
        let contexts = self.compute_contexts();
        let query_filter = self.filter(SupportThreshold::MinQueries(self.config.min_queries));
        let queries = self.compute_queries();

        PipelineReport {
            loaded: early.loaded,
            cleaned: early.cleaned,
            tuples: early.tuples,
            article_filter: early.article_filter,
            enrichment,
            contexts,
            query_filter,
            queries,
        }
    }

    /// Register each article's entities and index its chains. Articles whose
    /// id was already loaded are skipped.
    pub fn load(&mut self, articles: impl IntoIterator<Item = RawArticle>) -> usize {
        let mut loaded = 0;
        for raw in articles {
            if self.corpus.articles.contains_key(&raw.id) {
                tracing::warn!(article = %raw.id, "Skipping duplicate article");
                continue;
            }
            let article = Article::load(raw, &mut self.corpus.catalog);
            if !article.is_complete() {
                tracing::debug!(article = %article.id, missing = ?article.incomplete, "Loaded incomplete article");
            }
            self.corpus.articles.insert(article.id.clone(), article);
            loaded += 1;
        }
        tracing::info!(articles = loaded, entities = self.corpus.catalog.len(), "Loaded articles");
        loaded
    }

    pub fn clean_articles(&mut self) -> usize {
        self.config
            .article_criteria
            .iter()
            .map(|&criterion| clean_articles(&mut self.corpus, criterion))
            .sum()
    }

    pub fn compute_tuples(&mut self) -> usize {
        self.corpus.tuples = index_corpus(self.corpus.articles.values(), &self.corpus.catalog);
        tracing::info!(tuples = self.corpus.tuples.len(), "Computed tuples");
        self.corpus.tuples.len()
    }

    pub fn filter(&mut self, threshold: SupportThreshold) -> FilterReport {
        CorpusFilter::new(threshold).apply(&mut self.corpus)
    }

    pub async fn enrich(&mut self, source: &dyn EnrichmentSource) -> EnrichmentReport {
        enrich_catalog(&mut self.corpus.catalog, source).await
    }

    /// Find the contexts of every (tuple, article) pair and record the
    /// resulting query ids on each tuple. Replaces earlier results.
    pub fn compute_contexts(&mut self) -> usize {
        let Corpus {
            articles,
            catalog,
            tuples,
            ..
        } = &mut self.corpus;
        let catalog = &*catalog;

        for article in articles.values_mut() {
            article.contexts.clear();
        }

        let mut found: Vec<(String, String, BTreeMap<String, Context>)> = Vec::new();
        for tuple in tuples.iter_mut() {
            tuple.query_ids.clear();
            let entities: Vec<&Entity> = tuple.entities.iter().filter_map(|&id| catalog.get(id)).collect();
            if entities.len() != tuple.entities.len() {
                tracing::warn!(tuple = %tuple, "Skipping tuple with entities missing from catalog");
                continue;
            }

            for article_id in &tuple.article_ids {
                let Some(article) = articles.get(article_id) else {
                    continue;
                };
                let request = ContextRequest {
                    entities: &entities,
                    article,
                    catalog,
                };
                let contexts = self.finder.contexts(&self.config.context_kinds, &request);
                if contexts.is_empty() {
                    continue;
                }
                tuple.query_ids.extend(
                    contexts
                        .keys()
                        .map(|context_id| Query::make_id(article_id, &tuple.id, context_id)),
                );
                found.push((article_id.clone(), tuple.id.clone(), contexts));
            }
        }

        let mut total = 0;
        for (article_id, tuple_id, contexts) in found {
            total += contexts.len();
            if let Some(article) = articles.get_mut(&article_id) {
                article.contexts.insert(tuple_id, contexts);
            }
        }
        tracing::info!(contexts = total, "Computed contexts");
        total
    }

    pub fn compute_queries(&mut self) -> usize {
        let mut queries = BTreeMap::new();
        for tuple in &self.corpus.tuples {
            for article_id in &tuple.article_ids {
                let Some(contexts) = self
                    .corpus
                    .articles
                    .get(article_id)
                    .and_then(|a| a.contexts.get(&tuple.id))
                else {
                    continue;
                };
                for (context_id, context) in contexts {
                    let id = Query::make_id(article_id, &tuple.id, context_id);
                    queries.insert(
                        id.clone(),
                        Query {
                            id,
                            tuple_id: tuple.id.clone(),
                            article_id: article_id.clone(),
                            entities: tuple.names.clone(),
                            context: context.clone(),
                        },
                    );
                }
            }
        }
        self.corpus.queries = queries;
        tracing::info!(queries = self.corpus.queries.len(), "Computed queries");
        self.corpus.queries.len()
    }

    /// Train, valid and test sets of the computed queries.
    pub fn split(&self) -> Result<Split<Query>> {
        self.config
            .split
            .split(self.corpus.queries.values().cloned().collect())
    }
}
