#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]

pub mod article;
pub mod catalog;
pub mod config;
pub mod context;
pub mod coref;
pub mod corpus;
pub mod enrich;
pub mod entity;
pub mod error;
pub mod filter;
pub mod input;
pub mod pipeline;
pub mod split;
pub mod standardize;
pub mod stats;
pub mod tuple;

pub use article::{Article, Incompleteness, Mention, Sentence, Token};
pub use catalog::EntityCatalog;
pub use config::PipelineConfig;
pub use context::{Context, ContextKind, ContextRequest, ContextSpan, ContextWindowFinder};
pub use coref::{CoreferenceChain, CoreferenceIndex};
pub use corpus::{Corpus, Query};
pub use enrich::{
    enrich_catalog, EnrichmentReport, EnrichmentSource, JsonEnrichmentSource, LookupError,
};
pub use entity::{Enrichment, Entity, EntityId, EntityType};
pub use error::{Error, Result};
pub use filter::{clean_articles, ArticleCriterion, CorpusFilter, FilterReport, SupportThreshold};
pub use input::{RawArticle, RawChain, RawEntity, RawSentence};
pub use pipeline::{Pipeline, PipelineReport};
pub use split::{Split, SplitConfig};
pub use standardize::{contains_flexibly, names_match, primary_form, standardize, surname_form};
pub use stats::{Stats, StatsKind};
pub use tuple::{index_corpus, subtuples, EntityTuple, TupleIndexer};
