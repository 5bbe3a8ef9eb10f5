//! Shapes handed to the core by the corpus reader.
//!
//! XML parsing of the source corpus happens upstream; these types describe
//! what that reader produces for one article.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::article::{Mention, Token};
use crate::entity::EntityType;

/// Trailing abstract segments that only describe attached media.
const MEDIA_SUFFIXES: &[&str] = &["photo", "photos", "portrait", "portraits", "map", "maps"];

/// Size markers the corpus appends to abstracts.
const SIZE_MARKERS: &[&str] = &[" (M)", " (L)", " (S)"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl RawEntity {
    #[must_use]
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSentence {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<Token>,
    /// Plain text, used to derive whitespace tokens when `tokens` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RawSentence {
    #[must_use]
    pub fn from_text(index: usize, text: &str) -> Self {
        Self {
            index,
            tokens: Vec::new(),
            text: Some(text.to_string()),
        }
    }

    #[must_use]
    pub fn into_tokens(self) -> Vec<Token> {
        if !self.tokens.is_empty() {
            return self.tokens;
        }
        self.text
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(Token::word)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawChain {
    pub mentions: Vec<Mention>,
}

impl RawChain {
    #[must_use]
    pub fn with_mention(mut self, mention: Mention) -> Self {
        self.mentions.push(mention);
        self
    }
}

/// One article as produced by the corpus reader.
///
/// `sentences` and `coreference_chains` are `None` when the annotation file
/// for the article was missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub entities: Vec<RawEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentences: Option<Vec<RawSentence>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coreference_chains: Option<Vec<RawChain>>,
}

impl RawArticle {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            date: None,
            abstract_text: None,
            entities: Vec::new(),
            sentences: None,
            coreference_chains: None,
        }
    }

    #[must_use]
    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_entity(mut self, name: impl Into<String>, entity_type: EntityType) -> Self {
        self.entities.push(RawEntity::new(name, entity_type));
        self
    }

    #[must_use]
    pub fn with_sentences(mut self, texts: &[&str]) -> Self {
        self.sentences = Some(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| RawSentence::from_text(i, t))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn with_chain(mut self, chain: RawChain) -> Self {
        self.coreference_chains.get_or_insert_with(Vec::new).push(chain);
        self
    }
}

/// Strip size markers and trailing media captions from a corpus abstract.
#[must_use]
pub fn clean_abstract(raw: &str) -> String {
    let text = SIZE_MARKERS
        .iter()
        .fold(raw.to_string(), |text, marker| text.replace(marker, ""));

    let mut parts: Vec<&str> = text.split("; ").collect();
    while parts.len() > 1
        && parts
            .last()
            .is_some_and(|last| MEDIA_SUFFIXES.contains(&last.trim()))
    {
        parts.pop();
    }
    if parts.len() == 1 && MEDIA_SUFFIXES.contains(&parts[0].trim()) {
        return String::new();
    }

    parts.join("; ").trim().to_string()
}
