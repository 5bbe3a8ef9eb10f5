use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Location,
    Person,
    #[serde(alias = "org")]
    Organization,
}

impl EntityType {
    pub const ALL: [Self; 3] = [Self::Location, Self::Person, Self::Organization];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Person => "person",
            Self::Organization => "organization",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "location" => Ok(Self::Location),
            "person" => Ok(Self::Person),
            "organization" | "org" => Ok(Self::Organization),
            _ => Err(crate::Error::InvalidEntityType(s.to_string())),
        }
    }
}

/// Handle into the [`EntityCatalog`](crate::catalog::EntityCatalog).
///
/// Articles and tuples only ever hold these; the catalog owns the entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Background information attached to an entity by an
/// [`EnrichmentSource`](crate::enrich::EnrichmentSource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Whether the looked-up page is known to be about this exact entity.
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub aliases: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
}

impl Entity {
    #[must_use]
    pub const fn new(id: EntityId, name: String, entity_type: EntityType) -> Self {
        Self {
            id,
            name,
            entity_type,
            aliases: BTreeSet::new(),
            enrichment: None,
        }
    }

    /// Heuristic identity check, see [`crate::standardize::names_match`].
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        crate::standardize::names_match(
            &self.name,
            self.entity_type,
            &other.name,
            other.entity_type,
        )
    }

    /// Every raw form this entity has been seen under, its own name first.
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}
