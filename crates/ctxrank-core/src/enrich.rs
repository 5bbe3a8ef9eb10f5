use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::EntityCatalog;
use crate::entity::{Enrichment, Entity};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Ambiguous entity name: {0}")]
    Ambiguous(String),
    #[error("Lookup failed: {0}")]
    Failed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Where background information about entities comes from.
///
/// `Ok(None)` means the source has nothing on the entity. Errors are
/// reported per entity and never abort an enrichment run.
#[async_trait::async_trait]
pub trait EnrichmentSource: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, entity: &Entity) -> LookupResult<Option<Enrichment>>;
}

/// Outcome of one enrichment run, by entity name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub found: BTreeSet<String>,
    pub not_found: BTreeSet<String>,
    pub failed: BTreeMap<String, String>,
}

impl EnrichmentReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.found.len() + self.not_found.len() + self.failed.len()
    }
}

/// Look up every entity of `catalog` that has no enrichment yet.
///
/// Entities are processed in id order, one lookup at a time.
pub async fn enrich_catalog(
    catalog: &mut EntityCatalog,
    source: &dyn EnrichmentSource,
) -> EnrichmentReport {
    let mut report = EnrichmentReport::default();
    let pending: Vec<Entity> = catalog.all().cloned().collect();

    for entity in pending {
        if entity.enrichment.is_some() {
            report.found.insert(entity.name);
            continue;
        }

        match source.lookup(&entity).await {
            Ok(Some(enrichment)) => match catalog.set_enrichment(entity.id, enrichment) {
                Ok(()) => {
                    report.found.insert(entity.name);
                }
                Err(e) => {
                    report.failed.insert(entity.name, e.to_string());
                }
            },
            Ok(None) => {
                tracing::debug!(entity = %entity.name, source = source.name(), "No enrichment found");
                report.not_found.insert(entity.name);
            }
            Err(e) => {
                tracing::warn!(entity = %entity.name, source = source.name(), "Enrichment lookup failed: {}", e);
                report.failed.insert(entity.name, e.to_string());
            }
        }
    }

    tracing::info!(
        source = source.name(),
        found = report.found.len(),
        not_found = report.not_found.len(),
        failed = report.failed.len(),
        "Enriched entities"
    );
    report
}

/// Enrichments read from a JSON object mapping entity names to entries.
///
/// Entities are looked up under their name, then under each alias.
#[derive(Debug, Clone, Default)]
pub struct JsonEnrichmentSource {
    entries: BTreeMap<String, Enrichment>,
}

impl JsonEnrichmentSource {
    #[must_use]
    pub const fn new(entries: BTreeMap<String, Enrichment>) -> Self {
        Self { entries }
    }

    pub async fn load(path: &Path) -> LookupResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        let entries = serde_json::from_str(&json)?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl EnrichmentSource for JsonEnrichmentSource {
    fn name(&self) -> &str {
        "json"
    }

    async fn lookup(&self, entity: &Entity) -> LookupResult<Option<Enrichment>> {
        Ok(entity
            .surface_forms()
            .find_map(|form| self.entries.get(form))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    fn enrichment(title: &str) -> Enrichment {
        Enrichment {
            title: title.to_string(),
            summary: format!("{title} summary"),
            url: None,
            exact: true,
        }
    }

    struct FlakySource;

    #[async_trait::async_trait]
    impl EnrichmentSource for FlakySource {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn lookup(&self, entity: &Entity) -> LookupResult<Option<Enrichment>> {
            match entity.name.as_str() {
                "Paris" => Ok(Some(enrichment("Paris"))),
                "Jordan" => Err(LookupError::Ambiguous("Jordan".to_string())),
                _ => Ok(None),
            }
        }
    }

    fn catalog() -> EntityCatalog {
        let mut catalog = EntityCatalog::new();
        catalog.register("Paris", EntityType::Location).unwrap();
        catalog.register("Jordan", EntityType::Location).unwrap();
        catalog.register("Nowhere Town", EntityType::Location).unwrap();
        catalog
    }

    #[tokio::test]
    async fn test_enrich_catalog_reports_every_outcome() {
        let mut catalog = catalog();
        let report = enrich_catalog(&mut catalog, &FlakySource).await;

        assert_eq!(report.total(), 3);
        assert!(report.found.contains("Paris"));
        assert!(report.not_found.contains("Nowhere Town"));
        assert!(report.failed.contains_key("Jordan"));

        let paris = catalog.get(catalog.find("Paris").unwrap()).unwrap();
        assert_eq!(paris.enrichment.as_ref().unwrap().title, "Paris");
    }

    #[tokio::test]
    async fn test_already_enriched_entities_are_not_looked_up_again() {
        let mut catalog = catalog();
        let jordan = catalog.find("Jordan").unwrap();
        catalog.set_enrichment(jordan, enrichment("Jordan")).unwrap();

        let report = enrich_catalog(&mut catalog, &FlakySource).await;
        assert!(report.found.contains("Jordan"));
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_json_source_uses_aliases() {
        let mut catalog = EntityCatalog::new();
        let id = catalog.register("Clinton, Bill", EntityType::Person).unwrap();
        catalog.register("Bill Clinton", EntityType::Person).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enrichment.json");
        let entries = BTreeMap::from([("Bill Clinton".to_string(), enrichment("Bill Clinton"))]);
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let source = JsonEnrichmentSource::load(&path).await.unwrap();
        assert_eq!(source.len(), 1);

        let report = enrich_catalog(&mut catalog, &source).await;
        assert_eq!(report.found.len(), 1);
        assert!(catalog.get(id).unwrap().enrichment.is_some());
    }

    #[tokio::test]
    async fn test_json_source_missing_file() {
        let result = JsonEnrichmentSource::load(Path::new("/nonexistent/enrichment.json")).await;
        assert!(matches!(result, Err(LookupError::Io(_))));
    }
}
