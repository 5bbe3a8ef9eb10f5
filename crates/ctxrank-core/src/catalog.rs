use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::entity::{Enrichment, Entity, EntityId, EntityType};
use crate::standardize::{primary_form, standardize, surname_form};
use crate::{Error, Result};

/// Owner of every entity seen during one corpus-loading session.
///
/// Lookups go through two indexes: the exact raw strings an entity has been
/// registered under, and the primary standardized form of each of them keyed
/// by entity type. A new raw name merges into an existing entity of the same
/// type when its primary form or another full standardized form hits either
/// index. The bare surname form never takes part in merging. Call
/// [`EntityCatalog::reset`] between independent corpus loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Entity>", into = "Vec<Entity>")]
pub struct EntityCatalog {
    entities: BTreeMap<EntityId, Entity>,
    by_name: HashMap<String, EntityId>,
    by_form: HashMap<(EntityType, String), EntityId>,
    next_id: u32,
}

impl EntityCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `raw_name` to a catalog entity, creating or merging as needed.
    ///
    /// The exact raw name or its primary form held by an entity of a different
    /// type is rejected with [`Error::TypeConflict`] and leaves the catalog
    /// untouched; the earlier registration wins.
    pub fn register(&mut self, raw_name: &str, entity_type: EntityType) -> Result<EntityId> {
        if let Some(&id) = self.by_name.get(raw_name) {
            self.check_type(id, raw_name, entity_type)?;
            return Ok(id);
        }

        let primary = primary_form(raw_name, entity_type);
        if let Some(&id) = self.by_form.get(&(entity_type, primary.clone())) {
            self.merge_alias(id, raw_name, entity_type);
            return Ok(id);
        }
        if let Some(id) = self.held_by_other_type(&primary, entity_type) {
            self.check_type(id, raw_name, entity_type)?;
        }

        let surname = surname_form(raw_name, entity_type);
        let hit = standardize(raw_name, entity_type)
            .into_iter()
            .filter(|form| surname.as_ref() != Some(form))
            .flat_map(|form| {
                [
                    self.by_name.get(form.as_str()).copied(),
                    self.by_form.get(&(entity_type, form)).copied(),
                ]
            })
            .flatten()
            .filter(|&id| self.has_type(id, entity_type))
            .min();

        if let Some(id) = hit {
            self.merge_alias(id, raw_name, entity_type);
            return Ok(id);
        }

        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.index(id, raw_name, entity_type);
        self.entities
            .insert(id, Entity::new(id, raw_name.to_string(), entity_type));
        tracing::trace!(%id, name = raw_name, %entity_type, "registered entity");
        Ok(id)
    }

    fn has_type(&self, id: EntityId, entity_type: EntityType) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|e| e.entity_type == entity_type)
    }

    /// An entity of another type registered under `form` or holding it as
    /// its primary form.
    fn held_by_other_type(&self, form: &str, entity_type: EntityType) -> Option<EntityId> {
        EntityType::ALL
            .into_iter()
            .filter(|&t| t != entity_type)
            .find_map(|t| self.by_form.get(&(t, form.to_string())).copied())
            .or_else(|| {
                self.by_name
                    .get(form)
                    .copied()
                    .filter(|&id| !self.has_type(id, entity_type))
            })
    }

    fn check_type(&self, id: EntityId, raw_name: &str, seen: EntityType) -> Result<()> {
        let existing = self.entities.get(&id).ok_or(Error::UnknownEntity(id))?;
        if existing.entity_type == seen {
            Ok(())
        } else {
            Err(Error::TypeConflict {
                name: raw_name.to_string(),
                existing: existing.entity_type,
                seen,
            })
        }
    }

    fn merge_alias(&mut self, id: EntityId, raw_name: &str, entity_type: EntityType) {
        self.index(id, raw_name, entity_type);
        if let Some(entity) = self.entities.get_mut(&id) {
            if entity.name != raw_name {
                entity.aliases.insert(raw_name.to_string());
            }
        }
    }

    fn index(&mut self, id: EntityId, raw_name: &str, entity_type: EntityType) {
        self.by_name.entry(raw_name.to_string()).or_insert(id);
        self.by_form
            .entry((entity_type, primary_form(raw_name, entity_type)))
            .or_insert(id);
    }

    fn rebuild_indexes(&mut self) {
        self.by_name.clear();
        self.by_form.clear();
        let entries: Vec<(EntityId, EntityType, Vec<String>)> = self
            .entities
            .values()
            .map(|e| {
                (
                    e.id,
                    e.entity_type,
                    e.surface_forms().map(str::to_string).collect(),
                )
            })
            .collect();
        for (id, entity_type, forms) in entries {
            for form in forms {
                self.index(id, &form, entity_type);
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    #[must_use]
    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.entities.get(&id).map(|e| e.name.as_str())
    }

    /// Exact lookup by any raw string the entity was registered under.
    #[must_use]
    pub fn find(&self, raw_name: &str) -> Option<EntityId> {
        self.by_name.get(raw_name).copied()
    }

    /// Current entities in id order.
    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn set_enrichment(&mut self, id: EntityId, enrichment: Enrichment) -> Result<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(Error::UnknownEntity(id))?;
        entity.enrichment = Some(enrichment);
        Ok(())
    }

    /// Keep only the entities in `keep`, returning how many were removed.
    pub fn retain(&mut self, keep: &BTreeSet<EntityId>) -> usize {
        let before = self.entities.len();
        self.entities.retain(|id, _| keep.contains(id));
        let removed = before - self.entities.len();
        if removed > 0 {
            self.rebuild_indexes();
        }
        removed
    }

    /// Drop every entity and start a new session. Ids are not reused.
    pub fn reset(&mut self) {
        self.entities.clear();
        self.by_name.clear();
        self.by_form.clear();
    }
}

impl From<Vec<Entity>> for EntityCatalog {
    fn from(entities: Vec<Entity>) -> Self {
        let next_id = entities.iter().map(|e| e.id.0 + 1).max().unwrap_or(0);
        let mut catalog = Self {
            entities: entities.into_iter().map(|e| (e.id, e)).collect(),
            by_name: HashMap::new(),
            by_form: HashMap::new(),
            next_id,
        };
        catalog.rebuild_indexes();
        catalog
    }
}

impl From<EntityCatalog> for Vec<Entity> {
    fn from(catalog: EntityCatalog) -> Self {
        catalog.entities.into_values().collect()
    }
}
