//! Registry of protected entities.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::entity::{ProtectedEntity, SweepReport};
use crate::error::{GateError, Result};

/// Concurrent map of protected entities by id.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: DashMap<String, Arc<ProtectedEntity>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. Fails if the id is taken.
    pub fn register(&self, entity: ProtectedEntity) -> Result<Arc<ProtectedEntity>> {
        match self.entities.entry(entity.id().to_string()) {
            Entry::Occupied(occupied) => Err(GateError::DuplicateEntity(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                let entity = Arc::new(entity);
                info!(entity_id = %entity.id(), "Registered entity");
                vacant.insert(Arc::clone(&entity));
                Ok(entity)
            }
        }
    }

    /// Remove an entity, returning it.
    pub fn unregister(&self, entity_id: &str) -> Result<Arc<ProtectedEntity>> {
        let (_, entity) = self
            .entities
            .remove(entity_id)
            .ok_or_else(|| GateError::UnknownEntity(entity_id.to_string()))?;
        info!(entity_id = %entity_id, "Unregistered entity");
        Ok(entity)
    }

    pub fn get(&self, entity_id: &str) -> Option<Arc<ProtectedEntity>> {
        self.entities.get(entity_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entities.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Run expiry maintenance on every entity.
    pub fn sweep_expired(&self) -> SweepReport {
        let entities: Vec<Arc<ProtectedEntity>> = self
            .entities
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut report = SweepReport::default();
        for entity in entities {
            report += entity.sweep_expired();
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;
    use horizon::SphericalCoordinate;
    use proof_auth::{AuthenticatorConfig, KdfConfig};

    fn entity(id: &str) -> ProtectedEntity {
        let config = GateConfig {
            auth: AuthenticatorConfig {
                kdf: KdfConfig::insecure_fast(),
                ..Default::default()
            },
            ..GateConfig::new(id)
        };
        ProtectedEntity::new(SphericalCoordinate::origin(), "secret", config).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = EntityRegistry::new();
        registry.register(entity("b")).unwrap();
        registry.register(entity("a")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.get("a").unwrap().id(), "a");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = EntityRegistry::new();
        let first = registry.register(entity("a")).unwrap();

        let err = registry.register(entity("a")).unwrap_err();
        assert!(matches!(err, GateError::DuplicateEntity(id) if id == "a"));

        // Original entry untouched
        let current = registry.get("a").unwrap();
        assert_eq!(current.public_commitment(), first.public_commitment());
    }

    #[test]
    fn test_unregister() {
        let registry = EntityRegistry::new();
        registry.register(entity("a")).unwrap();

        assert_eq!(registry.unregister("a").unwrap().id(), "a");
        assert!(registry.is_empty());
        assert!(matches!(
            registry.unregister("a"),
            Err(GateError::UnknownEntity(_))
        ));
    }
}
