//! Entity/component store.
//!
//! Component data lives in a `bevy_ecs` [`World`]; the store adds the
//! lifecycle rules the simulation relies on:
//!
//! - Entities are addressed by [`EntityId`], a stable identifier owned by the
//!   store. Each backing ECS entity carries its id in a private `Handle`
//!   component so queries can hand identifiers back to callers. Callers can't
//!   name `Handle`, so no component write can change an entity's identity.
//! - Accessing a removed or unknown entity is an error ([`EngineError::NotFound`]),
//!   never an empty result. Multi-entity queries simply omit removed entities.
//! - A missing component on a live entity is a normal `None`, with a fallible
//!   accessor on top for callers that require it.

use crate::error::{EngineError, EngineResult};
use bevy_ecs::prelude::*;
use bevy_ecs::query::QueryFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a backing ECS entity.
#[derive(Component, Debug, Clone, Copy)]
struct Handle(EntityId);

/// Owns every entity and its component set.
pub struct Store {
    world: World,
    /// Live entities. Every key here has exactly one backing ECS entity.
    entities: HashMap<EntityId, Entity>,
    next_id: u64,
}

impl Store {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create an empty entity.
    ///
    /// With `None` a fresh identifier is generated. A caller-supplied id that
    /// is already live replaces the old entity and drops its components.
    pub fn create_entity(&mut self, id: Option<EntityId>) -> EntityId {
        let id = match id {
            Some(id) => {
                if let Some(previous) = self.entities.remove(&id) {
                    tracing::warn!(entity = %id, "entity id reused, replacing live entity");
                    self.world.despawn(previous);
                }
                id
            }
            None => self.generate_id(),
        };

        let entity = self.world.spawn(Handle(id)).id();
        self.entities.insert(id, entity);
        tracing::debug!(entity = %id, "entity created");
        id
    }

    /// Create an entity and attach a bundle of components to it.
    pub fn spawn<B: Bundle>(&mut self, components: B) -> EntityId {
        let id = self.create_entity(None);
        let entity = self.entities[&id];
        self.world.entity_mut(entity).insert(components);
        id
    }

    /// Remove an entity together with all of its components.
    pub fn remove_entity(&mut self, id: EntityId) -> EngineResult<()> {
        let entity = self.entities.remove(&id).ok_or(EngineError::NotFound(id))?;
        self.world.despawn(entity);
        tracing::debug!(entity = %id, "entity removed");
        Ok(())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Attach a component, replacing any existing one of the same type.
    pub fn set_component<T: Component>(&mut self, id: EntityId, component: T) -> EngineResult<()> {
        self.set_components(id, component)
    }

    /// Attach several components at once, e.g. `(Active, Body::default())`.
    pub fn set_components<B: Bundle>(&mut self, id: EntityId, components: B) -> EngineResult<()> {
        let entity = self.entity(id)?;
        self.world.entity_mut(entity).insert(components);
        Ok(())
    }

    /// Detach a component. Absent components are ignored.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> EngineResult<()> {
        let entity = self.entity(id)?;
        self.world.entity_mut(entity).remove::<T>();
        Ok(())
    }

    pub fn has<T: Component>(&self, id: EntityId) -> EngineResult<bool> {
        Ok(self.get::<T>(id)?.is_some())
    }

    /// Borrow a component if the entity carries it.
    pub fn get<T: Component>(&self, id: EntityId) -> EngineResult<Option<&T>> {
        let entity = self.entity(id)?;
        Ok(self.world.get::<T>(entity))
    }

    /// Mutably borrow a component in place if the entity carries it.
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> EngineResult<Option<&mut T>> {
        let entity = self.entity(id)?;
        Ok(self.world.get_mut::<T>(entity).map(Mut::into_inner))
    }

    /// Borrow a component the caller requires to be present.
    pub fn component<T: Component>(&self, id: EntityId) -> EngineResult<&T> {
        self.get::<T>(id)?.ok_or(EngineError::ComponentAbsent {
            entity: id,
            component: std::any::type_name::<T>(),
        })
    }

    /// Mutable counterpart of [`Store::component`].
    pub fn component_mut<T: Component>(&mut self, id: EntityId) -> EngineResult<&mut T> {
        self.get_mut::<T>(id)?.ok_or(EngineError::ComponentAbsent {
            entity: id,
            component: std::any::type_name::<T>(),
        })
    }

    /// Every live entity whose components satisfy the filter `F`.
    ///
    /// `F` is a `bevy_ecs` filter such as `(With<Active>, With<Body>)`;
    /// `query::<()>()` returns all entities. Results are ordered by id so the
    /// order stays stable while components come and go.
    pub fn query<F: QueryFilter>(&mut self) -> Vec<EntityId> {
        let mut state = self.world.query_filtered::<&Handle, F>();
        let mut ids: Vec<EntityId> = state.iter(&self.world).map(|handle| handle.0).collect();
        ids.sort_unstable();
        ids
    }

    /// Read-only access to the backing ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    fn entity(&self, id: EntityId) -> EngineResult<Entity> {
        self.entities.get(&id).copied().ok_or(EngineError::NotFound(id))
    }

    fn generate_id(&mut self) -> EntityId {
        loop {
            let id = EntityId(self.next_id);
            self.next_id += 1;
            if !self.entities.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Component, Debug, Clone, Copy, PartialEq)]
    struct Health(u32);

    #[derive(Component, Debug, Clone, Copy, PartialEq)]
    struct Tag;

    #[test]
    fn test_create_and_query() {
        let mut store = Store::new();
        let a = store.create_entity(None);
        let b = store.create_entity(None);
        let c = store.create_entity(None);

        store.set_components(a, (Health(10), Tag)).unwrap();
        store.set_component(b, Health(5)).unwrap();

        assert_eq!(store.query::<With<Health>>(), vec![a, b]);
        assert_eq!(store.query::<(With<Health>, With<Tag>)>(), vec![a]);
        assert_eq!(store.query::<()>(), vec![a, b, c]);
    }

    #[test]
    fn test_set_replaces_component() {
        let mut store = Store::new();
        let a = store.create_entity(None);
        store.set_component(a, Health(1)).unwrap();
        store.set_component(a, Health(2)).unwrap();
        assert_eq!(store.component::<Health>(a).unwrap(), &Health(2));
    }

    #[test]
    fn test_mutation_is_in_place() {
        let mut store = Store::new();
        let a = store.spawn(Health(1));
        store.component_mut::<Health>(a).unwrap().0 += 41;
        assert_eq!(store.get::<Health>(a).unwrap(), Some(&Health(42)));
    }

    #[test]
    fn test_removed_entity_is_not_found() {
        let mut store = Store::new();
        let a = store.spawn((Health(3), Tag));
        store.remove_entity(a).unwrap();

        assert!(store.query::<With<Health>>().is_empty());
        assert!(matches!(store.get::<Health>(a), Err(EngineError::NotFound(id)) if id == a));
        assert!(matches!(store.set_component(a, Tag), Err(EngineError::NotFound(_))));
        assert!(matches!(store.remove_component::<Tag>(a), Err(EngineError::NotFound(_))));
        assert!(matches!(store.remove_entity(a), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_absent_component_is_distinct() {
        let mut store = Store::new();
        let a = store.create_entity(None);

        assert_eq!(store.get::<Health>(a).unwrap(), None);
        assert!(matches!(
            store.component::<Health>(a),
            Err(EngineError::ComponentAbsent { entity, .. }) if entity == a
        ));
        // Removing an absent component is fine.
        store.remove_component::<Health>(a).unwrap();
    }

    #[test]
    fn test_caller_supplied_ids() {
        let mut store = Store::new();
        let fixed = store.create_entity(Some(EntityId(2)));
        assert_eq!(fixed, EntityId(2));

        let first = store.create_entity(None);
        let second = store.create_entity(None);
        assert_eq!(first, EntityId(1));
        assert_eq!(second, EntityId(3));
    }

    #[test]
    fn test_reused_id_replaces_entity() {
        let mut store = Store::new();
        let id = store.create_entity(Some(EntityId(7)));
        store.set_component(id, Health(9)).unwrap();

        store.create_entity(Some(EntityId(7)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get::<Health>(id).unwrap(), None);
    }

    #[test]
    fn test_query_order_survives_component_changes() {
        let mut store = Store::new();
        let ids: Vec<_> = (0..4).map(|_| store.spawn(Health(0))).collect();
        store.set_component(ids[0], Tag).unwrap();
        store.set_component(ids[2], Tag).unwrap();

        assert_eq!(store.query::<With<Health>>(), ids);
    }

    #[test]
    fn test_identity_survives_component_writes() {
        let mut store = Store::new();
        let a = store.spawn(Health(1));
        let b = store.spawn(Health(2));
        let c = store.spawn(Health(3));

        store.set_component(a, Tag).unwrap();
        store.remove_component::<Tag>(c).unwrap();
        store.set_components(b, (Tag, Health(5))).unwrap();

        assert_eq!(store.query::<With<Health>>(), vec![a, b, c]);
        assert_eq!(store.query::<()>().len(), store.len());
        assert_eq!(store.query::<With<Tag>>(), vec![a, b]);
    }
}
