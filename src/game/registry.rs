// Entity registry: authoritative set of live game objects

use std::collections::{BTreeSet, HashMap};

use super::entity::{Entity, EntityId, EntityKind};

/// Owns every live entity, indexed by id and by kind
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, Entity>,
    by_kind: HashMap<EntityKind, BTreeSet<EntityId>>,
    next_id: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry whose first id is `first`
    pub fn starting_at(first: EntityId) -> Self {
        Self {
            next_id: first.0,
            ..Self::default()
        }
    }

    /// Reserve a fresh id; ids are never handed out twice
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// The id `next_id` would return, without reserving it
    pub fn peek_next_id(&self) -> EntityId {
        EntityId(self.next_id)
    }

    /// Add an entity. An entity already registered under the same id is replaced
    pub fn register(&mut self, entity: Entity) {
        let id = entity.id;
        self.unregister(id);

        self.by_kind.entry(entity.kind()).or_default().insert(id);
        self.entities.insert(id, entity);
    }

    /// Remove an entity; `None` if it was not registered
    pub fn unregister(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;

        if let Some(ids) = self.by_kind.get_mut(&entity.kind()) {
            ids.remove(&id);
        }
        Some(entity)
    }

    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Ids of every live entity of `kind`, ascending
    pub fn all_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.by_kind
            .get(&kind)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.by_kind.get(&kind).map_or(0, BTreeSet::len)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
