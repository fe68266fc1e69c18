use std::collections::BTreeMap;

/// A change to a single entity of the ledger state
///
/// Deltas are the only way records are mutated. Each delta knows the key of
/// the entity it touches and how to transform it; an absent entity is
/// represented as `None` so that creation and removal are regular deltas too.
pub trait EntityDelta {
    type Key: Ord + Clone;
    type Entity;

    fn key(&self) -> Self::Key;

    fn apply(&mut self, entity: &mut Option<Self::Entity>);
}

/// A keyed collection of entities that deltas can be applied to
pub trait EntityStore<K, E> {
    fn take(&mut self, key: &K) -> Option<E>;

    fn put(&mut self, key: K, entity: Option<E>);

    fn apply_delta<D>(&mut self, delta: &mut D)
    where
        D: EntityDelta<Key = K, Entity = E>,
    {
        let key = delta.key();
        let mut entity = self.take(&key);
        delta.apply(&mut entity);
        self.put(key, entity);
    }
}

impl<K: Ord, E> EntityStore<K, E> for BTreeMap<K, E> {
    fn take(&mut self, key: &K) -> Option<E> {
        self.remove(key)
    }

    fn put(&mut self, key: K, entity: Option<E>) {
        if let Some(entity) = entity {
            self.insert(key, entity);
        }
    }
}
