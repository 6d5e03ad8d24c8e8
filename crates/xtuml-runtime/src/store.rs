//! Object store: every live instance, grouped by class name.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::instance::{Instance, InstanceId};

#[derive(Debug, Default)]
struct Extents {
    by_class: BTreeMap<String, BTreeMap<InstanceId, Arc<Instance>>>,
    owners: HashMap<InstanceId, String>,
}

/// Thread-safe instance extents.
#[derive(Debug)]
pub struct ObjectStore {
    extents: RwLock<Extents>,
    next_id: AtomicU64,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self {
            extents: RwLock::new(Extents::default()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn allocate_id(&self) -> InstanceId {
        InstanceId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Makes an empty extent for `class` so `select_all` works before the
    /// first instance exists.
    pub fn register(&self, class: &str) {
        self.write().by_class.entry(class.to_string()).or_default();
    }

    pub(crate) fn insert(&self, instance: Arc<Instance>) {
        let mut extents = self.write();
        let class = instance.class_name().to_string();
        extents.owners.insert(instance.id(), class.clone());
        extents
            .by_class
            .entry(class)
            .or_default()
            .insert(instance.id(), instance);
    }

    pub fn get(&self, id: InstanceId) -> Option<Arc<Instance>> {
        let extents = self.read();
        let class = extents.owners.get(&id)?;
        extents.by_class.get(class)?.get(&id).cloned()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.read().owners.contains_key(&id)
    }

    /// Every instance of `class`, in creation order.
    pub fn select_all(&self, class: &str) -> Vec<Arc<Instance>> {
        self.read()
            .by_class
            .get(class)
            .map(|extent| extent.values().cloned().collect())
            .unwrap_or_default()
    }

    /// First instance of `class` satisfying `predicate`.
    pub fn select_any(
        &self,
        class: &str,
        predicate: impl Fn(&Instance) -> bool,
    ) -> Option<Arc<Instance>> {
        let extents = self.read();
        extents
            .by_class
            .get(class)?
            .values()
            .find(|instance| predicate(instance))
            .cloned()
    }

    pub(crate) fn remove(&self, id: InstanceId) -> Option<Arc<Instance>> {
        let mut extents = self.write();
        let class = extents.owners.remove(&id)?;
        extents.by_class.get_mut(&class)?.remove(&id)
    }

    pub fn count(&self, class: &str) -> usize {
        self.read().by_class.get(class).map_or(0, BTreeMap::len)
    }

    pub fn len(&self) -> usize {
        self.read().owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every instance but keeps the registered extents.
    pub fn clear(&self) {
        let mut extents = self.write();
        extents.owners.clear();
        for extent in extents.by_class.values_mut() {
            extent.clear();
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Extents> {
        self.extents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Extents> {
        self.extents.write().unwrap_or_else(PoisonError::into_inner)
    }
}
