//! Relationship links between instances.
//!
//! Links are symmetric: relating `a` to `b` across `R1` makes each one
//! reachable from the other. Relating an already linked pair is a no-op.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::instance::InstanceId;

/// Unordered pair, stored smallest id first.
fn key(a: InstanceId, b: InstanceId) -> (InstanceId, InstanceId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Default)]
pub struct LinkTable {
    links: Mutex<HashMap<String, BTreeSet<(InstanceId, InstanceId)>>>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the pair was already linked.
    pub fn relate(&self, rel: &str, a: InstanceId, b: InstanceId) -> bool {
        self.lock().entry(rel.to_string()).or_default().insert(key(a, b))
    }

    /// Links every pair under one lock. Returns how many were new.
    pub fn relate_all(&self, rel: &str, pairs: &[(InstanceId, InstanceId)]) -> usize {
        let mut links = self.lock();
        let set = links.entry(rel.to_string()).or_default();
        pairs.iter().filter(|(a, b)| set.insert(key(*a, *b))).count()
    }

    /// Removes the link in either direction.
    pub fn unrelate(&self, rel: &str, a: InstanceId, b: InstanceId) -> bool {
        self.lock()
            .get_mut(rel)
            .is_some_and(|set| set.remove(&key(a, b)))
    }

    pub fn is_related(&self, rel: &str, a: InstanceId, b: InstanceId) -> bool {
        self.lock().get(rel).is_some_and(|set| set.contains(&key(a, b)))
    }

    /// Ids linked to `id` across `rel`, in id order.
    pub fn related(&self, rel: &str, id: InstanceId) -> Vec<InstanceId> {
        let links = self.lock();
        let Some(set) = links.get(rel) else {
            return Vec::new();
        };
        let mut out: Vec<InstanceId> = set
            .iter()
            .filter_map(|&(a, b)| {
                if a == id {
                    Some(b)
                } else if b == id {
                    Some(a)
                } else {
                    None
                }
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn count(&self, rel: &str) -> usize {
        self.lock().get(rel).map_or(0, BTreeSet::len)
    }

    /// Drops every link touching `id`.
    pub fn forget(&self, id: InstanceId) -> usize {
        let mut removed = 0;
        for set in self.lock().values_mut() {
            let before = set.len();
            set.retain(|&(a, b)| a != id && b != id);
            removed += before - set.len();
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, BTreeSet<(InstanceId, InstanceId)>>> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
