//! # Attribute Cache
//!
//! A read-through cache from lookup key (id, name or alias) to an attribute
//! definition. The cache is an ordinary value: build one per process and
//! share it by `Arc` between every [`AttributeManager`](crate::api::AttributeManager)
//! that should see the same entries.
//!
//! ## Coherence
//!
//! Writers invalidate only after their transaction has committed. A rolled-back
//! write never touches the cache, so it can never hold a definition that was
//! not durably written. The price is a short window between commit and
//! invalidation in which a concurrent reader may still be served the previous
//! definition.
//!
//! Every invalidation bumps a generation counter. A reader filling the cache
//! after a store miss records the generation before it takes its snapshot and
//! fills through [`AttributeCache::insert_if_current`], which drops the fill
//! if any invalidation happened in between. A snapshot that predates a
//! committed write can therefore never be cached after that write's
//! invalidation has run.
//!
//! Choice values are not cached; they are read from the store on every lookup.

use crate::model::{AttrId, Attribute};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Id(AttrId),
    Name(String),
    Alias(String),
}

impl CacheKey {
    /// Every key under which `attr` may be cached.
    pub fn all_for(attr: &Attribute) -> [CacheKey; 3] {
        [
            CacheKey::Id(attr.id),
            CacheKey::Name(attr.name.clone()),
            CacheKey::Alias(attr.alias.clone()),
        ]
    }
}

#[derive(Debug, Default)]
pub struct AttributeCache {
    entries: RwLock<HashMap<CacheKey, Attribute>>,
    generation: AtomicU64,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Attribute> {
        self.entries.read().get(key).cloned()
    }

    /// Resolve a raw key as a name, then as an id, then as an alias.
    pub fn lookup(&self, key: &str) -> Option<Attribute> {
        let entries = self.entries.read();
        entries
            .get(&CacheKey::Name(key.to_string()))
            .or_else(|| {
                key.parse::<AttrId>()
                    .ok()
                    .and_then(|id| entries.get(&CacheKey::Id(id)))
            })
            .or_else(|| entries.get(&CacheKey::Alias(key.to_string())))
            .cloned()
    }

    /// Fill every key of `attr`.
    pub fn insert(&self, attr: Attribute) {
        let mut entries = self.entries.write();
        for key in CacheKey::all_for(&attr) {
            entries.insert(key, attr.clone());
        }
        debug!(attr_id = attr.id, name = %attr.name, "attribute cached");
    }

    /// Fill every key of `attr` unless the cache was invalidated since
    /// `seen` was read from [`generation`](Self::generation).
    pub fn insert_if_current(&self, attr: Attribute, seen: u64) -> bool {
        let mut entries = self.entries.write();
        if self.generation.load(Ordering::Acquire) != seen {
            debug!(attr_id = attr.id, name = %attr.name, "cache fill dropped, invalidated meanwhile");
            return false;
        }
        for key in CacheKey::all_for(&attr) {
            entries.insert(key, attr.clone());
        }
        debug!(attr_id = attr.id, name = %attr.name, "attribute cached");
        true
    }

    /// Drop every key of `attr`.
    pub fn invalidate(&self, attr: &Attribute) {
        let mut entries = self.entries.write();
        for key in CacheKey::all_for(attr) {
            entries.remove(&key);
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
        debug!(attr_id = attr.id, name = %attr.name, "attribute cache invalidated");
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Invalidation counter; read it before the snapshot a fill comes from.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Number of cached keys, not attributes.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::fixtures::attribute;

    fn cached(id: AttrId, name: &str, alias: &str) -> Attribute {
        let mut attr = attribute(name);
        attr.id = id;
        attr.alias = alias.to_string();
        attr
    }

    #[test]
    fn insert_fills_all_keys() {
        let cache = AttributeCache::new();
        cache.insert(cached(3, "cpu", "Processor"));

        assert_eq!(cache.len(), 3);
        assert!(cache.get(&CacheKey::Id(3)).is_some());
        assert!(cache.get(&CacheKey::Name("cpu".into())).is_some());
        assert!(cache.get(&CacheKey::Alias("Processor".into())).is_some());
    }

    #[test]
    fn lookup_tries_name_then_id_then_alias() {
        let cache = AttributeCache::new();
        cache.insert(cached(1, "cpu", "Processor"));
        cache.insert(cached(2, "1", "one"));

        // "1" is the name of attribute 2 before it is the id of attribute 1
        assert_eq!(cache.lookup("1").unwrap().id, 2);
        assert_eq!(cache.lookup("2").unwrap().id, 2);
        assert_eq!(cache.lookup("Processor").unwrap().id, 1);
        assert!(cache.lookup("gpu").is_none());
    }

    #[test]
    fn invalidate_removes_every_key() {
        let cache = AttributeCache::new();
        let attr = cached(3, "cpu", "Processor");
        cache.insert(attr.clone());
        cache.invalidate(&attr);

        assert!(cache.is_empty());
        assert!(cache.lookup("cpu").is_none());
        assert!(cache.lookup("3").is_none());
        assert!(cache.lookup("Processor").is_none());
    }

    #[test]
    fn invalidate_leaves_other_attributes() {
        let cache = AttributeCache::new();
        let cpu = cached(1, "cpu", "cpu");
        cache.insert(cpu.clone());
        cache.insert(cached(2, "mem", "mem"));
        cache.invalidate(&cpu);

        assert!(cache.lookup("mem").is_some());
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn fill_from_before_an_invalidation_is_dropped() {
        let cache = AttributeCache::new();
        let cpu = cached(1, "cpu", "cpu");
        let seen = cache.generation();

        cache.invalidate(&cpu);
        assert!(!cache.insert_if_current(cpu.clone(), seen));
        assert!(cache.lookup("cpu").is_none());

        assert!(cache.insert_if_current(cpu, cache.generation()));
        assert!(cache.lookup("cpu").is_some());
    }

    #[test]
    fn clear_empties_and_drops_pending_fills() {
        let cache = AttributeCache::new();
        cache.insert(cached(1, "cpu", "cpu"));
        cache.insert(cached(2, "mem", "mem"));
        let seen = cache.generation();

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.insert_if_current(cached(1, "cpu", "cpu"), seen));
        assert!(cache.is_empty());
    }
}
