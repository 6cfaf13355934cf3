//! Function definition cache.
//!
//! Bounded, TTL-limited map from function id to definition. When a new id
//! arrives while the cache is full, the whole cache is dropped instead of
//! evicting single entries; the store remains the source of truth.

use faas_core::{CacheConfig, Function, FunctionId, TenantId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct Entry {
    function: Arc<Function>,
    inserted: Instant,
}

/// Tenant-scoped cache of function definitions.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use faas_core::{CacheConfig, Function, FunctionId, Language, ResourcePolicy, TenantId};
/// use faas_engine::FunctionCache;
///
/// let cache = FunctionCache::new(CacheConfig::default());
/// let acme = TenantId::new("acme");
/// let function = Function {
///     id: FunctionId::new(),
///     tenant: acme.clone(),
///     name: "hello".to_string(),
///     language: Language::Python,
///     source: "print('hi')".to_string(),
///     created_at: Utc::now(),
///     policy: ResourcePolicy::default(),
/// };
/// let id = function.id;
/// cache.put(function);
///
/// assert!(cache.get(&id, &acme).is_some());
/// assert!(cache.get(&id, &TenantId::new("globex")).is_none());
/// ```
#[derive(Debug)]
pub struct FunctionCache {
    capacity: usize,
    ttl: Duration,
    entries: Mutex<HashMap<FunctionId, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FunctionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            capacity: config.capacity,
            ttl: config.ttl(),
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached definition if it is fresh and owned by `tenant`.
    pub fn get(&self, id: &FunctionId, tenant: &TenantId) -> Option<Arc<Function>> {
        self.get_at(id, tenant, Instant::now())
    }

    /// [`get`](Self::get) with an explicit clock reading.
    pub fn get_at(&self, id: &FunctionId, tenant: &TenantId, now: Instant) -> Option<Arc<Function>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let found = match entries.get(id) {
            Some(entry) if now.saturating_duration_since(entry.inserted) >= self.ttl => {
                entries.remove(id);
                debug!(function = %id, "cache entry expired");
                None
            }
            Some(entry) if entry.function.is_owned_by(tenant) => Some(Arc::clone(&entry.function)),
            _ => None,
        };
        drop(entries);

        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Caches `function` and returns the shared handle.
    pub fn put(&self, function: Function) -> Arc<Function> {
        self.put_at(function, Instant::now())
    }

    /// [`put`](Self::put) with an explicit clock reading.
    pub fn put_at(&self, function: Function, now: Instant) -> Arc<Function> {
        let function = Arc::new(function);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(&function.id) && entries.len() >= self.capacity {
            debug!(capacity = self.capacity, "cache full, clearing");
            entries.clear();
        }
        entries.insert(
            function.id,
            Entry {
                function: Arc::clone(&function),
                inserted: now,
            },
        );
        function
    }

    /// Drops the entry for `id`. Returns `true` if one was present.
    pub fn invalidate(&self, id: &FunctionId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    /// Number of cached definitions, including expired ones not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Lookups answered from the cache.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that missed.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
