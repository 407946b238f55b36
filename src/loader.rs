/// Cached model loading
///
/// `ModelLoader::load` turns a catalog entry into a scene graph. Parsed
/// graphs are kept in a small FIFO cache so hovering back and forth between
/// thumbnails does not refetch or reparse; every caller gets its own copy,
/// so framing one copy never disturbs another.
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, warn};

use crate::catalog::{FileCatalog, ModelFile};
use crate::error::LoadError;
use crate::scene::glb::parse_glb;
use crate::scene::SceneGraph;

/// Number of parsed models kept in memory
pub const CACHE_CAPACITY: usize = 10;

/// Fixed-capacity map that evicts in insertion order
#[derive(Debug)]
pub struct FifoCache<V> {
    capacity: usize,
    entries: HashMap<String, V>,
    order: VecDeque<String>,
}

impl<V> FifoCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity + 1),
            order: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Insert at the back; returns the key evicted from the front, if any.
    /// Re-inserting an existing key replaces the value in place.
    pub fn insert(&mut self, key: String, value: V) -> Option<String> {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return None;
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, value);

        if self.order.len() > self.capacity {
            let evicted = self.order.pop_front()?;
            self.entries.remove(&evicted);
            return Some(evicted);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Keys from oldest to newest
    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

pub struct ModelLoader<C> {
    catalog: Arc<C>,
    cache: Arc<Mutex<FifoCache<SceneGraph>>>,
}

// Manual Clone: the catalog itself does not need to be Clone
impl<C> Clone for ModelLoader<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<C: FileCatalog> ModelLoader<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            cache: Arc::new(Mutex::new(FifoCache::new(CACHE_CAPACITY))),
        }
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    /// Load a model, from the cache when possible
    ///
    /// A miss reads the bytes through the catalog, parses them on a blocking
    /// worker and inserts the result. No rig is touched here.
    pub async fn load(&self, file: &ModelFile) -> Result<SceneGraph, LoadError> {
        let cached = self.cache.lock().get(&file.id).cloned();
        if let Some(graph) = cached {
            debug!("♻️  Cache hit: {}", file.id);
            return Ok(graph);
        }

        let bytes = self
            .catalog
            .read(&file.id)
            .await
            .map_err(|source| LoadError::Fetch {
                id: file.id.clone(),
                source,
            })?;

        let size = bytes.len();
        let graph = task::spawn_blocking(move || parse_glb(&bytes))
            .await
            .map_err(|e| LoadError::Parse {
                id: file.id.clone(),
                reason: format!("parser task failed: {}", e),
            })?
            .map_err(|e| LoadError::Parse {
                id: file.id.clone(),
                reason: e.to_string(),
            })?;

        debug!("📦 Parsed {} ({} bytes, {:?})", file.id, size, graph);
        if graph.is_empty() {
            warn!("⚠️  {} has no drawable geometry", file.id);
        }

        let mut cache = self.cache.lock();
        if let Some(evicted) = cache.insert(file.id.clone(), graph.clone()) {
            debug!("🗑️  Evicted {} from model cache", evicted);
        }
        debug!("🗂️  Model cache holds {}/{}", cache.len(), CACHE_CAPACITY);

        Ok(graph)
    }

    #[cfg(test)]
    pub fn cached_ids(&self) -> Vec<String> {
        self.cache.lock().keys().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalog;
    use crate::error::FetchError;
    use crate::scene::fixtures::box_glb;

    fn catalog_of(count: usize) -> MemoryCatalog {
        (0..count).fold(MemoryCatalog::new(), |catalog, i| {
            catalog.with_file(&format!("m{}.glb", i), box_glb([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]))
        })
    }

    #[test]
    fn test_fifo_cache_evicts_oldest() {
        let mut cache = FifoCache::new(2);
        assert_eq!(cache.insert("a".into(), 1), None);
        assert_eq!(cache.insert("b".into(), 2), None);
        // Replacing does not refresh the position
        assert_eq!(cache.insert("a".into(), 10), None);
        assert_eq!(cache.insert("c".into(), 3), Some("a".to_string()));

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(&2));
        assert_eq!(cache.keys().collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_io() {
        let loader = ModelLoader::new(Arc::new(catalog_of(1)));
        let file = ModelFile::new("m0.glb");

        loader.load(&file).await.expect("first load");
        loader.load(&file).await.expect("second load");

        assert_eq!(loader.catalog().reads(), 1);
    }

    #[tokio::test]
    async fn test_cache_is_bounded_fifo() {
        let loader = ModelLoader::new(Arc::new(catalog_of(12)));

        for i in 0..12 {
            loader
                .load(&ModelFile::new(format!("m{}.glb", i)))
                .await
                .expect("load");
        }

        let cached = loader.cached_ids();
        assert_eq!(cached.len(), CACHE_CAPACITY);
        assert_eq!(cached.first().map(String::as_str), Some("m2.glb"));
        assert_eq!(cached.last().map(String::as_str), Some("m11.glb"));

        // The evicted model is fetched again
        loader.load(&ModelFile::new("m0.glb")).await.expect("reload");
        assert_eq!(loader.catalog().reads(), 13);
        assert_eq!(loader.cached_ids().len(), CACHE_CAPACITY);
    }

    #[tokio::test]
    async fn test_copies_are_independent() {
        let loader = ModelLoader::new(Arc::new(catalog_of(1)));
        let file = ModelFile::new("m0.glb");

        let mut first = loader.load(&file).await.expect("load");
        first.transform.scale = 0.25;
        for material in first.materials_mut() {
            material.metalness = 0.0;
        }

        let second = loader.load(&file).await.expect("load");
        assert_eq!(second.transform.scale, 1.0);
        assert_eq!(second.material(Some(0)).metalness, 0.5);
    }

    #[tokio::test]
    async fn test_errors_carry_file_id() {
        let catalog = MemoryCatalog::new()
            .with_missing("gone.glb")
            .with_file("junk.glb", b"definitely not a model".to_vec());
        let loader = ModelLoader::new(Arc::new(catalog));

        let err = loader
            .load(&ModelFile::new("gone.glb"))
            .await
            .expect_err("missing file");
        assert_eq!(
            err,
            LoadError::Fetch {
                id: "gone.glb".to_string(),
                source: FetchError::NotInCatalog("gone.glb".to_string()),
            }
        );

        let err = loader
            .load(&ModelFile::new("junk.glb"))
            .await
            .expect_err("bad bytes");
        assert!(matches!(err, LoadError::Parse { ref id, .. } if id == "junk.glb"));

        // Failures are not cached
        assert!(loader.cached_ids().is_empty());
    }
}
