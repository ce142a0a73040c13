// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A name-keyed manager owning the handles of one resource kind.

use super::handle::ResourceHandle;
use super::registry::ResourceRegistry;
use ember_core::resource::{Referrer, ResourceError, ResourceKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Owns one [`ResourceHandle`] per resource name for kind `K`.
///
/// The first request for a name builds the kind recipe through the factory
/// and registers a new handle; later requests reuse it. Handles live until
/// [`remove`](Self::remove) drops the cache's reference, which is the only
/// way a handle leaves the registry.
pub struct ResourceCache<K: ResourceKind> {
    registry: Arc<ResourceRegistry>,
    factory: Box<dyn Fn(&str) -> K + Send + Sync>,
    handles: HashMap<String, Arc<ResourceHandle<K>>>,
}

impl<K: ResourceKind> ResourceCache<K> {
    /// Creates an empty cache whose handles are filed in `registry`.
    ///
    /// `factory` turns a resource name into the recipe that rebuilds it.
    pub fn new(
        registry: Arc<ResourceRegistry>,
        factory: impl Fn(&str) -> K + Send + Sync + 'static,
    ) -> Self {
        Self {
            registry,
            factory: Box::new(factory),
            handles: HashMap::new(),
        }
    }

    /// Returns the handle for `name`, creating an unloaded one if needed.
    pub fn handle(&mut self, name: &str) -> Arc<ResourceHandle<K>> {
        if let Some(handle) = self.handles.get(name) {
            return Arc::clone(handle);
        }
        let handle = ResourceHandle::new(name, (self.factory)(name), &self.registry);
        self.handles.insert(name.to_owned(), Arc::clone(&handle));
        handle
    }

    /// Returns the handle for `name` only if it already exists.
    pub fn existing(&self, name: &str) -> Option<Arc<ResourceHandle<K>>> {
        self.handles.get(name).cloned()
    }

    /// Adds a handle pre-seeded with `instance`, replacing any previous one.
    pub fn insert_loaded(&mut self, name: &str, instance: K::Resource) -> Arc<ResourceHandle<K>> {
        let handle =
            ResourceHandle::with_instance(name, (self.factory)(name), instance, &self.registry);
        self.handles.insert(name.to_owned(), Arc::clone(&handle));
        handle
    }

    /// Loads (if needed) and returns the instance for `name`.
    pub fn get(&mut self, name: &str) -> Result<Arc<K::Resource>, ResourceError> {
        self.handle(name).get()
    }

    /// Like [`get`](Self::get), recording `referrer` on the handle.
    pub fn get_for(
        &mut self,
        name: &str,
        referrer: Referrer,
    ) -> Result<Arc<K::Resource>, ResourceError> {
        self.handle(name).get_for(referrer)
    }

    /// Forgets `referrer` on the handle for `name`. Returns `false` if the
    /// handle does not exist or the referrer was not recorded.
    pub fn release(&self, name: &str, referrer: Referrer) -> bool {
        self.handles
            .get(name)
            .is_some_and(|handle| handle.release(referrer))
    }

    /// Drops the cache's reference to the handle for `name`.
    ///
    /// The registry forgets the handle once no other owner holds it.
    pub fn remove(&mut self, name: &str) -> Option<Arc<ResourceHandle<K>>> {
        let removed = self.handles.remove(name);
        if removed.is_some() {
            log::debug!("ResourceCache: Removed {} '{name}'", K::TAG);
        }
        removed
    }

    /// Returns `true` if a handle exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// Number of handles owned.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if no handles are owned.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Names of the owned handles, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handles.keys().cloned().collect();
        names.sort();
        names
    }

    /// The registry handles are filed in.
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::resource::ResourceKindTag;

    #[derive(Debug)]
    struct Tilemap {
        source: String,
    }

    struct TilemapFile {
        path: String,
    }

    impl ResourceKind for TilemapFile {
        type Resource = Tilemap;
        const TAG: ResourceKindTag = ResourceKindTag::Tilemap;

        fn new_reference(&self) -> Result<Tilemap, ResourceError> {
            if self.path.ends_with(".tmx") {
                Ok(Tilemap {
                    source: self.path.clone(),
                })
            } else {
                Err(ResourceError::not_found(&self.path))
            }
        }
    }

    fn cache() -> ResourceCache<TilemapFile> {
        ResourceCache::new(Arc::new(ResourceRegistry::new()), |name| TilemapFile {
            path: format!("maps/{name}"),
        })
    }

    #[test]
    fn same_name_shares_one_handle() {
        let mut maps = cache();
        let a = maps.handle("town.tmx");
        let b = maps.handle("town.tmx");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(maps.len(), 1);
        assert_eq!(maps.registry().live_count(ResourceKindTag::Tilemap), 1);
    }

    #[test]
    fn get_builds_through_factory() {
        let mut maps = cache();
        let town = maps.get("town.tmx").unwrap();
        assert_eq!(town.source, "maps/town.tmx");

        let err = maps.get("town.txt").unwrap_err();
        assert_eq!(err.resource_name(), "maps/town.txt");
        assert!(maps.contains("town.txt"), "failed loads keep their handle");
    }

    #[test]
    fn release_and_remove() {
        let mut maps = cache();
        let hero = Referrer::new(1);
        maps.get_for("town.tmx", hero).unwrap();

        assert!(maps.release("town.tmx", hero));
        assert!(!maps.release("town.tmx", hero));
        assert!(!maps.release("missing.tmx", hero));

        let registry = Arc::clone(maps.registry());
        let removed = maps.remove("town.tmx");
        assert!(removed.is_some());
        drop(removed);
        assert_eq!(registry.live_count(ResourceKindTag::Tilemap), 0);
        assert!(maps.is_empty());
    }

    #[test]
    fn preloaded_instances_skip_construction() {
        let mut maps = cache();
        maps.insert_loaded(
            "intro",
            Tilemap {
                source: "embedded".into(),
            },
        );

        assert_eq!(maps.get("intro").unwrap().source, "embedded");
        assert_eq!(maps.names(), vec!["intro".to_string()]);
        assert_eq!(maps.existing("intro").unwrap().load_count(), 0);
    }
}
