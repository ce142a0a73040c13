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

//! Bookkeeping of every live resource handle, bucketed by kind.

use super::policy::LifetimePolicy;
use ember_core::resource::ResourceKindTag;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::{Duration, Instant};

/// Type-erased view of a handle used by sweep passes.
///
/// Implemented by [`ResourceHandle`](super::ResourceHandle); other cache cells
/// can implement it to take part in the same sweeps.
pub trait ManagedResource: Send + Sync {
    /// Name of the resource.
    fn name(&self) -> &str;
    /// Registry bucket of the resource.
    fn kind_tag(&self) -> ResourceKindTag;
    /// Returns `true` if an instance is currently held.
    fn is_loaded(&self) -> bool;
    /// Returns `true` if the resource has been idle past its lifetime.
    fn is_stale(&self, now: Instant) -> bool;
    /// Evicts the instance if nothing protects it.
    fn try_dispose(&self) -> bool;
    /// A consistent snapshot of the lifecycle state.
    fn status(&self, now: Instant) -> ResourceStatus;
}

type Buckets = BTreeMap<ResourceKindTag, Vec<Weak<dyn ManagedResource>>>;

/// One row of [`ResourceRegistry::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStatus {
    /// Name of the resource.
    pub name: String,
    /// Registry bucket.
    pub kind: ResourceKindTag,
    /// Whether an instance is held.
    pub loaded: bool,
    /// Whether the instance is past its idle threshold.
    pub stale: bool,
    /// Number of recorded referrers.
    pub referrers: usize,
    /// Whether the handle is pinned.
    pub always_alive: bool,
    /// Successful constructions so far.
    pub load_count: u64,
}

/// Outcome of one [`ResourceRegistry::sweep`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Live handles looked at.
    pub examined: usize,
    /// Handles found stale.
    pub stale: usize,
    /// Stale handles evicted.
    pub disposed: usize,
    /// Stale handles that refused (referenced or kind guard).
    pub refused: usize,
    /// Stale handles left alone because the eviction limit was reached.
    pub deferred: usize,
    /// Dropped handles removed from the buckets.
    pub pruned: usize,
}

/// Registry of every live handle, bucketed by [`ResourceKindTag`].
///
/// The registry only holds weak references: it never keeps a handle alive and
/// forgets handles once their owner drops them. It is an explicit object
/// shared through an `Arc`, so two worlds never see each other's resources.
#[derive(Default)]
pub struct ResourceRegistry {
    buckets: RwLock<Buckets>,
    policy: LifetimePolicy,
}

impl ResourceRegistry {
    /// Creates an empty registry with no lifetime overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that applies `policy` to new handles.
    pub fn with_policy(policy: LifetimePolicy) -> Self {
        Self {
            buckets: RwLock::new(BTreeMap::new()),
            policy,
        }
    }

    /// Convenience constructor returning the registry behind an `Arc`.
    pub fn shared(policy: LifetimePolicy) -> Arc<Self> {
        Arc::new(Self::with_policy(policy))
    }

    fn read(&self) -> RwLockReadGuard<'_, Buckets> {
        self.buckets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Buckets> {
        self.buckets.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The lifetime policy applied to new handles.
    pub fn policy(&self) -> &LifetimePolicy {
        &self.policy
    }

    /// Effective idle threshold for a handle of `tag` whose kind asks for
    /// `kind_default`.
    pub fn lifetime_for(&self, tag: ResourceKindTag, kind_default: Duration) -> Duration {
        self.policy.lifetime_for(tag, kind_default)
    }

    /// Files a handle under `tag`. Called by handle constructors.
    pub fn register(&self, tag: ResourceKindTag, handle: Weak<dyn ManagedResource>) {
        self.write().entry(tag).or_default().push(handle);
    }

    /// Strong references to every live handle, taken under the read lock and
    /// released before any handle is locked.
    fn live_handles(&self) -> (Vec<Arc<dyn ManagedResource>>, usize) {
        let buckets = self.read();
        let mut live = Vec::new();
        let mut dead = 0;
        for handle in buckets.values().flatten() {
            match handle.upgrade() {
                Some(strong) => live.push(strong),
                None => dead += 1,
            }
        }
        (live, dead)
    }

    /// Removes dropped handles from every bucket, returning how many went.
    pub fn prune(&self) -> usize {
        let mut buckets = self.write();
        let mut pruned = 0;
        for bucket in buckets.values_mut() {
            let before = bucket.len();
            bucket.retain(|h| h.strong_count() > 0);
            pruned += before - bucket.len();
        }
        buckets.retain(|_, bucket| !bucket.is_empty());
        pruned
    }

    /// Evicts stale handles, at most `max_evictions` of them.
    ///
    /// Refusals are counted, not reported as failures: a stale handle that is
    /// still referenced is the normal case for anything on screen.
    pub fn sweep(&self, now: Instant, max_evictions: usize) -> SweepReport {
        let (live, dead) = self.live_handles();
        let mut report = SweepReport {
            examined: live.len(),
            ..SweepReport::default()
        };

        for handle in &live {
            if !handle.is_stale(now) {
                continue;
            }
            report.stale += 1;
            if report.disposed >= max_evictions {
                report.deferred += 1;
                continue;
            }
            if handle.try_dispose() {
                log::trace!(
                    "ResourceRegistry: Evicted {} '{}'",
                    handle.kind_tag(),
                    handle.name()
                );
                report.disposed += 1;
            } else {
                report.refused += 1;
            }
        }

        drop(live);
        if dead > 0 {
            report.pruned = self.prune();
        }
        report
    }

    /// Memory-pressure path: tries to evict every loaded handle, stale or not.
    ///
    /// Returns the number of evictions.
    pub fn dispose_all_unreferenced(&self) -> usize {
        let (live, _) = self.live_handles();
        let disposed = live
            .iter()
            .filter(|h| h.is_loaded())
            .filter(|h| h.try_dispose())
            .count();
        log::info!("ResourceRegistry: Released {disposed} resources under memory pressure");
        disposed
    }

    /// Number of live handles of `tag`.
    pub fn live_count(&self, tag: ResourceKindTag) -> usize {
        self.read()
            .get(&tag)
            .map_or(0, |bucket| bucket.iter().filter(|h| h.strong_count() > 0).count())
    }

    /// Number of live handles of `tag` currently holding an instance.
    pub fn loaded_count(&self, tag: ResourceKindTag) -> usize {
        let handles: Vec<_> = self
            .read()
            .get(&tag)
            .map(|bucket| bucket.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default();
        handles.iter().filter(|h| h.is_loaded()).count()
    }

    /// Number of live handles across all kinds.
    pub fn total_live(&self) -> usize {
        self.read()
            .values()
            .flatten()
            .filter(|h| h.strong_count() > 0)
            .count()
    }

    /// Kinds that have at least one registered handle.
    pub fn kinds(&self) -> Vec<ResourceKindTag> {
        self.read().keys().copied().collect()
    }

    /// A status row per live handle, ordered by kind then registration.
    pub fn snapshot(&self, now: Instant) -> Vec<ResourceStatus> {
        let (live, _) = self.live_handles();
        live.iter().map(|h| h.status(now)).collect()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("kinds", &self.kinds())
            .field("live", &self.total_live())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceHandle;
    use ember_core::resource::{Referrer, ResourceError, ResourceKind};

    struct Sprite;
    struct Track;

    impl ResourceKind for Sprite {
        type Resource = Vec<u8>;
        const TAG: ResourceKindTag = ResourceKindTag::Texture;

        fn new_reference(&self) -> Result<Vec<u8>, ResourceError> {
            Ok(vec![0; 16])
        }
    }

    impl ResourceKind for Track {
        type Resource = Vec<u8>;
        const TAG: ResourceKindTag = ResourceKindTag::Music;

        fn new_reference(&self) -> Result<Vec<u8>, ResourceError> {
            Ok(vec![0; 64])
        }
    }

    #[test]
    fn handles_are_bucketed_by_kind() {
        let registry = ResourceRegistry::new();
        let _a = ResourceHandle::new("a.png", Sprite, &registry);
        let _b = ResourceHandle::new("b.png", Sprite, &registry);
        let _t = ResourceHandle::new("theme.ogg", Track, &registry);

        assert_eq!(registry.live_count(ResourceKindTag::Texture), 2);
        assert_eq!(registry.live_count(ResourceKindTag::Music), 1);
        assert_eq!(
            registry.kinds(),
            vec![ResourceKindTag::Texture, ResourceKindTag::Music]
        );
    }

    #[test]
    fn dropped_handles_are_forgotten() {
        let registry = ResourceRegistry::new();
        let keep = ResourceHandle::new("a.png", Sprite, &registry);
        let gone = ResourceHandle::new("b.png", Sprite, &registry);
        drop(gone);

        assert_eq!(registry.live_count(ResourceKindTag::Texture), 1);
        assert_eq!(registry.prune(), 1);
        assert_eq!(registry.total_live(), 1);
        drop(keep);
        assert_eq!(registry.prune(), 1);
        assert!(registry.kinds().is_empty());
    }

    #[test]
    fn sweep_evicts_only_stale_unprotected_handles() {
        let registry = ResourceRegistry::new();
        let idle = ResourceHandle::new("idle.png", Sprite, &registry);
        let held = ResourceHandle::new("held.png", Sprite, &registry);
        let pinned = ResourceHandle::new("pinned.png", Sprite, &registry);
        let music = ResourceHandle::new("theme.ogg", Track, &registry);
        let _never_loaded = ResourceHandle::new("cold.png", Sprite, &registry);

        idle.get().unwrap();
        held.get_for(Referrer::new(1)).unwrap();
        pinned.set_always_alive(true).unwrap();
        music.get().unwrap();

        // Textures expire after 10s, music after 60s.
        let later = Instant::now() + Duration::from_secs(15);
        let report = registry.sweep(later, usize::MAX);

        assert_eq!(report.examined, 5);
        assert_eq!(report.stale, 2);
        assert_eq!(report.disposed, 1);
        assert_eq!(report.refused, 1);
        assert!(!idle.is_loaded());
        assert!(held.is_loaded());
        assert!(pinned.is_loaded());
        assert!(music.is_loaded());
        assert_eq!(registry.loaded_count(ResourceKindTag::Texture), 2);
    }

    #[test]
    fn sweep_respects_eviction_limit() {
        let registry = ResourceRegistry::new();
        let handles: Vec<_> = (0..5)
            .map(|i| ResourceHandle::new(format!("{i}.png"), Sprite, &registry))
            .collect();
        for h in &handles {
            h.get().unwrap();
        }

        let later = Instant::now() + Duration::from_secs(30);
        let report = registry.sweep(later, 2);
        assert_eq!(report.disposed, 2);
        assert_eq!(report.deferred, 3);

        let report = registry.sweep(later, 2);
        assert_eq!(report.disposed, 2);
        assert_eq!(report.deferred, 1);
    }

    #[test]
    fn policy_overrides_kind_lifetime() {
        let policy = LifetimePolicy::default()
            .with_override(ResourceKindTag::Texture, Duration::from_secs(2));
        let registry = ResourceRegistry::with_policy(policy);
        let sprite = ResourceHandle::new("a.png", Sprite, &registry);
        let track = ResourceHandle::new("theme.ogg", Track, &registry);

        assert_eq!(sprite.max_lifetime(), Duration::from_secs(2));
        assert_eq!(track.max_lifetime(), Duration::from_secs(60));
    }

    #[test]
    fn memory_pressure_ignores_staleness_but_not_protection() {
        let registry = ResourceRegistry::new();
        let fresh = ResourceHandle::new("fresh.png", Sprite, &registry);
        let held = ResourceHandle::new("held.png", Sprite, &registry);
        fresh.get().unwrap();
        held.get_for(Referrer::new(3)).unwrap();

        assert_eq!(registry.dispose_all_unreferenced(), 1);
        assert!(!fresh.is_loaded());
        assert!(held.is_loaded());
    }

    #[test]
    fn snapshot_reports_each_handle() {
        let registry = ResourceRegistry::new();
        let held = ResourceHandle::new("held.png", Sprite, &registry);
        held.get_for(Referrer::new(9)).unwrap();

        let rows = registry.snapshot(Instant::now());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "held.png");
        assert!(rows[0].loaded);
        assert!(!rows[0].stale);
        assert_eq!(rows[0].referrers, 1);
        assert_eq!(rows[0].load_count, 1);
    }
}
