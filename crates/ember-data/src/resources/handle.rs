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

//! The cache cell that makes a heavy resource look permanently available.

use super::registry::{ManagedResource, ResourceRegistry, ResourceStatus};
use ember_core::resource::{Referrer, ResourceError, ResourceKind, ResourceKindTag};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Lifecycle state of a handle. Every field is guarded by the handle's mutex.
struct HandleState<R> {
    instance: Option<Arc<R>>,
    last_access: Option<Instant>,
    referrers: HashSet<Referrer>,
    always_alive: bool,
    load_count: u64,
}

/// Owns zero or one live instance of a heavy resource and knows how to
/// rebuild it.
///
/// Callers always go through [`get`](Self::get), which transparently
/// reconstructs the instance if a sweep evicted it. Owners that must keep the
/// instance in memory record themselves as [`Referrer`]s, or pin the handle
/// with [`set_always_alive`](Self::set_always_alive).
///
/// Construction and disposal run inside the same per-handle critical section,
/// so an instance is never built twice and never dropped while being handed
/// out. Handles are independent of each other.
///
/// Disposing drops the handle's own reference to the instance. Callers that
/// still hold an `Arc` from an earlier `get` keep their copy alive until they
/// drop it; the next `get` builds a new one.
pub struct ResourceHandle<K: ResourceKind> {
    name: String,
    kind: K,
    max_lifetime: Duration,
    state: Mutex<HandleState<K::Resource>>,
}

impl<K: ResourceKind> ResourceHandle<K> {
    /// Creates an unloaded handle and files it in `registry` under `K::TAG`.
    ///
    /// The idle threshold is the kind's [`ResourceKind::max_lifetime`] unless
    /// the registry's lifetime policy overrides it for this tag.
    pub fn new(name: impl Into<String>, kind: K, registry: &ResourceRegistry) -> Arc<Self> {
        Self::build(name.into(), kind, None, registry)
    }

    /// Creates a handle pre-seeded with an already built instance.
    pub fn with_instance(
        name: impl Into<String>,
        kind: K,
        instance: K::Resource,
        registry: &ResourceRegistry,
    ) -> Arc<Self> {
        Self::build(name.into(), kind, Some(Arc::new(instance)), registry)
    }

    fn build(
        name: String,
        kind: K,
        instance: Option<Arc<K::Resource>>,
        registry: &ResourceRegistry,
    ) -> Arc<Self> {
        let max_lifetime = registry.lifetime_for(K::TAG, kind.max_lifetime());
        let last_access = instance.as_ref().map(|_| Instant::now());
        let handle = Arc::new(Self {
            name,
            kind,
            max_lifetime,
            state: Mutex::new(HandleState {
                instance,
                last_access,
                referrers: HashSet::new(),
                always_alive: false,
                load_count: 0,
            }),
        });
        registry.register(K::TAG, Arc::downgrade(&handle) as std::sync::Weak<dyn ManagedResource>);
        handle
    }

    fn lock(&self) -> MutexGuard<'_, HandleState<K::Resource>> {
        // A panic inside `new_reference` leaves the state untouched.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the live instance, building it first if it is absent.
    ///
    /// Stamps the access time on every call. A construction failure is
    /// returned as is; the handle stays unloaded and the next call retries.
    pub fn get(&self) -> Result<Arc<K::Resource>, ResourceError> {
        let mut state = self.lock();
        self.load_locked(&mut state)
    }

    /// Records `referrer` (idempotent), then behaves as [`get`](Self::get).
    pub fn get_for(&self, referrer: Referrer) -> Result<Arc<K::Resource>, ResourceError> {
        let mut state = self.lock();
        state.referrers.insert(referrer);
        self.load_locked(&mut state)
    }

    fn load_locked(
        &self,
        state: &mut HandleState<K::Resource>,
    ) -> Result<Arc<K::Resource>, ResourceError> {
        state.last_access = Some(Instant::now());

        if let Some(instance) = &state.instance {
            return Ok(Arc::clone(instance));
        }

        match self.kind.new_reference() {
            Ok(resource) => {
                let instance = Arc::new(resource);
                state.instance = Some(Arc::clone(&instance));
                state.load_count += 1;
                log::debug!(
                    "ResourceHandle: Loaded {} '{}' (load #{})",
                    K::TAG,
                    self.name,
                    state.load_count
                );
                Ok(instance)
            }
            Err(e) => {
                log::warn!(
                    "ResourceHandle: Failed to load {} '{}': {e}",
                    K::TAG,
                    self.name
                );
                Err(e)
            }
        }
    }

    /// Forgets `referrer` and stamps the access time.
    ///
    /// Never disposes; eviction is always decided by a later
    /// [`try_dispose`](Self::try_dispose).
    pub fn release(&self, referrer: Referrer) -> bool {
        let mut state = self.lock();
        state.last_access = Some(Instant::now());
        state.referrers.remove(&referrer)
    }

    /// Pins or unpins the handle.
    ///
    /// Pinning loads the instance immediately if it is absent. If that load
    /// fails the error is returned and the pin stays set; the next `get` or
    /// `set_always_alive(true)` retries.
    pub fn set_always_alive(&self, always_alive: bool) -> Result<(), ResourceError> {
        let mut state = self.lock();
        state.always_alive = always_alive;
        if always_alive && state.instance.is_none() {
            self.load_locked(&mut state)?;
        }
        Ok(())
    }

    /// Evicts the instance if nothing protects it.
    ///
    /// Refuses when unloaded, pinned, referenced, or when the kind's
    /// [`allow_dispose`](ResourceKind::allow_dispose) guard says no. Refusal is
    /// an ordinary outcome, not an error. Returns whether eviction happened.
    pub fn try_dispose(&self) -> bool {
        let mut state = self.lock();
        let Some(instance) = state.instance.as_ref() else {
            return false;
        };
        if state.always_alive || !state.referrers.is_empty() {
            return false;
        }
        if !self.kind.allow_dispose(instance) {
            return false;
        }

        state.instance = None;
        state.last_access = None;
        log::trace!("ResourceHandle: Disposed {} '{}'", K::TAG, self.name);
        true
    }

    /// Returns `true` when loaded, unpinned and idle for at least the kind's
    /// maximum lifetime.
    ///
    /// Referrers do not affect staleness, only disposal.
    pub fn is_stale(&self, now: Instant) -> bool {
        let state = self.lock();
        Self::stale_locked(&state, now, self.max_lifetime)
    }

    fn stale_locked(
        state: &HandleState<K::Resource>,
        now: Instant,
        max_lifetime: Duration,
    ) -> bool {
        if state.instance.is_none() || state.always_alive {
            return false;
        }
        state
            .last_access
            .is_some_and(|last| now.saturating_duration_since(last) >= max_lifetime)
    }

    /// Name the handle was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind recipe this handle rebuilds its instance from.
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Registry bucket of this handle.
    pub fn kind_tag(&self) -> ResourceKindTag {
        K::TAG
    }

    /// Effective idle threshold.
    pub fn max_lifetime(&self) -> Duration {
        self.max_lifetime
    }

    /// Returns `true` if an instance is currently held.
    pub fn is_loaded(&self) -> bool {
        self.lock().instance.is_some()
    }

    /// Returns `true` if the handle is pinned.
    pub fn is_always_alive(&self) -> bool {
        self.lock().always_alive
    }

    /// Time of the last `get` or `release`, if any since the last disposal.
    pub fn last_access(&self) -> Option<Instant> {
        self.lock().last_access
    }

    /// Number of recorded referrers.
    pub fn referrer_count(&self) -> usize {
        self.lock().referrers.len()
    }

    /// Returns `true` if `referrer` is recorded.
    pub fn has_referrer(&self, referrer: Referrer) -> bool {
        self.lock().referrers.contains(&referrer)
    }

    /// Number of successful constructions so far.
    pub fn load_count(&self) -> u64 {
        self.lock().load_count
    }
}

impl<K: ResourceKind> ManagedResource for ResourceHandle<K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind_tag(&self) -> ResourceKindTag {
        K::TAG
    }

    fn is_loaded(&self) -> bool {
        ResourceHandle::is_loaded(self)
    }

    fn is_stale(&self, now: Instant) -> bool {
        ResourceHandle::is_stale(self, now)
    }

    fn try_dispose(&self) -> bool {
        ResourceHandle::try_dispose(self)
    }

    fn status(&self, now: Instant) -> ResourceStatus {
        let state = self.lock();
        ResourceStatus {
            name: self.name.clone(),
            kind: K::TAG,
            loaded: state.instance.is_some(),
            stale: Self::stale_locked(&state, now, self.max_lifetime),
            referrers: state.referrers.len(),
            always_alive: state.always_alive,
            load_count: state.load_count,
        }
    }
}

impl<K: ResourceKind> fmt::Debug for ResourceHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ResourceHandle")
            .field("name", &self.name)
            .field("kind", &K::TAG)
            .field("loaded", &state.instance.is_some())
            .field("referrers", &state.referrers.len())
            .field("always_alive", &state.always_alive)
            .field("max_lifetime", &self.max_lifetime)
            .finish()
    }
}
