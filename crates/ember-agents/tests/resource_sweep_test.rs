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

//! Integration tests for the sweep agent driven by a real scheduler.

use crossbeam_channel::unbounded;
use ember_agents::{ResourceSweepAgent, SweepConfig};
use ember_control::{Scheduler, SchedulerConfig};
use ember_core::resource::{Referrer, ResourceError, ResourceKind, ResourceKindTag};
use ember_core::task::Lane;
use ember_data::resources::{LifetimePolicy, ResourceCache, ResourceHandle, ResourceRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};

// --- Test setup: fake texture and music kinds ---
struct Pixels(Vec<u8>);

struct TextureFile {
    path: String,
}

impl ResourceKind for TextureFile {
    type Resource = Pixels;
    const TAG: ResourceKindTag = ResourceKindTag::Texture;

    fn new_reference(&self) -> Result<Pixels, ResourceError> {
        Ok(Pixels(self.path.bytes().collect()))
    }
}

struct MusicStream;

impl ResourceKind for MusicStream {
    type Resource = String;
    const TAG: ResourceKindTag = ResourceKindTag::Music;

    fn new_reference(&self) -> Result<String, ResourceError> {
        Ok("stream".to_owned())
    }
}
// ---

fn scheduler() -> Scheduler {
    Scheduler::new(SchedulerConfig {
        log_lifecycle: false,
        ..SchedulerConfig::default()
    })
}

#[test]
fn test_sweep_agent_evicts_idle_textures_but_keeps_referenced_ones() {
    // --- 1. ARRANGE ---
    ember_telemetry::logging::init_for_tests();
    let registry = Arc::new(ResourceRegistry::new());
    let mut textures = ResourceCache::new(Arc::clone(&registry), |name| TextureFile {
        path: format!("textures/{name}"),
    });
    let hero = Referrer::new(42);
    textures.get("grass.png").unwrap();
    textures.get_for("hero.png", hero).unwrap();

    let (report_tx, report_rx) = unbounded();
    let agent = ResourceSweepAgent::new(Arc::clone(&registry), SweepConfig::default())
        .with_report_sender(report_tx);
    let stats = agent.stats_handle();

    let mut scheduler = scheduler();
    scheduler.register(agent, Lane::Parallel).unwrap();
    let t0 = Instant::now();

    // --- 2. ACT ---
    // The first tick only starts the agent's clock.
    scheduler.process_at(t0).unwrap();
    scheduler.process_at(t0 + Duration::from_secs(15)).unwrap();

    // --- 3. ASSERT ---
    let grass = textures.existing("grass.png").unwrap();
    let hero_tex = textures.existing("hero.png").unwrap();
    assert!(!grass.is_loaded(), "Idle texture should have been evicted");
    assert!(hero_tex.is_loaded(), "Referenced texture must survive the sweep");

    let report = report_rx.try_recv().expect("One pass should have been reported");
    assert_eq!(report.stale, 2);
    assert_eq!(report.disposed, 1);
    assert_eq!(report.refused, 1);
    assert_eq!(stats.lock().unwrap().passes, 1);

    // The evicted texture comes back transparently on the next access.
    assert_eq!(textures.get("grass.png").unwrap().0, b"textures/grass.png".to_vec());
    assert_eq!(grass.load_count(), 2);
}

#[test]
fn test_sweep_waits_for_interval_and_honours_kind_lifetimes() {
    // --- 1. ARRANGE ---
    let registry = ResourceRegistry::shared(
        LifetimePolicy::default().with_override(ResourceKindTag::Texture, Duration::from_secs(2)),
    );
    let texture = ResourceHandle::new("ui.png", TextureFile { path: "ui.png".into() }, &registry);
    let music = ResourceHandle::new("theme.ogg", MusicStream, &registry);
    texture.get().unwrap();
    music.get().unwrap();

    let config = SweepConfig {
        interval_ms: 5000,
        max_evictions_per_pass: 8,
    };
    let agent = ResourceSweepAgent::new(Arc::clone(&registry), config);
    let stats = agent.stats_handle();
    let mut scheduler = scheduler();
    scheduler.register(agent, Lane::Parallel).unwrap();
    let t0 = Instant::now();

    // --- 2. ACT & 3. ASSERT ---
    scheduler.process_at(t0).unwrap();
    scheduler.process_at(t0 + Duration::from_secs(3)).unwrap();
    assert!(texture.is_loaded(), "No pass may run before the interval elapses");
    assert_eq!(stats.lock().unwrap().passes, 0);

    scheduler.process_at(t0 + Duration::from_secs(6)).unwrap();
    assert!(!texture.is_loaded(), "Texture lifetime was shortened to 2s");
    assert!(music.is_loaded(), "Music keeps its 60s lifetime");
    assert_eq!(stats.lock().unwrap().passes, 1);
}

#[test]
fn test_eviction_cap_defers_the_rest_to_later_passes() {
    // --- 1. ARRANGE ---
    let registry = Arc::new(ResourceRegistry::new());
    let mut textures = ResourceCache::new(Arc::clone(&registry), |name| TextureFile {
        path: name.to_owned(),
    });
    for i in 0..5 {
        textures.get(&format!("tile_{i}.png")).unwrap();
    }
    let mut agent = ResourceSweepAgent::new(
        Arc::clone(&registry),
        SweepConfig {
            interval_ms: 0,
            max_evictions_per_pass: 2,
        },
    );
    let later = Instant::now() + Duration::from_secs(30);

    // --- 2. ACT ---
    let first = agent.run_sweep(later);
    let second = agent.run_sweep(later);
    let third = agent.run_sweep(later);

    // --- 3. ASSERT ---
    assert_eq!((first.disposed, first.deferred), (2, 3));
    assert_eq!((second.disposed, second.deferred), (2, 1));
    assert_eq!((third.disposed, third.deferred), (1, 0));
    assert_eq!(registry.loaded_count(ResourceKindTag::Texture), 0);
    assert_eq!(agent.stats().disposed, 5);
}

#[test]
fn test_memory_pressure_releases_fresh_resources_except_pinned() {
    // --- 1. ARRANGE ---
    let registry = Arc::new(ResourceRegistry::new());
    let logo = TextureFile {
        path: "logo.png".into(),
    };
    let pinned = ResourceHandle::new("logo.png", logo, &registry);
    let background = TextureFile {
        path: "bg.png".into(),
    };
    let fresh = ResourceHandle::new("bg.png", background, &registry);
    pinned.set_always_alive(true).unwrap();
    fresh.get().unwrap();

    let agent = ResourceSweepAgent::new(Arc::clone(&registry), SweepConfig::default());
    let pressure = agent.pressure();
    let stats = agent.stats_handle();
    let mut scheduler = scheduler();
    scheduler.register(agent, Lane::Parallel).unwrap();

    // --- 2. ACT ---
    pressure.raise();
    scheduler.process().unwrap();

    // --- 3. ASSERT ---
    assert!(!fresh.is_loaded());
    assert!(pinned.is_loaded());
    assert!(!pressure.is_raised(), "The signal is consumed by the release");
    assert_eq!(stats.lock().unwrap().pressure_releases, 1);
}

#[test]
fn test_dropped_handles_leave_the_registry() {
    // --- 1. ARRANGE ---
    let registry = Arc::new(ResourceRegistry::new());
    let mut textures = ResourceCache::new(Arc::clone(&registry), |name| TextureFile {
        path: name.to_owned(),
    });
    textures.get("a.png").unwrap();
    textures.get("b.png").unwrap();
    let mut agent = ResourceSweepAgent::new(Arc::clone(&registry), SweepConfig::default());

    // --- 2. ACT ---
    drop(textures.remove("a.png"));
    let report = agent.run_sweep(Instant::now());

    // --- 3. ASSERT ---
    assert_eq!(report.examined, 1);
    assert_eq!(report.pruned, 1);
    assert_eq!(registry.live_count(ResourceKindTag::Texture), 1);
}
