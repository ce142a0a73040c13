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

// Ember sandbox
// Pumps a headless frame loop through the scheduler with fake resources.

mod config;
mod kinds;

use anyhow::Result;
use clap::Parser;
use config::SandboxConfig;
use ember_agents::{FnTask, ResourceSweepAgent, SequenceTask, TimerTask};
use ember_control::{Scheduler, SchedulerEvent};
use ember_core::diagnostics::Level;
use ember_core::{Lane, Referrer, TaskStep};
use ember_data::resources::{ResourceCache, ResourceRegistry};
use ember_telemetry::RecordingSink;
use kinds::{MusicFile, TextureFile};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

type Textures = Arc<Mutex<ResourceCache<TextureFile>>>;
type Tracks = Arc<Mutex<ResourceCache<MusicFile>>>;

const HERO: Referrer = Referrer::new(1);
const ROOM: Referrer = Referrer::new(2);
const ROOM_PARTS: [&str; 3] = ["floor", "walls", "props"];
const FADE_FRAMES: u32 = 5;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// RON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the number of frames to pump.
    #[arg(short, long)]
    ticks: Option<u32>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn load_room(textures: &Textures, room: &str) -> Result<()> {
    let mut textures = lock(textures);
    for part in ROOM_PARTS {
        textures.get_for(&format!("{room}/{part}.png"), ROOM)?;
    }
    Ok(())
}

fn release_room(textures: &Textures, room: &str) {
    let textures = lock(textures);
    for part in ROOM_PARTS {
        textures.release(&format!("{room}/{part}.png"), ROOM);
    }
}

fn fade(label: &'static str, frames: u32) -> FnTask {
    let mut frame = 0;
    FnTask::new(move |_| {
        frame += 1;
        log::trace!("Sandbox: {label} {frame}/{frames}");
        TaskStep::from_continue(frame < frames)
    })
    .named(label)
}

/// Fade out, swap room textures and music, fade in.
fn room_transition(
    textures: Textures,
    tracks: Tracks,
    from: &'static str,
    to: &'static str,
) -> SequenceTask {
    let swap = FnTask::fallible(move |_| {
        release_room(&textures, from);
        load_room(&textures, to)?;

        let mut tracks = lock(&tracks);
        tracks.get(&format!("{from}.ogg"))?.stop();
        let music = tracks.get(&format!("{to}.ogg"))?;
        music.play();
        log::info!("Sandbox: Entered {to}, now playing {}", music.track);
        Ok(TaskStep::Finished)
    })
    .named("swap_room");

    SequenceTask::new("room_transition")
        .then(fade("fade_out", FADE_FRAMES))
        .then(swap)
        .then(fade("fade_in", FADE_FRAMES))
}

fn main() -> Result<()> {
    let args = Args::parse();
    ember_telemetry::logging::init("info");

    let mut config = match &args.config {
        Some(path) => SandboxConfig::load(path)?,
        None => SandboxConfig::default(),
    };
    if let Some(ticks) = args.ticks {
        config.ticks = ticks;
    }
    log::info!(
        "Sandbox: Pumping {} frames of {}ms",
        config.ticks,
        config.frame_ms
    );

    // --- Resources ---
    let registry = ResourceRegistry::shared(config.lifetimes.clone());
    let textures: Textures = Arc::new(Mutex::new(ResourceCache::new(
        Arc::clone(&registry),
        TextureFile::new,
    )));
    let tracks: Tracks = Arc::new(Mutex::new(ResourceCache::new(
        Arc::clone(&registry),
        MusicFile::new,
    )));

    load_room(&textures, "room_a")?;
    lock(&textures).handle("ui/font.png").set_always_alive(true)?;
    lock(&tracks).get("room_a.ogg")?.play();
    if let Err(e) = lock(&textures).get("missing.png") {
        log::warn!("Sandbox: {e}");
    }

    // --- Tasks ---
    let console = Arc::new(RecordingSink::new().forwarding());
    let (scheduler, events) = Scheduler::with_event_channel(config.scheduler.clone());
    let mut scheduler = scheduler.with_sink(console.clone());

    let sweep = ResourceSweepAgent::new(Arc::clone(&registry), config.sweep.clone());
    let pressure = sweep.pressure();
    let sweep_stats = sweep.stats_handle();
    scheduler.register(sweep, Lane::Parallel)?;

    let hero_textures = Arc::clone(&textures);
    scheduler.register(
        FnTask::fallible(move |_| {
            let sprite = lock(&hero_textures).get_for("hero.png", HERO)?;
            log::trace!("Sandbox: Drawing {} ({} bytes)", sprite.path, sprite.pixels.len());
            Ok(TaskStep::Continue)
        })
        .named("hero"),
        Lane::Parallel,
    )?;

    let cursor_visible = Arc::new(AtomicBool::new(true));
    let cursor = Arc::clone(&cursor_visible);
    scheduler.register(
        TimerTask::repeating("blink", Duration::from_millis(500), move |_| {
            cursor.fetch_xor(true, Ordering::SeqCst);
        })
        .times(20),
        Lane::Parallel,
    )?;

    let (door_textures, door_tracks) = (Arc::clone(&textures), Arc::clone(&tracks));
    scheduler.register(
        TimerTask::once("enter_room_b", Duration::from_secs(5), move |ctx| {
            let transition = room_transition(
                Arc::clone(&door_textures),
                Arc::clone(&door_tracks),
                "room_a",
                "room_b",
            );
            ctx.spawn(Box::new(transition), Lane::Exclusive);
        }),
        Lane::Parallel,
    )?;

    // --- Frame loop ---
    let start = Instant::now();
    let frame = config.frame();
    for tick in 1..=config.ticks {
        if config.pressure_at_tick == Some(tick) {
            log::warn!("Sandbox: Simulating memory pressure on frame {tick}");
            pressure.raise();
        }
        scheduler.process_at(start + frame * tick)?;

        for event in events.try_iter() {
            if let SchedulerEvent::Failed { id, reason } = event {
                log::warn!("Sandbox: {id} failed: {reason}");
            }
        }
    }

    // --- Report ---
    let end = start + frame * config.ticks;
    println!(
        "{:<24} {:<10} {:>6} {:>6} {:>9} {:>6} {:>5}",
        "resource", "kind", "loaded", "stale", "referrers", "pinned", "loads"
    );
    for row in registry.snapshot(end) {
        println!(
            "{:<24} {:<10} {:>6} {:>6} {:>9} {:>6} {:>5}",
            row.name,
            row.kind.as_str(),
            row.loaded,
            row.stale,
            row.referrers,
            row.always_alive,
            row.load_count
        );
    }
    let stats = *lock(&sweep_stats);
    let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
    println!("\n{}", ron::ser::to_string_pretty(&stats, pretty)?);
    println!(
        "{} tasks still scheduled, {} scheduler errors",
        scheduler.len(),
        console.count_at(Level::Error)
    );

    scheduler.destroy();
    Ok(())
}
