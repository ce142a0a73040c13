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

use super::SweepConfig;
use crossbeam_channel::Sender;
use ember_core::task::{Task, TaskContext, TaskStep};
use ember_data::resources::{ResourceRegistry, SweepReport};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// A shareable flag asking the sweep agent to release every resource it can
/// on its next step.
#[derive(Debug, Clone, Default)]
pub struct MemoryPressure(Arc<AtomicBool>);

impl MemoryPressure {
    /// Creates a lowered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks for a full release on the next step.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if a release is pending.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Running totals of the sweep agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    /// Number of sweep passes run.
    pub passes: u64,
    /// Evictions across all passes, pressure releases included.
    pub disposed: u64,
    /// Stale handles that refused eviction, across all passes.
    pub refused: u64,
    /// Pressure releases run.
    pub pressure_releases: u64,
    /// Report of the latest pass.
    pub last_report: SweepReport,
}

/// The agent responsible for evicting idle resources from a registry.
///
/// Register it in the parallel lane; it never finishes on its own.
pub struct ResourceSweepAgent {
    registry: Arc<ResourceRegistry>,
    config: SweepConfig,
    last_sweep: Option<Instant>,
    pressure: MemoryPressure,
    stats: Arc<Mutex<SweepStats>>,
    report_sender: Option<Sender<SweepReport>>,
}

impl ResourceSweepAgent {
    /// Creates a new `ResourceSweepAgent` over `registry`.
    pub fn new(registry: Arc<ResourceRegistry>, config: SweepConfig) -> Self {
        Self {
            registry,
            config,
            last_sweep: None,
            pressure: MemoryPressure::new(),
            stats: Arc::new(Mutex::new(SweepStats::default())),
            report_sender: None,
        }
    }

    /// Attaches a sender receiving the report of every sweep pass.
    pub fn with_report_sender(mut self, sender: Sender<SweepReport>) -> Self {
        self.report_sender = Some(sender);
        self
    }

    /// Uses an existing pressure signal instead of a fresh one.
    pub fn with_pressure(mut self, pressure: MemoryPressure) -> Self {
        self.pressure = pressure;
        self
    }

    /// The pressure signal this agent listens to.
    pub fn pressure(&self) -> MemoryPressure {
        self.pressure.clone()
    }

    /// Shared totals, readable after the agent has been handed to a scheduler.
    pub fn stats_handle(&self) -> Arc<Mutex<SweepStats>> {
        Arc::clone(&self.stats)
    }

    /// Current totals.
    pub fn stats(&self) -> SweepStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one sweep pass now, regardless of the interval.
    pub fn run_sweep(&mut self, now: Instant) -> SweepReport {
        let report = self
            .registry
            .sweep(now, self.config.max_evictions_per_pass);
        self.last_sweep = Some(now);

        {
            let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
            stats.passes += 1;
            stats.disposed += report.disposed as u64;
            stats.refused += report.refused as u64;
            stats.last_report = report;
        }

        if report.disposed > 0 || report.deferred > 0 {
            log::debug!(
                "ResourceSweepAgent: Evicted {} of {} stale resources ({} refused, {} deferred)",
                report.disposed,
                report.stale,
                report.refused,
                report.deferred,
            );
        } else {
            log::trace!(
                "ResourceSweepAgent: Nothing to evict among {} resources",
                report.examined
            );
        }

        if let Some(sender) = &self.report_sender {
            let _ = sender.try_send(report);
        }
        report
    }

    /// Releases every loaded resource nothing protects.
    pub fn release_under_pressure(&mut self) -> usize {
        let disposed = self.registry.dispose_all_unreferenced();
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.pressure_releases += 1;
        stats.disposed += disposed as u64;
        disposed
    }

    fn sweep_due(&self, now: Instant) -> bool {
        match self.last_sweep {
            Some(last) => now.saturating_duration_since(last) >= self.config.interval(),
            None => false,
        }
    }
}

impl Task for ResourceSweepAgent {
    fn name(&self) -> Option<&str> {
        Some("ResourceSweepAgent")
    }

    fn step(&mut self, ctx: &mut dyn TaskContext) -> TaskStep {
        let now = ctx.now();

        if self.pressure.take() {
            self.release_under_pressure();
        }

        // The first step only starts the clock.
        if self.last_sweep.is_none() {
            self.last_sweep = Some(now);
        } else if self.sweep_due(now) {
            self.run_sweep(now);
        }

        TaskStep::Continue
    }

    fn on_finish(&mut self, forced: bool) {
        log::info!(
            "ResourceSweepAgent: Stopped (forced={forced}) after {} passes",
            self.stats().passes
        );
    }
}
