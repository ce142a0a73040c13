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

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1000;
const DEFAULT_MAX_EVICTIONS_PER_PASS: usize = 32;

/// Cadence and batching of the [`ResourceSweepAgent`](super::ResourceSweepAgent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Time between two sweep passes, in milliseconds.
    pub interval_ms: u64,
    /// Upper bound on evictions per pass, so a burst of stale resources is
    /// spread over several frames.
    pub max_evictions_per_pass: usize,
}

impl SweepConfig {
    /// The interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            max_evictions_per_pass: DEFAULT_MAX_EVICTIONS_PER_PASS,
        }
    }
}
