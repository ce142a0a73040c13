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

//! Configuration for the scheduler.

use serde::{Deserialize, Serialize};

/// Configuration for a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Diagnostics tag used for every lifecycle line.
    pub name: String,
    /// Emit debug/info lines on register, finish and cancel.
    /// Failures are always reported.
    pub log_lifecycle: bool,
    /// Treat a panic inside `step` or `on_finish` as a task failure instead of
    /// unwinding through `process`.
    pub catch_panics: bool,
    /// Capacity of the event channel created by
    /// [`Scheduler::with_event_channel`](crate::Scheduler::with_event_channel).
    /// If the buffer is full, new events are dropped.
    pub event_buffer_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: "Scheduler".to_owned(),
            log_lifecycle: true,
            catch_panics: true,
            event_buffer_size: 256,
        }
    }
}
