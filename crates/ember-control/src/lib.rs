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

//! # Ember Control
//!
//! The per-frame task scheduler. An external frame pump calls
//! [`Scheduler::process`] once per tick; the scheduler steps every parallel
//! task, then the head of the exclusive queue, isolating failures per task.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use events::{SchedulerEvent, TickReport};
pub use ids::TaskIdAllocator;
pub use scheduler::Scheduler;
