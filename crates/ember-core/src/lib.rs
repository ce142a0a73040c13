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

//! # Ember Core
//!
//! Foundational crate containing the capability contracts of the runtime
//! backbone: what a cacheable resource kind must provide, what a scheduled
//! task must provide, and where diagnostics go.
//!
//! Nothing in here owns state. The cache cells live in `ember-data`, the
//! scheduler in `ember-control`.

#![warn(missing_docs)]

pub mod diagnostics;
pub mod resource;
pub mod task;

pub use diagnostics::{DiagnosticsSink, LogSink};
pub use resource::{Referrer, ResourceError, ResourceKind, ResourceKindTag};
pub use task::{Lane, Task, TaskContext, TaskError, TaskId, TaskStep};
