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

//! The agent that frees idle resources.
//!
//! Handles never dispose themselves. This agent runs in the parallel lane,
//! and every [`SweepConfig::interval_ms`] it walks the registry and evicts stale,
//! unreferenced, unpinned handles, a bounded number per pass. A raised
//! [`MemoryPressure`] signal makes the next step release everything it can,
//! stale or not.

mod agent;
mod config;

pub use agent::*;
pub use config::*;
