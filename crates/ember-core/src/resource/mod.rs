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

//! Provides the foundational traits and primitive types for Ember's resource cache.
//!
//! This module defines the "common language" spoken between the cache cells
//! and the collaborators that know how to build a heavy resource (a texture
//! decoder, an audio clip loader, a tilemap parser...). It has no knowledge of
//! how the instances are stored, shared or evicted.
//!
//! The key components are:
//! - The [`ResourceKind`] trait: implemented once per resource type.
//! - [`ResourceKindTag`]: the explicit tag used to bucket handles by kind.
//! - [`Referrer`]: an opaque owner identity that pins a resource in memory.
//! - [`ResourceError`]: why a resource could not be (re)constructed.

mod error;
mod kind;
mod referrer;

pub use error::*;
pub use kind::*;
pub use referrer::*;
