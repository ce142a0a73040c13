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

//! # Ember Data
//!
//! Storage side of the resource cache: the lazily-recreated
//! [`ResourceHandle`](resources::ResourceHandle), the
//! [`ResourceRegistry`](resources::ResourceRegistry) that buckets live handles
//! by kind for sweep passes, and the name-keyed
//! [`ResourceCache`](resources::ResourceCache) managers that own handles.

#![warn(missing_docs)]

pub mod resources;
