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

use std::fmt;

/// An error raised when a resource kind cannot produce an instance.
///
/// Returned to the caller of a handle's `get`; the handle stays unloaded and
/// the next `get` retries from scratch.
#[derive(Debug)]
pub enum ResourceError {
    /// The backing data for the resource does not exist.
    NotFound {
        /// Name of the resource that was requested.
        name: String,
    },
    /// The backing data exists but could not be decoded.
    Malformed {
        /// Name of the resource that was requested.
        name: String,
        /// What was wrong with it.
        details: String,
    },
    /// The underlying library failed while building the instance.
    Backend {
        /// Name of the resource that was requested.
        name: String,
        /// The library error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ResourceError {
    /// Convenience constructor for missing backing data.
    pub fn not_found(name: impl Into<String>) -> Self {
        ResourceError::NotFound { name: name.into() }
    }

    /// Convenience constructor for undecodable backing data.
    pub fn malformed(name: impl Into<String>, details: impl Into<String>) -> Self {
        ResourceError::Malformed {
            name: name.into(),
            details: details.into(),
        }
    }

    /// Wraps a library error.
    pub fn backend(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ResourceError::Backend {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Name of the resource the error is about.
    pub fn resource_name(&self) -> &str {
        match self {
            ResourceError::NotFound { name }
            | ResourceError::Malformed { name, .. }
            | ResourceError::Backend { name, .. } => name,
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound { name } => write!(f, "Resource '{name}' not found"),
            ResourceError::Malformed { name, details } => {
                write!(f, "Resource '{name}' is malformed: {details}")
            }
            ResourceError::Backend { name, source } => {
                write!(f, "Failed to build resource '{name}': {source}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Backend { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
