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

/// An opaque identity recorded against a resource handle by an owner that
/// depends on it.
///
/// The cache never dereferences a referrer; it only compares them. Owners can
/// mint one from any stable number (an entity id, a sprite id) or from their
/// own address with [`Referrer::of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Referrer(u64);

impl Referrer {
    /// Creates a referrer from a raw identity.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Creates a referrer from the address of `owner`.
    ///
    /// Only meaningful while `owner` stays at the same address.
    pub fn of<T: ?Sized>(owner: &T) -> Self {
        Self(owner as *const T as *const () as usize as u64)
    }

    /// Returns the raw identity.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Referrer {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "referrer#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_identity_distinguishes_owners() {
        let a = 1u32;
        let b = 2u32;
        assert_eq!(Referrer::of(&a), Referrer::of(&a));
        assert_ne!(Referrer::of(&a), Referrer::of(&b));
    }

    #[test]
    fn raw_round_trip() {
        let r: Referrer = 42.into();
        assert_eq!(r.raw(), 42);
        assert_eq!(r.to_string(), "referrer#42");
    }
}
