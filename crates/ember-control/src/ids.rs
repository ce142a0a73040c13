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

use ember_core::task::TaskId;

/// Hands out task ids for one scheduler.
///
/// Ids increase monotonically and wrap from `u64::MAX` back to zero. After a
/// wrap, ids still held by live tasks are skipped.
#[derive(Debug, Clone, Default)]
pub struct TaskIdAllocator {
    next: u64,
}

impl TaskIdAllocator {
    /// Starts allocating at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts allocating at `next`.
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// The raw value the next allocation will try first.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Returns the next id for which `is_live` is `false`.
    pub fn allocate(&mut self, is_live: impl Fn(TaskId) -> bool) -> TaskId {
        loop {
            let id = TaskId::new(self.next);
            self.next = self.next.wrapping_add(1);
            if !is_live(id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase() {
        let mut ids = TaskIdAllocator::new();
        let a = ids.allocate(|_| false);
        let b = ids.allocate(|_| false);
        assert_eq!((a.raw(), b.raw()), (0, 1));
    }

    #[test]
    fn wraps_at_max_and_skips_live_ids() {
        let mut ids = TaskIdAllocator::starting_at(u64::MAX);
        assert_eq!(ids.allocate(|_| false).raw(), u64::MAX);

        let live = [TaskId::new(0), TaskId::new(1)];
        let id = ids.allocate(|id| live.contains(&id));
        assert_eq!(id.raw(), 2);
        assert_eq!(ids.peek(), 3);
    }
}
