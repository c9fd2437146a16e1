// Copyright (c) 2023 Huawei Device Co., Ltd.
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

use std::collections::BTreeMap;

/// An opaque handle to one entry of the [`TimesupIndex`]. Stable: removing
/// other entries never invalidates it, and removing an already-expired token
/// is a no-op.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct TimesupToken {
    deadline: u64,
    seq: u64,
}

/// Deadline-ordered index of in-flight executors with a total-wall-clock
/// limit. Duplicate deadlines are allowed; a per-insert sequence number keeps
/// the map keys unique and the tokens stable.
pub(crate) struct TimesupIndex {
    entries: BTreeMap<(u64, u64), usize>,
    next_seq: u64,
}

impl TimesupIndex {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Adds an executor token under the given absolute deadline
    /// (milliseconds on the loop clock).
    pub(crate) fn insert(&mut self, deadline: u64, executor: usize) -> TimesupToken {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert((deadline, seq), executor);
        TimesupToken { deadline, seq }
    }

    /// Removes the entry behind `token`, if it is still present.
    pub(crate) fn remove(&mut self, token: TimesupToken) {
        self.entries.remove(&(token.deadline, token.seq));
    }

    /// The entry with the smallest deadline, if any.
    pub(crate) fn earliest(&self) -> Option<(u64, usize)> {
        self.entries
            .iter()
            .next()
            .map(|(&(deadline, _), &executor)| (deadline, executor))
    }

    /// Removes the entry with the smallest deadline. Used by the expiry scan
    /// to advance past an entry it has just visited.
    pub(crate) fn pop_first(&mut self) {
        if let Some(&key) = self.entries.keys().next() {
            self.entries.remove(&key);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod ut_timesup {
    use super::TimesupIndex;

    /// UT test cases for ordering and duplicate deadlines.
    ///
    /// # Brief
    /// 1. Inserts three entries, two sharing one deadline.
    /// 2. Checks `earliest` order and that `pop_first` walks duplicates one
    ///    by one.
    #[test]
    fn ut_timesup_order_and_duplicates() {
        let mut index = TimesupIndex::new();
        index.insert(200, 1);
        index.insert(100, 2);
        index.insert(100, 3);
        assert_eq!(index.len(), 3);

        assert_eq!(index.earliest(), Some((100, 2)));
        index.pop_first();
        assert_eq!(index.earliest(), Some((100, 3)));
        index.pop_first();
        assert_eq!(index.earliest(), Some((200, 1)));
        index.pop_first();
        assert!(index.is_empty());
    }

    /// UT test cases for token stability.
    ///
    /// # Brief
    /// 1. Inserts two entries with the same deadline and removes the first
    ///    by token.
    /// 2. Checks the second entry survives and that removing the same token
    ///    again is a no-op.
    #[test]
    fn ut_timesup_token_removal() {
        let mut index = TimesupIndex::new();
        let first = index.insert(50, 7);
        index.insert(50, 8);

        index.remove(first);
        assert_eq!(index.earliest(), Some((50, 8)));

        index.remove(first);
        assert_eq!(index.len(), 1);
    }
}
