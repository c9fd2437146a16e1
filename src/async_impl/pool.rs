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

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use curl::easy::Easy2;

use crate::async_impl::executor::Collector;

// A recycled transfer handle keeps its live connections and session caches
// across requests.
pub(crate) struct HandlePool {
    handles: Mutex<Vec<Easy2<Collector>>>,
    created: AtomicU64,
}

impl HandlePool {
    pub(crate) fn new() -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
            created: AtomicU64::new(0),
        }
    }

    /// Pre-creates `reserve` handles so the first submissions do not pay the
    /// handle setup cost.
    pub(crate) fn warm(&self, reserve: usize) {
        let mut fresh = Vec::with_capacity(reserve);
        for _ in 0..reserve {
            fresh.push(self.create());
        }
        self.handles.lock().unwrap().append(&mut fresh);
    }

    /// Takes a handle from the free list, creating a fresh one when the list
    /// is empty. Never fails.
    pub(crate) fn acquire(&self) -> Easy2<Collector> {
        let recycled = self.handles.lock().unwrap().pop();
        recycled.unwrap_or_else(|| self.create())
    }

    /// Returns a handle to the free list. The handle and its collector are
    /// reset so the next acquire starts from a clean slate; the underlying
    /// connection cache survives the reset.
    pub(crate) fn release(&self, mut easy: Easy2<Collector>) {
        easy.get_mut().reset();
        easy.reset();
        self.handles.lock().unwrap().push(easy);
    }

    /// How many handles this pool has created over its lifetime.
    pub(crate) fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// How many handles currently sit on the free list.
    pub(crate) fn idle_count(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    fn create(&self) -> Easy2<Collector> {
        self.created.fetch_add(1, Ordering::Relaxed);
        Easy2::new(Collector::new())
    }
}
