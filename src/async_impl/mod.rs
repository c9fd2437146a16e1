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

//! HTTP asynchronous client module.
//!
//! This module provides the components that run requests in the background:
//!
//! - [`EventLoop`]: one thread driving every in-flight transfer, delivering
//! each outcome through the request's completion callback.
//!
//! - [`EventLoopBuilder`]: configuration of a loop before it starts (handle
//! reserve, connection cap, loop-wide resolve overrides).

mod event_loop;
mod executor;
mod pool;
mod socket;
mod timesup;

pub use event_loop::{EventLoop, EventLoopBuilder};

pub(crate) use executor::perform_on_thread;
