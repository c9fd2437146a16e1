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

//! HTTP synchronous client module.
//!
//! [`Request::perform`] lands here: the request is driven to completion on
//! the calling thread with a private transfer handle, sharing the
//! configuration translation and response assembly with the asynchronous
//! path. No event loop state is involved, so this is safe to call from any
//! thread, including alongside a running loop.
//!
//! [`Request::perform`]: crate::Request::perform

use crate::request::Request;
use crate::response::Response;

pub(crate) fn perform(request: &mut Request) -> Response {
    crate::async_impl::perform_on_thread(request)
}
