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

//! `mux_http_client` provides an HTTP(S) client that multiplexes many
//! concurrent requests over a single background event loop thread, reusing
//! connections across requests, and delivers each response through a
//! completion callback. The same request model also supports blocking
//! single-shot execution on the calling thread.
//!
//! # Asynchronous requests
//!
//! ```no_run
//! use mux_http_client::async_impl::EventLoop;
//! use mux_http_client::Request;
//!
//! let event_loop = EventLoop::new().unwrap();
//!
//! let mut request = Request::new("http://www.example.com");
//! request.on_complete(|_request, response| {
//!     println!("{} {}", response.status_code(), response.body_as_str());
//! });
//! event_loop.submit(request);
//! // Dropping the loop waits for every callback to fire.
//! ```
//!
//! # Synchronous requests
//!
//! ```no_run
//! use mux_http_client::Request;
//!
//! let response = Request::new("http://www.example.com").perform();
//! println!("{}", response.status_code());
//! ```

pub mod async_impl;
pub mod sync_impl;
pub mod util;

mod error;
mod header;
mod mime;
mod request;
mod resolve;
mod response;
mod status;

pub use error::{ErrorKind, HttpClientError};
pub use header::Header;
pub use mime::MimeField;
pub use request::{HttpVersion, Method, OnComplete, OnProgress, Request};
pub use resolve::ResolveHost;
pub use response::Response;
pub use status::RequestStatus;
pub use util::{CertType, HttpAuthType, ProxyData, ProxyType};
