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

use std::time::Duration;

use crate::header::Header;
use crate::status::RequestStatus;

/// The response of a finished request.
///
/// A response always carries a [`RequestStatus`] describing how the request
/// ended; the HTTP fields are only meaningful when that status is
/// `Success`.
///
/// # Examples
///
/// ```no_run
/// use mux_http_client::Request;
///
/// let response = Request::new("http://www.example.com").perform();
/// if response.status().is_success() {
///     println!("{} {}", response.status_code(), response.body_as_str());
/// }
/// ```
#[derive(Debug)]
pub struct Response {
    status: RequestStatus,
    status_code: u32,
    status_line: String,
    headers: Vec<Header>,
    body: Vec<u8>,
    total_time: Duration,
}

impl Response {
    pub(crate) fn new() -> Self {
        Self {
            status: RequestStatus::Unknown,
            status_code: 0,
            status_line: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
            total_time: Duration::ZERO,
        }
    }

    /// The library-level outcome of the request.
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// The numeric HTTP status code of the final response, e.g. `200`.
    pub fn status_code(&self) -> u32 {
        self.status_code
    }

    /// The raw HTTP status line of the final response, e.g.
    /// `HTTP/1.1 200 OK`.
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// The headers of the final response. When redirects were followed only
    /// the last hop's headers are kept.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Looks a header up by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.name_matches(name))
    }

    /// The response body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The response body as text, with invalid UTF-8 replaced.
    pub fn body_as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Total time the transfer took.
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    pub(crate) fn set_status(&mut self, status: RequestStatus) {
        self.status = status;
    }

    pub(crate) fn set_status_code(&mut self, status_code: u32) {
        self.status_code = status_code;
    }

    pub(crate) fn set_status_line(&mut self, status_line: String) {
        self.status_line = status_line;
    }

    pub(crate) fn set_headers(&mut self, headers: Vec<Header>) {
        self.headers = headers;
    }

    pub(crate) fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    pub(crate) fn set_total_time(&mut self, total_time: Duration) {
        self.total_time = total_time;
    }
}
