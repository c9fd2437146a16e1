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

/// A single HTTP header, a name and value pair.
///
/// # Examples
///
/// ```
/// use mux_http_client::Header;
///
/// let header = Header::new("Connection", "Keep-Alive");
/// assert_eq!(header.name(), "Connection");
/// assert_eq!(header.value(), "Keep-Alive");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    /// Creates a new `Header`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The name of the header, e.g. `Connection`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of the header, e.g. `Keep-Alive`. Empty when the header was
    /// added to suppress one of the engine's default headers.
    pub fn value(&self) -> &str {
        &self.value
    }

    // Header names compare case-insensitively per RFC 9110.
    pub(crate) fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    // The `Name: value` form the transfer engine consumes. A bare `Name:`
    // tells the engine to drop its default header of that name.
    pub(crate) fn to_engine_format(&self) -> String {
        if self.value.is_empty() {
            format!("{}:", self.name)
        } else {
            format!("{}: {}", self.name, self.value)
        }
    }
}

#[cfg(test)]
mod ut_header {
    use super::Header;

    /// UT test cases for `Header` accessors and matching.
    ///
    /// # Brief
    /// 1. Creates a `Header`.
    /// 2. Checks accessors, case-insensitive matching and the engine format.
    #[test]
    fn ut_header_basic() {
        let header = Header::new("Content-Type", "text/plain");
        assert_eq!(header.name(), "Content-Type");
        assert_eq!(header.value(), "text/plain");
        assert!(header.name_matches("content-type"));
        assert!(!header.name_matches("content-length"));
        assert_eq!(header.to_engine_format(), "Content-Type: text/plain");
    }

    /// UT test cases for the header removal form.
    ///
    /// # Brief
    /// 1. Creates a `Header` with an empty value.
    /// 2. Checks that the engine format is the bare `Name:` form.
    #[test]
    fn ut_header_removal_form() {
        let header = Header::new("Expect", "");
        assert_eq!(header.to_engine_format(), "Expect:");
    }
}
