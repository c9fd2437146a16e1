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

use std::net::IpAddr;

/// A `host:port => ip` override that bypasses DNS resolution for matching
/// requests.
///
/// Overrides can be set per request or on a whole event loop; loop-level
/// overrides apply to every request that loop runs.
///
/// # Examples
///
/// ```
/// use mux_http_client::ResolveHost;
///
/// let local = ResolveHost::new("example.com", 80, "127.0.0.1".parse().unwrap());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolveHost {
    host: String,
    port: u16,
    ip_addr: IpAddr,
}

impl ResolveHost {
    /// Creates a new `ResolveHost`.
    pub fn new(host: impl Into<String>, port: u16, ip_addr: IpAddr) -> Self {
        Self {
            host: host.into(),
            port,
            ip_addr,
        }
    }

    /// The host name being overridden.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port the override applies to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The address the host resolves to.
    pub fn ip_addr(&self) -> IpAddr {
        self.ip_addr
    }

    // `HOST:PORT:ADDRESS`, the transfer engine's resolve list entry format.
    pub(crate) fn to_engine_format(&self) -> String {
        format!("{}:{}:{}", self.host, self.port, self.ip_addr)
    }
}

#[cfg(test)]
mod ut_resolve {
    use super::ResolveHost;

    /// UT test cases for `ResolveHost::to_engine_format`.
    ///
    /// # Brief
    /// 1. Creates a `ResolveHost`.
    /// 2. Checks accessors and the engine entry format.
    #[test]
    fn ut_resolve_format() {
        let resolve = ResolveHost::new("example.com", 443, "10.0.0.7".parse().unwrap());
        assert_eq!(resolve.host(), "example.com");
        assert_eq!(resolve.port(), 443);
        assert_eq!(resolve.to_engine_format(), "example.com:443:10.0.0.7");
    }
}
