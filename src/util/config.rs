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

/// The scheme used to talk to the proxy itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProxyType {
    /// Plain HTTP proxy.
    Http,
    /// HTTPS proxy.
    Https,
}

/// HTTP authentication methods usable against a proxy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HttpAuthType {
    /// Basic HTTP authentication, the default.
    Basic,
    /// All available methods; the engine picks the most secure one offered.
    Any,
    /// All available methods considered secure/safe.
    AnySafe,
}

/// Proxy settings for a single request.
///
/// # Examples
///
/// ```
/// use mux_http_client::{ProxyData, ProxyType};
///
/// let proxy = ProxyData::new(ProxyType::Http, "proxy.example.com")
///     .port(3128)
///     .basic_auth("Aladdin", "open sesame");
/// ```
#[derive(Clone, Debug)]
pub struct ProxyData {
    proxy_type: ProxyType,
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    auth_types: Option<Vec<HttpAuthType>>,
}

impl ProxyData {
    /// Creates proxy settings for the given proxy host, on the default
    /// port 80 and without credentials.
    pub fn new(proxy_type: ProxyType, host: impl Into<String>) -> Self {
        Self {
            proxy_type,
            host: host.into(),
            port: 80,
            username: None,
            password: None,
            auth_types: None,
        }
    }

    /// Sets the proxy port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the username and password to authenticate against the proxy
    /// with. The methods offered default to `Basic` unless [`auth_types`]
    /// selects otherwise.
    ///
    /// [`auth_types`]: Self::auth_types
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Selects the authentication methods offered to the proxy.
    pub fn auth_types(mut self, auth_types: Vec<HttpAuthType>) -> Self {
        self.auth_types = Some(auth_types);
        self
    }

    pub(crate) fn proxy_type(&self) -> ProxyType {
        self.proxy_type
    }

    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn proxy_port(&self) -> u16 {
        self.port
    }

    pub(crate) fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub(crate) fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub(crate) fn selected_auth_types(&self) -> Option<&[HttpAuthType]> {
        self.auth_types.as_deref()
    }
}

/// The encoding of a client certificate file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CertType {
    /// PEM encoded certificate.
    Pem,
    /// DER encoded certificate.
    Der,
}

impl CertType {
    // The engine expects the encoding by name.
    pub(crate) fn as_engine_str(&self) -> &'static str {
        match self {
            Self::Pem => "PEM",
            Self::Der => "DER",
        }
    }
}
