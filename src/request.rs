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

//! The user-facing request model.
//!
//! A [`Request`] is configured in place and then either handed to an
//! [`EventLoop`] for asynchronous execution or driven to completion on the
//! calling thread with [`Request::perform`]. Both paths share the same
//! configuration translation.
//!
//! [`EventLoop`]: crate::async_impl::EventLoop

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ErrorKind, HttpClientError};
use crate::header::Header;
use crate::mime::MimeField;
use crate::resolve::ResolveHost;
use crate::response::Response;
use crate::util::config::{CertType, ProxyData};

/// Completion callback for asynchronous requests. Ownership of the request
/// and its response moves into the callback; it is invoked exactly once per
/// submitted request.
pub type OnComplete = Box<dyn FnOnce(Request, Response) + Send + 'static>;

/// Transfer progress callback, called periodically with
/// `(download_total, download_now, upload_total, upload_now)` byte counts.
/// Returning `false` aborts the transfer; it then finishes with
/// [`RequestStatus::RequestAborted`].
///
/// [`RequestStatus::RequestAborted`]: crate::RequestStatus::RequestAborted
pub type OnProgress = Arc<dyn Fn(u64, u64, u64, u64) -> bool + Send + Sync + 'static>;

/// The HTTP method of a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    /// `GET`, the default.
    Get,
    /// `HEAD`.
    Head,
    /// `POST`.
    Post,
    /// `PUT`.
    Put,
    /// `DELETE`.
    Delete,
    /// `PATCH`.
    Patch,
    /// `OPTIONS`.
    Options,
    /// `CONNECT`.
    Connect,
}

impl Method {
    /// The method name as it appears on the request line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
        }
    }
}

/// The HTTP version a request is allowed to negotiate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HttpVersion {
    /// Let the transfer engine pick the best version it can, the default.
    UseBest,
    /// HTTP/1.0.
    Http10,
    /// HTTP/1.1.
    Http11,
    /// Attempt HTTP/2, falling back to HTTP/1.1.
    Http2,
    /// Attempt HTTP/2 over TLS only, falling back to HTTP/1.1.
    Http2Tls,
    /// HTTP/2 without the HTTP/1.1 upgrade dance; fails if the server does
    /// not speak it.
    Http2PriorKnowledge,
}

// Raw POST data and mime fields are mutually exclusive; the variant makes an
// illegal combination unrepresentable.
#[derive(Clone, Debug)]
pub(crate) enum RequestBody {
    Empty,
    Raw(Vec<u8>),
    Mime(Vec<MimeField>),
}

/// An HTTP request.
///
/// The request is owned by the user until it is handed to an event loop with
/// [`EventLoop::submit`]; ownership comes back through the completion
/// callback together with the [`Response`]. [`Request::perform`] executes the
/// same request synchronously on the calling thread.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use mux_http_client::Request;
///
/// let mut request = Request::new("http://www.example.com");
/// request.set_timeout(Some(Duration::from_secs(5)));
/// let response = request.perform();
/// ```
///
/// [`EventLoop::submit`]: crate::async_impl::EventLoop::submit
pub struct Request {
    url: String,
    method: Method,
    version: HttpVersion,
    timeout: Option<Duration>,
    timesup: Option<Duration>,
    follow_redirects: bool,
    max_redirects: i64,
    verify_ssl_peer: bool,
    verify_ssl_host: bool,
    cert: Option<PathBuf>,
    cert_type: Option<CertType>,
    key: Option<PathBuf>,
    key_password: Option<String>,
    proxy: Option<ProxyData>,
    accept_encodings: Option<Vec<String>>,
    resolve_hosts: Vec<ResolveHost>,
    headers: Vec<Header>,
    body: RequestBody,
    happy_eyeballs_timeout: Option<Duration>,
    on_complete: Option<OnComplete>,
    on_progress: Option<OnProgress>,
}

impl Request {
    /// Creates a new `Request` for the given url.
    ///
    /// # Examples
    ///
    /// ```
    /// use mux_http_client::Request;
    ///
    /// let request = Request::new("http://www.example.com");
    /// ```
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            version: HttpVersion::UseBest,
            timeout: None,
            timesup: None,
            follow_redirects: true,
            max_redirects: -1,
            verify_ssl_peer: true,
            verify_ssl_host: true,
            cert: None,
            cert_type: None,
            key: None,
            key_password: None,
            proxy: None,
            accept_encodings: None,
            resolve_hosts: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            happy_eyeballs_timeout: None,
            on_complete: None,
            on_progress: None,
        }
    }

    /// The URL of the request.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sets the URL of the request.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// The HTTP method this request will use.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Sets the HTTP method this request should use. Note that
    /// [`set_body`] switches the method to `POST` on its own; override the
    /// method after that call if e.g. `PUT` is wanted.
    ///
    /// [`set_body`]: Self::set_body
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// The HTTP version this request will negotiate.
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// Sets the HTTP version this request should negotiate.
    pub fn set_version(&mut self, version: HttpVersion) {
        self.version = version;
    }

    /// The transport-level timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sets the transport-level timeout, enforced by the transfer engine. A
    /// request without one can block for as long as the server stays silent.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// The total-wall-clock deadline, if any.
    pub fn timesup(&self) -> Option<Duration> {
        self.timesup
    }

    /// Sets the total-wall-clock deadline. It is enforced by the event loop
    /// independently of the transport timeout: when it elapses first, the
    /// completion callback fires immediately with
    /// [`RequestStatus::Timesup`] while the engine finishes tearing the
    /// transfer down in the background. The synchronous path ignores it.
    ///
    /// [`RequestStatus::Timesup`]: crate::RequestStatus::Timesup
    pub fn set_timesup(&mut self, timesup: Option<Duration>) {
        self.timesup = timesup;
    }

    /// Is the request automatically following redirects?
    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    /// When following redirects, the maximum number to follow; `-1` means
    /// unlimited.
    pub fn max_redirects(&self) -> i64 {
        self.max_redirects
    }

    /// Sets whether this request follows redirects, and how deep. Following
    /// is enabled by default with no depth limit. A `None` or negative
    /// maximum means unlimited.
    pub fn set_follow_redirects(&mut self, follow: bool, max_redirects: Option<i64>) {
        self.follow_redirects = follow;
        if follow {
            self.max_redirects = match max_redirects {
                Some(max) if max >= 0 => max,
                _ => -1,
            };
        }
    }

    /// Is the SSL/TLS peer certificate verified? Defaults to `true`.
    pub fn verify_ssl_peer(&self) -> bool {
        self.verify_ssl_peer
    }

    /// Sets whether the SSL/TLS peer certificate is verified.
    pub fn set_verify_ssl_peer(&mut self, verify: bool) {
        self.verify_ssl_peer = verify;
    }

    /// Is the SSL/TLS host name verified against the certificate? Defaults
    /// to `true`.
    pub fn verify_ssl_host(&self) -> bool {
        self.verify_ssl_host
    }

    /// Sets whether the SSL/TLS host name is verified.
    pub fn set_verify_ssl_host(&mut self, verify: bool) {
        self.verify_ssl_host = verify;
    }

    /// Sets the client certificate file to present, and optionally its
    /// encoding.
    pub fn set_ssl_cert(&mut self, cert: impl Into<PathBuf>, cert_type: Option<CertType>) {
        self.cert = Some(cert.into());
        self.cert_type = cert_type;
    }

    /// The client certificate file, if one is set.
    pub fn ssl_cert(&self) -> Option<&PathBuf> {
        self.cert.as_ref()
    }

    /// Sets the private key file for the client certificate.
    pub fn set_ssl_key(&mut self, key: impl Into<PathBuf>) {
        self.key = Some(key.into());
    }

    /// The private key file, if one is set.
    pub fn ssl_key(&self) -> Option<&PathBuf> {
        self.key.as_ref()
    }

    /// Sets the pass phrase of the private key.
    pub fn set_key_password(&mut self, password: impl Into<String>) {
        self.key_password = Some(password.into());
    }

    /// Sets the proxy this request connects through.
    ///
    /// # Examples
    ///
    /// ```
    /// use mux_http_client::{ProxyData, ProxyType, Request};
    ///
    /// let mut request = Request::new("http://www.example.com");
    /// request.set_proxy(ProxyData::new(ProxyType::Http, "proxy.example.com").port(3128));
    /// ```
    pub fn set_proxy(&mut self, proxy: ProxyData) {
        self.proxy = Some(proxy);
    }

    /// The proxy settings, if any.
    pub fn proxy(&self) -> Option<&ProxyData> {
        self.proxy.as_ref()
    }

    /// Sets the `Accept-Encoding` values offered to the server. `None`
    /// leaves the header untouched. Mutually exclusive with adding an
    /// `Accept-Encoding` header by hand.
    pub fn set_accept_encodings(&mut self, encodings: Option<Vec<String>>) {
        self.accept_encodings = encodings;
    }

    /// Offers every encoding this build of the transfer engine supports.
    pub fn accept_encoding_all_available(&mut self) {
        self.accept_encodings = Some(Vec::new());
    }

    /// The configured `Accept-Encoding` values. An empty list means "all
    /// available".
    pub fn accept_encodings(&self) -> Option<&[String]> {
        self.accept_encodings.as_deref()
    }

    /// Adds a `host:port => ip` override to bypass DNS for this request.
    pub fn add_resolve_host(&mut self, resolve_host: ResolveHost) {
        self.resolve_hosts.push(resolve_host);
    }

    /// Clears all resolve overrides set on this request.
    pub fn clear_resolve_hosts(&mut self) {
        self.resolve_hosts.clear();
    }

    /// The resolve overrides set on this request.
    pub fn resolve_hosts(&self) -> &[ResolveHost] {
        &self.resolve_hosts
    }

    /// Adds a request header.
    ///
    /// # Examples
    ///
    /// ```
    /// use mux_http_client::Request;
    ///
    /// let mut request = Request::new("http://www.example.com");
    /// request.header("Connection", "Keep-Alive");
    /// ```
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push(Header::new(name, value));
    }

    /// Suppresses one of the headers the transfer engine adds by default,
    /// e.g. `Expect`.
    pub fn remove_header(&mut self, name: impl Into<String>) {
        self.headers.push(Header::new(name, ""));
    }

    /// The headers currently added to this request.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Clears the current set of headers for this request.
    pub fn clear_headers(&mut self) {
        self.headers.clear();
    }

    /// Sets the request body and switches the method to `POST`. Override the
    /// method afterwards for e.g. `PUT`.
    ///
    /// Mutually exclusive with [`add_mime_field`]: a request cannot carry
    /// traditional POST data inside a mime form submission.
    ///
    /// # Errors
    ///
    /// `ConfigurationConflict` if mime fields were already added; the
    /// request is left unchanged.
    ///
    /// [`add_mime_field`]: Self::add_mime_field
    pub fn set_body(&mut self, data: impl Into<Vec<u8>>) -> Result<(), HttpClientError> {
        match self.body {
            RequestBody::Mime(_) => Err(HttpClientError::new_with_message(
                ErrorKind::ConfigurationConflict,
                "cannot set a POST body after adding mime fields",
            )),
            _ => {
                self.body = RequestBody::Raw(data.into());
                self.method = Method::Post;
                Ok(())
            }
        }
    }

    /// The raw POST body, if one is set.
    pub fn body_data(&self) -> Option<&[u8]> {
        match &self.body {
            RequestBody::Raw(data) => Some(data),
            _ => None,
        }
    }

    /// Adds a mime field to this request, making it a multipart form
    /// submission.
    ///
    /// # Errors
    ///
    /// `ConfigurationConflict` if a raw POST body was already set; the
    /// request is left unchanged.
    pub fn add_mime_field(&mut self, field: MimeField) -> Result<(), HttpClientError> {
        match &mut self.body {
            RequestBody::Raw(_) => Err(HttpClientError::new_with_message(
                ErrorKind::ConfigurationConflict,
                "cannot add mime fields after setting a POST body",
            )),
            RequestBody::Mime(fields) => {
                fields.push(field);
                Ok(())
            }
            RequestBody::Empty => {
                self.body = RequestBody::Mime(vec![field]);
                Ok(())
            }
        }
    }

    /// The mime fields of this request.
    pub fn mime_fields(&self) -> &[MimeField] {
        match &self.body {
            RequestBody::Mime(fields) => fields,
            _ => &[],
        }
    }

    /// Sets the happy eyeballs timeout, the head start given to the first
    /// address family when connecting to a dual-stack host.
    pub fn set_happy_eyeballs_timeout(&mut self, timeout: Duration) {
        self.happy_eyeballs_timeout = Some(timeout);
    }

    /// The happy eyeballs timeout, if one is set.
    pub fn happy_eyeballs_timeout(&self) -> Option<Duration> {
        self.happy_eyeballs_timeout
    }

    /// Sets the completion callback invoked when this request finishes on an
    /// event loop. Synchronous execution never calls it; [`perform`] returns
    /// the response instead.
    ///
    /// [`perform`]: Self::perform
    pub fn on_complete<F>(&mut self, handler: F)
    where
        F: FnOnce(Request, Response) + Send + 'static,
    {
        self.on_complete = Some(Box::new(handler));
    }

    /// Sets or clears the transfer progress callback.
    pub fn on_progress<F>(&mut self, handler: Option<F>)
    where
        F: Fn(u64, u64, u64, u64) -> bool + Send + Sync + 'static,
    {
        self.on_progress = handler.map(|h| {
            let handler: OnProgress = Arc::new(h);
            handler
        });
    }

    /// Synchronously executes this request on the calling thread and returns
    /// its response. Shares the configuration translation with the
    /// asynchronous path but never touches an event loop.
    ///
    /// Note: without a transport timeout this call can block for as long as
    /// the server stays silent.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mux_http_client::Request;
    ///
    /// let response = Request::new("http://www.example.com").perform();
    /// assert!(response.status().is_success());
    /// ```
    pub fn perform(&mut self) -> Response {
        crate::sync_impl::perform(self)
    }

    pub(crate) fn request_body(&self) -> &RequestBody {
        &self.body
    }

    pub(crate) fn take_on_complete(&mut self) -> Option<OnComplete> {
        self.on_complete.take()
    }

    pub(crate) fn progress_handler(&self) -> Option<OnProgress> {
        self.on_progress.clone()
    }

    pub(crate) fn cert_type(&self) -> Option<CertType> {
        self.cert_type
    }

    pub(crate) fn key_password(&self) -> Option<&str> {
        self.key_password.as_deref()
    }
}

impl core::fmt::Debug for Request {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("version", &self.version)
            .field("timeout", &self.timeout)
            .field("timesup", &self.timesup)
            .finish()
    }
}
