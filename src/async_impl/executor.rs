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

//! The per-request state object binding one `Request` to one transfer
//! handle.
//!
//! An executor is created and prepared on the submitter's thread, travels to
//! the loop thread through the pending queue, and is finalized there exactly
//! once. The blocking path reuses the same configuration translation on the
//! caller's thread.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use curl::easy::{Auth, Easy2, Form, Handler, List, WriteError};

use crate::async_impl::pool::HandlePool;
use crate::async_impl::timesup::TimesupToken;
use crate::error::{ErrorKind, HttpClientError};
use crate::header::Header;
use crate::mime::MimeValue;
use crate::request::{HttpVersion, Method, OnProgress, Request, RequestBody};
use crate::resolve::ResolveHost;
use crate::response::Response;
use crate::status::RequestStatus;
use crate::util::config::HttpAuthType;

/// The transfer handle's sink. The engine writes response data, header
/// lines and progress ticks into it while the transfer runs; finalization
/// drains it into the `Response`.
pub(crate) struct Collector {
    status_line: String,
    headers: Vec<Header>,
    body: Vec<u8>,
    on_progress: Option<OnProgress>,
}

impl Collector {
    pub(crate) fn new() -> Self {
        Self {
            status_line: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
            on_progress: None,
        }
    }

    pub(crate) fn set_progress(&mut self, on_progress: Option<OnProgress>) {
        self.on_progress = on_progress;
    }

    pub(crate) fn reset(&mut self) {
        self.status_line.clear();
        self.headers.clear();
        self.body.clear();
        self.on_progress = None;
    }

    // Drains everything collected so far. Only the final response survives
    // here: redirect hops were discarded as their successors arrived.
    pub(crate) fn take_collected(&mut self) -> (String, Vec<Header>, Vec<u8>) {
        (
            std::mem::take(&mut self.status_line),
            std::mem::take(&mut self.headers),
            std::mem::take(&mut self.body),
        )
    }
}

impl Handler for Collector {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }

    fn header(&mut self, data: &[u8]) -> bool {
        let line = String::from_utf8_lossy(data);
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        if line.starts_with("HTTP/") {
            // A new status line starts a new hop (redirect or retry); only
            // the final response is reported.
            self.status_line = line.to_string();
            self.headers.clear();
            self.body.clear();
        } else if let Some((name, value)) = line.split_once(':') {
            self.headers.push(Header::new(name.trim(), value.trim()));
        }
        true
    }

    fn progress(&mut self, dltotal: f64, dlnow: f64, ultotal: f64, ulnow: f64) -> bool {
        match &self.on_progress {
            Some(handler) => handler(
                dltotal as u64,
                dlnow as u64,
                ultotal as u64,
                ulnow as u64,
            ),
            None => true,
        }
    }
}

/// Binds one in-flight `Request` to one transfer handle borrowed from the
/// loop's pool, and carries the response being assembled.
///
/// While the transfer sits inside the engine the detached handle lives in
/// the loop's parked table next to this executor; only the detached form
/// ever crosses the thread boundary.
pub(crate) struct Executor {
    request: Option<Request>,
    response: Response,
    easy: Option<Easy2<Collector>>,
    completion_called: bool,
    timesup_token: Option<TimesupToken>,
    pool: Arc<HandlePool>,
}

impl Executor {
    pub(crate) fn new(request: Request, pool: Arc<HandlePool>) -> Self {
        let easy = pool.acquire();
        Self {
            request: Some(request),
            response: Response::new(),
            easy: Some(easy),
            completion_called: false,
            timesup_token: None,
            pool,
        }
    }

    /// Translates the request into engine options. Pure configuration, no
    /// loop state involved, so it runs on the submitter's thread.
    pub(crate) fn prepare(
        &mut self,
        loop_resolve_hosts: &[ResolveHost],
    ) -> Result<(), HttpClientError> {
        let request = self.request.as_ref().expect("executor without request");
        let easy = self.easy.as_mut().expect("executor without handle");
        configure(easy, request, loop_resolve_hosts)
    }

    pub(crate) fn completion_called(&self) -> bool {
        self.completion_called
    }

    pub(crate) fn set_completion_called(&mut self) {
        self.completion_called = true;
    }

    pub(crate) fn timesup(&self) -> Option<Duration> {
        self.request.as_ref().and_then(|r| r.timesup())
    }

    pub(crate) fn set_timesup_token(&mut self, token: TimesupToken) {
        self.timesup_token = Some(token);
    }

    pub(crate) fn take_timesup_token(&mut self) -> Option<TimesupToken> {
        self.timesup_token.take()
    }

    pub(crate) fn clear_timesup_token(&mut self) {
        self.timesup_token = None;
    }

    pub(crate) fn take_easy(&mut self) -> Easy2<Collector> {
        self.easy.take().expect("transfer handle already taken")
    }

    /// Stamps the outcome and snapshots the engine info and the collected
    /// data into the response. The normal completion path.
    pub(crate) fn finish_normal(
        &mut self,
        status: RequestStatus,
        easy: Option<&mut Easy2<Collector>>,
    ) {
        self.response.set_status(status);
        if let Some(easy) = easy {
            self.response
                .set_status_code(easy.response_code().unwrap_or(0));
            self.response
                .set_total_time(easy.total_time().unwrap_or(Duration::ZERO));
            let (status_line, headers, body) = easy.get_mut().take_collected();
            self.response.set_status_line(status_line);
            self.response.set_headers(headers);
            self.response.set_body(body);
        }
    }

    /// Stamps the timesup outcome. The body becomes a synthetic marker; the
    /// headers are whatever arrived before the deadline. The transfer handle
    /// stays inside the engine and the entry in the timesup index stays put:
    /// the expiry scan owns index advancement so that several executors
    /// sharing one deadline can be expired in a single pass.
    pub(crate) fn finish_timesup(&mut self, partial: Option<(String, Vec<Header>)>) {
        let timesup = self.timesup().unwrap_or(Duration::ZERO);
        self.response.set_status(RequestStatus::Timesup);
        if let Some((status_line, headers)) = partial {
            self.response.set_status_line(status_line);
            self.response.set_headers(headers);
        }
        self.response
            .set_body(format!("timesup of {} ms exceeded", timesup.as_millis()).into_bytes());
        self.response.set_total_time(timesup);
    }

    /// Moves the request and the assembled response into the completion
    /// callback. The `completion_called` guard in the callers makes sure
    /// this happens at most once per executor.
    pub(crate) fn deliver(&mut self) {
        let Some(mut request) = self.request.take() else {
            return;
        };
        let handler = request.take_on_complete();
        let response = std::mem::replace(&mut self.response, Response::new());
        if let Some(handler) = handler {
            handler(request, response);
        }
    }

    pub(crate) fn release_handle(&self, easy: Easy2<Collector>) {
        self.pool.release(easy);
    }
}

/// Runs a request to completion on the calling thread with a fresh,
/// non-pooled transfer handle. Shares `configure` and the snapshot logic
/// with the asynchronous path and never touches any event loop state.
pub(crate) fn perform_on_thread(request: &mut Request) -> Response {
    let mut response = Response::new();
    let mut easy = Easy2::new(Collector::new());

    if configure(&mut easy, request, &[]).is_err() {
        response.set_status(RequestStatus::SendError);
        return response;
    }

    let status = RequestStatus::from_transfer_result(easy.perform());
    response.set_status(status);
    response.set_status_code(easy.response_code().unwrap_or(0));
    response.set_total_time(easy.total_time().unwrap_or(Duration::ZERO));
    let (status_line, headers, body) = easy.get_mut().take_collected();
    response.set_status_line(status_line);
    response.set_headers(headers);
    response.set_body(body);
    response
}

/// Translates every request field into engine options and installs the
/// collector's sinks. Shared by the asynchronous and the blocking path.
pub(crate) fn configure(
    easy: &mut Easy2<Collector>,
    request: &Request,
    loop_resolve_hosts: &[ResolveHost],
) -> Result<(), HttpClientError> {
    apply_options(easy, request, loop_resolve_hosts)
        .map_err(|e| HttpClientError::new_with_cause(ErrorKind::Build, Some(e)))
}

fn apply_options(
    easy: &mut Easy2<Collector>,
    request: &Request,
    loop_resolve_hosts: &[ResolveHost],
) -> Result<(), Box<dyn Error + Send + Sync>> {
    easy.url(request.url())?;

    match request.method() {
        Method::Get => easy.get(true)?,
        Method::Head => easy.nobody(true)?,
        Method::Post => easy.post(true)?,
        method => easy.custom_request(method.as_str())?,
    }

    easy.http_version(match request.version() {
        HttpVersion::UseBest => curl::easy::HttpVersion::Any,
        HttpVersion::Http10 => curl::easy::HttpVersion::V10,
        HttpVersion::Http11 => curl::easy::HttpVersion::V11,
        HttpVersion::Http2 => curl::easy::HttpVersion::V2,
        HttpVersion::Http2Tls => curl::easy::HttpVersion::V2TLS,
        HttpVersion::Http2PriorKnowledge => curl::easy::HttpVersion::V2PriorKnowledge,
    })?;

    if !request.headers().is_empty() {
        let mut list = List::new();
        for header in request.headers() {
            list.append(&header.to_engine_format())?;
        }
        easy.http_headers(list)?;
    }

    match request.request_body() {
        RequestBody::Empty => {}
        RequestBody::Raw(data) => easy.post_fields_copy(data)?,
        RequestBody::Mime(fields) => {
            let mut form = Form::new();
            for field in fields {
                match field.value() {
                    MimeValue::Contents(contents) => {
                        form.part(field.name()).contents(contents.as_bytes()).add()?
                    }
                    MimeValue::FilePath(path) => form.part(field.name()).file(path).add()?,
                }
            }
            easy.httppost(form)?;
        }
    }

    easy.ssl_verify_peer(request.verify_ssl_peer())?;
    easy.ssl_verify_host(request.verify_ssl_host())?;
    if let Some(cert) = request.ssl_cert() {
        easy.ssl_cert(cert)?;
        if let Some(cert_type) = request.cert_type() {
            easy.ssl_cert_type(cert_type.as_engine_str())?;
        }
    }
    if let Some(key) = request.ssl_key() {
        easy.ssl_key(key)?;
    }
    if let Some(password) = request.key_password() {
        easy.key_password(password)?;
    }

    if let Some(proxy) = request.proxy() {
        easy.proxy(proxy.host())?;
        easy.proxy_port(proxy.proxy_port())?;
        match proxy.proxy_type() {
            crate::util::config::ProxyType::Http => {
                easy.proxy_type(curl::easy::ProxyType::Http)?;
            }
            // curl-rust's safe `ProxyType` enum has no `Https` variant even
            // though libcurl's `CURLOPT_PROXYTYPE` accepts `CURLPROXY_HTTPS`
            // (2); set the raw option directly to get the intended behavior.
            crate::util::config::ProxyType::Https => {
                setopt_long_raw(easy, curl_sys::CURLOPT_PROXYTYPE, 2)?;
            }
        }
        if let Some(username) = proxy.username() {
            easy.proxy_username(username)?;
        }
        if let Some(password) = proxy.password() {
            easy.proxy_password(password)?;
        }
        easy.proxy_auth(&proxy_auth_set(proxy.selected_auth_types()))?;
    }

    if let Some(encodings) = request.accept_encodings() {
        // An empty list asks for everything this engine build supports.
        easy.accept_encoding(&encodings.join(", "))?;
    }

    if !request.resolve_hosts().is_empty() || !loop_resolve_hosts.is_empty() {
        let mut list = List::new();
        for resolve in loop_resolve_hosts.iter().chain(request.resolve_hosts()) {
            list.append(&resolve.to_engine_format())?;
        }
        easy.resolve(list)?;
    }

    if let Some(timeout) = request.timeout() {
        easy.timeout(timeout)?;
    }
    if let Some(happy_eyeballs) = request.happy_eyeballs_timeout() {
        // curl-rust's safe `Easy2` wrapper has no method for
        // `CURLOPT_HAPPY_EYEBALLS_TIMEOUT_MS` (271); set the raw option
        // directly to get the intended behavior.
        setopt_long_raw(
            easy,
            271,
            happy_eyeballs.as_millis() as std::os::raw::c_long,
        )?;
    }

    easy.follow_location(request.follow_redirects())?;
    if request.follow_redirects() && request.max_redirects() >= 0 {
        easy.max_redirections(request.max_redirects() as u32)?;
    }

    let progress = request.progress_handler();
    if progress.is_some() {
        easy.progress(true)?;
    }
    easy.get_mut().set_progress(progress);

    Ok(())
}

// Sets a `CURLOPT_*` long option that curl-rust's safe `Easy2` wrapper has
// no method for, via the raw handle it exposes through `Easy2::raw`.
fn setopt_long_raw(
    easy: &mut Easy2<Collector>,
    option: curl_sys::CURLoption,
    value: std::os::raw::c_long,
) -> Result<(), curl::Error> {
    let rc = unsafe { curl_sys::curl_easy_setopt(easy.raw(), option, value) };
    if rc == curl_sys::CURLE_OK {
        Ok(())
    } else {
        Err(curl::Error::new(rc))
    }
}

// BASIC is the engine default; ANY lets it pick the strongest offered and
// ANY_SAFE excludes cleartext schemes.
fn proxy_auth_set(auth_types: Option<&[HttpAuthType]>) -> Auth {
    let mut auth = Auth::new();
    match auth_types {
        None => {
            auth.basic(true);
        }
        Some(types) => {
            for auth_type in types {
                match auth_type {
                    HttpAuthType::Basic => {
                        auth.basic(true);
                    }
                    HttpAuthType::Any => {
                        auth.basic(true).digest(true).gssnegotiate(true).ntlm(true);
                    }
                    HttpAuthType::AnySafe => {
                        auth.digest(true).gssnegotiate(true).ntlm(true);
                    }
                }
            }
        }
    }
    auth
}
