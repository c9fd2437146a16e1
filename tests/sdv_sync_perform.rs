/*
 * Copyright (c) 2023 Huawei Device Co., Ltd.
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

mod common;

use std::sync::mpsc;
use std::time::Duration;

use mux_http_client::async_impl::EventLoop;
use mux_http_client::{Request, RequestStatus};

use common::start_stub_server;

/// SDV test case for the blocking single-shot path.
///
/// # Brief
/// 1. Starts a stub returning `200 OK` with body `hi`.
/// 2. Performs a request synchronously.
/// 3. Checks status, code, body and headers.
#[test]
fn sdv_sync_perform() {
    let server = start_stub_server(Duration::ZERO, 200, "hi");

    let mut request = Request::new(server.url("/"));
    request.set_timeout(Some(Duration::from_secs(10)));
    let response = request.perform();

    assert_eq!(response.status(), RequestStatus::Success);
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body_as_str(), "hi");
    assert_eq!(response.header("X-Stub").unwrap().value(), "1");
    assert!(response.status_line().starts_with("HTTP/"));
}

/// SDV test case for parity between the blocking and the asynchronous path.
///
/// # Brief
/// 1. Runs the same GET through `perform` and through an event loop.
/// 2. Checks both responses agree on status, code, body and the stub's
///    marker header.
#[test]
fn sdv_sync_async_parity() {
    let server = start_stub_server(Duration::ZERO, 200, "payload");

    let mut sync_request = Request::new(server.url("/parity"));
    sync_request.set_timeout(Some(Duration::from_secs(10)));
    let sync_response = sync_request.perform();

    let event_loop = EventLoop::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let mut async_request = Request::new(server.url("/parity"));
    async_request.set_timeout(Some(Duration::from_secs(10)));
    async_request.on_complete(move |_request, response| {
        tx.send(response).unwrap();
    });
    assert!(event_loop.submit(async_request));
    let async_response = rx.recv_timeout(Duration::from_secs(10)).unwrap();

    assert_eq!(sync_response.status(), async_response.status());
    assert_eq!(sync_response.status_code(), async_response.status_code());
    assert_eq!(sync_response.body(), async_response.body());
    assert_eq!(
        sync_response.header("X-Stub").unwrap().value(),
        async_response.header("X-Stub").unwrap().value()
    );
}

/// SDV test case for aborting a transfer from the progress callback.
///
/// # Brief
/// 1. Starts a stub that stalls 300 ms.
/// 2. Performs a request whose progress callback returns `false`.
/// 3. Checks the request ends with `RequestAborted`.
#[test]
fn sdv_progress_abort() {
    let server = start_stub_server(Duration::from_millis(300), 200, "never");

    let mut request = Request::new(server.url("/abort"));
    request.set_timeout(Some(Duration::from_secs(10)));
    request.on_progress(Some(|_dltotal, _dlnow, _ultotal, _ulnow| false));
    let response = request.perform();

    assert_eq!(response.status(), RequestStatus::RequestAborted);
}

/// SDV test case for a connection failure.
///
/// # Brief
/// 1. Performs a request against a port nothing listens on.
/// 2. Checks the status lands in the connect class of the mapping.
#[test]
fn sdv_connect_error() {
    let mut request = Request::new("http://127.0.0.1:1/");
    request.set_timeout(Some(Duration::from_secs(5)));
    let response = request.perform();
    assert_eq!(response.status(), RequestStatus::ConnectError);
    assert_eq!(response.status_code(), 0);
}
