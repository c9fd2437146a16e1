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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use mux_http_client::async_impl::EventLoop;
use mux_http_client::{Request, RequestStatus};

use common::{start_silent_server, start_stub_server, wait_until};

/// SDV test case for the asynchronous happy path.
///
/// # Brief
/// 1. Starts a stub returning `200 OK` with body `hi`.
/// 2. Submits one GET on a loop with two reserved handles.
/// 3. Checks the callback fires once with the full response and the active
///    count returns to zero.
#[test]
fn sdv_async_happy_path() {
    let server = start_stub_server(Duration::ZERO, 200, "hi");
    let event_loop = EventLoop::builder().reserve_connections(2).build().unwrap();

    let (tx, rx) = mpsc::channel();
    let mut request = Request::new(server.url("/"));
    request.set_timeout(Some(Duration::from_secs(10)));
    request.on_complete(move |_request, response| {
        tx.send(response).unwrap();
    });
    assert!(event_loop.submit(request));

    let response = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(response.status(), RequestStatus::Success);
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body_as_str(), "hi");
    assert_eq!(response.header("X-Stub").unwrap().value(), "1");
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    wait_until(Duration::from_secs(5), || {
        event_loop.active_request_count() == 0
    });
}

/// SDV test case for a timesup firing before the transport finishes.
///
/// # Brief
/// 1. Starts a stub that stalls 500 ms before answering.
/// 2. Submits a request with a 50 ms timesup.
/// 3. Checks the callback fires promptly with `Timesup` and the synthetic
///    body, and never fires a second time once the transport completes.
#[test]
fn sdv_timesup_before_transport() {
    let server = start_stub_server(Duration::from_millis(500), 200, "late");
    let event_loop = EventLoop::new().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();
    let counter = calls.clone();
    let mut request = Request::new(server.url("/slow"));
    request.set_timeout(Some(Duration::from_secs(10)));
    request.set_timesup(Some(Duration::from_millis(50)));
    request.on_complete(move |_request, response| {
        counter.fetch_add(1, Ordering::SeqCst);
        tx.send(response).unwrap();
    });
    assert!(event_loop.submit(request));

    let response = rx.recv_timeout(Duration::from_millis(300)).unwrap();
    assert_eq!(response.status(), RequestStatus::Timesup);
    assert_eq!(response.body_as_str(), "timesup of 50 ms exceeded");

    // The stalled transfer finishes well within this window; its normal
    // completion must not reach the callback again.
    std::thread::sleep(Duration::from_millis(700));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    wait_until(Duration::from_secs(5), || {
        event_loop.active_request_count() == 0
    });
}

/// SDV test case for the transport-level timeout.
///
/// # Brief
/// 1. Starts a server that accepts connections but never responds.
/// 2. Submits a request with a 300 ms transport timeout and no timesup.
/// 3. Checks the callback delivers `Timeout` and the loop drains, which
///    requires the engine's internal timers to advance without any socket
///    readiness event.
#[test]
fn sdv_transport_timeout() {
    let port = start_silent_server();
    let event_loop = EventLoop::new().unwrap();

    let (tx, rx) = mpsc::channel();
    let mut request = Request::new(format!("http://127.0.0.1:{port}/"));
    request.set_timeout(Some(Duration::from_millis(300)));
    request.on_complete(move |_request, response| {
        tx.send(response).unwrap();
    });
    assert!(event_loop.submit(request));

    let response = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(response.status(), RequestStatus::Timeout);
    assert_eq!(response.status_code(), 0);

    wait_until(Duration::from_secs(5), || {
        event_loop.active_request_count() == 0
    });
}

/// SDV test case for a concurrent burst of submissions.
///
/// # Brief
/// 1. Starts a stub returning `200 OK`.
/// 2. Submits 100 requests from 4 threads into one loop.
/// 3. Checks 100 callbacks arrive, all successful, and the active count
///    returns to zero.
#[test]
fn sdv_concurrent_burst() {
    let server = start_stub_server(Duration::ZERO, 200, "ok");
    let event_loop = Arc::new(EventLoop::builder().reserve_connections(4).build().unwrap());

    let (tx, rx) = mpsc::channel();
    let mut submitters = Vec::new();
    for _ in 0..4 {
        let event_loop = event_loop.clone();
        let tx = tx.clone();
        let url = server.url("/burst");
        submitters.push(std::thread::spawn(move || {
            for _ in 0..25 {
                let tx = tx.clone();
                let mut request = Request::new(url.clone());
                request.set_timeout(Some(Duration::from_secs(10)));
                request.on_complete(move |_request, response| {
                    tx.send(response.status()).unwrap();
                });
                assert!(event_loop.submit(request));
            }
        }));
    }
    drop(tx);
    for submitter in submitters {
        submitter.join().unwrap();
    }

    let mut succeeded = 0;
    for _ in 0..100 {
        let status = rx.recv_timeout(Duration::from_secs(30)).unwrap();
        assert_eq!(status, RequestStatus::Success);
        succeeded += 1;
    }
    assert_eq!(succeeded, 100);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    wait_until(Duration::from_secs(5), || {
        event_loop.active_request_count() == 0
    });
}

/// SDV test case for transfer handle reuse through the pool.
///
/// # Brief
/// 1. Builds a loop with two reserved handles.
/// 2. Runs five requests one after another, waiting for each completion.
/// 3. Checks the pool never created a handle beyond the reserve.
#[test]
fn sdv_handle_pool_reuse() {
    let server = start_stub_server(Duration::ZERO, 200, "ok");
    let event_loop = EventLoop::builder().reserve_connections(2).build().unwrap();

    for _ in 0..5 {
        let (tx, rx) = mpsc::channel();
        let mut request = Request::new(server.url("/"));
        request.set_timeout(Some(Duration::from_secs(10)));
        request.on_complete(move |_request, _response| {
            tx.send(()).unwrap();
        });
        assert!(event_loop.submit(request));
        rx.recv_timeout(Duration::from_secs(10)).unwrap();
        wait_until(Duration::from_secs(5), || {
            event_loop.active_request_count() == 0
        });
    }

    assert_eq!(event_loop.transfer_handle_count(), 2);
}

/// SDV test case for clean shutdown with requests in flight.
///
/// # Brief
/// 1. Starts a stub that stalls 200 ms.
/// 2. Submits ten requests and immediately drops the loop.
/// 3. Checks the drop returned only after all ten callbacks fired.
#[test]
fn sdv_shutdown_drains_in_flight() {
    let server = start_stub_server(Duration::from_millis(200), 200, "done");
    let event_loop = EventLoop::builder().reserve_connections(2).build().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    for _ in 0..10 {
        let counter = calls.clone();
        let mut request = Request::new(server.url("/"));
        request.set_timeout(Some(Duration::from_secs(10)));
        request.on_complete(move |_request, response| {
            assert_eq!(response.status(), RequestStatus::Success);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(event_loop.submit(request));
    }

    drop(event_loop);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
}

/// SDV test case for submissions after `stop`.
///
/// # Brief
/// 1. Builds a loop, runs one request, stops the loop.
/// 2. Submits another request.
/// 3. Checks the late submission is rejected and no callback fires for it.
#[test]
fn sdv_stop_rejects_new_requests() {
    let server = start_stub_server(Duration::ZERO, 200, "ok");
    let event_loop = EventLoop::new().unwrap();

    let (tx, rx) = mpsc::channel();
    let mut request = Request::new(server.url("/"));
    request.set_timeout(Some(Duration::from_secs(10)));
    request.on_complete(move |_request, _response| {
        tx.send(()).unwrap();
    });
    assert!(event_loop.submit(request));
    rx.recv_timeout(Duration::from_secs(10)).unwrap();

    event_loop.stop();
    let mut late = Request::new(server.url("/"));
    late.on_complete(|_request, _response| panic!("rejected request completed"));
    assert!(!event_loop.submit(late));

    wait_until(Duration::from_secs(5), || {
        event_loop.active_request_count() == 0
    });
}
