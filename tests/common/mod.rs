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

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::service::{make_service_fn, service_fn};

/// A stub HTTP server running on its own runtime. The server answers every
/// request with the configured status and body, after an optional delay.
/// Dropping the handle tears the server down.
pub struct StubServer {
    pub port: u16,
    _runtime: tokio::runtime::Runtime,
}

impl StubServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

/// Starts a stub server answering `status` with `body` after `delay`.
pub fn start_stub_server(delay: Duration, status: u16, body: &'static str) -> StubServer {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("Build stub runtime failed");

    let (port_tx, port_rx) = std::sync::mpsc::channel();
    runtime.spawn(async move {
        let make_service = make_service_fn(move |_conn| async move {
            Ok::<_, Infallible>(service_fn(move |_req| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, Infallible>(
                    hyper::Response::builder()
                        .status(status)
                        .header("X-Stub", "1")
                        .body(hyper::Body::from(body))
                        .expect("Build stub response failed"),
                )
            }))
        });

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let server = hyper::Server::bind(&addr).serve(make_service);
        port_tx
            .send(server.local_addr().port())
            .expect("Send stub port failed");
        let _ = server.await;
    });

    let port = port_rx.recv().expect("Recv stub port failed");
    StubServer {
        port,
        _runtime: runtime,
    }
}

/// Starts a server that accepts connections but never writes a byte back,
/// for exercising transport-level timeouts. Accepted connections are held
/// open for the lifetime of the test process. Returns the bound port.
pub fn start_silent_server() -> u16 {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("Bind silent server failed");
    let port = listener
        .local_addr()
        .expect("Silent server local_addr failed")
        .port();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept() {
            held.push(stream);
        }
    });
    port
}

/// Spins until `condition` holds, failing the test after `limit`.
pub fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) {
    let start = std::time::Instant::now();
    while !condition() {
        assert!(
            start.elapsed() < limit,
            "condition not reached within {limit:?}"
        );
        std::thread::sleep(Duration::from_millis(5));
    }
}
