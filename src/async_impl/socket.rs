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

use std::io;

use curl::multi::Socket;
use mio::unix::SourceFd;
use mio::{Interest, Registry, Token};

/// One reactor registration for a socket the transfer engine polls.
///
/// The engine owns the socket itself; this context only owns the poll
/// registration. Contexts live in a slab; the slab key doubles as the mio
/// token, and key + 1 is the engine's per-socket user data (0 marks a socket
/// without a context).
pub(crate) struct SocketContext {
    socket: Socket,
    interest: Option<Interest>,
}

impl SocketContext {
    pub(crate) fn new(socket: Socket) -> Self {
        Self {
            socket,
            interest: None,
        }
    }

    pub(crate) fn socket(&self) -> Socket {
        self.socket
    }

    /// Arms or re-arms the poll registration for the given direction mask.
    pub(crate) fn arm(
        &mut self,
        registry: &Registry,
        token: Token,
        interest: Interest,
    ) -> io::Result<()> {
        let mut source = SourceFd(&self.socket);
        match self.interest {
            None => registry.register(&mut source, token, interest)?,
            Some(current) if current != interest => {
                registry.reregister(&mut source, token, interest)?
            }
            Some(_) => {}
        }
        self.interest = Some(interest);
        Ok(())
    }

    /// Stops polling. The engine may have closed the fd already, so a failed
    /// deregistration is not an error worth surfacing.
    pub(crate) fn disarm(&mut self, registry: &Registry) {
        if self.interest.take().is_some() {
            let _ = registry.deregister(&mut SourceFd(&self.socket));
        }
    }
}
