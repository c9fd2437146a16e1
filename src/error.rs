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

//! Definition of `HttpClientError` which covers the errors that can occur
//! while a request is being configured or a loop is being built.
//!
//! Outcomes of a transfer that already started are not errors in this sense:
//! they are reported through the [`RequestStatus`] stamped on the `Response`.
//!
//! [`RequestStatus`]: crate::RequestStatus

use core::fmt::{Debug, Display, Formatter};
use std::error::Error;

/// The structure encapsulates errors that can be encountered when working
/// with the HTTP client.
pub struct HttpClientError {
    kind: ErrorKind,
    cause: Option<Box<dyn Error + Send + Sync>>,
}

impl HttpClientError {
    /// Gets the `ErrorKind` of this `HttpClientError`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mux_http_client::{ErrorKind, HttpClientError};
    ///
    /// # fn kind_of(error: HttpClientError) {
    /// let kind = error.error_kind();
    /// # }
    /// ```
    pub fn error_kind(&self) -> ErrorKind {
        self.kind
    }

    pub(crate) fn new_with_cause<T>(kind: ErrorKind, cause: Option<T>) -> Self
    where
        T: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            kind,
            cause: cause.map(|e| e.into()),
        }
    }

    pub(crate) fn new_with_message(kind: ErrorKind, message: &str) -> Self {
        Self {
            kind,
            cause: Some(CauseMessage::new(message).into()),
        }
    }
}

impl Debug for HttpClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut builder = f.debug_struct("HttpClientError");
        builder.field("ErrorKind", &self.kind);
        if let Some(ref cause) = self.cause {
            builder.field("Cause", cause);
        }
        builder.finish()
    }
}

impl Display for HttpClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.kind.as_str())?;

        if let Some(ref cause) = self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl Error for HttpClientError {}

/// Error kinds which can indicate the type of a `HttpClientError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Errors for using various builders.
    Build,

    /// A request setter was called in a state that forbids it, for example
    /// setting a POST body after mime fields have been added.
    ConfigurationConflict,

    /// Other error kinds.
    Other,
}

impl ErrorKind {
    /// Gets the string info of this `ErrorKind`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mux_http_client::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::Build.as_str(), "Build Error");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "Build Error",
            Self::ConfigurationConflict => "Configuration Conflict Error",
            Self::Other => "Other Error",
        }
    }
}

/// Messages for summarizing the cause of the error.
pub(crate) struct CauseMessage(String);

impl CauseMessage {
    pub(crate) fn new(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl Debug for CauseMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Display for CauseMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Error for CauseMessage {}
