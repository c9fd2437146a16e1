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

//! Terminal outcome of a request, stamped on every [`Response`].
//!
//! [`Response`]: crate::Response

/// The library-level outcome of a finished request.
///
/// Every transfer ends in exactly one of these states. `Timesup` is the only
/// variant the transfer engine never produces itself: it is stamped by the
/// event loop when the total-wall-clock deadline elapses first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// The request completed and a response was received.
    Success,

    /// The connection to the server (or proxy) could not be established.
    ConnectError,

    /// The host (or proxy host) name could not be resolved.
    DnsError,

    /// The SSL/TLS handshake failed.
    SslConnectError,

    /// The peer certificate or local certificate/key was rejected.
    SslCertError,

    /// The transport-level timeout elapsed before the transfer finished.
    Timeout,

    /// The total-wall-clock deadline elapsed before the transfer finished.
    Timesup,

    /// Sending data on the network failed.
    SendError,

    /// Receiving data from the network failed.
    RecvError,

    /// The progress callback asked for the transfer to be aborted.
    RequestAborted,

    /// The download ended prematurely or the body could not be written.
    DownloadError,

    /// The response body could not be decoded with its content encoding.
    ContentEncodingError,

    /// Any transfer failure without a more precise classification.
    Unknown,
}

impl RequestStatus {
    /// Gets the string info of this `RequestStatus`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mux_http_client::RequestStatus;
    ///
    /// assert_eq!(RequestStatus::Timesup.as_str(), "Timesup");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::ConnectError => "Connect Error",
            Self::DnsError => "Dns Error",
            Self::SslConnectError => "Ssl Connect Error",
            Self::SslCertError => "Ssl Certificate Error",
            Self::Timeout => "Timeout",
            Self::Timesup => "Timesup",
            Self::SendError => "Send Error",
            Self::RecvError => "Recv Error",
            Self::RequestAborted => "Request Aborted",
            Self::DownloadError => "Download Error",
            Self::ContentEncodingError => "Content Encoding Error",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns `true` for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    // The canonical mapping from a finished transfer to a status. Total: any
    // engine result lands on exactly one variant.
    pub(crate) fn from_transfer_result(result: Result<(), curl::Error>) -> Self {
        let error = match result {
            Ok(()) => return Self::Success,
            Err(e) => e,
        };

        if error.is_couldnt_connect() {
            Self::ConnectError
        } else if error.is_couldnt_resolve_host() || error.is_couldnt_resolve_proxy() {
            Self::DnsError
        } else if error.is_ssl_connect_error() {
            Self::SslConnectError
        } else if error.is_peer_failed_verification() || error.is_ssl_certproblem() {
            Self::SslCertError
        } else if error.is_operation_timedout() {
            Self::Timeout
        } else if error.is_send_error() {
            Self::SendError
        } else if error.is_recv_error() {
            Self::RecvError
        } else if error.is_aborted_by_callback() {
            Self::RequestAborted
        } else if error.is_partial_file() || error.is_write_error() {
            Self::DownloadError
        } else if error.is_bad_content_encoding() {
            Self::ContentEncodingError
        } else {
            Self::Unknown
        }
    }
}

#[cfg(test)]
mod ut_status {
    use super::RequestStatus;

    /// UT test cases for `RequestStatus::from_transfer_result`.
    ///
    /// # Brief
    /// 1. Maps an `Ok` transfer result and several engine error codes.
    /// 2. Checks that each result lands on the expected variant.
    #[test]
    fn ut_status_mapping() {
        assert_eq!(
            RequestStatus::from_transfer_result(Ok(())),
            RequestStatus::Success
        );
        assert_eq!(
            RequestStatus::from_transfer_result(Err(curl::Error::new(
                curl_sys::CURLE_COULDNT_CONNECT
            ))),
            RequestStatus::ConnectError
        );
        assert_eq!(
            RequestStatus::from_transfer_result(Err(curl::Error::new(
                curl_sys::CURLE_COULDNT_RESOLVE_HOST
            ))),
            RequestStatus::DnsError
        );
        assert_eq!(
            RequestStatus::from_transfer_result(Err(curl::Error::new(
                curl_sys::CURLE_OPERATION_TIMEDOUT
            ))),
            RequestStatus::Timeout
        );
        assert_eq!(
            RequestStatus::from_transfer_result(Err(curl::Error::new(
                curl_sys::CURLE_ABORTED_BY_CALLBACK
            ))),
            RequestStatus::RequestAborted
        );
        assert_eq!(
            RequestStatus::from_transfer_result(Err(curl::Error::new(
                curl_sys::CURLE_URL_MALFORMAT
            ))),
            RequestStatus::Unknown
        );
    }

    /// UT test cases for `RequestStatus::is_success` and `as_str`.
    ///
    /// # Brief
    /// 1. Calls `is_success` on a success and a failure variant.
    /// 2. Checks a couple of `as_str` values.
    #[test]
    fn ut_status_accessors() {
        assert!(RequestStatus::Success.is_success());
        assert!(!RequestStatus::Timesup.is_success());
        assert_eq!(RequestStatus::SendError.as_str(), "Send Error");
        assert_eq!(RequestStatus::DnsError.as_str(), "Dns Error");
    }
}
