// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, warn};
use serde::Serialize;
use tuyasign_core::{Error, ErrorKind};

/// Error body sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Stable error code, like `config_missing`.
    pub code: &'static str,
    /// Human readable message.
    pub msg: String,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            code: error_code(err.kind()),
            msg: err.to_string(),
        }
    }
}

/// An [`Error`] returned from a handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        status_code(self.0.kind())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!("request failed with {status}: {:?}", self.0);
        } else {
            debug!("request rejected with {status}: {}", self.0);
        }

        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}

pub fn status_code(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ConfigMissing | ErrorKind::RequestInvalid => StatusCode::BAD_REQUEST,
        ErrorKind::AuthenticationExpired => StatusCode::UNAUTHORIZED,
        ErrorKind::AcquisitionFailed | ErrorKind::ServerError | ErrorKind::MalformedResponse => {
            StatusCode::BAD_GATEWAY
        }
        ErrorKind::Transport => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_code(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ConfigMissing => "config_missing",
        ErrorKind::RequestInvalid => "request_invalid",
        ErrorKind::AcquisitionFailed => "acquisition_failed",
        ErrorKind::AuthenticationExpired => "authentication_expired",
        ErrorKind::Transport => "transport_error",
        ErrorKind::ServerError => "server_error",
        ErrorKind::MalformedResponse => "malformed_response",
        ErrorKind::Unexpected => "unexpected",
    }
}
