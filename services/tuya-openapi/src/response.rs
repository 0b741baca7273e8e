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

use crate::constants::*;
use bytes::Bytes;
use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tuyasign_core::{Error, Result};

/// Response of a Tuya OpenAPI call.
///
/// `body` is the JSON returned by the remote, kept as is.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status returned by the remote.
    pub status: StatusCode,
    /// Parsed JSON body.
    pub body: Value,
}

/// The `{ success, result, code, msg }` wrapper every Tuya response uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Envelope {
    /// Whether the call succeeded at the business level.
    pub success: bool,
    /// Payload of a successful call.
    pub result: Option<Value>,
    /// Error code of a failed call.
    code: Option<Code>,
    /// Error message of a failed call.
    pub msg: Option<String>,
}

// Tuya sends numeric codes, but tolerate the string form too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Code {
    Int(i64),
    Str(String),
}

impl Envelope {
    /// Error code of a failed call, if any.
    pub fn code(&self) -> Option<i64> {
        match self.code.as_ref()? {
            Code::Int(v) => Some(*v),
            Code::Str(v) => v.trim().parse().ok(),
        }
    }

    /// Whether the remote rejected the access token.
    pub fn is_token_invalid(&self) -> bool {
        self.code() == Some(TOKEN_INVALID_CODE) || self.msg.as_deref() == Some(TOKEN_INVALID_MSG)
    }

    /// `code: msg` for error messages.
    pub fn describe(&self) -> String {
        match (self.code(), self.msg.as_deref()) {
            (Some(code), Some(msg)) => format!("{code}: {msg}"),
            (Some(code), None) => code.to_string(),
            (None, Some(msg)) => msg.to_string(),
            (None, None) => "no error detail".to_string(),
        }
    }
}

impl Response {
    /// Parse an HTTP response into a `Response`.
    ///
    /// - a JSON object body is kept whatever the status is
    /// - a non-JSON body on a non-2xx status is a [`ErrorKind::ServerError`]
    /// - a non-JSON body on a 2xx status is a [`ErrorKind::MalformedResponse`]
    ///
    /// [`ErrorKind::ServerError`]: tuyasign_core::ErrorKind::ServerError
    /// [`ErrorKind::MalformedResponse`]: tuyasign_core::ErrorKind::MalformedResponse
    pub fn from_http(resp: http::Response<Bytes>) -> Result<Self> {
        let (parts, body) = resp.into_parts();
        let status = parts.status;

        match serde_json::from_slice::<Value>(&body) {
            Ok(value) if value.is_object() => Ok(Self {
                status,
                body: value,
            }),
            _ if !status.is_success() => Err(Error::server_error(format!(
                "remote returned {status}: {}",
                String::from_utf8_lossy(&body)
            ))),
            Ok(_) => Err(Error::malformed_response(
                "response body is not a JSON object",
            )),
            Err(e) => {
                Err(Error::malformed_response("response body is not valid JSON").with_source(e))
            }
        }
    }

    /// Envelope view of the body.
    ///
    /// Unknown shapes yield an envelope with `success: false`.
    pub fn envelope(&self) -> Envelope {
        Envelope::deserialize(&self.body).unwrap_or_default()
    }

    /// Whether the remote rejected the access token.
    pub fn is_token_invalid(&self) -> bool {
        self.envelope().is_token_invalid()
    }
}
