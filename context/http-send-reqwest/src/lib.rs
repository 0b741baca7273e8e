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

//! Reqwest-based HTTP sending implementation for tuyasign.
//!
//! ```no_run
//! use std::time::Duration;
//! use tuyasign_core::{Context, OsEnv};
//! use tuyasign_http_send_reqwest::ReqwestHttpSend;
//!
//! # fn main() -> tuyasign_core::Result<()> {
//! let ctx = Context::new()
//!     .with_http_send(ReqwestHttpSend::with_timeout(Duration::from_secs(10))?)
//!     .with_env(OsEnv);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use log::{debug, warn};
use reqwest::{Client, Request};
use tuyasign_core::{Error, HttpSend, Result};

/// Timeout applied by [`ReqwestHttpSend::default`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reqwest-based implementation of the `HttpSend` trait.
///
/// Every failure to reach the remote or to read its body, timeouts included,
/// is reported as [`tuyasign_core::ErrorKind::Transport`].
#[derive(Debug, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl Default for ReqwestHttpSend {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT).unwrap_or_else(|err| {
            warn!("{err}, falling back to a client without timeout");
            Self::new(Client::new())
        })
    }
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    ///
    /// The caller is responsible for configuring a timeout on the client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a new ReqwestHttpSend whose calls are bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            Error::unexpected("failed to build reqwest client").with_source(e)
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req)
            .map_err(|e| Error::request_invalid("failed to build request").with_source(e))?;
        debug!("sending {} {}", req.method(), req.url().path());

        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| transport_error("failed to send request", e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| transport_error("failed to read response body", e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

fn transport_error(context: &str, err: reqwest::Error) -> Error {
    let message = if err.is_timeout() {
        format!("{context}: timed out")
    } else {
        context.to_string()
    };
    Error::transport(message).with_source(err)
}
