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
use crate::device::DeviceQuery;
use crate::response::Response;
use crate::sign_request::{request_body, sign_business_request};
use crate::{AccessToken, TokenManager};
use bytes::Bytes;
use http::Method;
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use tuyasign_core::time::{now, now_millis};
use tuyasign_core::utils::Redact;
use tuyasign_core::{Context, Error, Result, SigningCredential};

/// RetryPolicy decides whether a rejected call is retried with a fresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// How many times a call may be retried after the remote rejected its token.
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 1 }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn never() -> Self {
        Self { max_retries: 0 }
    }

    /// Whether the call that got `resp` on attempt `attempt` (starting at 0)
    /// should be retried.
    pub fn should_retry(&self, attempt: usize, resp: &Response) -> bool {
        attempt < self.max_retries && resp.is_token_invalid()
    }
}

/// Client performs signed calls against the Tuya OpenAPI.
///
/// Every call is signed with a fresh timestamp and the token handed out by
/// the shared [`TokenManager`]. When the remote rejects the token, the client
/// invalidates it, fetches a new one and retries according to its
/// [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Client {
    ctx: Context,
    endpoint: String,
    tokens: Arc<TokenManager>,
    retry: RetryPolicy,
}

impl Client {
    /// Create a client sharing `tokens`, using its endpoint.
    pub fn new(ctx: Context, tokens: Arc<TokenManager>) -> Self {
        Self {
            ctx,
            endpoint: tokens.endpoint().to_string(),
            tokens,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the OpenAPI endpoint for business calls.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The token manager backing this client.
    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Perform a signed call.
    ///
    /// `path` includes the query string. Successful responses are returned
    /// unmodified, including business failures (`success: false`) that are
    /// not about the token.
    pub async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        self.call_with_token(None, method, path, body).await
    }

    /// Perform a signed call, using `token` for the first attempt when given.
    ///
    /// Retries always use a token obtained from the token manager. Answers
    /// with a non-2xx status are reported as [`ErrorKind::ServerError`].
    ///
    /// [`ErrorKind::ServerError`]: tuyasign_core::ErrorKind::ServerError
    pub async fn call_with_token(
        &self,
        token: Option<AccessToken>,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        let resp = self.forward(token, method.clone(), path, body).await?;
        if !resp.status.is_success() {
            return Err(Error::server_error(format!(
                "{method} {path} returned {}: {}",
                resp.status,
                resp.envelope().describe()
            )));
        }
        Ok(resp)
    }

    /// Perform a signed call and return the remote answer as is.
    ///
    /// Behaves like [`Client::call_with_token`] except that JSON answers with
    /// a non-2xx status are returned instead of turned into errors. A rejected
    /// token is still refreshed and retried.
    pub async fn forward(
        &self,
        token: Option<AccessToken>,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        if !self.tokens.credential().is_valid() {
            return Err(Error::config_missing(format!(
                "{TUYA_CLIENT_ID} and {TUYA_SECRET_KEY} must be set"
            )));
        }
        let body = request_body(body)?;

        let started = now();
        let (mut token, mut supplied) = match token.filter(|t| t.is_valid()) {
            Some(token) => (token, true),
            None => (self.tokens.get_token().await?, false),
        };

        let mut attempt = 0;
        loop {
            let resp = self.send(&token, method.clone(), path, body.clone()).await?;

            if self.retry.should_retry(attempt, &resp) {
                warn!(
                    "{method} {path} rejected access token {}, refreshing and retrying",
                    Redact::from(token.token())
                );
                // A rejected caller token leaves the cached one untouched, so
                // drop the cached one too unless it was acquired during this call.
                if !self.tokens.invalidate_token(&token) && supplied {
                    self.tokens.invalidate_acquired_before(started);
                }
                supplied = false;
                token = self.tokens.get_token().await?;
                attempt += 1;
                continue;
            }

            if resp.is_token_invalid() {
                return Err(Error::authentication_expired(format!(
                    "{method} {path} still rejected after {attempt} token refresh(es): {}",
                    resp.envelope().describe()
                )));
            }

            return Ok(resp);
        }
    }

    /// Perform the `GET` call described by `query`.
    pub async fn query(&self, query: &DeviceQuery) -> Result<Response> {
        self.call(Method::GET, &query.path(), None).await
    }

    async fn send(
        &self,
        token: &AccessToken,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Response> {
        let req = sign_business_request(
            self.tokens.credential(),
            token,
            &now_millis(),
            method,
            path,
            body,
        )?
        .into_http(&self.endpoint)?;

        debug!("sending {} {}", req.method(), req.uri());
        let resp = self.ctx.http_send(req).await?;
        debug!("got {} for {path}", resp.status());

        Response::from_http(resp)
    }
}
