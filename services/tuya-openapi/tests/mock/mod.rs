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

//! A scripted Tuya OpenAPI that records every request it gets.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::{json, Value};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tuyasign_core::hash::upper_hex_hmac_sha256;
use tuyasign_core::{Context, HttpSend, ProvideCredential, Result};
use tuyasign_tuya_openapi::{string_to_sign, Client, StaticCredentialProvider, TokenManager};

pub const ENDPOINT: &str = "https://openapi.example.com";
pub const CLIENT_ID: &str = "mock-client-id";
pub const SECRET_KEY: &str = "mock-secret-key";

type TokenHandler = dyn Fn(usize) -> Result<http::Response<Bytes>> + Send + Sync;
type BusinessHandler = dyn Fn(&Recorded) -> Result<http::Response<Bytes>> + Send + Sync;

/// A request as the mock received it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether the `sign` header matches what the server would compute.
    pub fn is_signed_correctly(&self) -> bool {
        let body = (!self.body.is_empty()).then_some(&self.body[..]);
        let expected = string_to_sign(
            self.header("client_id").unwrap_or_default(),
            self.header("access_token"),
            self.header("t").unwrap_or_default(),
            &self.method,
            body,
            &self.path,
        );
        let expected = upper_hex_hmac_sha256(SECRET_KEY.as_bytes(), expected.as_bytes());
        self.header("sign") == Some(expected.as_str())
    }
}

struct Inner {
    token_delay: Duration,
    on_token: Box<TokenHandler>,
    on_business: Box<BusinessHandler>,
    requests: Mutex<Vec<Recorded>>,
}

#[derive(Clone)]
pub struct MockHttpSend {
    inner: Arc<Inner>,
}

impl Debug for MockHttpSend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpSend")
            .field("requests", &self.inner.requests.lock().unwrap().len())
            .finish()
    }
}

impl MockHttpSend {
    pub fn builder() -> MockBuilder {
        MockBuilder {
            token_delay: Duration::ZERO,
            on_token: Box::new(|n| {
                ok(json!({"access_token": format!("token-{n}"), "expire_time": 7200}))
            }),
            on_business: Box::new(|_| ok(json!([]))),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path.starts_with("/v1.0/token"))
            .count()
    }

    pub fn business_requests(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| !r.path.starts_with("/v1.0/token"))
            .collect()
    }

    /// A client and its token manager wired to this mock.
    pub async fn client(&self) -> (Arc<TokenManager>, Client) {
        let ctx = Context::new().with_http_send(self.clone());
        let credential = StaticCredentialProvider::new(CLIENT_ID, SECRET_KEY)
            .provide_credential(&ctx)
            .await
            .unwrap()
            .expect("static credential is always provided");
        let tokens =
            Arc::new(TokenManager::new(ctx.clone(), credential).with_endpoint(ENDPOINT));
        let client = Client::new(ctx, tokens.clone());
        (tokens, client)
    }
}

pub struct MockBuilder {
    token_delay: Duration,
    on_token: Box<TokenHandler>,
    on_business: Box<BusinessHandler>,
}

impl MockBuilder {
    /// Delay every token response, so concurrent callers overlap.
    pub fn token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }

    /// Answer the `n`th (1-based) token request.
    pub fn on_token(
        mut self,
        f: impl Fn(usize) -> Result<http::Response<Bytes>> + Send + Sync + 'static,
    ) -> Self {
        self.on_token = Box::new(f);
        self
    }

    /// Answer every other request.
    pub fn on_business(
        mut self,
        f: impl Fn(&Recorded) -> Result<http::Response<Bytes>> + Send + Sync + 'static,
    ) -> Self {
        self.on_business = Box::new(f);
        self
    }

    pub fn build(self) -> MockHttpSend {
        let _ = env_logger::builder().is_test(true).try_init();

        MockHttpSend {
            inner: Arc::new(Inner {
                token_delay: self.token_delay,
                on_token: self.on_token,
                on_business: self.on_business,
                requests: Mutex::new(Vec::new()),
            }),
        }
    }
}

#[async_trait::async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        assert_eq!(parts.uri.host(), Some("openapi.example.com"));

        let recorded = Recorded {
            method: parts.method,
            path: parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_default(),
            headers: parts.headers,
            body,
        };

        let token_number = {
            let mut requests = self.inner.requests.lock().unwrap();
            requests.push(recorded.clone());
            requests
                .iter()
                .filter(|r| r.path.starts_with("/v1.0/token"))
                .count()
        };

        if recorded.path.starts_with("/v1.0/token") {
            tokio::time::sleep(self.inner.token_delay).await;
            (self.inner.on_token)(token_number)
        } else {
            (self.inner.on_business)(&recorded)
        }
    }
}

pub fn respond(status: StatusCode, body: Value) -> Result<http::Response<Bytes>> {
    Ok(http::Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Bytes::from(body.to_string()))?)
}

pub fn ok(result: Value) -> Result<http::Response<Bytes>> {
    respond(
        StatusCode::OK,
        json!({"success": true, "result": result, "t": 1700000000000u64}),
    )
}

pub fn fail(code: i64, msg: &str) -> Result<http::Response<Bytes>> {
    respond(
        StatusCode::OK,
        json!({"success": false, "code": code, "msg": msg, "t": 1700000000000u64}),
    )
}

pub fn token_invalid() -> Result<http::Response<Bytes>> {
    fail(1010, "token invalid")
}
