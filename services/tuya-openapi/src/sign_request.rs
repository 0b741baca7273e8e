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
use crate::{AccessToken, Credential};
use bytes::Bytes;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use serde_json::Value;
use std::fmt::Write;
use tuyasign_core::hash::{hex_sha256, upper_hex_hmac_sha256, EMPTY_SHA256};
use tuyasign_core::{Error, Result};

/// Headers are never part of the signature in this protocol.
const SIGNED_HEADERS: &str = "";

/// SignedRequest is a fully prepared call to the Tuya OpenAPI.
///
/// The signature covers method, path, body, timestamp and (for business
/// calls) the access token. It is built fresh for every call and consumed by
/// [`SignedRequest::into_http`].
#[derive(Debug)]
pub struct SignedRequest {
    method: Method,
    path: String,
    body: Option<Bytes>,
    timestamp: String,
    sign: String,
    headers: HeaderMap,
}

impl SignedRequest {
    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path including the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Body bytes, `None` when the request has no body.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Timestamp in milliseconds, identical to the `t` header.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Upper-cased hex HMAC-SHA256 signature.
    pub fn sign(&self) -> &str {
        &self.sign
    }

    /// Headers to send along with the request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Turn this signed request into an `http::Request` against `endpoint`.
    pub fn into_http(self, endpoint: &str) -> Result<http::Request<Bytes>> {
        let uri = format!("{}{}", endpoint.trim_end_matches('/'), self.path);

        let mut req = http::Request::builder()
            .method(self.method)
            .uri(uri)
            .body(self.body.unwrap_or_default())?;
        *req.headers_mut() = self.headers;

        Ok(req)
    }
}

/// Sign the request to the token endpoint (`GET /v1.0/token?grant_type=1`).
///
/// Headers: `client_id`, `sign`, `t`, `sign_method`.
pub fn sign_token_request(cred: &Credential, timestamp: &str) -> Result<SignedRequest> {
    check_credential(cred)?;
    check_timestamp(timestamp)?;

    build(cred, None, timestamp, Method::GET, TOKEN_PATH, None)
}

/// Sign a business call made with `token`.
///
/// Headers: `client_id`, `access_token`, `sign`, `t`, `sign_method`, and
/// `Content-Type: application/json` when `body` is present.
pub fn sign_business_request(
    cred: &Credential,
    token: &AccessToken,
    timestamp: &str,
    method: Method,
    path: &str,
    body: Option<Bytes>,
) -> Result<SignedRequest> {
    check_credential(cred)?;
    check_timestamp(timestamp)?;
    if token.token().is_empty() {
        return Err(Error::request_invalid("access token is empty"));
    }
    if !path.starts_with('/') {
        return Err(Error::request_invalid(format!(
            "path must start with '/': {path}"
        )));
    }

    build(cred, Some(token.token()), timestamp, method, path, body)
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// client_id + [access_token] + t + HTTPMethod + "\n" +
/// Content-SHA256 + "\n" +
/// SignedHeaders + "\n" +
/// PathWithQuery
/// ```
///
/// `Content-SHA256` is the hex SHA256 of the body, or of the empty byte
/// string when there is no body. `SignedHeaders` is always empty.
pub fn string_to_sign(
    client_id: &str,
    access_token: Option<&str>,
    timestamp: &str,
    method: &Method,
    body: Option<&[u8]>,
    path: &str,
) -> String {
    let content_sha256 = match body {
        Some(bs) if !bs.is_empty() => hex_sha256(bs),
        _ => EMPTY_SHA256.to_string(),
    };

    let mut s = String::with_capacity(
        client_id.len() + timestamp.len() + content_sha256.len() + path.len() + 64,
    );
    s.push_str(client_id);
    if let Some(token) = access_token {
        s.push_str(token);
    }
    s.push_str(timestamp);
    s.push_str(method.as_str());
    // Writing into a String never fails.
    let _ = write!(s, "\n{content_sha256}\n{SIGNED_HEADERS}\n{path}");

    s
}

/// Convert a JSON body into the exact bytes to sign and transmit.
///
/// `None`, `null`, `{}` and `[]` carry nothing and map to `None`, so they
/// are signed with the empty-body hash and sent without a body.
pub fn request_body(body: Option<&Value>) -> Result<Option<Bytes>> {
    let Some(value) = body else {
        return Ok(None);
    };

    let is_empty = match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if is_empty {
        return Ok(None);
    }

    let bs = serde_json::to_vec(value)
        .map_err(|e| Error::request_invalid("failed to serialize request body").with_source(e))?;
    Ok(Some(Bytes::from(bs)))
}

fn build(
    cred: &Credential,
    access_token: Option<&str>,
    timestamp: &str,
    method: Method,
    path: &str,
    body: Option<Bytes>,
) -> Result<SignedRequest> {
    let body = body.filter(|bs| !bs.is_empty());
    let string_to_sign = string_to_sign(
        &cred.client_id,
        access_token,
        timestamp,
        &method,
        body.as_deref(),
        path,
    );
    let sign = upper_hex_hmac_sha256(cred.secret_key.as_bytes(), string_to_sign.as_bytes());

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(CLIENT_ID),
        HeaderValue::from_str(&cred.client_id)?,
    );
    if let Some(token) = access_token {
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(ACCESS_TOKEN), value);
    }
    headers.insert(HeaderName::from_static(SIGN), {
        let mut value = HeaderValue::from_str(&sign)?;
        value.set_sensitive(true);
        value
    });
    headers.insert(HeaderName::from_static(T), HeaderValue::from_str(timestamp)?);
    headers.insert(
        HeaderName::from_static(SIGN_METHOD),
        HeaderValue::from_static(HMAC_SHA256),
    );
    if body.is_some() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    Ok(SignedRequest {
        method,
        path: path.to_string(),
        body,
        timestamp: timestamp.to_string(),
        sign,
        headers,
    })
}

fn check_credential(cred: &Credential) -> Result<()> {
    if cred.client_id.is_empty() {
        return Err(Error::request_invalid("client id is empty"));
    }
    if cred.secret_key.is_empty() {
        return Err(Error::request_invalid("secret key is empty"));
    }
    Ok(())
}

fn check_timestamp(timestamp: &str) -> Result<()> {
    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::request_invalid(format!(
            "timestamp must be milliseconds since epoch: {timestamp:?}"
        )));
    }
    Ok(())
}
