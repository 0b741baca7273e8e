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

//! HTTP request handlers

use crate::app::AppState;
use crate::error::{ApiError, ErrorBody};
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use log::debug;
use serde::Serialize;
use serde_json::{json, Value};
use tuyasign_core::Error;
use tuyasign_tuya_openapi::reading::{Alert, Limits, Reading};
use tuyasign_tuya_openapi::{poll, AccessToken, DeviceOutcome, DeviceSnapshot};

pub const X_TUYA_PATH: &str = "x-tuya-path";
pub const X_TUYA_METHOD: &str = "x-tuya-method";

/// `GET /api/get-tuya-token`
pub async fn token_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let token = state.client.token_manager().get_token().await?;

    Ok(Json(json!({
        "success": true,
        "result": { "access_token": token.token() },
    })))
}

/// `POST /api/proxy`
///
/// Forwards the call described by `X-Tuya-Path` and `X-Tuya-Method`, signed
/// with the bearer token when one is given, and relays the remote status and
/// JSON body, error statuses included.
pub async fn proxy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let path = header(&headers, X_TUYA_PATH)
        .ok_or_else(|| Error::request_invalid("X-Tuya-Path header is required"))?;
    let method = match header(&headers, X_TUYA_METHOD) {
        Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes()).map_err(Error::from)?,
        None => Method::GET,
    };
    let token = bearer_token(&headers).map(AccessToken::new);
    let body = json_body(&body)?;

    debug!("proxying {method} {path}");
    let resp = state
        .client
        .forward(token, method, path, body.as_ref())
        .await?;

    Ok((resp.status, Json(resp.body)).into_response())
}

/// One device in the `GET /api/devices` answer.
#[derive(Debug, Serialize)]
pub struct DeviceReport {
    pub id: String,
    pub name: String,
    pub ok: bool,
    pub limits: Limits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<DeviceSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<Reading>,
    pub alerts: Vec<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl DeviceReport {
    fn new(outcome: DeviceOutcome) -> Self {
        let DeviceOutcome { device, result } = outcome;
        match result {
            Ok(snapshot) => {
                let reading = Reading::from_snapshot(&snapshot);
                Self {
                    id: device.id,
                    name: device.name,
                    ok: true,
                    limits: device.limits,
                    alerts: reading.alerts(&device.limits),
                    reading: Some(reading),
                    snapshot: Some(snapshot),
                    error: None,
                }
            }
            Err(err) => Self {
                id: device.id,
                name: device.name,
                ok: false,
                limits: device.limits,
                snapshot: None,
                reading: None,
                alerts: Vec::new(),
                error: Some(ErrorBody::from(&err)),
            },
        }
    }
}

/// `GET /api/devices`
///
/// A missing configuration or a failed token acquisition fails the whole
/// request; any other failure is reported per device.
pub async fn devices_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let outcomes = poll(&state.client, &state.devices).await?;
    let reports: Vec<DeviceReport> = outcomes
        .into_iter()
        .map(DeviceReport::new)
        .collect();

    Ok(Json(json!({ "success": true, "result": reports })))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// `Authorization: Bearer <token>`; the scheme itself is not checked.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let (_, token) = header(headers, AUTHORIZATION.as_str())?.split_once(' ')?;
    Some(token.trim()).filter(|t| !t.is_empty())
}

fn json_body(body: &[u8]) -> Result<Option<Value>, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| Error::request_invalid("request body is not valid JSON").with_source(e))
}
