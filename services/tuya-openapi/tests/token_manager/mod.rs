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

use crate::mock::*;
use anyhow::Result;
use futures::future::join_all;
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tuyasign_core::ErrorKind;
use tuyasign_tuya_openapi::AccessToken;

#[tokio::test]
async fn test_concurrent_get_token_acquires_once() -> Result<()> {
    let mock = MockHttpSend::builder()
        .token_delay(Duration::from_millis(50))
        .build();
    let (tokens, _) = mock.client().await;

    let results = join_all((0..8).map(|_| tokens.get_token())).await;

    assert_eq!(mock.token_requests(), 1);
    for result in results {
        assert_eq!(result?.token(), "token-1");
    }
    assert_eq!(tokens.current(), Some(AccessToken::new("token-1")));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_get_token_share_failure() -> Result<()> {
    let mock = MockHttpSend::builder()
        .token_delay(Duration::from_millis(50))
        .on_token(|n| match n {
            1 => fail(1004, "sign invalid"),
            n => ok(json!({"access_token": format!("token-{n}")})),
        })
        .build();
    let (tokens, _) = mock.client().await;

    let results = join_all((0..4).map(|_| tokens.get_token())).await;

    assert_eq!(mock.token_requests(), 1);
    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AcquisitionFailed);
        assert!(err.to_string().contains("sign invalid"), "{err}");
    }

    // The failure is not cached: the next caller acquires again.
    assert!(tokens.current().is_none());
    assert_eq!(tokens.get_token().await?.token(), "token-2");
    assert_eq!(mock.token_requests(), 2);
    Ok(())
}

#[tokio::test]
async fn test_token_request_is_signed() -> Result<()> {
    let mock = MockHttpSend::builder().build();
    let (tokens, _) = mock.client().await;

    tokens.get_token().await?;

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.path, "/v1.0/token?grant_type=1");
    assert_eq!(req.header("client_id"), Some(CLIENT_ID));
    assert_eq!(req.header("sign_method"), Some("HMAC-SHA256"));
    assert_eq!(req.header("access_token"), None);
    assert_eq!(req.header("t").map(str::len), Some(13));
    assert!(req.is_signed_correctly());
    Ok(())
}

#[tokio::test]
async fn test_acquisition_failure_kinds() {
    let cases = [
        respond(StatusCode::INTERNAL_SERVER_ERROR, json!({"msg": "boom"})),
        ok(json!({"expire_time": 7200})),
        ok(json!({"access_token": ""})),
        Err(tuyasign_core::Error::transport("connection refused")),
    ];

    for case in cases {
        let case = std::sync::Mutex::new(Some(case));
        let mock = MockHttpSend::builder()
            .on_token(move |_| case.lock().unwrap().take().unwrap())
            .build();
        let (tokens, _) = mock.client().await;

        let err = tokens.get_token().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AcquisitionFailed, "{err}");
        assert!(tokens.current().is_none());
    }
}

#[tokio::test]
async fn test_invalidate_token_with_other_token_keeps_current() -> Result<()> {
    let mock = MockHttpSend::builder().build();
    let (tokens, client) = mock.client().await;

    let current = tokens.get_token().await?;
    assert!(!tokens.invalidate_token(&AccessToken::new("token-0")));

    client
        .call(Method::GET, "/v1.0/devices/eb13a02df36c15cc0czqmm/status", None)
        .await?;

    assert_eq!(mock.token_requests(), 1);
    assert_eq!(
        mock.business_requests()[0].header("access_token"),
        Some(current.token())
    );
    Ok(())
}

#[tokio::test]
async fn test_invalidate_forces_new_acquisition() -> Result<()> {
    let mock = MockHttpSend::builder().build();
    let (tokens, _) = mock.client().await;

    assert_eq!(tokens.get_token().await?.token(), "token-1");
    tokens.invalidate();
    assert_eq!(tokens.get_token().await?.token(), "token-2");
    assert_eq!(mock.token_requests(), 2);
    Ok(())
}
