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
use tuyasign_core::{Error, ErrorKind};
use tuyasign_tuya_openapi::{AccessToken, DeviceQuery, ResourceKind, RetryPolicy};

const STATUS_PATH: &str = "/v1.0/devices/eb13a02df36c15cc0czqmm/status";

#[tokio::test]
async fn test_call_signs_with_token() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|_| ok(json!([{"code": "va_temperature", "value": 235}])))
        .build();
    let (_, client) = mock.client().await;

    let resp = client.call(Method::GET, STATUS_PATH, None).await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.body["result"],
        json!([{"code": "va_temperature", "value": 235}])
    );

    let requests = mock.business_requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.path, STATUS_PATH);
    assert_eq!(req.header("access_token"), Some("token-1"));
    assert_eq!(req.header("content-type"), None);
    assert!(req.body.is_empty());
    assert!(req.is_signed_correctly());
    Ok(())
}

#[tokio::test]
async fn test_call_with_body() -> Result<()> {
    let mock = MockHttpSend::builder().build();
    let (_, client) = mock.client().await;

    let body = json!({"commands": [{"code": "switch_1", "value": true}]});
    client
        .call(
            Method::POST,
            "/v1.0/devices/eb13a02df36c15cc0czqmm/commands",
            Some(&body),
        )
        .await?;

    let req = &mock.business_requests()[0];
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(serde_json::from_slice::<serde_json::Value>(&req.body)?, body);
    assert!(req.is_signed_correctly());
    Ok(())
}

#[tokio::test]
async fn test_token_invalid_retries_once_with_fresh_token() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|req| match req.header("access_token") {
            Some("token-1") => token_invalid(),
            _ => ok(json!([])),
        })
        .build();
    let (tokens, client) = mock.client().await;

    let resp = client.call(Method::GET, STATUS_PATH, None).await?;
    assert_eq!(resp.body["success"], json!(true));

    let requests = mock.business_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("access_token"), Some("token-1"));
    assert_eq!(requests[1].header("access_token"), Some("token-2"));
    assert!(requests.iter().all(|r| r.is_signed_correctly()));
    assert_eq!(mock.token_requests(), 2);
    assert_eq!(tokens.current(), Some(AccessToken::new("token-2")));
    Ok(())
}

#[tokio::test]
async fn test_token_invalid_by_msg_only() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|req| match req.header("access_token") {
            Some("token-1") => respond(
                StatusCode::OK,
                json!({"success": false, "msg": "token invalid"}),
            ),
            _ => ok(json!([])),
        })
        .build();
    let (_, client) = mock.client().await;

    client.call(Method::GET, STATUS_PATH, None).await?;
    assert_eq!(mock.business_requests().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_second_rejection_is_authentication_expired() {
    let mock = MockHttpSend::builder()
        .on_business(|_| token_invalid())
        .build();
    let (_, client) = mock.client().await;

    let err = client
        .call(Method::GET, STATUS_PATH, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthenticationExpired);
    assert_eq!(mock.business_requests().len(), 2);
    assert_eq!(mock.token_requests(), 2);
}

#[tokio::test]
async fn test_never_retry_policy() {
    let mock = MockHttpSend::builder()
        .on_business(|_| token_invalid())
        .build();
    let (_, client) = mock.client().await;
    let client = client.with_retry_policy(RetryPolicy::never());

    let err = client
        .call(Method::GET, STATUS_PATH, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthenticationExpired);
    assert_eq!(mock.business_requests().len(), 1);
}

#[tokio::test]
async fn test_timeout_is_transport_error_without_retry() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|_| Err(Error::transport("request timed out")))
        .build();
    let (tokens, client) = mock.client().await;

    let err = client
        .call(Method::GET, STATUS_PATH, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(mock.business_requests().len(), 1);
    assert_eq!(mock.token_requests(), 1);
    assert_eq!(tokens.current(), Some(AccessToken::new("token-1")));
    Ok(())
}

#[tokio::test]
async fn test_business_failure_is_returned_unmodified() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|_| fail(1106, "permission deny"))
        .build();
    let (_, client) = mock.client().await;

    let resp = client.call(Method::GET, STATUS_PATH, None).await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["code"], json!(1106));
    assert_eq!(resp.body["msg"], json!("permission deny"));
    assert_eq!(mock.business_requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_error_status_is_server_error() {
    let mock = MockHttpSend::builder()
        .on_business(|_| respond(StatusCode::SERVICE_UNAVAILABLE, json!({"msg": "busy"})))
        .build();
    let (_, client) = mock.client().await;

    let err = client
        .call(Method::GET, STATUS_PATH, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert!(err.to_string().contains("busy"), "{err}");
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let mock = MockHttpSend::builder()
        .on_business(|_| {
            Ok(http::Response::builder()
                .status(200)
                .body(bytes::Bytes::from_static(b"<html></html>"))?)
        })
        .build();
    let (_, client) = mock.client().await;

    let err = client
        .call(Method::GET, STATUS_PATH, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_bad_path_is_request_invalid() {
    let mock = MockHttpSend::builder().build();
    let (_, client) = mock.client().await;

    let err = client
        .call(Method::GET, "v1.0/devices", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(mock.business_requests().is_empty());
}

#[tokio::test]
async fn test_supplied_token_is_used_first() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|req| match req.header("access_token") {
            Some("from-browser") => token_invalid(),
            _ => ok(json!([])),
        })
        .build();
    let (_, client) = mock.client().await;

    client
        .call_with_token(
            Some(AccessToken::new("from-browser")),
            Method::GET,
            STATUS_PATH,
            None,
        )
        .await?;

    let requests = mock.business_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("access_token"), Some("from-browser"));
    assert_eq!(requests[1].header("access_token"), Some("token-1"));
    assert_eq!(mock.token_requests(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rejected_supplied_token_refreshes_cached_token() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|req| match req.header("access_token") {
            Some("token-2") => ok(json!([])),
            _ => token_invalid(),
        })
        .build();
    let (tokens, client) = mock.client().await;
    // Cached before the call, and just as stale as the browser's token.
    tokens.get_token().await?;

    let resp = client
        .call_with_token(
            Some(AccessToken::new("from-browser")),
            Method::GET,
            STATUS_PATH,
            None,
        )
        .await?;
    assert_eq!(resp.body["success"], json!(true));

    let sent: Vec<_> = mock
        .business_requests()
        .iter()
        .map(|r| r.header("access_token").map(str::to_string))
        .collect();
    assert_eq!(
        sent,
        vec![Some("from-browser".to_string()), Some("token-2".to_string())]
    );
    assert_eq!(mock.token_requests(), 2);
    assert_eq!(tokens.current(), Some(AccessToken::new("token-2")));
    Ok(())
}

#[tokio::test]
async fn test_forward_returns_error_status() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|_| {
            respond(
                StatusCode::NOT_FOUND,
                json!({"success": false, "code": 1106, "msg": "device not found"}),
            )
        })
        .build();
    let (_, client) = mock.client().await;

    let resp = client
        .forward(None, Method::GET, STATUS_PATH, None)
        .await?;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(
        resp.body,
        json!({"success": false, "code": 1106, "msg": "device not found"})
    );

    let err = client
        .call(Method::GET, STATUS_PATH, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerError);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_rejections_refresh_once() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|req| match req.header("access_token") {
            Some("token-1") => token_invalid(),
            _ => ok(json!([])),
        })
        .build();
    let (tokens, client) = mock.client().await;
    tokens.get_token().await?;

    let results = join_all((0..4).map(|_| client.call(Method::GET, STATUS_PATH, None))).await;
    for result in results {
        result?;
    }

    // Callers that saw the same stale token share one refresh.
    assert_eq!(mock.token_requests(), 2);
    Ok(())
}

#[tokio::test]
async fn test_query() -> Result<()> {
    let mock = MockHttpSend::builder()
        .on_business(|_| ok(json!({"online": true})))
        .build();
    let (_, client) = mock.client().await;

    let resp = client
        .query(&DeviceQuery::new("eb08f82b6ddb5a1699dced", ResourceKind::Info))
        .await?;
    assert_eq!(resp.envelope().result, Some(json!({"online": true})));
    assert_eq!(
        mock.business_requests()[0].path,
        "/v1.0/devices/eb08f82b6ddb5a1699dced"
    );
    Ok(())
}
