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

//! Tuya OpenAPI signing implementation for tuyasign.
//!
//! This crate signs calls to the Tuya cloud OpenAPI, keeps the access token
//! fresh, and reads devices on top of it.
//!
//! ## Overview
//!
//! Every call carries an HMAC-SHA256 signature over the client id, the access
//! token (business calls only), a millisecond timestamp, the method, the
//! SHA256 of the body and the path. The access token is obtained from
//! `/v1.0/token` and kept until the remote rejects it with code `1010`; the
//! [`Client`] then refreshes it once and retries.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use http::Method;
//! use tuyasign_core::{Context, OsEnv, ProvideCredential};
//! use tuyasign_http_send_reqwest::ReqwestHttpSend;
//! use tuyasign_tuya_openapi::{Client, EnvCredentialProvider, TokenManager};
//!
//! #[tokio::main]
//! async fn main() -> tuyasign_core::Result<()> {
//!     let ctx = Context::new()
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!
//!     let credential = EnvCredentialProvider::new()
//!         .provide_credential(&ctx)
//!         .await?
//!         .unwrap_or_default();
//!
//!     let tokens = Arc::new(TokenManager::new(ctx.clone(), credential));
//!     let client = Client::new(ctx, tokens);
//!
//!     let resp = client
//!         .call(Method::GET, "/v1.0/devices/eb13a02df36c15cc0czqmm/status", None)
//!         .await?;
//!     println!("{}", resp.body);
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! ```bash
//! export TUYA_CLIENT_ID=your-client-id
//! export TUYA_SECRET_KEY=your-secret-key
//! # optional, defaults to https://openapi.tuyaus.com
//! export TUYA_ENDPOINT=https://openapi.tuyaeu.com
//! ```

#![warn(missing_docs)]

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::{AccessToken, Credential};

mod sign_request;
pub use sign_request::{
    request_body, sign_business_request, sign_token_request, string_to_sign, SignedRequest,
};

mod response;
pub use response::{Envelope, Response};

mod token_manager;
pub use token_manager::TokenManager;

mod client;
pub use client::{Client, RetryPolicy};

mod device;
pub use device::{
    fetch_all, fetch_device, poll, Device, DeviceOutcome, DeviceQuery, DeviceSnapshot,
    FunctionSpec, ResourceKind, StatusEntry,
};

pub mod reading;

mod provide_credential;
pub use provide_credential::*;
