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

//! HTTP proxy in front of the Tuya OpenAPI.
//!
//! Browsers call this proxy instead of the OpenAPI so that the secret key
//! never leaves the server:
//!
//! - `GET /api/get-tuya-token` returns the current access token.
//! - `POST /api/proxy` signs and forwards the call named by `X-Tuya-Path`.
//! - `GET /api/devices` polls the configured devices.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;

pub use app::{create_app, AppState};
pub use config::Settings;
