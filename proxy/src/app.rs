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

use crate::config::Settings;
use crate::handlers::{devices_handler, proxy_handler, token_handler};
use axum::routing::{get, post};
use axum::Router;
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tuyasign_core::{Context, ProvideCredential, Result};
use tuyasign_tuya_openapi::{
    Client, Config, ConfigCredentialProvider, Credential, Device, TokenManager,
};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: Client,
    pub devices: Arc<[Device]>,
}

impl AppState {
    /// Build the state from a loaded `config`.
    ///
    /// Missing credentials are not fatal: the proxy still starts and answers
    /// every call with `config_missing`.
    pub async fn new(ctx: Context, config: Config, settings: &Settings) -> Result<Self> {
        let endpoint = config.endpoint();
        let credential = ConfigCredentialProvider::new(Arc::new(config))
            .provide_credential(&ctx)
            .await?;
        let credential = match credential {
            Some(credential) => credential,
            None => {
                warn!("TUYA_CLIENT_ID or TUYA_SECRET_KEY is not set, calls will be rejected");
                Credential::default()
            }
        };

        info!("using Tuya OpenAPI endpoint {endpoint}");
        let tokens = Arc::new(TokenManager::new(ctx.clone(), credential).with_endpoint(endpoint));

        Ok(Self {
            client: Client::new(ctx, tokens),
            devices: settings.devices.clone().into(),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/get-tuya-token", get(token_handler))
        .route("/api/proxy", post(proxy_handler))
        .route("/api/devices", get(devices_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
