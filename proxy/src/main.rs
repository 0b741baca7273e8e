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

use log::info;
use tokio::net::TcpListener;
use tuyasign_core::{Context, OsEnv};
use tuyasign_http_send_reqwest::ReqwestHttpSend;
use tuyasign_proxy::{create_app, AppState, Settings};
use tuyasign_tuya_openapi::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    env_logger::init();

    let ctx = Context::new().with_env(OsEnv);
    let settings = Settings::from_env(&ctx)?;
    let ctx = ctx.with_http_send(ReqwestHttpSend::with_timeout(settings.http_timeout)?);

    let config = Config::default().from_env(&ctx);
    let state = AppState::new(ctx, config, &settings).await?;

    let listener = TcpListener::bind(settings.addr).await?;
    info!(
        "listening on {}, serving {} devices",
        settings.addr,
        settings.devices.len()
    );

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
