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

use crate::{constants::*, Credential};
use async_trait::async_trait;
use log::debug;
use tuyasign_core::{Context, ProvideCredential, Result};

/// EnvCredentialProvider loads Tuya credentials from environment variables.
///
/// This provider looks for the following environment variables:
/// - `TUYA_CLIENT_ID`: The client id of the cloud project
/// - `TUYA_SECRET_KEY`: The secret key of the cloud project
///
/// Both must be set and non-empty, otherwise nothing is provided.
#[derive(Debug, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let client_id = envs.get(TUYA_CLIENT_ID).filter(|v| !v.is_empty());
        let secret_key = envs.get(TUYA_SECRET_KEY).filter(|v| !v.is_empty());

        match (client_id, secret_key) {
            (Some(id), Some(secret)) => Ok(Some(Credential::new(id.clone(), secret.clone()))),
            _ => {
                debug!("{TUYA_CLIENT_ID} or {TUYA_SECRET_KEY} is not set");
                Ok(None)
            }
        }
    }
}
