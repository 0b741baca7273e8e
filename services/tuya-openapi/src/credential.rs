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

use std::fmt::{Debug, Formatter};
use tuyasign_core::time::{now, DateTime};
use tuyasign_core::utils::Redact;
use tuyasign_core::SigningCredential;

/// Credential that holds the client id and secret key of a Tuya cloud project.
///
/// Never serialized; `Debug` redacts both fields.
#[derive(Default, Clone)]
pub struct Credential {
    /// Client id (access id) of the cloud project.
    pub client_id: String,
    /// Secret key (access secret) of the cloud project.
    pub secret_key: String,
}

impl Credential {
    /// Create a new credential.
    pub fn new(client_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &Redact::from(&self.client_id))
            .field("secret_key", &Redact::from(&self.secret_key))
            .finish()
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self) -> bool {
        !self.client_id.is_empty() && !self.secret_key.is_empty()
    }
}

/// AccessToken is the bearer credential returned by the token endpoint.
///
/// There is no expiry tracked here: a token stays in use until the remote
/// rejects it.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    acquired_at: DateTime,
}

impl AccessToken {
    /// Create a token acquired now.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            acquired_at: now(),
        }
    }

    /// The raw token string, as sent in the `access_token` header.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// When this token was acquired.
    pub fn acquired_at(&self) -> DateTime {
        self.acquired_at
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for AccessToken {}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &Redact::from(&self.token))
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

impl SigningCredential for AccessToken {
    fn is_valid(&self) -> bool {
        !self.token.is_empty()
    }
}
