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
use crate::response::Response;
use crate::sign_request::sign_token_request;
use crate::{AccessToken, Credential};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use log::{debug, info, warn};
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use tuyasign_core::time::{now_millis, DateTime};
use tuyasign_core::utils::Redact;
use tuyasign_core::{Context, Error, Result, SigningCredential};

type Acquisition = Shared<BoxFuture<'static, std::result::Result<AccessToken, Arc<Error>>>>;

enum State {
    Unset,
    Acquiring(Acquisition),
    Valid(AccessToken),
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Unset => "unset",
            State::Acquiring(_) => "acquiring",
            State::Valid(_) => "valid",
        }
    }
}

/// TokenManager owns the current access token.
///
/// - [`TokenManager::get_token`] returns the cached token, or acquires one.
///   Concurrent callers share a single in-flight acquisition and all get its
///   result, failure included.
/// - [`TokenManager::invalidate`] drops the cached token. Staleness is only
///   ever discovered by a downstream call being rejected; there is no local
///   expiry timer.
pub struct TokenManager {
    ctx: Context,
    endpoint: String,
    credential: Credential,
    state: Mutex<State>,
}

impl Debug for TokenManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().map(|s| s.name()).unwrap_or("poisoned");
        f.debug_struct("TokenManager")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential)
            .field("state", &state)
            .finish()
    }
}

impl TokenManager {
    /// Create a new token manager for `credential`, talking to the default endpoint.
    pub fn new(ctx: Context, credential: Credential) -> Self {
        Self {
            ctx,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credential,
            state: Mutex::new(State::Unset),
        }
    }

    /// Set the OpenAPI endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// The OpenAPI endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The credential used to sign requests.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The cached token, without triggering an acquisition.
    pub fn current(&self) -> Option<AccessToken> {
        match &*self.state.lock().expect("lock poisoned") {
            State::Valid(token) => Some(token.clone()),
            _ => None,
        }
    }

    /// Get a presumptively valid access token.
    pub async fn get_token(&self) -> Result<AccessToken> {
        if !self.credential.is_valid() {
            return Err(Error::config_missing(format!(
                "{TUYA_CLIENT_ID} and {TUYA_SECRET_KEY} must be set"
            )));
        }

        let acquisition = {
            let mut state = self.state.lock().expect("lock poisoned");
            match &*state {
                State::Valid(token) => {
                    debug!("reusing cached access token {}", Redact::from(token.token()));
                    return Ok(token.clone());
                }
                State::Acquiring(acquisition) => {
                    debug!("joining in-flight token acquisition");
                    acquisition.clone()
                }
                State::Unset => {
                    debug!("no access token cached, acquiring one");
                    let acquisition = acquire(
                        self.ctx.clone(),
                        self.endpoint.clone(),
                        self.credential.clone(),
                    )
                    .map(|res| res.map_err(Arc::new))
                    .boxed()
                    .shared();
                    *state = State::Acquiring(acquisition.clone());
                    acquisition
                }
            }
        };

        let result = acquisition.clone().await;

        {
            let mut state = self.state.lock().expect("lock poisoned");
            let settles = matches!(
                &*state,
                State::Acquiring(inflight) if inflight.ptr_eq(&acquisition)
            );
            if settles {
                *state = match &result {
                    Ok(token) => State::Valid(token.clone()),
                    Err(_) => State::Unset,
                };
            }
        }

        result.map_err(|err| Error::new(err.kind(), err.to_string()).with_source(err))
    }

    /// Drop the cached token, if any.
    ///
    /// An acquisition already in flight is left alone.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().expect("lock poisoned");
        if let State::Valid(token) = &*state {
            warn!("invalidating access token {}", Redact::from(token.token()));
            *state = State::Unset;
        }
    }

    /// Drop the cached token only if it is still `stale`.
    ///
    /// Returns whether the token was dropped. Callers that all saw the same
    /// rejected token therefore cause a single refresh.
    pub fn invalidate_token(&self, stale: &AccessToken) -> bool {
        let mut state = self.state.lock().expect("lock poisoned");
        let matched = matches!(&*state, State::Valid(current) if current == stale);
        if matched {
            warn!("access token {} was rejected, dropping it", Redact::from(stale.token()));
            *state = State::Unset;
        }
        matched
    }

    /// Drop the cached token if it was acquired at or before `since`.
    ///
    /// A token acquired later was obtained after the rejection being handled
    /// and is kept.
    pub fn invalidate_acquired_before(&self, since: DateTime) -> bool {
        let mut state = self.state.lock().expect("lock poisoned");
        let outdated = matches!(&*state, State::Valid(current) if current.acquired_at() <= since);
        if outdated {
            warn!("access token predates a rejected call, dropping it");
            *state = State::Unset;
        }
        outdated
    }
}

async fn acquire(ctx: Context, endpoint: String, credential: Credential) -> Result<AccessToken> {
    let req = sign_token_request(&credential, &now_millis())?.into_http(&endpoint)?;

    let resp = ctx.http_send(req).await.map_err(|e| {
        warn!("token endpoint unreachable: {e}");
        Error::acquisition_failed(format!("token endpoint unreachable: {e}")).with_source(e)
    })?;

    let resp = Response::from_http(resp).map_err(|e| {
        Error::acquisition_failed(format!("token endpoint answered badly: {e}")).with_source(e)
    })?;
    if !resp.status.is_success() {
        return Err(Error::acquisition_failed(format!(
            "token endpoint returned {}",
            resp.status
        )));
    }

    let envelope = resp.envelope();
    let token = envelope
        .result
        .as_ref()
        .and_then(|result| result.get("access_token"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty());

    match token {
        Some(token) if envelope.success => {
            info!("acquired access token {}", Redact::from(token));
            Ok(AccessToken::new(token))
        }
        _ => {
            warn!("token endpoint rejected the request: {}", envelope.describe());
            Err(Error::acquisition_failed(format!(
                "token endpoint rejected the request: {}",
                envelope.describe()
            )))
        }
    }
}
