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

//! Core components for signing Tuya OpenAPI requests.
//!
//! This crate provides the foundational types and traits shared by the
//! tuyasign crates.
//!
//! - **Context**: a container holding the HTTP sender and environment access,
//!   so that tests can swap both out.
//! - **Traits**: [`ProvideCredential`] loads the client id and secret key,
//!   [`SigningCredential`] validates it.
//! - **Error**: a single [`Error`] type whose [`ErrorKind`] tells callers how
//!   the failure should be reported.
//!
//! ## Example
//!
//! ```no_run
//! use tuyasign_core::{Context, OsEnv, Result};
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let client_id = ctx.env_var("TUYA_CLIENT_ID");
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: SHA256 and HMAC-SHA256 helpers
//! - [`time`]: millisecond timestamps
//! - [`utils`]: data redaction for logs

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SigningCredential};
