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

// Env values used in tuya services.
pub const TUYA_CLIENT_ID: &str = "TUYA_CLIENT_ID";
pub const TUYA_SECRET_KEY: &str = "TUYA_SECRET_KEY";
pub const TUYA_ENDPOINT: &str = "TUYA_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "https://openapi.tuyaus.com";
pub const TOKEN_PATH: &str = "/v1.0/token?grant_type=1";

// Headers used in signed requests.
pub const CLIENT_ID: &str = "client_id";
pub const ACCESS_TOKEN: &str = "access_token";
pub const SIGN: &str = "sign";
pub const T: &str = "t";
pub const SIGN_METHOD: &str = "sign_method";
pub const HMAC_SHA256: &str = "HMAC-SHA256";

// Markers of a rejected access token.
pub const TOKEN_INVALID_CODE: i64 = 1010;
pub const TOKEN_INVALID_MSG: &str = "token invalid";
