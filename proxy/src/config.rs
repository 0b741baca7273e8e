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

use std::net::SocketAddr;
use std::time::Duration;
use tuyasign_core::{Context, Error, Result};
use tuyasign_http_send_reqwest::DEFAULT_TIMEOUT;
use tuyasign_tuya_openapi::reading::Range;
use tuyasign_tuya_openapi::Device;

pub const TUYA_PROXY_ADDR: &str = "TUYA_PROXY_ADDR";
pub const TUYA_HTTP_TIMEOUT_SECS: &str = "TUYA_HTTP_TIMEOUT_SECS";
pub const TUYA_DEVICES: &str = "TUYA_DEVICES";

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

const DEFAULT_DEVICES: &[(&str, &str)] = &[
    ("eb798cab6fd0612ab95jwc", "Sala-T5"),
    ("eb4834395c8fbc4dfefpe9", "Sala-T4"),
    ("eb13a02df36c15cc0czqmm", "Sala-T3"),
    ("eb08f82b6ddb5a1699dced", "Sala-T2"),
];

/// Settings of the proxy process.
///
/// Credentials are not part of it; they go through
/// [`tuyasign_tuya_openapi::Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address to listen on.
    pub addr: SocketAddr,
    /// Timeout of every call to the OpenAPI.
    pub http_timeout: Duration,
    /// Devices served by `/api/devices`, each with its own limits.
    pub devices: Vec<Device>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            http_timeout: DEFAULT_TIMEOUT,
            devices: default_devices(),
        }
    }
}

impl Settings {
    /// Load settings from env, falling back to defaults.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let var = |key: &str| ctx.env_var(key).filter(|v| !v.trim().is_empty());

        let addr = var(TUYA_PROXY_ADDR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr.trim().parse::<SocketAddr>().map_err(|e| {
            Error::config_missing(format!("{TUYA_PROXY_ADDR} is not a socket address: {addr}"))
                .with_source(e)
        })?;

        let http_timeout = match var(TUYA_HTTP_TIMEOUT_SECS) {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::config_missing(format!(
                        "{TUYA_HTTP_TIMEOUT_SECS} must be a positive number of seconds: {v}"
                    )))
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        let devices = match var(TUYA_DEVICES) {
            Some(v) => parse_devices(&v)?,
            None => default_devices(),
        };

        Ok(Self {
            addr,
            http_timeout,
            devices,
        })
    }
}

fn default_devices() -> Vec<Device> {
    DEFAULT_DEVICES
        .iter()
        .map(|(id, name)| Device::new(*id, *name))
        .collect()
}

/// Parse `id=name,id=name`. A bare `id` is named after itself.
///
/// Each entry may override its limits with `;temp=min..max` and
/// `;hum=min..max`, either bound may be left out: `abc=Kitchen;temp=..25`.
fn parse_devices(s: &str) -> Result<Vec<Device>> {
    s.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_device)
        .collect()
}

fn parse_device(entry: &str) -> Result<Device> {
    let mut parts = entry.split(';').map(str::trim);
    let head = parts.next().unwrap_or_default();
    let mut device = match head.split_once('=') {
        Some((id, name)) if !name.trim().is_empty() => Device::new(id.trim(), name.trim()),
        Some((id, _)) => Device::new(id.trim(), id.trim()),
        None => Device::new(head, head),
    };

    for part in parts.filter(|p| !p.is_empty()) {
        let invalid = || {
            Error::config_missing(format!(
                "{TUYA_DEVICES} has an invalid limit for {}: {part}",
                device.id
            ))
        };
        let (key, bounds) = part.split_once('=').ok_or_else(invalid)?;
        let range = match key.trim() {
            "temp" => &mut device.limits.temperature,
            "hum" => &mut device.limits.humidity,
            _ => return Err(invalid()),
        };
        override_range(range, bounds).ok_or_else(invalid)?;
    }

    Ok(device)
}

// `min..max`, `min..` or `..max`; missing bounds keep their current value.
fn override_range(range: &mut Range, bounds: &str) -> Option<()> {
    let (min, max) = bounds.split_once("..")?;
    let bound = |v: &str| -> Option<Option<f64>> {
        let v = v.trim();
        if v.is_empty() {
            return Some(None);
        }
        v.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some)
    };

    let (min, max) = (bound(min)?, bound(max)?);
    range.min = min.unwrap_or(range.min);
    range.max = max.unwrap_or(range.max);
    Some(())
}
