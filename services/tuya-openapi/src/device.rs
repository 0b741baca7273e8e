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

use crate::reading::Limits;
use crate::response::Response;
use crate::Client;
use futures::future::join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tuyasign_core::{Error, Result};

/// A device to poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Tuya device id.
    pub id: String,
    /// Human readable name.
    pub name: String,
    /// Comfort limits its readings are checked against.
    #[serde(default)]
    pub limits: Limits,
}

impl Device {
    /// Create a new device with the default limits.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            limits: Limits::default(),
        }
    }

    /// Set the comfort limits of this device.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

/// The resource of a device a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Current data point values.
    Status,
    /// Function specs, including value scales.
    Functions,
    /// Device info, including the online flag.
    Info,
}

/// A read-only query against a single device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceQuery {
    /// Tuya device id.
    pub device_id: String,
    /// Resource to read.
    pub kind: ResourceKind,
}

impl DeviceQuery {
    /// Create a new query.
    pub fn new(device_id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            device_id: device_id.into(),
            kind,
        }
    }

    /// Path of this query on the OpenAPI.
    pub fn path(&self) -> String {
        match self.kind {
            ResourceKind::Status => format!("/v1.0/devices/{}/status", self.device_id),
            ResourceKind::Functions => format!("/v1.0/devices/{}/functions", self.device_id),
            ResourceKind::Info => format!("/v1.0/devices/{}", self.device_id),
        }
    }
}

/// One data point reported by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Data point code, like `va_temperature`.
    pub code: String,
    /// Raw value, before scaling.
    pub value: Value,
}

/// Spec of a device function.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Data point code.
    pub code: String,
    /// Value type, like `Integer` or `Enum`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// JSON encoded value constraints, like `{"min":-200,"max":600,"scale":1}`.
    #[serde(default)]
    pub values: String,
}

/// Everything read from a device in one polling cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DeviceSnapshot {
    /// Tuya device id.
    pub id: String,
    /// Current data points.
    pub status: Vec<StatusEntry>,
    /// Function specs; empty when the device did not report them.
    pub functions: Vec<FunctionSpec>,
    /// Online flag; `None` when unknown.
    pub online: Option<bool>,
}

impl DeviceSnapshot {
    /// Look up the spec of function `code`.
    pub fn function(&self, code: &str) -> Option<&FunctionSpec> {
        self.functions.iter().find(|f| f.code == code)
    }
}

/// The result of polling one device.
#[derive(Debug)]
pub struct DeviceOutcome {
    /// The polled device.
    pub device: Device,
    /// Snapshot, or the error that stopped this device.
    pub result: Result<DeviceSnapshot>,
}

impl DeviceOutcome {
    /// Whether this device was read.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Number of devices read.
    pub fn count_ok(outcomes: &[DeviceOutcome]) -> usize {
        outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Number of devices that failed.
    pub fn count_failed(outcomes: &[DeviceOutcome]) -> usize {
        outcomes.len() - Self::count_ok(outcomes)
    }
}

/// Read status, functions and info of `device` concurrently.
///
/// The status must succeed. Functions and info are best effort: a business
/// failure leaves them empty / unknown.
pub async fn fetch_device(client: &Client, device: &Device) -> Result<DeviceSnapshot> {
    let status = DeviceQuery::new(&device.id, ResourceKind::Status);
    let functions = DeviceQuery::new(&device.id, ResourceKind::Functions);
    let info = DeviceQuery::new(&device.id, ResourceKind::Info);

    let (status, functions, info) = futures::try_join!(
        client.query(&status),
        client.query(&functions),
        client.query(&info),
    )?;

    let envelope = status.envelope();
    if !envelope.success {
        return Err(Error::server_error(format!(
            "failed to read status of {}: {}",
            device.name,
            envelope.describe()
        )));
    }
    let status = match envelope.result {
        Some(value @ Value::Array(_)) => serde_json::from_value(value)?,
        _ => Vec::new(),
    };

    Ok(DeviceSnapshot {
        id: device.id.clone(),
        status,
        functions: parse_functions(&device.name, &functions),
        online: parse_online(&info),
    })
}

fn parse_functions(name: &str, resp: &Response) -> Vec<FunctionSpec> {
    let envelope = resp.envelope();
    if !envelope.success {
        debug!("{name} did not report functions: {}", envelope.describe());
        return Vec::new();
    }

    envelope
        .result
        .and_then(|mut result| result.get_mut("functions").map(Value::take))
        .and_then(|functions| serde_json::from_value(functions).ok())
        .unwrap_or_default()
}

fn parse_online(resp: &Response) -> Option<bool> {
    let envelope = resp.envelope();
    if !envelope.success {
        return None;
    }
    envelope.result?.get("online")?.as_bool()
}

/// Read every device in `devices` concurrently.
///
/// Outcomes keep the order of `devices`. One device failing never cancels
/// the others.
pub async fn fetch_all(client: &Client, devices: &[Device]) -> Vec<DeviceOutcome> {
    let outcomes: Vec<DeviceOutcome> = join_all(devices.iter().map(|device| async move {
        let result = fetch_device(client, device).await;
        if let Err(err) = &result {
            warn!("failed to read device {} ({}): {err}", device.name, device.id);
        }
        DeviceOutcome {
            device: device.clone(),
            result,
        }
    }))
    .await;

    info!(
        "polled {} devices: {} ok, {} failed",
        outcomes.len(),
        DeviceOutcome::count_ok(&outcomes),
        DeviceOutcome::count_failed(&outcomes)
    );
    outcomes
}

/// Run one polling cycle.
///
/// The token is obtained up front so that a missing configuration or a failed
/// acquisition is reported once for the whole cycle instead of per device.
pub async fn poll(client: &Client, devices: &[Device]) -> Result<Vec<DeviceOutcome>> {
    client.token_manager().get_token().await?;
    Ok(fetch_all(client, devices).await)
}
