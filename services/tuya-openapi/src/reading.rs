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

//! Extract temperature, humidity and battery readings from device snapshots.

use crate::device::{DeviceSnapshot, FunctionSpec, StatusEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TEMPERATURE_KEYS: &[&str] = &[
    "va_temperature",
    "temp_current",
    "temperature",
    "temp_value",
    "temp_set",
];
const HUMIDITY_KEYS: &[&str] = &["va_humidity", "humidity_value", "humidity"];
const BATTERY_KEYS: &[&str] = &[
    "battery_percentage",
    "battery_value",
    "battery_state",
    "battery",
];

const LOW_BATTERY: f64 = 20.0;

/// Pick the first status entry matching `keys`.
///
/// Exact codes are tried first, in key order. Otherwise the first entry whose
/// lower-cased code contains a key with its underscores removed wins.
pub fn prefer<'a>(keys: &[&str], status: &'a [StatusEntry]) -> Option<&'a StatusEntry> {
    for key in keys {
        if let Some(entry) = status.iter().find(|s| s.code == *key) {
            return Some(entry);
        }
    }

    for key in keys {
        let needle = key.replace('_', "");
        if let Some(entry) = status
            .iter()
            .find(|s| s.code.to_lowercase().contains(&needle))
        {
            return Some(entry);
        }
    }

    None
}

/// Scale a raw integer value according to its function spec.
///
/// Only `Integer` specs whose values carry `scale > 0` are scaled; anything
/// else is returned as a plain number, or `None` if it is not numeric.
pub fn scale_normalize(value: &Value, spec: Option<&FunctionSpec>) -> Option<f64> {
    let raw = value.as_f64()?;

    let scale = spec
        .filter(|spec| spec.kind == "Integer")
        .and_then(|spec| serde_json::from_str::<Value>(&spec.values).ok())
        .and_then(|values| values.get("scale").and_then(Value::as_i64))
        .unwrap_or(0);

    if scale > 0 {
        Some(raw / 10f64.powi(scale.min(i32::MAX as i64) as i32))
    } else {
        Some(raw)
    }
}

/// Unit of the data point `code`.
pub fn unit_for(code: &str) -> &'static str {
    let code = code.to_lowercase();
    if code.contains("temp") {
        "°C"
    } else if code.contains("humid") || code.contains("batt") {
        "%"
    } else {
        ""
    }
}

/// An inclusive range a reading should stay in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Range {
    /// Whether `value` is outside this range.
    pub fn excludes(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }
}

/// Comfort limits of a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Temperature in °C.
    pub temperature: Range,
    /// Relative humidity in %.
    pub humidity: Range,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            temperature: Range {
                min: 18.0,
                max: 27.0,
            },
            humidity: Range {
                min: 30.0,
                max: 70.0,
            },
        }
    }
}

/// Something worth looking at on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alert {
    /// Temperature outside its limits.
    Temperature,
    /// Humidity outside its limits.
    Humidity,
    /// Battery below 20 %.
    LowBattery,
    /// The device reported itself offline.
    Offline,
}

/// Normalized readings of a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reading {
    /// Temperature in °C.
    pub temperature: Option<f64>,
    /// Relative humidity in %.
    pub humidity: Option<f64>,
    /// Battery level in %, clamped to `0..=100`.
    pub battery: Option<f64>,
    /// Online flag, as reported.
    pub online: Option<bool>,
}

impl Reading {
    /// Extract readings from `snapshot`.
    pub fn from_snapshot(snapshot: &DeviceSnapshot) -> Self {
        let scaled = |keys: &[&str]| {
            let entry = prefer(keys, &snapshot.status)?;
            scale_normalize(&entry.value, snapshot.function(&entry.code))
        };

        Self {
            temperature: scaled(TEMPERATURE_KEYS),
            humidity: scaled(HUMIDITY_KEYS),
            battery: prefer(BATTERY_KEYS, &snapshot.status).and_then(|e| battery_level(&e.value)),
            online: snapshot.online,
        }
    }

    /// Alerts raised by these readings under `limits`.
    pub fn alerts(&self, limits: &Limits) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if self.online == Some(false) {
            alerts.push(Alert::Offline);
        }
        if self.temperature.is_some_and(|v| limits.temperature.excludes(v)) {
            alerts.push(Alert::Temperature);
        }
        if self.humidity.is_some_and(|v| limits.humidity.excludes(v)) {
            alerts.push(Alert::Humidity);
        }
        if self.battery.is_some_and(|v| v < LOW_BATTERY) {
            alerts.push(Alert::LowBattery);
        }
        alerts
    }
}

// Battery may be a percentage or a coarse state like "low".
fn battery_level(value: &Value) -> Option<f64> {
    let level = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => match s.to_lowercase().as_str() {
            "low" => 20.0,
            "medium" => 50.0,
            "high" => 80.0,
            "full" => 100.0,
            other => other.parse().ok()?,
        },
        _ => return None,
    };
    Some(level.clamp(0.0, 100.0))
}
