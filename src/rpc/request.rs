//! JSON-RPC request decoding.
//!
//! One UDP datagram carries one request:
//!
//! ```text
//! {"jsonrpc": "2.0", "method": "set_power_level", "params": {"power_level": 42.2}, "id": 1}
//! ```
//!
//! `jsonrpc`, `method` and `params` must be present; the version string and
//! `id` are not interpreted.  Requests are fire-and-forget, so decoding
//! errors are only logged by the caller.

use core::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::app::commands::{AppCommand, PidUpdate};

/// Largest datagram accepted.
pub const MAX_DATAGRAM: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Not JSON, not an object, oversized, or a field of the wrong shape.
    Malformed,
    /// A required envelope or parameter field is absent.
    MissingField(&'static str),
    /// `method` names nothing this controller implements.
    UnknownMethod(heapless::String<32>),
    /// `power_level` is neither a number nor a numeric string, or is NaN.
    InvalidLevel,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed request"),
            Self::MissingField(name) => write!(f, "'{}' missing", name),
            Self::UnknownMethod(m) => write!(f, "unknown method '{}'", m),
            Self::InvalidLevel => write!(f, "power_level is not numeric"),
        }
    }
}

impl core::error::Error for RequestError {}

#[derive(Deserialize)]
struct Envelope {
    jsonrpc: Option<Value>,
    method: Option<String>,
    params: Option<Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PidParams {
    #[serde(rename = "P")]
    kp: Option<f32>,
    #[serde(rename = "I")]
    ki: Option<f32>,
    #[serde(rename = "D")]
    kd: Option<f32>,
    set_point: Option<f32>,
    current_temperature: Option<f32>,
}

impl From<PidParams> for PidUpdate {
    fn from(p: PidParams) -> Self {
        Self {
            kp: p.kp,
            ki: p.ki,
            kd: p.kd,
            set_point: p.set_point,
            current_temperature: p.current_temperature,
        }
    }
}

/// Decode one datagram into a command.
pub fn decode(datagram: &[u8]) -> Result<AppCommand, RequestError> {
    if datagram.len() > MAX_DATAGRAM {
        return Err(RequestError::Malformed);
    }
    let envelope: Envelope = serde_json::from_slice(datagram).map_err(|_| RequestError::Malformed)?;

    if envelope.jsonrpc.is_none() {
        return Err(RequestError::MissingField("jsonrpc"));
    }
    let method = envelope.method.ok_or(RequestError::MissingField("method"))?;
    let params = envelope.params.ok_or(RequestError::MissingField("params"))?;

    match method.as_str() {
        "set_power_level" => decode_power_level(&params).map(AppCommand::SetPowerLevel),
        "pid_update" => {
            let p: PidParams = serde_json::from_value(params).map_err(|_| RequestError::Malformed)?;
            Ok(AppCommand::PidUpdate(p.into()))
        }
        "shutdown" => Ok(AppCommand::Shutdown),
        other => {
            let mut name = heapless::String::new();
            for c in other.chars() {
                if name.push(c).is_err() {
                    break;
                }
            }
            Err(RequestError::UnknownMethod(name))
        }
    }
}

fn decode_power_level(params: &Value) -> Result<f32, RequestError> {
    let raw = params
        .as_object()
        .ok_or(RequestError::Malformed)?
        .get("power_level")
        .ok_or(RequestError::MissingField("power_level"))?;

    let level = match raw {
        Value::Number(n) => n.as_f64().ok_or(RequestError::InvalidLevel)? as f32,
        Value::String(s) => s.trim().parse::<f32>().map_err(|_| RequestError::InvalidLevel)?,
        _ => return Err(RequestError::InvalidLevel),
    };
    // Magnitudes beyond f32 become infinities and clamp like any other
    // out-of-range level.
    if level.is_nan() {
        Err(RequestError::InvalidLevel)
    } else {
        Ok(level)
    }
}
