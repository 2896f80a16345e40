use num_derive::FromPrimitive;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum DeviceState {
    Unknown,
    Online = 1,
    Alarm = 2,
    Offline = 3,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceState::Unknown => "unknown",
            DeviceState::Online => "online",
            DeviceState::Alarm => "alarm",
            DeviceState::Offline => "offline",
        };
        f.write_str(name)
    }
}

impl<'de> serde::Deserialize<'de> for DeviceState {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;

        /* Some firmware reports the state as a string, e.g. "1" */
        let state = match &value {
            Value::String(s) => s.trim().parse::<u64>().ok(),
            v => v.as_u64(),
        };

        Ok(state
            .and_then(num::FromPrimitive::from_u64)
            .unwrap_or(DeviceState::Unknown))
    }
}
