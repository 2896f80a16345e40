pub mod current_data;
pub mod device_state;
pub mod token;

use serde::Deserialize;
use serde_json::Value;

/* Envelope fields shared by every Solarman response */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub success: bool,
    /// Vendor error code, sent either as a string or as a number.
    pub code: Option<Value>,
    pub msg: Option<String>,
    pub request_id: Option<String>,
}

impl Status {
    pub fn code(&self) -> Option<String> {
        match &self.code {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.to_owned()),
            Some(v) => Some(v.to_string()),
        }
    }

    /// Human readable failure description.
    pub fn describe(&self) -> String {
        format!(
            "code {}: {}",
            self.code().unwrap_or_else(|| "(none)".to_string()),
            self.msg
                .as_deref()
                .unwrap_or("(no error message received)")
        )
    }
}
