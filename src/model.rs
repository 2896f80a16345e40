use serde::{Deserialize, Serialize};
use std::fmt;

type Watts = f64;

/// Key of the `dataList` entry carrying current AC output power (in mW).
pub const POWER_KEY: &str = "APo_t1";

#[derive(Clone)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
    pub email: String,
    pub password: String,
}

/* Never print secrets, even at trace level */
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Api {
    pub api_url: String,
    pub credentials: Credentials,
}

/// Bearer token issued by `/account/v1.0/token`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token(pub String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} chars>)", self.0.len())
    }
}

/// Instantaneous output power, always non-negative and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerReading(Watts);

impl PowerReading {
    pub const ZERO: PowerReading = PowerReading(0.0);

    /// Build a reading from the milliwatt value reported by the inverter.
    pub fn from_milliwatts(milliwatts: f64) -> Self {
        let watts = milliwatts / 1000.0;
        if watts.is_finite() && watts > 0.0 {
            PowerReading(watts)
        } else {
            PowerReading::ZERO
        }
    }

    pub fn watts(&self) -> Watts {
        self.0
    }
}

/* Power file format: "D.DD", ties rounded up */
impl fmt::Display for PowerReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", (self.0 * 100.0).round() / 100.0)
    }
}

/// Outcome of a telemetry request that reached the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    Reading(PowerReading),
    /// The API refused the request, typically because the token went stale.
    Rejected {
        code: Option<String>,
        message: Option<String>,
    },
}
