use crate::model::{Api, Credentials};
use config::Config;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

const API_URL: &str = "https://globalapi.solarmanpv.com";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Settings exactly as found in the environment.
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct RawSettings {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub device_sn: Option<String>,
    pub base_dir: Option<String>,
    pub api_url: Option<String>,
    pub http_timeout: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api: Api,
    pub device_sn: String,
    /// Directory for state, power and error files. Defaults to the executable's directory.
    pub base_dir: Option<PathBuf>,
    pub http_timeout: Duration,
}

/// A required environment variable which is unset or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingSetting(pub &'static str);

impl fmt::Display for MissingSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not set", self.0)
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Source(config::ConfigError),
    Missing(Vec<MissingSetting>),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Source(e) => write!(f, "unable to read environment: {}", e),
            SettingsError::Missing(missing) => {
                let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

impl std::error::Error for SettingsError {}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(String::from)
}

/// Check required settings, reporting every missing one.
pub fn validate(raw: &RawSettings) -> Result<Settings, Vec<MissingSetting>> {
    let mut missing = Vec::new();
    let mut required = |name: &'static str, value: &Option<String>| {
        non_blank(value).unwrap_or_else(|| {
            missing.push(MissingSetting(name));
            String::new()
        })
    };

    let app_id = required("APP_ID", &raw.app_id);
    let app_secret = required("API_KEY", &raw.api_key);
    let email = required("EMAIL", &raw.email);
    let password = required("PASSWORD", &raw.password);
    let device_sn = required("DEVICE_SN", &raw.device_sn);

    if !missing.is_empty() {
        return Err(missing);
    }

    let api_url = non_blank(&raw.api_url).unwrap_or_else(|| API_URL.to_string());

    Ok(Settings {
        api: Api {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            credentials: Credentials {
                app_id,
                app_secret,
                email,
                password,
            },
        },
        device_sn,
        base_dir: non_blank(&raw.base_dir).map(PathBuf::from),
        /* 0 would make every request time out immediately */
        http_timeout: Duration::from_secs(
            raw.http_timeout
                .filter(|secs| *secs > 0)
                .unwrap_or(HTTP_TIMEOUT_SECS),
        ),
    })
}

pub fn read_raw_settings() -> Result<RawSettings, config::ConfigError> {
    let mut settings = Config::default();
    settings.merge(config::Environment::new())?;

    settings.try_into()
}

pub fn read_settings() -> Result<Settings, SettingsError> {
    let raw = read_raw_settings().map_err(SettingsError::Source)?;

    validate(&raw).map_err(SettingsError::Missing)
}

impl Settings {
    /// Resolve the output directory, falling back to where the executable lives.
    pub fn output_dir(&self) -> io::Result<PathBuf> {
        match &self.base_dir {
            Some(dir) => Ok(dir.to_owned()),
            None => std::env::current_exe()?
                .parent()
                .map(PathBuf::from)
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory")
                }),
        }
    }
}
