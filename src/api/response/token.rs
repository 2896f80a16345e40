use super::Status;
use serde::Deserialize;
use serde_json::Value;

/* POST /account/v1.0/token */
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(flatten)]
    pub status: Status,
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    /// Lifetime in seconds, informational only.
    pub expires_in: Option<Value>,
}
