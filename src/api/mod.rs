pub mod endpoint;
pub mod error;
pub mod response;

use crate::model::{self, Telemetry, Token};
use async_trait::async_trait;
pub use error::Error;
use response::current_data::CurrentData;
use response::token::TokenResponse;
use serde::de::DeserializeOwned;
use serde::Serialize;

use std::collections::HashMap;
use std::time::Duration;

/// Operations the poller needs from the Solarman OpenAPI.
#[async_trait]
pub trait SolarmanApi {
    /// Exchange credentials for a fresh bearer token.
    async fn authenticate(&self) -> Result<Token, Error>;

    /// Read the current output power of device `device_sn`.
    ///
    /// A refused request (stale token, `success: false`) is reported as
    /// `Telemetry::Rejected`, not as an error.
    async fn fetch_power(&self, token: &Token, device_sn: &str) -> Result<Telemetry, Error>;
}

pub struct Client {
    api: model::Api,
    client: reqwest::Client,
}

pub fn client(api: model::Api, timeout: Duration) -> Result<Client, Error> {
    let client = reqwest::ClientBuilder::new()
        .timeout(timeout)
        .build()
        .or(Err(Error::InternalError))?;

    Ok(Client { api, client })
}

/// Map Non-2xx API response to Error
fn map_api_err(error: reqwest::Error) -> Error {
    match error.status() {
        Some(http::StatusCode::TOO_MANY_REQUESTS) => Error::RateExceeded(error.to_string()),
        Some(http::StatusCode::UNAUTHORIZED) | Some(http::StatusCode::FORBIDDEN) => {
            Error::LoginError(error.to_string())
        }
        _ => Error::ApiError(error.to_string()),
    }
}

/// Token response is only usable with `success` set and a non-blank `access_token`.
fn map_token_response(response: TokenResponse) -> Result<Token, Error> {
    if !response.status.success {
        return Err(Error::LoginError(response.status.describe()));
    }

    match response.access_token {
        Some(token) if !token.trim().is_empty() => Ok(Token(token)),
        _ => Err(Error::InvalidResponse(
            format!("{:?}", response.status),
            String::from("missing access_token"),
        )),
    }
}

/// Process body of valid HTTP response (2xx) to identify API-level refusal indicated with
/// non-true `success`.
fn map_response_status(data: CurrentData) -> Telemetry {
    if data.status.success {
        if let Some(state) = data.device_state {
            log::info!(
                "Device {} is {} (sampled at {})",
                data.device_sn.as_deref().unwrap_or("?"),
                state,
                data.collection_time
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "unknown time".to_string())
            );
        }
        Telemetry::Reading(data.power())
    } else {
        log::warn!("Telemetry request refused: {}", data.status.describe());
        Telemetry::Rejected {
            code: data.status.code(),
            message: data.status.msg,
        }
    }
}

fn parse<T: DeserializeOwned>(endpoint: &endpoint::Endpoint, text: String) -> Result<T, Error> {
    log::trace!("endpoint: {}, response_text: {}", endpoint, text);

    serde_json::from_str::<T>(&text).map_err(|e| Error::InvalidResponse(text, e.to_string()))
}

impl Client {
    async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &endpoint::Endpoint,
        query: &[(&str, &str)],
        body: &B,
        token: Option<&Token>,
    ) -> Result<reqwest::Response, Error> {
        let url = format!("{}{}", self.api.api_url, endpoint);

        let request = self.client.post(url).json(body);
        let request = if query.is_empty() {
            request
        } else {
            request.query(query)
        };
        let request = match token {
            Some(token) => request.header(
                http::header::AUTHORIZATION,
                format!("bearer {}", token.as_str()),
            ),
            None => request,
        };

        request.send().await.map_err(map_api_err)
    }
}

async fn read_text(response: reqwest::Response) -> Result<String, Error> {
    response
        .error_for_status()
        .map_err(map_api_err)?
        .text()
        .await
        .map_err(|e| Error::ApiError(format!("Error reading API response: {}", e)))
}

#[async_trait]
impl SolarmanApi for Client {
    async fn authenticate(&self) -> Result<Token, Error> {
        let credentials = &self.api.credentials;
        let request_body = HashMap::from([
            ("password", credentials.password.as_str()),
            ("appSecret", credentials.app_secret.as_str()),
            ("email", credentials.email.as_str()),
        ]);

        log::debug!("Requesting token for application {}", credentials.app_id);

        let response = self
            .post(
                endpoint::TOKEN,
                &[("appId", credentials.app_id.as_str())],
                &request_body,
                None,
            )
            .await?;

        read_text(response)
            .await
            .and_then(|text| parse::<TokenResponse>(endpoint::TOKEN, text))
            .and_then(map_token_response)
    }

    async fn fetch_power(&self, token: &Token, device_sn: &str) -> Result<Telemetry, Error> {
        let request_body = HashMap::from([("deviceSn", device_sn)]);

        let response = self
            .post(endpoint::CURRENT_DATA, &[], &request_body, Some(token))
            .await?;

        /* A stale bearer token is refused at HTTP level by some API gateways */
        let status = response.status();
        if status == http::StatusCode::UNAUTHORIZED || status == http::StatusCode::FORBIDDEN {
            log::warn!("Telemetry request refused with HTTP {}", status);
            return Ok(Telemetry::Rejected {
                code: Some(status.as_u16().to_string()),
                message: status.canonical_reason().map(String::from),
            });
        }

        read_text(response)
            .await
            .and_then(|text| parse::<CurrentData>(endpoint::CURRENT_DATA, text))
            .map(map_response_status)
    }
}
