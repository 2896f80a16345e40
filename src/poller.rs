use crate::api::SolarmanApi;
use crate::model::{PowerReading, Telemetry, Token};
use crate::storage::Storage;
use crate::Error;

/// Single-shot poll of one device: reuse or obtain a token, read power, persist both.
pub struct Poller<A> {
    api: A,
    device_sn: String,
    storage: Storage,
}

impl<A: SolarmanApi> Poller<A> {
    pub fn new(api: A, device_sn: String, storage: Storage) -> Self {
        Poller {
            api,
            device_sn,
            storage,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    async fn token(&self) -> Result<Token, Error> {
        match self.storage.read_token() {
            Some(token) => {
                log::debug!("Reusing cached token");
                Ok(token)
            }
            None => {
                log::info!("No cached token, authenticating");
                Ok(self.api.authenticate().await?)
            }
        }
    }

    /// Fetch power with `token`; if refused, re-authenticate and try exactly once more.
    async fn fetch(&self, token: Token) -> Result<(Token, PowerReading), Error> {
        if let Telemetry::Reading(reading) = self.api.fetch_power(&token, &self.device_sn).await? {
            return Ok((token, reading));
        }

        log::info!("Token refused, re-authenticating");
        let token = self.api.authenticate().await?;

        match self.api.fetch_power(&token, &self.device_sn).await? {
            Telemetry::Reading(reading) => Ok((token, reading)),
            Telemetry::Rejected { code, message } => Err(Error::NoReading(format!(
                "device {} refused after re-authentication (code {}: {})",
                self.device_sn,
                code.as_deref().unwrap_or("none"),
                message.as_deref().unwrap_or("no message")
            ))),
        }
    }

    /// Run one poll. Files are only written once a reading is obtained.
    pub async fn run(&self) -> Result<PowerReading, Error> {
        let token = self.token().await?;
        let (token, reading) = self.fetch(token).await?;

        self.storage.write_outputs(&token, &reading)?;

        log::info!("Device {} produces {} W", self.device_sn, reading);
        Ok(reading)
    }

    /// Run one poll and append any failure to the error log.
    pub async fn run_and_record(&self) -> Result<PowerReading, Error> {
        let result = self.run().await;
        if let Err(e) = &result {
            self.storage.record_failure(e);
        }
        result
    }
}
