use solarman_poller::api;
use solarman_poller::poller::Poller;
use solarman_poller::settings;
use solarman_poller::storage::Storage;
use std::process;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let settings = settings::read_settings().unwrap_or_else(|e| {
        log::error!("Configuration error: {}", e);
        process::exit(1);
    });

    let base_dir = settings.output_dir().unwrap_or_else(|e| {
        log::error!("Unable to determine output directory: {}", e);
        process::exit(1);
    });
    let storage = Storage::new(&base_dir);

    let client = match api::client(settings.api, settings.http_timeout) {
        Ok(client) => client,
        Err(e) => {
            storage.record_failure(&solarman_poller::Error::from(e));
            return;
        }
    };

    /* Failures end up in the error log, the process itself still exits cleanly */
    let poller = Poller::new(client, settings.device_sn, storage);
    let _ = poller.run_and_record().await;
}
