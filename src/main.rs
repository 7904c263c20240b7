//! Hookstore - Entry Point
//!
//! Reads one JSON payload from standard input, validates it against the
//! configured policy, and persists it under the storage root. Prints the
//! absolute path of the written file on success.

use std::io::Read;

use log::{error, info};

use hookstore::error::HookstoreError;
use hookstore::{AppConfig, Payload, store, validation};

fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match store::check_capacity(&config) {
        Ok(available) => info!(
            "Storage ready at {} ({} bytes available)",
            config.storage.storage_root, available
        ),
        Err(e) => {
            error!("Storage capacity check failed: {}", e);
            std::process::exit(1);
        }
    }

    let mut input = Vec::new();
    if let Err(e) = std::io::stdin().read_to_end(&mut input) {
        error!("Failed to read payload from stdin: {}", e);
        std::process::exit(1);
    }

    match run(&config, &input) {
        Ok(path) => println!("{}", path),
        Err(e) => {
            error!("Rejected payload: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(config: &AppConfig, input: &[u8]) -> Result<String, HookstoreError> {
    let mut payload = Payload::from_json_bytes(input)?;
    validation::validate(&payload, &config.policy)?;
    let result = store::persist(&mut payload, config)?;
    info!("Accepted payload {}", payload.log_summary());
    Ok(result.path.display().to_string())
}
