//! snapvault server entry point.
//!
//! Minimal by design: read configuration, delegate to `api::serve`, print
//! errors to stderr, exit non-zero on failure.

use snapvault::api::{serve, ServerConfig};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = serve(config).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
