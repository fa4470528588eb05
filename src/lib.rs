pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod models;
pub mod reference;
pub mod service;
pub mod stream;
pub mod synth;
pub mod table;
pub mod transport;

pub use crate::config::Config;
pub use crate::error::{PriceAgentError, Result};
pub use crate::service::PriceAgentService;

/// Install the stderr fmt subscriber shared by all binaries. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}
