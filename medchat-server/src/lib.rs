//! `medchat-server` answers medical questions over HTTP.
//! `POST /chat` runs the retrieval pipeline; `GET /health` reports liveness.

pub mod config;
pub mod error;
pub mod protocol;
pub mod providers;
pub mod server;

pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use providers::build_pipeline;
pub use server::{AppState, MAX_BODY_BYTES, ServerConfig, app_router, run_server};
