#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! HTTP surface of the CrossDebate engineering backend.
//!
//! Exposes CSV uploads backed by the in-process table registry and the simulated
//! multi-agent analysis endpoint, with the CORS policy the front-end expects.

/// Layered server configuration.
#[path = "../config.rs"]
pub mod config;

/// Client-facing error mapping.
#[path = "../error.rs"]
pub mod error;

/// Shared handler state.
#[path = "../state.rs"]
pub mod state;

/// Router and handlers.
#[path = "../routes.rs"]
pub mod routes;

pub use config::{ConfigError, ServerConfig, DEFAULT_BODY_LIMIT};
pub use error::ApiError;
pub use routes::{build_router, UploadResponse};
pub use state::AppState;
