//! HTTP surface for chirp
//!
//! Translates the auth and social services into a JSON API: the route
//! table, the error envelope, and server assembly with CORS, tracing and
//! body limits.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ServerConfig, ServerConfigError};
pub use error::{init_error_mode, ApiError};
pub use routes::build_router;
pub use server::{build_app, serve};
pub use state::AppState;
