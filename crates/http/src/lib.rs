//! # bookstore-http
//!
//! The axum application: routes, controllers, request extractors, the
//! services that span several repositories, and server startup.

pub mod config;
pub mod controllers;
pub mod error;
pub mod extract;
pub mod logging;
pub mod middleware;
pub mod resources;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;

pub use config::Settings;
pub use error::{HttpError, HttpResult};
pub use logging::{init_logging, LogFormat};
pub use routes::build_router;
pub use server::start_server;
pub use state::AppState;
