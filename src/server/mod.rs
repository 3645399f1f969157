//! HTTP API for the collection service

mod auth;
mod handlers;
mod routes;
mod server;
mod types;

pub use auth::AuthState;
pub use handlers::AppState;
pub use routes::create_router;
pub use server::HttpServer;
pub use types::*;
