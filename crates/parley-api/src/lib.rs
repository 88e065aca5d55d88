pub mod config;
pub mod error;
pub mod handlers;
pub mod hints;
pub mod middleware;
pub mod rate_limit;
pub mod router;
pub mod routes;
pub mod session;
pub mod state;
pub mod streaming;
