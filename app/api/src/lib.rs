pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resolve;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use state::AppState;
