pub mod config;
mod http_layers;
pub mod metrics;
mod roles_routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::run_server;
