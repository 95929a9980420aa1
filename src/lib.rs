pub mod config;
pub mod constants;
pub mod context;
pub mod core_cli;
pub mod core_error;
pub mod core_fs;
pub mod core_ftpcommand;
pub mod core_network;
pub mod core_session;
pub mod core_transfer;
pub mod helpers;
pub mod server;
pub mod worker_pool;

pub use config::{Config, ServerConfig};
pub use server::Server;
