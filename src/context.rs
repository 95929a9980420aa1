use crate::config::ServerConfig;
use crate::core_fs::PathValidator;
use crate::core_session::SessionRegistry;
use crate::core_transfer::TransferEngine;
use anyhow::{Context, Result};
use log::info;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

/// Read-mostly state shared by the reactor and every worker.
pub struct ServerContext {
    pub registry: Arc<SessionRegistry>,
    pub paths: PathValidator,
    pub pasv_ip: Ipv4Addr,
    pub engine: TransferEngine,
    pub data_connect_timeout: Duration,
    pub greeting: String,
}

impl ServerContext {
    /// Creates the root directory if needed and canonicalizes it.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.root_dir)
            .with_context(|| format!("Failed to create root directory: {}", config.root_dir))?;
        let paths = PathValidator::new(&config.root_dir)
            .with_context(|| format!("Failed to resolve root directory: {}", config.root_dir))?;
        info!("Serving files from {:?}", paths.root());

        Ok(Self {
            registry: Arc::new(SessionRegistry::new()),
            paths,
            pasv_ip: config.pasv_ip()?,
            engine: TransferEngine::new(
                config.download_buffer_size(),
                config.upload_buffer_size(),
            ),
            data_connect_timeout: config.data_connect_timeout(),
            greeting: config.greeting().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_context(root: &std::path::Path, connect_timeout_ms: u64) -> ServerContext {
    let config = ServerConfig {
        root_dir: root.display().to_string(),
        data_connect_timeout_ms: Some(connect_timeout_ms),
        ..ServerConfig::default()
    };
    ServerContext::from_config(&config).unwrap()
}
