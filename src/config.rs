use crate::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_DATA_CONNECT_TIMEOUT_MS, DEFAULT_GREETING, DEFAULT_LISTEN_PORT,
    DEFAULT_PASV_ADDRESS, DEFAULT_ROOT_DIR, DEFAULT_WORKER_THREADS,
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_pasv_address")]
    pub pasv_address: String, // Advertised in the 227 reply, and bound by passive listeners
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    pub upload_buffer_size: Option<usize>, // Optional to allow default value
    pub download_buffer_size: Option<usize>, // Optional to allow default value
    pub data_connect_timeout_ms: Option<u64>,
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

fn default_pasv_address() -> String {
    DEFAULT_PASV_ADDRESS.to_string()
}

fn default_root_dir() -> String {
    DEFAULT_ROOT_DIR.to_string()
}

fn default_worker_threads() -> usize {
    DEFAULT_WORKER_THREADS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            pasv_address: default_pasv_address(),
            root_dir: default_root_dir(),
            worker_threads: DEFAULT_WORKER_THREADS,
            upload_buffer_size: Some(DEFAULT_BUFFER_SIZE),
            download_buffer_size: Some(DEFAULT_BUFFER_SIZE),
            data_connect_timeout_ms: Some(DEFAULT_DATA_CONNECT_TIMEOUT_MS),
            greeting: Some(DEFAULT_GREETING.to_string()),
        }
    }
}

impl ServerConfig {
    pub fn pasv_ip(&self) -> Result<Ipv4Addr> {
        self.pasv_address
            .parse()
            .with_context(|| format!("pasv_address must be an IPv4 address: {}", self.pasv_address))
    }

    pub fn upload_buffer_size(&self) -> usize {
        self.upload_buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE)
    }

    pub fn download_buffer_size(&self) -> usize {
        self.download_buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE)
    }

    pub fn data_connect_timeout(&self) -> Duration {
        Duration::from_millis(
            self.data_connect_timeout_ms
                .unwrap_or(DEFAULT_DATA_CONNECT_TIMEOUT_MS),
        )
    }

    pub fn greeting(&self) -> &str {
        self.greeting.as_deref().unwrap_or(DEFAULT_GREETING)
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;

        // Set defaults if not specified
        if config.server.upload_buffer_size.is_none() {
            config.server.upload_buffer_size = Some(DEFAULT_BUFFER_SIZE);
        }
        if config.server.download_buffer_size.is_none() {
            config.server.download_buffer_size = Some(DEFAULT_BUFFER_SIZE);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.server.pasv_ip()?;
        if self.server.worker_threads == 0 {
            bail!("worker_threads must be at least 1");
        }
        if self.server.upload_buffer_size() == 0 || self.server.download_buffer_size() == 0 {
            bail!("transfer buffer sizes must be non-zero");
        }
        Ok(())
    }
}
