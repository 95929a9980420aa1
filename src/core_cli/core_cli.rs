use crate::config::Config;
use anyhow::Result;
use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "pasvftpd", about = "A passive-mode FTP server written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the control port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the served root directory
    #[arg(short, long)]
    pub root: Option<String>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Loads the configuration file (or defaults) and applies the overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)?,
            None => Config::default(),
        };
        if let Some(port) = self.port {
            config.server.listen_port = port;
        }
        if let Some(root) = &self.root {
            config.server.root_dir = root.clone();
        }
        config.validate()?;
        Ok(config)
    }
}
