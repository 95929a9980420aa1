use anyhow::Result;
use chrono::Local;
use clap::Parser;
use env_logger::{Builder, Env};
use pasvftpd::core_cli::Cli;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    let config = args.load_config()?;

    // Run the FTP server
    pasvftpd::server::run(config).await
}
