use crate::config::Config;
use log::info;

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    info!("  Listen Port: {}", config.server.listen_port);
    info!("  PASV Address: {}", config.server.pasv_address);
    info!("  Root Directory: {}", config.server.root_dir);
    info!("  Worker Threads: {}", config.server.worker_threads);
    info!(
        "  Upload Buffer Size: {} bytes",
        config.server.upload_buffer_size()
    );
    info!(
        "  Download Buffer Size: {} bytes",
        config.server.download_buffer_size()
    );
    info!(
        "  Data Connect Timeout: {} ms",
        config.server.data_connect_timeout().as_millis()
    );
}
