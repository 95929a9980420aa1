// src/constants.rs

pub const DEFAULT_LISTEN_PORT: u16 = 2100;
pub const DEFAULT_PASV_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_ROOT_DIR: &str = "/tmp/ftproot";
pub const DEFAULT_WORKER_THREADS: usize = 4;
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_DATA_CONNECT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_GREETING: &str = "Welcome to pasvftpd";

/// Longest control line accepted before the connection is dropped.
pub const MAX_CONTROL_LINE: usize = 4096;
/// Read size for the control connection.
pub const CONTROL_READ_SIZE: usize = 1024;
/// Upper bound on waiting for live sessions to close during shutdown.
pub const SHUTDOWN_DRAIN_MS: u64 = 10_000;
