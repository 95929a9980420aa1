// Error taxonomy for command processing
use crate::core_ftpcommand::reply::Reply;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FtpError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Path escapes the server root: {0}")]
    PathEscape(String),

    #[error("No data channel, PASV required")]
    NoDataChannel,

    #[error("Data channel error: {0}")]
    DataChannel(String),

    #[error("Timed out waiting for the data connection")]
    DataChannelTimeout,

    #[error("Data channel cancelled by session teardown")]
    Cancelled,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to create file: {0}")]
    FileCreate(String),

    #[error("Failed to list directory: {0}")]
    DirectoryUnavailable(String),

    #[error("Transfer I/O error: {0}")]
    TransferIo(String),

    #[error("Control connection lost: {0}")]
    ConnectionLost(String),
}

impl FtpError {
    /// Reply sent on the control connection when a command fails with this error.
    pub fn to_reply(&self) -> Reply {
        match self {
            FtpError::UnknownCommand(_) => Reply::new(500, "Unknown command"),
            FtpError::Syntax(_) => Reply::new(501, "Syntax error in parameters or arguments"),
            FtpError::PathEscape(_) => Reply::new(550, "Path is outside of the allowed area"),
            FtpError::NoDataChannel => Reply::new(425, "Use PASV first"),
            FtpError::DataChannel(_) => Reply::new(425, "Can't open data connection"),
            FtpError::DataChannelTimeout => Reply::new(425, "Data connection timeout"),
            FtpError::FileNotFound(_) => Reply::new(550, "File not found"),
            FtpError::FileCreate(_) => Reply::new(550, "Can't create file"),
            FtpError::DirectoryUnavailable(_) => Reply::new(550, "Failed to list directory"),
            FtpError::Cancelled | FtpError::TransferIo(_) | FtpError::ConnectionLost(_) => {
                Reply::new(426, "Connection closed; transfer aborted")
            }
        }
    }

    /// True for failures that end the session instead of producing a reply.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FtpError::ConnectionLost(_))
    }
}
