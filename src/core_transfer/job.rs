use crate::core_error::FtpError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_transfer::TransferEngine;
use log::{debug, error};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
}

/// What a data command asked for, before anything is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRequest {
    List(PathBuf),
    Retrieve(PathBuf),
    Store(PathBuf),
}

/// An opened source or sink for exactly one LIST/RETR/STOR.
#[derive(Debug)]
pub enum TransferJob {
    Listing(Vec<u8>),
    Download(File),
    Upload(File),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    pub direction: Direction,
    pub bytes: u64,
}

impl JobRequest {
    pub fn path(&self) -> &Path {
        match self {
            JobRequest::List(path) | JobRequest::Retrieve(path) | JobRequest::Store(path) => path,
        }
    }

    /// Opens the file or renders the listing.
    pub async fn open(&self) -> Result<TransferJob, FtpError> {
        match self {
            JobRequest::List(dir) => render_listing(dir).await.map(TransferJob::Listing),
            JobRequest::Retrieve(path) => match File::open(path).await {
                Ok(file) if is_regular_file(&file).await => Ok(TransferJob::Download(file)),
                Ok(_) => Err(FtpError::FileNotFound(path.display().to_string())),
                Err(e) => {
                    error!("File not found or could not be opened: {:?}, error: {}", path, e);
                    Err(FtpError::FileNotFound(path.display().to_string()))
                }
            },
            // Truncated in `run`, once a peer is attached.
            JobRequest::Store(path) => match open_for_upload(path).await {
                Ok(file) => Ok(TransferJob::Upload(file)),
                Err(e) => {
                    error!("Failed to create file: {:?}, error: {}", path, e);
                    Err(FtpError::FileCreate(path.display().to_string()))
                }
            },
        }
    }
}

async fn open_for_upload(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create(true).open(path).await
}

async fn is_regular_file(file: &File) -> bool {
    file.metadata().await.map(|m| m.is_file()).unwrap_or(false)
}

/// One directory level, entry names only, CRLF separated. Order is whatever
/// the filesystem yields; `read_dir` never reports `.` or `..`.
pub async fn render_listing(dir: &Path) -> Result<Vec<u8>, FtpError> {
    let unavailable = |e: std::io::Error| {
        error!("Failed to read directory {:?}: {}", dir, e);
        FtpError::DirectoryUnavailable(dir.display().to_string())
    };
    let mut entries = fs::read_dir(dir).await.map_err(unavailable)?;
    let mut listing = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
        listing.extend_from_slice(entry.file_name().to_string_lossy().as_bytes());
        listing.extend_from_slice(b"\r\n");
    }
    debug!("Rendered listing of {:?}: {} bytes", dir, listing.len());
    Ok(listing)
}

impl TransferJob {
    pub fn direction(&self) -> Direction {
        match self {
            TransferJob::Listing(_) | TransferJob::Download(_) => Direction::Send,
            TransferJob::Upload(_) => Direction::Receive,
        }
    }

    /// The 150 reply sent just before bytes move.
    pub fn opening_reply(&self) -> Reply {
        match self {
            TransferJob::Listing(_) => Reply::new(150, "Here comes the directory listing"),
            TransferJob::Download(_) => Reply::new(150, "Opening binary mode data connection"),
            TransferJob::Upload(_) => Reply::new(150, "Ready to receive data"),
        }
    }

    pub async fn run<P>(self, peer: &mut P, engine: &TransferEngine) -> Result<TransferReport, FtpError>
    where
        P: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let direction = self.direction();
        let bytes = match self {
            TransferJob::Listing(listing) => engine.send(&mut listing.as_slice(), peer).await?,
            TransferJob::Download(mut file) => engine.send(&mut file, peer).await?,
            TransferJob::Upload(mut file) => {
                file.set_len(0)
                    .await
                    .map_err(|e| FtpError::TransferIo(e.to_string()))?;
                engine.receive(peer, &mut file).await?
            }
        };
        Ok(TransferReport { direction, bytes })
    }
}

impl TransferReport {
    /// The 226 reply, carrying the byte count.
    pub fn completion_reply(&self, listing: bool) -> Reply {
        if listing {
            Reply::new(226, format!("Directory send OK ({} bytes)", self.bytes))
        } else {
            Reply::new(226, format!("Transfer complete ({} bytes)", self.bytes))
        }
    }
}
