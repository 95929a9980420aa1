use crate::core_error::FtpError;
use log::{debug, error};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Chunked byte copy between a data peer and a source or sink.
#[derive(Debug, Clone, Copy)]
pub struct TransferEngine {
    download_chunk: usize,
    upload_chunk: usize,
}

impl TransferEngine {
    pub fn new(download_chunk: usize, upload_chunk: usize) -> Self {
        Self {
            download_chunk: download_chunk.max(1),
            upload_chunk: upload_chunk.max(1),
        }
    }

    /// Server -> client. The peer is shut down once the source is exhausted.
    pub async fn send<R, W>(&self, source: &mut R, peer: &mut W) -> Result<u64, FtpError>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut buffer = vec![0; self.download_chunk];
        let mut total: u64 = 0;
        loop {
            let bytes_read = match source.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    error!("Error reading transfer source: {}", e);
                    return Err(FtpError::TransferIo(e.to_string()));
                }
            };
            if let Err(e) = peer.write_all(&buffer[..bytes_read]).await {
                error!("Error sending data to client: {}", e);
                return Err(FtpError::TransferIo(e.to_string()));
            }
            total += bytes_read as u64;
        }

        peer.flush()
            .await
            .map_err(|e| FtpError::TransferIo(e.to_string()))?;
        if let Err(e) = peer.shutdown().await {
            debug!("Data peer shutdown after send: {}", e);
        }
        Ok(total)
    }

    /// Client -> server, until the peer reaches EOF. Already-written bytes are
    /// left in the sink on failure.
    pub async fn receive<R, W>(&self, peer: &mut R, sink: &mut W) -> Result<u64, FtpError>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut buffer = vec![0; self.upload_chunk];
        let mut total: u64 = 0;
        loop {
            let bytes_read = match peer.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    error!("Error reading from data stream: {}", e);
                    return Err(FtpError::TransferIo(e.to_string()));
                }
            };
            if let Err(e) = sink.write_all(&buffer[..bytes_read]).await {
                error!("Error writing to file: {}", e);
                return Err(FtpError::TransferIo(e.to_string()));
            }
            total += bytes_read as u64;
        }

        sink.flush()
            .await
            .map_err(|e| FtpError::TransferIo(e.to_string()))?;
        Ok(total)
    }
}
