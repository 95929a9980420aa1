use crate::config::Config;
use crate::constants::SHUTDOWN_DRAIN_MS;
use crate::context::ServerContext;
use crate::core_network::Reactor;
use crate::core_session::SessionRegistry;
use crate::helpers::log_config;
use crate::worker_pool::WorkerPool;
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

/// A bound, not yet running, server.
pub struct Server {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    worker_threads: usize,
}

impl Server {
    /// Validates the configuration, prepares the root and binds the control port.
    pub async fn bind(config: &Config) -> Result<Self> {
        config.validate()?;
        log_config(config);

        let ctx = ServerContext::from_config(&config.server)?;
        let listener = TcpListener::bind(("0.0.0.0", config.server.listen_port))
            .await
            .with_context(|| {
                format!("Failed to bind control port {}", config.server.listen_port)
            })?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            ctx: Arc::new(ctx),
            worker_threads: config.server.worker_threads,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.ctx.registry)
    }

    /// Serves until `shutdown` resolves, then stops accepting and drains:
    /// every live session is closed and torn down before the workers stop.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let grace = Duration::from_millis(SHUTDOWN_DRAIN_MS);
        let pool = WorkerPool::spawn(self.worker_threads, Arc::clone(&self.ctx));
        let reactor = Reactor::new(self.listener, Arc::clone(&self.ctx), pool.handle());

        reactor.run(shutdown).await;
        drain_sessions(&self.ctx, grace).await;
        pool.join(grace).await;

        info!("Server stopped");
        Ok(())
    }
}

async fn drain_sessions(ctx: &ServerContext, grace: Duration) {
    let sessions = ctx.registry.sessions();
    info!("Closing {} live session(s)", sessions.len());
    for session in &sessions {
        session.begin_close();
    }
    drop(sessions);

    let deadline = Instant::now() + grace;
    while ctx.registry.session_count() > 0 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let remaining = ctx.registry.session_count();
    if remaining > 0 {
        warn!("{} session(s) still open after shutdown grace period", remaining);
    }
}

/// Runs the FTP server with the provided configuration until Ctrl+C.
pub async fn run(config: Config) -> Result<()> {
    let server = Server::bind(&config).await?;
    server
        .run(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
}
