use crate::context::ServerContext;
use crate::core_error::FtpError;
use crate::core_ftpcommand::handlers::dispatch;
use crate::core_ftpcommand::reply::Reply;
use crate::core_network::data_channel::{ChannelPhase, DataChannel};
use crate::core_session::mailbox::{Mailbox, WorkItem};
use crate::core_session::registry::{ListenerId, SessionId};
use crate::core_transfer::JobRequest;
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::time::Instant;

pub type ControlWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// State of one control connection, created once at accept and torn down once.
pub struct Session {
    id: SessionId,
    peer_addr: SocketAddr,
    current_dir: PathBuf,
    control: Mutex<ControlWriter>,
    // The session lock: every DataChannel transition goes through it.
    data: Mutex<DataChannel>,
    closing: watch::Sender<bool>,
    mailbox: Mailbox,
    torn_down: AtomicBool,
}

impl Session {
    pub fn new(
        id: SessionId,
        peer_addr: SocketAddr,
        current_dir: PathBuf,
        control: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        let (closing, _) = watch::channel(false);
        Self {
            id,
            peer_addr,
            current_dir,
            control: Mutex::new(Box::new(control)),
            data: Mutex::new(DataChannel::new()),
            closing,
            mailbox: Mailbox::new(),
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn data_channel(&self) -> &Mutex<DataChannel> {
        &self.data
    }

    pub async fn data_phase(&self) -> ChannelPhase {
        self.data.lock().await.phase()
    }

    pub async fn send_reply(&self, reply: &Reply) -> Result<(), FtpError> {
        let mut control = self.control.lock().await;
        control
            .write_all(&reply.to_wire())
            .await
            .map_err(|e| FtpError::ConnectionLost(e.to_string()))?;
        control
            .flush()
            .await
            .map_err(|e| FtpError::ConnectionLost(e.to_string()))?;
        debug!("Session {} -> {}", self.id, reply);
        Ok(())
    }

    /// Runs one command line. Non-fatal failures come back as error replies;
    /// `Err` means the control connection is gone.
    pub async fn handle_line(&self, ctx: &ServerContext, raw: &str) -> Result<Reply, FtpError> {
        dispatch(ctx, self, raw).await
    }

    /// Works through the mailbox until it is empty. Called by exactly one
    /// worker at a time.
    pub async fn drain(&self, ctx: &ServerContext) {
        while let Some(item) = self.mailbox.next() {
            match item {
                WorkItem::Line(line) => self.execute(ctx, &line).await,
                WorkItem::Invalid => self.reject_invalid().await,
                WorkItem::Teardown => self.teardown(ctx).await,
            }
        }
    }

    async fn execute(&self, ctx: &ServerContext, line: &str) {
        if self.is_closing() {
            debug!("Session {} closing, dropped command: {}", self.id, redact(line));
            return;
        }
        debug!("Session {} received command: {}", self.id, redact(line));

        let reply = match self.handle_line(ctx, line).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Session {}: {}", self.id, e);
                self.begin_close();
                return;
            }
        };
        self.respond(&reply).await;
    }

    async fn reject_invalid(&self) {
        if self.is_closing() {
            return;
        }
        let e = FtpError::Syntax("command line is not valid UTF-8".to_string());
        warn!("Session {}: {}", self.id, e);
        self.respond(&e.to_reply()).await;
    }

    async fn respond(&self, reply: &Reply) {
        match self.send_reply(reply).await {
            Ok(()) if reply.closes_session() => self.begin_close(),
            Ok(()) => {}
            Err(e) => {
                warn!("Session {}: failed to send reply: {}", self.id, e);
                self.begin_close();
            }
        }
    }

    /// Stops the reactor reading this connection and wakes any worker waiting
    /// on the data channel.
    pub fn begin_close(&self) {
        self.closing.send_replace(true);
    }

    pub fn is_closing(&self) -> bool {
        *self.closing.borrow()
    }

    pub fn subscribe_closing(&self) -> watch::Receiver<bool> {
        self.closing.subscribe()
    }

    /// Resolves once `begin_close` has been called.
    pub async fn closed(&self) {
        let mut closing = self.subscribe_closing();
        watch_until(&mut closing, |closed| closed).await;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Reactor side: a passive peer was accepted on `listener_id`.
    pub async fn attach_data_peer(&self, listener_id: ListenerId, peer: TcpStream) {
        let mut channel = self.data.lock().await;
        match channel.attach_peer(listener_id, peer) {
            Ok(()) => debug!("Session {}: data connection established", self.id),
            Err(stale) => {
                debug!(
                    "Session {}: dropping peer for superseded listener {}",
                    self.id, listener_id
                );
                drop(stale);
            }
        }
    }

    /// Reactor side: accept failed on `listener_id`.
    pub async fn abandon_data_listener(&self, listener_id: ListenerId) {
        let mut channel = self.data.lock().await;
        if channel.abandon_listener(listener_id) {
            debug!("Session {}: passive listener {} abandoned", self.id, listener_id);
        }
    }

    /// LIST/RETR/STOR: opens the source or sink, waits for the passive peer,
    /// moves the bytes and returns the channel to Idle on every path.
    pub async fn run_transfer(
        &self,
        ctx: &ServerContext,
        request: JobRequest,
    ) -> Result<Reply, FtpError> {
        let mut channel = self.data.lock().await;
        if channel.phase() == ChannelPhase::Idle {
            return Err(FtpError::NoDataChannel);
        }

        let job = match request.open().await {
            Ok(job) => job,
            Err(e) => {
                channel.reset(&ctx.registry);
                return Err(e);
            }
        };

        let (mut channel, peer) = self.wait_for_peer(channel, ctx).await;
        let mut peer = peer?;

        if let Err(e) = self.send_reply(&job.opening_reply()).await {
            channel.reset(&ctx.registry);
            return Err(e);
        }

        let result = tokio::select! {
            result = job.run(&mut peer, &ctx.engine) => result,
            _ = self.closed() => {
                warn!("Session {}: control connection closed mid-transfer", self.id);
                Err(FtpError::Cancelled)
            }
        };
        drop(peer);
        channel.reset(&ctx.registry);
        drop(channel);

        let report = result?;
        info!(
            "Session {}: {:?} {} bytes for {:?}",
            self.id,
            report.direction,
            report.bytes,
            request.path()
        );
        Ok(report.completion_reply(matches!(request, JobRequest::List(_))))
    }

    /// Blocks this worker, with the lock released, until the reactor attaches
    /// a peer, the bound elapses, or the session closes.
    async fn wait_for_peer<'a>(
        &'a self,
        mut channel: MutexGuard<'a, DataChannel>,
        ctx: &ServerContext,
    ) -> (MutexGuard<'a, DataChannel>, Result<TcpStream, FtpError>) {
        let deadline = Instant::now() + ctx.data_connect_timeout;
        loop {
            match channel.phase() {
                ChannelPhase::Connected => {
                    let peer = channel
                        .take_peer()
                        .ok_or_else(|| FtpError::DataChannel("data peer missing".to_string()));
                    return (channel, peer);
                }
                ChannelPhase::Idle => {
                    let err = FtpError::DataChannel("listener closed before a peer connected".to_string());
                    return (channel, Err(err));
                }
                ChannelPhase::Listening => {}
            }

            let mut phase = channel.subscribe();
            drop(channel);

            let outcome = tokio::time::timeout_at(deadline, async {
                tokio::select! {
                    settled = watch_until(&mut phase, |p| p != ChannelPhase::Listening) => settled,
                    _ = self.closed() => false,
                }
            })
            .await;

            channel = self.data.lock().await;
            match outcome {
                Ok(true) => continue,
                Ok(false) => {
                    channel.reset(&ctx.registry);
                    return (channel, Err(FtpError::Cancelled));
                }
                Err(_) => {
                    warn!("Session {}: timed out waiting for data connection", self.id);
                    channel.reset(&ctx.registry);
                    return (channel, Err(FtpError::DataChannelTimeout));
                }
            }
        }
    }

    /// Releases the data channel, closes the control writer and drops the
    /// registry entry. Runs once; later calls are no-ops.
    pub async fn teardown(&self, ctx: &ServerContext) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.begin_close();
        self.data.lock().await.reset(&ctx.registry);
        if let Err(e) = self.control.lock().await.shutdown().await {
            debug!("Session {}: control shutdown: {}", self.id, e);
        }
        ctx.registry.remove(self.id);
        info!("Connection closed for {} (session {})", self.peer_addr, self.id);
    }
}

/// Waits until `accept` holds for the published value. False if the sender is gone.
async fn watch_until<T: Copy>(rx: &mut watch::Receiver<T>, accept: impl Fn(T) -> bool) -> bool {
    loop {
        let current = *rx.borrow_and_update();
        if accept(current) {
            return true;
        }
        if rx.changed().await.is_err() {
            return false;
        }
    }
}

fn redact(line: &str) -> &str {
    let is_pass = line
        .trim_start()
        .get(..4)
        .is_some_and(|verb| verb.eq_ignore_ascii_case("PASS"));
    if is_pass {
        "PASS ****"
    } else {
        line
    }
}
