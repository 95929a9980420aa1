use crate::constants::{CONTROL_READ_SIZE, MAX_CONTROL_LINE};
use crate::context::ServerContext;
use crate::core_ftpcommand::reply::Reply;
use crate::core_network::framing::{Frame, LineFramer};
use crate::core_session::{Session, WorkItem};
use crate::worker_pool::PoolHandle;
use log::{debug, error, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};

/// Accepts control connections and turns their bytes into work for the pool.
///
/// Nothing here runs command logic: the accept loop registers a session, and
/// the per-connection reader only frames lines and submits them. Passive
/// listeners are driven by `pasv::accept_pasv_connection` on the same runtime.
pub struct Reactor {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    pool: PoolHandle,
}

impl Reactor {
    pub fn new(listener: TcpListener, ctx: Arc<ServerContext>, pool: PoolHandle) -> Self {
        Self {
            listener,
            ctx,
            pool,
        }
    }

    /// Runs until `shutdown` resolves. The control listener is closed on return.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopped accepting control connections");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, addr)) => self.open_session(socket, addr),
                    Err(e) => error!("Failed to accept control connection: {}", e),
                }
            }
        }
    }

    fn open_session(&self, socket: TcpStream, addr: SocketAddr) {
        let id = self.ctx.registry.next_session_id();
        let (reader, writer) = socket.into_split();
        let session = Arc::new(Session::new(
            id,
            addr,
            self.ctx.paths.root().to_path_buf(),
            writer,
        ));
        self.ctx.registry.insert(Arc::clone(&session));
        info!("New connection from {} (session {})", addr, id);

        tokio::spawn(watch_control_connection(
            session,
            reader,
            Arc::clone(&self.ctx),
            self.pool.clone(),
        ));
    }
}

/// Greets the client, then reads until EOF, error, protocol violation or
/// session close. Always ends by queueing the teardown behind any pending
/// commands.
async fn watch_control_connection(
    session: Arc<Session>,
    mut reader: OwnedReadHalf,
    ctx: Arc<ServerContext>,
    pool: PoolHandle,
) {
    let greeting = Reply::new(220, ctx.greeting.as_str());
    match session.send_reply(&greeting).await {
        Ok(()) => read_commands(&session, &mut reader, &pool).await,
        Err(e) => warn!("Session {}: failed to send greeting: {}", session.id(), e),
    }

    session.begin_close();
    drop(reader);
    pool.submit(&session, WorkItem::Teardown);
}

async fn read_commands(session: &Session, reader: &mut OwnedReadHalf, pool: &PoolHandle) {
    let mut framer = LineFramer::new(MAX_CONTROL_LINE);
    let mut buffer = vec![0; CONTROL_READ_SIZE];
    loop {
        tokio::select! {
            _ = session.closed() => {
                debug!("Session {}: stopped reading control connection", session.id());
                return;
            }
            read = reader.read(&mut buffer) => match read {
                Ok(0) => {
                    info!("Session {}: client disconnected", session.id());
                    return;
                }
                Ok(n) => match framer.push(&buffer[..n]) {
                    Ok(frames) => {
                        for frame in frames {
                            let item = match frame {
                                Frame::Command(line) => WorkItem::Line(line),
                                Frame::Invalid => WorkItem::Invalid,
                            };
                            pool.submit(session, item);
                        }
                    }
                    Err(e) => {
                        warn!("Session {}: protocol violation: {}", session.id(), e);
                        return;
                    }
                },
                Err(e) => {
                    warn!("Session {}: control connection error: {}", session.id(), e);
                    return;
                }
            }
        }
    }
}
