use crate::context::ServerContext;
use crate::core_error::FtpError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_session::registry::{ListenerId, SessionRegistry};
use crate::core_session::Session;
use log::{debug, error, info, trace};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Sets up a passive mode (PASV) listener for `session`.
///
/// Any previous listener or peer of the session is torn down first, under the
/// session lock, so a session never has two live listeners.
pub async fn handle_pasv_command(ctx: &ServerContext, session: &Session) -> Result<Reply, FtpError> {
    let mut channel = session.data_channel().lock().await;
    if let Some(previous) = channel.listener_id() {
        debug!(
            "Session {}: PASV supersedes data channel {}",
            session.id(),
            previous
        );
    }
    channel.reset(&ctx.registry);

    let (listener, port) = setup_pasv_listener(ctx.pasv_ip)
        .await
        .map_err(|e| FtpError::DataChannel(e.to_string()))?;

    // Route before spawning so the accept task always finds its owner.
    let listener_id = ctx.registry.register_listener(session.id());
    let accept_task = tokio::spawn(accept_pasv_connection(
        listener,
        listener_id,
        Arc::clone(&ctx.registry),
    ));
    channel.start_listening(listener_id, port, accept_task.abort_handle());

    Ok(pasv_reply(ctx.pasv_ip, port))
}

/// Binds an ephemeral port on the advertised address.
pub async fn setup_pasv_listener(pasv_ip: Ipv4Addr) -> std::io::Result<(TcpListener, u16)> {
    let listener = TcpListener::bind((pasv_ip, 0)).await?;
    let port = listener.local_addr()?.port();
    debug!("PASV listener set up on IP: {}, Port: {}", pasv_ip, port);
    Ok((listener, port))
}

/// `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`
pub fn pasv_reply(pasv_ip: Ipv4Addr, port: u16) -> Reply {
    let [h1, h2, h3, h4] = pasv_ip.octets();
    Reply::new(
        227,
        format!(
            "Entering Passive Mode ({},{},{},{},{},{})",
            h1,
            h2,
            h3,
            h4,
            port >> 8,
            port & 0xFF
        ),
    )
}

/// Reactor side of a passive listener: accepts exactly one peer, closes the
/// listener, and hands the peer to whichever session still owns the route.
pub async fn accept_pasv_connection(
    listener: TcpListener,
    listener_id: ListenerId,
    registry: Arc<SessionRegistry>,
) {
    let accepted = listener.accept().await;
    drop(listener);

    let Some(owner) = registry.remove_listener(listener_id) else {
        trace!("Listener {} no longer routed, dropping", listener_id);
        return;
    };
    let Some(session) = registry.get(owner) else {
        trace!("Session {} gone before its data connection", owner);
        return;
    };

    match accepted {
        Ok((peer, addr)) => {
            info!("Session {}: accepted data connection from {}", owner, addr);
            session.attach_data_peer(listener_id, peer).await;
        }
        Err(e) => {
            error!("Failed to accept data connection: {}", e);
            session.abandon_data_listener(listener_id).await;
        }
    }
}

/// Connects to the address advertised in a 227 reply.
pub async fn connect_pasv(reply_text: &str) -> std::io::Result<TcpStream> {
    let invalid = || std::io::Error::new(std::io::ErrorKind::InvalidData, "malformed 227 reply");
    let start = reply_text.find('(').ok_or_else(invalid)?;
    let end = reply_text[start..].find(')').ok_or_else(invalid)? + start;
    let fields: Vec<u8> = reply_text[start + 1..end]
        .split(',')
        .map(|field| field.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;
    let [h1, h2, h3, h4, p1, p2] = fields[..] else {
        return Err(invalid());
    };
    let port = (p1 as u16) << 8 | p2 as u16;
    TcpStream::connect((Ipv4Addr::new(h1, h2, h3, h4), port)).await
}
