use crate::core_error::FtpError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_session::Session;
use log::info;

/// Handles the QUIT FTP command.
///
/// The returned reply is marked as closing: the session stops reading once it
/// has been flushed, and the reactor schedules the teardown.
pub fn handle_quit_command(session: &Session) -> Result<Reply, FtpError> {
    info!("Session {}: received QUIT, closing connection", session.id());
    Ok(Reply::closing(221, "Goodbye"))
}
