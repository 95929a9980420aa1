use crate::core_error::FtpError;
use crate::core_ftpcommand::ftpcommand::ParsedCommand;
use crate::core_ftpcommand::reply::Reply;
use crate::core_session::Session;
use log::debug;

/// Handles the PASS FTP command. Any password is accepted.
pub fn handle_pass_command(session: &Session, _parsed: &ParsedCommand) -> Result<Reply, FtpError> {
    debug!("Session {}: login accepted", session.id());
    Ok(Reply::new(230, "Login successful"))
}
