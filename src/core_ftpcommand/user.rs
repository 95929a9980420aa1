use crate::core_error::FtpError;
use crate::core_ftpcommand::ftpcommand::ParsedCommand;
use crate::core_ftpcommand::reply::Reply;
use crate::core_session::Session;
use log::info;

/// Handles the USER FTP command. No account lookup is made.
pub fn handle_user_command(session: &Session, parsed: &ParsedCommand) -> Result<Reply, FtpError> {
    info!(
        "Session {}: USER {}",
        session.id(),
        parsed.first_arg().unwrap_or("<none>")
    );
    Ok(Reply::new(331, "Please specify the password"))
}
