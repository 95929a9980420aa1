use crate::context::ServerContext;
use crate::core_error::FtpError;
use crate::core_ftpcommand::ftpcommand::{FtpCommand, ParsedCommand};
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::{list, pass, quit, retr, stor, user};
use crate::core_network::pasv;
use crate::core_session::Session;
use log::{debug, warn};

/// Parses `raw` and runs it against `session`, the one instance owning the
/// connection.
///
/// Every non-fatal error is turned into its reply here, so a bad command
/// never ends the connection. `Err` is reserved for a lost control connection.
pub async fn dispatch(
    ctx: &ServerContext,
    session: &Session,
    raw: &str,
) -> Result<Reply, FtpError> {
    let parsed = match ParsedCommand::parse(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Session {}: {}", session.id(), e);
            return Ok(e.to_reply());
        }
    };

    let result = match parsed.command {
        FtpCommand::USER => user::handle_user_command(session, &parsed),
        FtpCommand::PASS => pass::handle_pass_command(session, &parsed),
        FtpCommand::QUIT => quit::handle_quit_command(session),
        FtpCommand::PASV => pasv::handle_pasv_command(ctx, session).await,
        FtpCommand::LIST => list::handle_list_command(ctx, session).await,
        FtpCommand::RETR => retr::handle_retr_command(ctx, session, &parsed).await,
        FtpCommand::STOR => stor::handle_stor_command(ctx, session, &parsed).await,
    };

    match result {
        Ok(reply) => Ok(reply),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(
                "Session {}: error handling command {:?}: {}",
                session.id(),
                parsed.command,
                e
            );
            Ok(e.to_reply())
        }
    }
}
