use crate::context::ServerContext;
use crate::core_error::FtpError;
use crate::core_ftpcommand::ftpcommand::ParsedCommand;
use crate::core_ftpcommand::reply::Reply;
use crate::core_session::Session;
use crate::core_transfer::JobRequest;
use log::info;

/// Handles the STOR (Store File) FTP command.
///
/// The target is truncated or created, then filled from the data connection
/// until the client closes it. A transfer that fails midway leaves the
/// partial file in place.
pub async fn handle_stor_command(
    ctx: &ServerContext,
    session: &Session,
    parsed: &ParsedCommand,
) -> Result<Reply, FtpError> {
    let arg = parsed.required_arg()?;
    let path = ctx.paths.resolve_async(session.current_dir(), arg).await?;
    info!("Session {}: receiving file {:?}", session.id(), path);
    session.run_transfer(ctx, JobRequest::Store(path)).await
}
