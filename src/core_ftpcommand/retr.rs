use crate::context::ServerContext;
use crate::core_error::FtpError;
use crate::core_ftpcommand::ftpcommand::ParsedCommand;
use crate::core_ftpcommand::reply::Reply;
use crate::core_session::Session;
use crate::core_transfer::JobRequest;
use log::info;

/// Handles the RETR (Retrieve) FTP command.
///
/// The path is confined to the server root before anything is opened; a
/// missing file is reported with 550 and no byte reaches the data connection.
pub async fn handle_retr_command(
    ctx: &ServerContext,
    session: &Session,
    parsed: &ParsedCommand,
) -> Result<Reply, FtpError> {
    let arg = parsed.required_arg()?;
    let path = ctx.paths.resolve_async(session.current_dir(), arg).await?;
    info!("Session {}: sending file {:?}", session.id(), path);
    session.run_transfer(ctx, JobRequest::Retrieve(path)).await
}
