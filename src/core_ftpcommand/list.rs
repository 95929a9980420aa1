use crate::context::ServerContext;
use crate::core_error::FtpError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_session::Session;
use crate::core_transfer::JobRequest;

/// Handles the LIST FTP command: names in the session's current directory,
/// sent over the passive data connection. Arguments are ignored.
pub async fn handle_list_command(ctx: &ServerContext, session: &Session) -> Result<Reply, FtpError> {
    let request = JobRequest::List(session.current_dir().to_path_buf());
    session.run_transfer(ctx, request).await
}
