// Here's the list of the FTP commands implemented
pub mod list;
pub mod pass;
pub mod quit;
pub mod retr;
pub mod stor;
pub mod user;

// Parsing, dispatch and the reply type
pub mod ftpcommand;
pub mod handlers;
pub mod reply;
