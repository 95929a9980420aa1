pub mod mailbox;
pub mod registry;
pub mod session;

pub use mailbox::{Mailbox, WorkItem};
pub use registry::{ListenerId, SessionId, SessionRegistry};
pub use session::Session;
