pub mod data_channel;
pub mod framing;
pub mod network;
pub mod pasv;

pub use data_channel::{ChannelPhase, DataChannel};
pub use framing::{Frame, LineFramer};
pub use network::Reactor;
