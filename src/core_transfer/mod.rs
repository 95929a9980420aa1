pub mod engine;
pub mod job;

pub use engine::TransferEngine;
pub use job::{Direction, JobRequest, TransferJob, TransferReport};
