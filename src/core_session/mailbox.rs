use parking_lot::Mutex;
use std::collections::VecDeque;

/// A unit of work for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    Line(String),
    /// A line that was not valid UTF-8.
    Invalid,
    Teardown,
}

#[derive(Default)]
struct MailboxInner {
    queue: VecDeque<WorkItem>,
    scheduled: bool,
}

/// Per-session FIFO. At most one worker drains a mailbox at a time, which is
/// what keeps a session's commands in submission order.
#[derive(Default)]
pub struct Mailbox {
    inner: Mutex<MailboxInner>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `item`. Returns true when the session must be handed to the pool.
    pub fn push(&self, item: WorkItem) -> bool {
        let mut inner = self.inner.lock();
        inner.queue.push_back(item);
        if inner.scheduled {
            false
        } else {
            inner.scheduled = true;
            true
        }
    }

    /// Next item for the draining worker. `None` also releases the schedule,
    /// atomically with the emptiness check.
    pub fn next(&self) -> Option<WorkItem> {
        let mut inner = self.inner.lock();
        let item = inner.queue.pop_front();
        if item.is_none() {
            inner.scheduled = false;
        }
        item
    }
}
