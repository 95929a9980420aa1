use crate::context::ServerContext;
use crate::core_session::{Session, SessionId, WorkItem};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Cloneable submission side of the pool, held by the reactor tasks.
#[derive(Clone)]
pub struct PoolHandle {
    queue: mpsc::UnboundedSender<SessionId>,
}

impl PoolHandle {
    /// Queues `item` on the session's mailbox and schedules the session if no
    /// worker is already draining it. False once the pool has stopped.
    pub fn submit(&self, session: &Session, item: WorkItem) -> bool {
        if session.mailbox().push(item) && self.queue.send(session.id()).is_err() {
            warn!("Worker pool stopped, session {} not scheduled", session.id());
            return false;
        }
        true
    }
}

/// Fixed set of workers pulling session ids from one FIFO queue.
pub struct WorkerPool {
    handle: PoolHandle,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(size: usize, ctx: Arc<ServerContext>) -> Self {
        let (queue, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..size.max(1))
            .map(|index| {
                tokio::spawn(run_worker(index, Arc::clone(&receiver), Arc::clone(&ctx)))
            })
            .collect::<Vec<_>>();
        info!("Started {} worker(s)", workers.len());

        Self {
            handle: PoolHandle { queue },
            workers,
        }
    }

    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Waits for the workers to finish the queue once every handle is gone.
    /// Workers still busy after `grace` are aborted.
    pub async fn join(self, grace: Duration) {
        let WorkerPool { handle, workers } = self;
        drop(handle);

        let deadline = Instant::now() + grace;
        for worker in workers {
            let abort = worker.abort_handle();
            if tokio::time::timeout_at(deadline, worker).await.is_err() {
                warn!("Worker still busy after shutdown grace period, aborting");
                abort.abort();
            }
        }
    }
}

async fn run_worker(
    index: usize,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<SessionId>>>,
    ctx: Arc<ServerContext>,
) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(session_id) = next else {
            break;
        };
        match ctx.registry.get(session_id) {
            Some(session) => session.drain(&ctx).await,
            None => debug!("Worker {}: session {} already gone", index, session_id),
        }
    }
    debug!("Worker {} stopped", index);
}
