use crate::core_session::registry::{ListenerId, SessionRegistry};
use log::debug;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Observable state of a session's passive data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    Idle,
    Listening,
    Connected,
}

#[derive(Debug)]
enum ChannelState {
    Idle,
    Listening {
        listener_id: ListenerId,
        port: u16,
        // The listener socket lives inside the reactor's accept task.
        accept_task: AbortHandle,
    },
    Connected {
        listener_id: ListenerId,
        peer: TcpStream,
    },
}

/// One session's passive listener and accepted peer.
///
/// Every transition happens with the owning session's data lock held. The
/// phase is also published on a watch channel so a worker can release the
/// lock while it waits for the reactor to attach a peer.
#[derive(Debug)]
pub struct DataChannel {
    state: ChannelState,
    phase: watch::Sender<ChannelPhase>,
}

impl Default for DataChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl DataChannel {
    pub fn new() -> Self {
        let (phase, _) = watch::channel(ChannelPhase::Idle);
        Self {
            state: ChannelState::Idle,
            phase,
        }
    }

    pub fn phase(&self) -> ChannelPhase {
        match self.state {
            ChannelState::Idle => ChannelPhase::Idle,
            ChannelState::Listening { .. } => ChannelPhase::Listening,
            ChannelState::Connected { .. } => ChannelPhase::Connected,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelPhase> {
        self.phase.subscribe()
    }

    pub fn listener_id(&self) -> Option<ListenerId> {
        match self.state {
            ChannelState::Idle => None,
            ChannelState::Listening { listener_id, .. }
            | ChannelState::Connected { listener_id, .. } => Some(listener_id),
        }
    }

    /// Idle -> Listening. Callers reset first, so a previous listener never survives.
    pub fn start_listening(&mut self, listener_id: ListenerId, port: u16, accept_task: AbortHandle) {
        debug_assert_eq!(self.phase(), ChannelPhase::Idle);
        self.set_state(ChannelState::Listening {
            listener_id,
            port,
            accept_task,
        });
    }

    /// Listening -> Connected, only for the listener that is still current.
    /// A peer from a superseded listener is handed back to be dropped.
    pub fn attach_peer(&mut self, listener_id: ListenerId, peer: TcpStream) -> Result<(), TcpStream> {
        match self.state {
            ChannelState::Listening {
                listener_id: current,
                ..
            } if current == listener_id => {
                self.set_state(ChannelState::Connected { listener_id, peer });
                Ok(())
            }
            _ => Err(peer),
        }
    }

    /// Listening -> Idle after the reactor failed to accept on `listener_id`.
    pub fn abandon_listener(&mut self, listener_id: ListenerId) -> bool {
        match self.state {
            ChannelState::Listening {
                listener_id: current,
                ..
            } if current == listener_id => {
                self.set_state(ChannelState::Idle);
                true
            }
            _ => false,
        }
    }

    /// Connected -> Idle, handing the peer to the transfer.
    pub fn take_peer(&mut self) -> Option<TcpStream> {
        match std::mem::replace(&mut self.state, ChannelState::Idle) {
            ChannelState::Connected { peer, .. } => {
                self.phase.send_replace(ChannelPhase::Idle);
                Some(peer)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Any -> Idle. Closes the listener and peer and drops the registry entry.
    pub fn reset(&mut self, registry: &SessionRegistry) {
        match std::mem::replace(&mut self.state, ChannelState::Idle) {
            ChannelState::Idle => return,
            ChannelState::Listening {
                listener_id,
                port,
                accept_task,
            } => {
                accept_task.abort();
                registry.remove_listener(listener_id);
                debug!("Closed passive listener {} on port {}", listener_id, port);
            }
            ChannelState::Connected { listener_id, peer } => {
                drop(peer);
                debug!("Closed data connection from listener {}", listener_id);
            }
        }
        self.phase.send_replace(ChannelPhase::Idle);
    }

    fn set_state(&mut self, state: ChannelState) {
        self.state = state;
        self.phase.send_replace(self.phase());
    }
}
