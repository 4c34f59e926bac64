//! Cross-process broadcast bus on a tokio broadcast channel.
//!
//! Each process holds a receiver; the sender never hears its own messages
//! because the host socket does not echo to the emitter.

use async_trait::async_trait;
use tokio::sync::broadcast;

use npcvibes_shared::{SocketMessage, SOCKET_CHANNEL};

use crate::infrastructure::ports::{BroadcastPort, TransportError};

const DEFAULT_CAPACITY: usize = 256;

/// A message tagged with the process that sent it
#[derive(Debug, Clone)]
pub struct Envelope {
    pub sender: String,
    pub message: SocketMessage,
}

/// Shared socket channel. Clone a handle per process with [`BroadcastBus::handle`].
#[derive(Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<Envelope>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// A sending/receiving endpoint for one process
    pub fn handle(&self, process_id: impl Into<String>) -> BusHandle {
        BusHandle {
            process_id: process_id.into(),
            sender: self.sender.clone(),
        }
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One process's view of the bus
#[derive(Clone)]
pub struct BusHandle {
    process_id: String,
    sender: broadcast::Sender<Envelope>,
}

impl BusHandle {
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// Receive messages sent by every other process.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            process_id: self.process_id.clone(),
            receiver: self.sender.subscribe(),
        }
    }
}

#[async_trait]
impl BroadcastPort for BusHandle {
    async fn emit(&self, message: &SocketMessage) -> Result<(), TransportError> {
        tracing::debug!(
            channel = SOCKET_CHANNEL,
            sender = %self.process_id,
            kind = message.kind(),
            "Broadcasting socket message"
        );
        // No receivers is not an error: nobody else is connected.
        let _ = self.sender.send(Envelope {
            sender: self.process_id.clone(),
            message: message.clone(),
        });
        Ok(())
    }
}

pub struct Subscription {
    process_id: String,
    receiver: broadcast::Receiver<Envelope>,
}

impl Subscription {
    /// Next message from another process. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<SocketMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if envelope.sender == self.process_id => continue,
                Ok(envelope) => return Some(envelope.message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Socket subscriber lagged, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<SocketMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) if envelope.sender == self.process_id => continue,
                Ok(envelope) => return Some(envelope.message),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Socket subscriber lagged, messages dropped");
                }
                Err(_) => return None,
            }
        }
    }
}
