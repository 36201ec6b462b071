//! Inbound message dispatch
//!
//! The webhook acknowledges the transport immediately and hands the
//! decoded message to a queue; a worker task consumes the queue and
//! spawns one orchestration per message. Messages from different users
//! therefore process concurrently, and a slow AI call for one user never
//! stalls another's reply.
//!
//! The queue preserves enqueue order, but because each message runs in
//! its own task, two near-simultaneous messages from the same user can
//! race on the session; the last write wins.

use crate::error::Result;
use crate::orchestrator::ConversationOrchestrator;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A decoded inbound message awaiting processing
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Stable user identity from the transport
    pub user_id: String,
    /// Message text, possibly empty
    pub text: String,
}

/// Consumer side of the dispatch queue
///
/// Implemented by [`ConversationOrchestrator`](crate::orchestrator::ConversationOrchestrator);
/// a trait so the worker is testable without real collaborators.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    /// Processes one inbound message to completion
    async fn handle(&self, user_id: &str, text: &str);
}

#[async_trait]
impl InboundHandler for ConversationOrchestrator {
    async fn handle(&self, user_id: &str, text: &str) {
        ConversationOrchestrator::handle(self, user_id, text).await;
    }
}

/// Producer handle for the dispatch queue
///
/// Cheap to clone; the webhook holds one per connection.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<InboundMessage>,
}

impl Dispatcher {
    /// Enqueues a message for background processing
    ///
    /// Waits for queue capacity, so a flooded queue applies backpressure
    /// to the transport rather than dropping messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has shut down.
    pub async fn enqueue(&self, message: InboundMessage) -> Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| anyhow::anyhow!("dispatch worker has shut down"))?;
        Ok(())
    }
}

/// Starts the dispatch worker
///
/// Returns the producer handle and the worker's join handle. The worker
/// runs until every [`Dispatcher`] clone is dropped, spawning one task
/// per dequeued message.
///
/// # Arguments
///
/// * `handler` - The message processor (normally the orchestrator)
/// * `capacity` - Queue depth before enqueue applies backpressure
pub fn spawn_worker(
    handler: Arc<dyn InboundHandler>,
    capacity: usize,
) -> (Dispatcher, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<InboundMessage>(capacity);

    let worker = tokio::spawn(async move {
        tracing::info!("Dispatch worker started (queue capacity {})", capacity);
        while let Some(message) = rx.recv().await {
            let handler = handler.clone();
            tokio::spawn(async move {
                handler.handle(&message.user_id, &message.text).await;
            });
        }
        tracing::info!("Dispatch worker stopped");
    });

    (Dispatcher { tx }, worker)
}
