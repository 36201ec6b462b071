//! Serve command handler
//!
//! Wires the stores, chat provider, outbound sender, orchestrator, and
//! dispatch worker together, then runs the webhook until the process is
//! stopped.

use crate::config::Config;
use crate::dispatch::spawn_worker;
use crate::error::Result;
use crate::orchestrator::ConversationOrchestrator;
use crate::outbound::{ConsoleSender, MessageSender, TwilioSender};
use crate::providers::GeminiProvider;
use crate::server;
use crate::storage::{SledAppointmentStore, SledSessionStore};
use std::sync::Arc;

/// Runs the webhook server and message worker
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `bind` - Optional listen address override
/// * `dry_run` - Log outbound messages instead of sending through Twilio
pub async fn run_serve(config: Config, bind: Option<String>, dry_run: bool) -> Result<()> {
    let sessions = Arc::new(SledSessionStore::new(&config.storage.sessions_path)?);
    let appointments = Arc::new(SledAppointmentStore::new(&config.storage.appointments_path)?);
    let provider = Arc::new(GeminiProvider::new(config.gemini.clone())?);

    let sender: Arc<dyn MessageSender> = if dry_run {
        tracing::info!("Dry run: outbound messages will be logged, not sent");
        Arc::new(ConsoleSender)
    } else {
        Arc::new(TwilioSender::new(config.twilio.clone())?)
    };

    let orchestrator = Arc::new(
        ConversationOrchestrator::new(sessions, appointments, provider, sender)
            .with_thinking_message(config.bot.thinking_message),
    );

    let (dispatcher, worker) = spawn_worker(orchestrator, config.server.queue_capacity);

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    server::serve(&bind, dispatcher).await?;

    worker.await?;
    Ok(())
}
