//! Conversation orchestration
//!
//! Routes each inbound message to either the booking state machine or
//! the AI chat fallback, owns session load/save, and delivers the reply
//! through the outbound sender (splitting long texts into ordered
//! chunks).

use crate::booking::{self, BookingState};
use crate::outbound::MessageSender;
use crate::providers::ChatProvider;
use crate::storage::types::{ChatEntry, Service, Session};
use crate::storage::{AppointmentStore, SessionStore};
use std::sync::Arc;

/// Maximum characters per outbound message; longer replies are split.
pub const MAX_MESSAGE_LENGTH: usize = 1500;

/// Phrases that start the booking dialogue from an idle session.
const BOOKING_KEYWORDS: [&str; 4] = [
    "book appointment",
    "schedule appointment",
    "make an appointment",
    "set up appointment",
];

const EMPTY_MESSAGE_REPLY: &str = "I didn't receive a message. Please send something!";
const APOLOGY_REPLY: &str =
    "I'm sorry, I encountered an error trying to process your request. Please try again later.";

/// Routes inbound messages and manages session lifecycle
///
/// One `handle` call per inbound message. Collaborators are trait
/// objects, so the orchestrator is testable with in-memory fakes and the
/// session is always passed explicitly rather than fetched from ambient
/// state.
pub struct ConversationOrchestrator {
    sessions: Arc<dyn SessionStore>,
    appointments: Arc<dyn AppointmentStore>,
    provider: Arc<dyn ChatProvider>,
    sender: Arc<dyn MessageSender>,
    /// Send a "Thinking..." pre-message before processing
    acknowledge_first: bool,
}

impl ConversationOrchestrator {
    /// Creates an orchestrator over its four collaborators
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        appointments: Arc<dyn AppointmentStore>,
        provider: Arc<dyn ChatProvider>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            sessions,
            appointments,
            provider,
            sender,
            acknowledge_first: false,
        }
    }

    /// Enables the "Thinking..." pre-message before each reply
    pub fn with_thinking_message(mut self, enabled: bool) -> Self {
        self.acknowledge_first = enabled;
        self
    }

    /// Handles one inbound message end to end
    ///
    /// Never returns an error: every failure path ends in a user-visible
    /// message and a consistent session state. Outbound sends (including
    /// split chunks) are issued sequentially to preserve order; a failed
    /// chunk is logged and later chunks are still attempted.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Stable user identity from the transport
    /// * `text` - Decoded message text
    pub async fn handle(&self, user_id: &str, text: &str) {
        let text = text.trim();
        tracing::info!("Inbound message from {}: \"{}\"", user_id, text);

        if text.is_empty() {
            self.deliver(user_id, EMPTY_MESSAGE_REPLY).await;
            return;
        }

        if self.acknowledge_first {
            self.deliver(user_id, "Thinking...").await;
        }

        let reply = match self.process(user_id, text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Error processing message from {}: {:#}", user_id, e);
                self.reset_session(user_id).await;
                APOLOGY_REPLY.to_string()
            }
        };

        self.deliver(user_id, &reply).await;
    }

    /// Produces the reply text, mutating and persisting the session.
    async fn process(&self, user_id: &str, text: &str) -> crate::error::Result<String> {
        let mut session = self
            .sessions
            .find(user_id)
            .await?
            .unwrap_or_else(|| Session::new(user_id));

        // Mid-booking messages go to the state machine; AI chat is never
        // consulted on this branch.
        if session.state.is_booking() {
            let today = chrono::Local::now().date_naive();
            let transition = booking::advance(
                std::mem::take(&mut session.state),
                user_id,
                text,
                today,
                self.appointments.as_ref(),
            )
            .await;
            session.state = transition.state;
            self.sessions.upsert(&session).await?;
            return Ok(transition.reply);
        }

        if is_booking_intent(text) {
            session.state = BookingState::AwaitingService;
            let reply = format!(
                "Okay, let's book an appointment. What type of service are you looking for? \
                 (e.g., {})",
                Service::list_names()
            );
            self.sessions.upsert(&session).await?;
            return Ok(reply);
        }

        session.history.push(ChatEntry::user(text));
        let reply = self.provider.respond(&session.history).await?;
        session.history.push(ChatEntry::assistant(reply.clone()));
        self.sessions.upsert(&session).await?;
        tracing::debug!(
            "Session for {} now holds {} history entries",
            user_id,
            session.history.len()
        );

        Ok(reply)
    }

    /// Best-effort defensive reset after an uncaught processing error.
    ///
    /// Avoids stranding a user mid-booking on an unrelated crash; a
    /// secondary save failure here is swallowed, not escalated.
    async fn reset_session(&self, user_id: &str) {
        match self.sessions.find(user_id).await {
            Ok(Some(mut session)) => {
                session.state = BookingState::Idle;
                if let Err(e) = self.sessions.upsert(&session).await {
                    tracing::error!("Failed to save session after error for {}: {}", user_id, e);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Failed to load session after error for {}: {}", user_id, e);
            }
        }
    }

    /// Sends a reply, splitting it into ordered chunks when too long.
    async fn deliver(&self, user_id: &str, text: &str) {
        let chunks = split_message(text, MAX_MESSAGE_LENGTH);
        if chunks.len() > 1 {
            tracing::info!("Splitting reply to {} into {} parts", user_id, chunks.len());
        }
        for chunk in chunks {
            if let Err(e) = self.sender.send(user_id, &chunk).await {
                tracing::error!("Failed to send message to {}: {}", user_id, e);
            }
        }
    }
}

/// True when the text contains a booking-intent phrase.
fn is_booking_intent(text: &str) -> bool {
    let lowered = text.to_lowercase();
    BOOKING_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Splits text into consecutive chunks of at most `max_len` characters
///
/// Character order is preserved; there is no word-boundary awareness.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_len)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClinicbotError, Result};
    use crate::storage::types::{AppointmentRecord, ChatRole};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MemorySessions {
        sessions: Mutex<HashMap<String, Session>>,
    }

    impl MemorySessions {
        fn new() -> Self {
            Self {
                sessions: Mutex::new(HashMap::new()),
            }
        }

        fn get(&self, user_id: &str) -> Option<Session> {
            self.sessions.lock().unwrap().get(user_id).cloned()
        }

        fn len(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SessionStore for MemorySessions {
        async fn find(&self, user_id: &str) -> Result<Option<Session>> {
            Ok(self.sessions.lock().unwrap().get(user_id).cloned())
        }

        async fn upsert(&self, session: &Session) -> Result<()> {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.user_id.clone(), session.clone());
            Ok(())
        }
    }

    struct MemoryAppointments {
        records: Mutex<Vec<AppointmentRecord>>,
    }

    impl MemoryAppointments {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AppointmentStore for MemoryAppointments {
        async fn insert(&self, record: &AppointmentRecord) -> Result<String> {
            self.records.lock().unwrap().push(record.clone());
            Ok(record.id.clone())
        }

        async fn list(&self) -> Result<Vec<AppointmentRecord>> {
            Ok(self.records.lock().unwrap().clone())
        }
    }

    /// Provider returning a fixed reply, or failing when `reply` is None.
    struct ScriptedProvider {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn replying(reply: impl Into<String>) -> Self {
            Self {
                reply: Some(reply.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn respond(&self, _history: &[ChatEntry]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(ClinicbotError::Provider("model unavailable".to_string()).into()),
            }
        }
    }

    /// Sender recording every delivery; can fail the nth call.
    struct RecordingSender {
        sent: Mutex<Vec<String>>,
        fail_on_call: Option<usize>,
        calls: AtomicUsize,
    }

    impl RecordingSender {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_on_call: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_on_call: Some(call),
                calls: AtomicUsize::new(0),
            }
        }

        fn messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, _user_id: &str, text: &str) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_call == Some(call) {
                return Err(ClinicbotError::Send("delivery failed".to_string()).into());
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        sessions: Arc<MemorySessions>,
        appointments: Arc<MemoryAppointments>,
        provider: Arc<ScriptedProvider>,
        sender: Arc<RecordingSender>,
        orchestrator: ConversationOrchestrator,
    }

    fn harness(provider: ScriptedProvider, sender: RecordingSender) -> Harness {
        let sessions = Arc::new(MemorySessions::new());
        let appointments = Arc::new(MemoryAppointments::new());
        let provider = Arc::new(provider);
        let sender = Arc::new(sender);
        let orchestrator = ConversationOrchestrator::new(
            sessions.clone(),
            appointments.clone(),
            provider.clone(),
            sender.clone(),
        );
        Harness {
            sessions,
            appointments,
            provider,
            sender,
            orchestrator,
        }
    }

    const USER: &str = "whatsapp:+15551234567";

    #[tokio::test]
    async fn test_empty_message_prompts_without_session() {
        let h = harness(ScriptedProvider::replying("unused"), RecordingSender::new());

        h.orchestrator.handle(USER, "   ").await;

        let sent = h.sender.messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("send something"));
        assert_eq!(h.sessions.len(), 0);
        assert_eq!(h.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_booking_intent_starts_flow() {
        let h = harness(ScriptedProvider::replying("unused"), RecordingSender::new());

        h.orchestrator.handle(USER, "I want to BOOK APPOINTMENT").await;

        let sent = h.sender.messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("What type of service"));
        assert!(sent[0].contains("Dental Check-up"));

        let session = h.sessions.get(USER).unwrap();
        assert_eq!(session.state, BookingState::AwaitingService);
        assert!(session.history.is_empty());
        assert_eq!(h.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mid_booking_delegates_without_ai() {
        let h = harness(ScriptedProvider::replying("unused"), RecordingSender::new());

        let mut session = Session::new(USER);
        session.state = BookingState::AwaitingService;
        h.sessions.upsert(&session).await.unwrap();

        h.orchestrator.handle(USER, "Vaccination").await;

        let session = h.sessions.get(USER).unwrap();
        assert!(matches!(
            session.state,
            BookingState::AwaitingPatientName { .. }
        ));
        assert_eq!(h.provider.call_count(), 0);

        let sent = h.sender.messages();
        assert!(sent[0].contains("full name"));
    }

    #[tokio::test]
    async fn test_idle_chat_goes_to_provider_and_updates_history() {
        let h = harness(
            ScriptedProvider::replying("We open at 9 AM."),
            RecordingSender::new(),
        );

        h.orchestrator.handle(USER, "what are your hours?").await;

        assert_eq!(h.provider.call_count(), 1);
        let sent = h.sender.messages();
        assert_eq!(sent, vec!["We open at 9 AM.".to_string()]);

        let session = h.sessions.get(USER).unwrap();
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, ChatRole::User);
        assert_eq!(session.history[0].content, "what are your hours?");
        assert_eq!(session.history[1].role, ChatRole::Assistant);
        assert_eq!(session.history[1].content, "We open at 9 AM.");
        assert_eq!(session.state, BookingState::Idle);
    }

    #[tokio::test]
    async fn test_provider_failure_sends_apology_and_resets() {
        let h = harness(ScriptedProvider::failing(), RecordingSender::new());

        h.orchestrator.handle(USER, "hello there").await;

        let sent = h.sender.messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("I'm sorry, I encountered an error"));

        // The defensive reset leaves any saved session idle.
        if let Some(session) = h.sessions.get(USER) {
            assert_eq!(session.state, BookingState::Idle);
        }
    }

    #[tokio::test]
    async fn test_long_reply_split_into_ordered_chunks() {
        let long_reply = "a".repeat(3200);
        let h = harness(
            ScriptedProvider::replying(long_reply),
            RecordingSender::new(),
        );

        h.orchestrator.handle(USER, "tell me everything").await;

        let sent = h.sender.messages();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].len(), 1500);
        assert_eq!(sent[1].len(), 1500);
        assert_eq!(sent[2].len(), 200);
    }

    #[tokio::test]
    async fn test_chunk_failure_does_not_abort_remaining() {
        let long_reply = "b".repeat(3200);
        let h = harness(
            ScriptedProvider::replying(long_reply),
            RecordingSender::failing_on(0),
        );

        h.orchestrator.handle(USER, "tell me everything").await;

        // First chunk failed; the remaining two were still sent in order.
        let sent = h.sender.messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].len(), 1500);
        assert_eq!(sent[1].len(), 200);
    }

    #[tokio::test]
    async fn test_thinking_message_precedes_reply() {
        let sessions = Arc::new(MemorySessions::new());
        let appointments = Arc::new(MemoryAppointments::new());
        let sender = Arc::new(RecordingSender::new());
        let orchestrator = ConversationOrchestrator::new(
            sessions,
            appointments,
            Arc::new(ScriptedProvider::replying("hi!")),
            sender.clone(),
        )
        .with_thinking_message(true);

        orchestrator.handle(USER, "hello").await;

        let sent = sender.messages();
        assert_eq!(sent, vec!["Thinking...".to_string(), "hi!".to_string()]);
    }

    #[tokio::test]
    async fn test_full_flow_creates_appointment() {
        let h = harness(ScriptedProvider::replying("unused"), RecordingSender::new());

        h.orchestrator.handle(USER, "book appointment").await;
        h.orchestrator.handle(USER, "Dental Check-up").await;
        h.orchestrator.handle(USER, "Jane Doe").await;
        h.orchestrator.handle(USER, "tomorrow").await;
        h.orchestrator.handle(USER, "10:00 AM").await;
        h.orchestrator.handle(USER, "yes").await;

        let records = h.appointments.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].patient_name, "Jane Doe");

        let session = h.sessions.get(USER).unwrap();
        assert_eq!(session.state, BookingState::Idle);

        let sent = h.sender.messages();
        assert!(sent.last().unwrap().contains("successfully booked"));
    }

    #[test]
    fn test_is_booking_intent_keywords() {
        assert!(is_booking_intent("please book appointment for me"));
        assert!(is_booking_intent("SCHEDULE APPOINTMENT"));
        assert!(is_booking_intent("can I make an appointment?"));
        assert!(is_booking_intent("set up appointment tomorrow"));
        assert!(!is_booking_intent("what are your opening hours?"));
        assert!(!is_booking_intent("appointment"));
    }

    #[test]
    fn test_split_message_short_is_single() {
        let chunks = split_message("hello", 1500);
        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn test_split_message_exact_multiple() {
        let chunks = split_message(&"x".repeat(3000), 1500);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 1500));
    }

    #[test]
    fn test_split_message_preserves_order() {
        let text: String = ('a'..='z').cycle().take(3200).collect();
        let chunks = split_message(&text, 1500);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.join(""), text);
        assert_eq!(chunks[2].len(), 200);
    }
}
