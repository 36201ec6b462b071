//! Shared in-memory fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use clinicbot::error::Result;
use clinicbot::orchestrator::ConversationOrchestrator;
use clinicbot::outbound::MessageSender;
use clinicbot::providers::ChatProvider;
use clinicbot::storage::types::{AppointmentRecord, ChatEntry, Session};
use clinicbot::storage::{AppointmentStore, SessionStore};
use clinicbot::ClinicbotError;

/// Session store backed by a HashMap
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the stored session, if any.
    pub fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(user_id).cloned()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
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

/// Appointment store backed by a Vec
#[derive(Default)]
pub struct MemoryAppointmentStore {
    records: Mutex<Vec<AppointmentRecord>>,
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AppointmentRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn insert(&self, record: &AppointmentRecord) -> Result<String> {
        self.records.lock().unwrap().push(record.clone());
        Ok(record.id.clone())
    }

    async fn list(&self) -> Result<Vec<AppointmentRecord>> {
        Ok(self.records.lock().unwrap().clone())
    }
}

/// Chat provider that always answers with a fixed reply
pub struct ScriptedProvider {
    reply: String,
    fail: bool,
}

impl ScriptedProvider {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: String::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn respond(&self, _history: &[ChatEntry]) -> Result<String> {
        if self.fail {
            return Err(ClinicbotError::Provider("scripted failure".to_string()).into());
        }
        Ok(self.reply.clone())
    }
}

/// Sender that records every outbound message
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Bodies of all messages sent to a user, in order.
    pub fn bodies(&self, user_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == user_id)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, user_id: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Wires an orchestrator over in-memory fakes
pub struct TestBot {
    pub sessions: Arc<MemorySessionStore>,
    pub appointments: Arc<MemoryAppointmentStore>,
    pub sender: Arc<RecordingSender>,
    pub orchestrator: Arc<ConversationOrchestrator>,
}

impl TestBot {
    pub fn new(provider: ScriptedProvider) -> Self {
        let sessions = Arc::new(MemorySessionStore::new());
        let appointments = Arc::new(MemoryAppointmentStore::new());
        let sender = Arc::new(RecordingSender::new());
        let orchestrator = Arc::new(ConversationOrchestrator::new(
            sessions.clone(),
            appointments.clone(),
            Arc::new(provider),
            sender.clone(),
        ));
        Self {
            sessions,
            appointments,
            sender,
            orchestrator,
        }
    }

    /// Sends one message and returns the replies it produced.
    pub async fn say(&self, user_id: &str, text: &str) -> Vec<String> {
        let before = self.sender.bodies(user_id).len();
        self.orchestrator.handle(user_id, text).await;
        self.sender.bodies(user_id)[before..].to_vec()
    }
}
