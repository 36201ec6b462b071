//! Session and appointment persistence
//!
//! Defines the storage seams the orchestrator and state machine depend
//! on, plus sled-backed implementations storing JSON values in embedded
//! key-value trees. Sessions are keyed by user identity, appointments by
//! their generated ULID.

pub mod types;

use crate::error::{ClinicbotError, Result};
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use types::{AppointmentRecord, Session};

/// Keyed store for per-user conversation sessions
///
/// Concurrent updates to the same user's session are last-write-wins;
/// the engine assumes at most one in-flight message per user.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Looks up the session for a user identity, if one exists
    async fn find(&self, user_id: &str) -> Result<Option<Session>>;

    /// Inserts or replaces the session for its user identity
    async fn upsert(&self, session: &Session) -> Result<()>;
}

/// Append-only store for confirmed appointments
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Persists a new appointment record, returning its identifier
    async fn insert(&self, record: &AppointmentRecord) -> Result<String>;

    /// Lists all stored appointments
    async fn list(&self) -> Result<Vec<AppointmentRecord>>;
}

/// Sled-backed session store
///
/// One tree, keyed by user id, JSON-serialized [`Session`] values.
pub struct SledSessionStore {
    db: Db,
}

impl SledSessionStore {
    /// Open or create a session store
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the database directory
    ///
    /// # Errors
    ///
    /// Returns `ClinicbotError::Storage` if the database cannot be opened
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| ClinicbotError::Storage(format!("Failed to open database: {}", e)))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl SessionStore for SledSessionStore {
    async fn find(&self, user_id: &str) -> Result<Option<Session>> {
        match self
            .db
            .get(user_id.as_bytes())
            .map_err(|e| ClinicbotError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let session = serde_json::from_slice(&bytes)
                    .map_err(|e| ClinicbotError::Storage(format!("Deserialization failed: {}", e)))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, session: &Session) -> Result<()> {
        let value = serde_json::to_vec(session)
            .map_err(|e| ClinicbotError::Storage(format!("Serialization failed: {}", e)))?;

        self.db
            .insert(session.user_id.as_bytes(), value)
            .map_err(|e| ClinicbotError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush_async()
            .await
            .map_err(|e| ClinicbotError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }
}

/// Sled-backed appointment store
///
/// One tree, keyed by appointment ULID, JSON-serialized
/// [`AppointmentRecord`] values. ULID keys sort by creation time, so
/// iteration yields appointments in booking order.
pub struct SledAppointmentStore {
    db: Db,
}

impl SledAppointmentStore {
    /// Open or create an appointment store
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the database directory
    ///
    /// # Errors
    ///
    /// Returns `ClinicbotError::Storage` if the database cannot be opened
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| ClinicbotError::Storage(format!("Failed to open database: {}", e)))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl AppointmentStore for SledAppointmentStore {
    async fn insert(&self, record: &AppointmentRecord) -> Result<String> {
        let value = serde_json::to_vec(record)
            .map_err(|e| ClinicbotError::Storage(format!("Serialization failed: {}", e)))?;

        self.db
            .insert(record.id.as_bytes(), value)
            .map_err(|e| ClinicbotError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush_async()
            .await
            .map_err(|e| ClinicbotError::Storage(format!("Flush failed: {}", e)))?;

        Ok(record.id.clone())
    }

    async fn list(&self) -> Result<Vec<AppointmentRecord>> {
        let mut records = Vec::new();
        for result in self.db.iter() {
            let (_, value) =
                result.map_err(|e| ClinicbotError::Storage(format!("Iteration failed: {}", e)))?;

            let record: AppointmentRecord = serde_json::from_slice(&value)
                .map_err(|e| ClinicbotError::Storage(format!("Deserialization failed: {}", e)))?;

            records.push(record);
        }
        Ok(records)
    }
}
