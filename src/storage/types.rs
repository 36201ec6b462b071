//! Core data types for sessions and appointments
//!
//! Defines the clinic service catalogue, chat history entries, the
//! persisted per-user session, and the immutable appointment record
//! created when a booking is confirmed.

use crate::booking::BookingState;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Clinic services available for booking
///
/// The set is fixed; user input is matched against the canonical display
/// names with a case-insensitive substring test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Service {
    GeneralConsultation,
    DentalCheckup,
    Physiotherapy,
    Vaccination,
}

/// All services, in the order they are offered to the user.
pub const ALL_SERVICES: [Service; 4] = [
    Service::GeneralConsultation,
    Service::DentalCheckup,
    Service::Physiotherapy,
    Service::Vaccination,
];

impl Service {
    /// Canonical display name, as listed in prompts and recorded on
    /// appointments.
    pub fn name(&self) -> &'static str {
        match self {
            Service::GeneralConsultation => "General Consultation",
            Service::DentalCheckup => "Dental Check-up",
            Service::Physiotherapy => "Physiotherapy",
            Service::Vaccination => "Vaccination",
        }
    }

    /// Matches free-form user input against the service catalogue
    ///
    /// The input matches a service when it contains that service's display
    /// name, case-insensitively. The first match in catalogue order wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use clinicbot::storage::types::Service;
    ///
    /// assert_eq!(
    ///     Service::match_input("I'd like a dental check-up please"),
    ///     Some(Service::DentalCheckup)
    /// );
    /// assert_eq!(Service::match_input("haircut"), None);
    /// ```
    pub fn match_input(input: &str) -> Option<Service> {
        let lowered = input.to_lowercase();
        ALL_SERVICES
            .into_iter()
            .find(|service| lowered.contains(&service.name().to_lowercase()))
    }

    /// Comma-separated list of all service names, for prompts.
    pub fn list_names() -> String {
        ALL_SERVICES
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Role of a chat history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single entry in a session's conversation history
///
/// Entries are insertion-ordered and passed verbatim to the chat provider
/// as context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    /// Who produced the entry
    pub role: ChatRole,
    /// The message text
    pub content: String,
}

impl ChatEntry {
    /// Creates a user entry
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant entry
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Per-user conversational state, persisted across messages
///
/// A session is created on the first message from a new user identity,
/// mutated once per inbound message, and never deleted. Any in-progress
/// booking draft lives inside [`BookingState`], so the state and the
/// accumulated fields cannot drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Stable external identity (phone-number-like string), unique key
    pub user_id: String,
    /// Ordered conversation history used as AI chat context
    pub history: Vec<ChatEntry>,
    /// Current position in the booking dialogue
    #[serde(default)]
    pub state: BookingState,
}

impl Session {
    /// Creates a fresh session for a user: idle, empty history.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            history: Vec::new(),
            state: BookingState::Idle,
        }
    }
}

/// Status of an appointment record
///
/// Records are created as `Pending`; later transitions are an external
/// (clinic staff) concern and never happen in this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

/// A confirmed appointment, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    /// Unique appointment identifier (ULID)
    pub id: String,
    /// The booking user's identity
    pub user_id: String,
    /// Booked service
    pub service: Service,
    /// Patient name, recorded verbatim from the conversation
    pub patient_name: String,
    /// Appointment calendar date (today or future at creation time)
    pub date: NaiveDate,
    /// Normalized 12-hour clock time, e.g. "10:00 AM"
    pub time: String,
    /// Current status; always `Pending` at creation
    pub status: AppointmentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Generates a fresh appointment identifier
pub fn new_appointment_id() -> String {
    ulid::Ulid::new().to_string()
}
