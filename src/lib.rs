//! Clinicbot - conversational appointment booking engine
//!
//! This library implements a WhatsApp-style clinic assistant: a per-user
//! booking state machine collecting structured appointment data across
//! asynchronous messages, with a generative-AI chat fallback for
//! everything else.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `booking`: the multi-turn state machine plus date and time parsing
//! - `orchestrator`: routes inbound messages to the state machine or AI
//!   chat, owns session lifecycle and reply delivery
//! - `dispatch`: queue handoff between the webhook and the orchestrator
//! - `server`: the webhook transport adapter
//! - `providers`: AI chat provider abstraction and the Gemini client
//! - `outbound`: outbound message sender abstraction and Twilio client
//! - `storage`: session/appointment stores and data types
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition

pub mod booking;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod outbound;
pub mod providers;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use booking::BookingState;
pub use config::Config;
pub use error::{ClinicbotError, Result};
pub use orchestrator::ConversationOrchestrator;
pub use storage::types::{AppointmentRecord, AppointmentStatus, Service, Session};
