//! Appointment booking dialogue
//!
//! This module contains the multi-turn booking state machine and its
//! input parsers: free-form date interpretation and 12-hour clock-time
//! validation.

pub mod dates;
pub mod flow;
pub mod times;

pub use flow::{advance, format_date, AppointmentDraft, BookingState, Transition};
