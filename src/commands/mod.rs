//! Command handlers for the Clinicbot CLI

pub mod appointments;
pub mod serve;
pub mod session;
