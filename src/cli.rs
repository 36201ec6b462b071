//! Command-line interface definition for Clinicbot
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving the webhook and inspecting stored
//! sessions and appointments.

use clap::{Parser, Subcommand};

/// Clinicbot - conversational appointment booking engine
///
/// Receives WhatsApp-style messages, walks users through a multi-turn
/// booking dialogue, and falls back to AI chat when no booking is in
/// progress.
#[derive(Parser, Debug, Clone)]
#[command(name = "clinicbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Clinicbot
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the webhook server and message worker
    Serve {
        /// Override the listen address from config
        #[arg(short, long)]
        bind: Option<String>,

        /// Log outbound messages instead of sending through Twilio
        #[arg(long)]
        dry_run: bool,
    },

    /// List booked appointments
    Appointments,

    /// Show a user's conversation session
    Session {
        /// User identity, e.g. "whatsapp:+15551234567"
        user_id: String,
    },
}

impl Cli {
    /// Parses command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
