//! Session command handler
//!
//! Prints one user's conversation session: booking state and history.

use crate::config::Config;
use crate::error::Result;
use crate::storage::types::ChatRole;
use crate::storage::{SessionStore, SledSessionStore};

/// Shows a user's conversation session
pub async fn run_show(config: Config, user_id: &str) -> Result<()> {
    let store = SledSessionStore::new(&config.storage.sessions_path)?;

    let Some(session) = store.find(user_id).await? else {
        println!("No session for {}.", user_id);
        return Ok(());
    };

    println!("Session for {}", session.user_id);
    println!("Booking state: {:?}", session.state);
    println!("History ({} entries):", session.history.len());
    for entry in &session.history {
        let role = match entry.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        println!("  [{}] {}", role, entry.content);
    }
    Ok(())
}
