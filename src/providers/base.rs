//! Chat provider trait
//!
//! The AI chat capability is consumed as an opaque, stateless completion
//! call: the full ordered history is resent on every request and the
//! provider returns one assistant reply.

use crate::error::Result;
use crate::storage::types::ChatEntry;
use async_trait::async_trait;

/// Generative AI chat capability
///
/// Implementations are stateless across calls; conversation memory lives
/// in the session history the caller supplies. Failures propagate to the
/// orchestrator's error path, which resets any in-progress booking.
///
/// # Examples
///
/// ```
/// use clinicbot::providers::ChatProvider;
/// use clinicbot::storage::types::ChatEntry;
/// use clinicbot::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl ChatProvider for EchoProvider {
///     async fn respond(&self, history: &[ChatEntry]) -> Result<String> {
///         Ok(history.last().map(|e| e.content.clone()).unwrap_or_default())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let provider = EchoProvider;
/// let reply = provider.respond(&[ChatEntry::user("hello")]).await.unwrap();
/// assert_eq!(reply, "hello");
/// # });
/// ```
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generates an assistant reply to the conversation so far
    ///
    /// # Arguments
    ///
    /// * `history` - The ordered conversation history, ending with the
    ///   user message being answered
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response is malformed
    async fn respond(&self, history: &[ChatEntry]) -> Result<String>;
}
