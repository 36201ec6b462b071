//! AI chat providers
//!
//! The [`ChatProvider`] trait is the seam the orchestrator talks through;
//! [`GeminiProvider`] is the production implementation.

pub mod base;
pub mod gemini;

pub use base::ChatProvider;
pub use gemini::GeminiProvider;
