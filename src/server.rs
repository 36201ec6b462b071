//! Webhook transport adapter
//!
//! A single axum route decodes Twilio-style form posts into
//! (user identity, text) pairs and hands them to the dispatch queue.
//! The empty TwiML acknowledgment goes back to the transport before any
//! processing happens, so webhook timeouts never depend on the AI call.

use crate::dispatch::{Dispatcher, InboundMessage};
use crate::error::Result;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Form, Router};
use serde::Deserialize;

/// Empty TwiML document: acknowledge receipt, reply out of band.
const EMPTY_TWIML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>";

/// Inbound webhook form fields (Twilio naming)
#[derive(Debug, Deserialize)]
pub struct InboundForm {
    /// The sender's identity, e.g. "whatsapp:+15551234567"
    #[serde(rename = "From")]
    pub from: String,
    /// The message text; missing bodies arrive as empty
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Builds the webhook router
pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route("/webhook/whatsapp", post(handle_inbound))
        .with_state(dispatcher)
}

/// Decodes an inbound message, acks immediately, processes in background.
async fn handle_inbound(
    State(dispatcher): State<Dispatcher>,
    Form(form): Form<InboundForm>,
) -> impl IntoResponse {
    if let Err(e) = dispatcher
        .enqueue(InboundMessage {
            user_id: form.from,
            text: form.body,
        })
        .await
    {
        tracing::error!("Failed to enqueue inbound message: {}", e);
        return (StatusCode::SERVICE_UNAVAILABLE, "worker unavailable").into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        EMPTY_TWIML,
    )
        .into_response()
}

/// Binds and serves the webhook until the process exits
///
/// # Arguments
///
/// * `bind` - Listen address, e.g. "0.0.0.0:3000"
/// * `dispatcher` - Producer handle for the dispatch queue
pub async fn serve(bind: &str, dispatcher: Dispatcher) -> Result<()> {
    let app = router(dispatcher);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Webhook listening on {}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}
