//! The multi-turn booking state machine
//!
//! Drives the appointment collection dialogue: service, patient name,
//! date, time, confirmation. Each state variant carries exactly the
//! fields collected so far, so the state and the draft cannot disagree.
//!
//! Idle is entered and exited by the orchestrator; this module only
//! handles messages that arrive mid-booking.

use crate::booking::{dates, times};
use crate::storage::types::{
    new_appointment_id, AppointmentRecord, AppointmentStatus, Service,
};
use crate::storage::AppointmentStore;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Position in the booking dialogue, carrying the fields collected so far
///
/// Fields accumulate in order: service, then patient name, then date, then
/// time. A variant can only exist once everything before it was validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingState {
    /// No booking in progress; messages go to AI chat
    #[default]
    Idle,
    /// Waiting for the user to pick a service
    AwaitingService,
    /// Waiting for the patient's name
    AwaitingPatientName { service: Service },
    /// Waiting for an appointment date
    AwaitingDate {
        service: Service,
        patient_name: String,
    },
    /// Waiting for an appointment time
    AwaitingTime {
        service: Service,
        patient_name: String,
        date: NaiveDate,
    },
    /// Waiting for a yes/no on the assembled draft
    AwaitingConfirmation { draft: AppointmentDraft },
}

impl BookingState {
    /// True when a booking dialogue is in progress.
    pub fn is_booking(&self) -> bool {
        !matches!(self, BookingState::Idle)
    }
}

/// A fully collected appointment, awaiting the user's confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDraft {
    pub service: Service,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time: String,
}

impl AppointmentDraft {
    /// The confirmation summary echoed back before booking.
    fn summary(&self) -> String {
        format!(
            "Please confirm your appointment details:\n\n\
             *Service:* {}\n\
             *Patient Name:* {}\n\
             *Date:* {}\n\
             *Time:* {}\n\n\
             Is this correct? (Yes/No)",
            self.service,
            self.patient_name,
            format_date(self.date),
            self.time
        )
    }
}

/// Outcome of feeding one message to the state machine
#[derive(Debug, Clone)]
pub struct Transition {
    /// The state to store back on the session
    pub state: BookingState,
    /// The reply to send to the user
    pub reply: String,
}

/// Renders a date for user-facing messages, e.g. "15 June 2025".
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// Feeds one user message to the booking state machine
///
/// Valid input advances to the next state; unrecognized input re-prompts
/// and stays put. Reaching `AwaitingConfirmation` with a "yes" persists
/// the appointment (status pending); a persistence failure is caught
/// here, the flow resets to Idle, and the user is told the booking
/// failed.
///
/// # Arguments
///
/// * `state` - The session's current booking state
/// * `user_id` - The booking user's identity, recorded on the appointment
/// * `input` - The inbound message text (already trimmed, non-empty)
/// * `today` - Reference date for interpreting relative date expressions
/// * `appointments` - Store that receives the confirmed appointment
pub async fn advance(
    state: BookingState,
    user_id: &str,
    input: &str,
    today: NaiveDate,
    appointments: &dyn AppointmentStore,
) -> Transition {
    match state {
        BookingState::AwaitingService => match Service::match_input(input) {
            Some(service) => Transition {
                reply: format!(
                    "Got it. You want {}. What is the patient's full name?",
                    service
                ),
                state: BookingState::AwaitingPatientName { service },
            },
            None => Transition {
                reply: format!(
                    "I'm sorry, \"{}\" is not a recognized service. Please choose from: {}.",
                    input,
                    Service::list_names()
                ),
                state: BookingState::AwaitingService,
            },
        },

        BookingState::AwaitingPatientName { service } => Transition {
            reply: format!(
                "Thanks, {}. When would you like to book the appointment? \
                 Please provide a date (e.g., 2025-06-15, today, tomorrow, next Monday).",
                input
            ),
            state: BookingState::AwaitingDate {
                service,
                patient_name: input.to_string(),
            },
        },

        BookingState::AwaitingDate {
            service,
            patient_name,
        } => match dates::interpret(input, today) {
            Some(date) => Transition {
                reply: format!(
                    "Okay, {}. What time would you prefer? (e.g., 10:00 AM, 2:30 PM)",
                    format_date(date)
                ),
                state: BookingState::AwaitingTime {
                    service,
                    patient_name,
                    date,
                },
            },
            None => Transition {
                reply: "I couldn't understand that date or it's in the past. \
                        Please try again with formats like 2025-06-15, 06/15/2025, \
                        15-06-2025, or words like 'today', 'tomorrow', 'next Monday'."
                    .to_string(),
                state: BookingState::AwaitingDate {
                    service,
                    patient_name,
                },
            },
        },

        BookingState::AwaitingTime {
            service,
            patient_name,
            date,
        } => match times::validate(input) {
            Some(time) => {
                let draft = AppointmentDraft {
                    service,
                    patient_name,
                    date,
                    time,
                };
                Transition {
                    reply: draft.summary(),
                    state: BookingState::AwaitingConfirmation { draft },
                }
            }
            None => Transition {
                reply: "I couldn't understand that time. \
                        Please use a format like 10:00 AM or 2:30 PM."
                    .to_string(),
                state: BookingState::AwaitingTime {
                    service,
                    patient_name,
                    date,
                },
            },
        },

        BookingState::AwaitingConfirmation { draft } => {
            let answer = input.to_lowercase();
            if answer == "yes" {
                confirm(draft, user_id, appointments).await
            } else if answer == "no" {
                Transition {
                    reply: "No problem. Your appointment booking has been cancelled. \
                            How else can I assist you?"
                        .to_string(),
                    state: BookingState::Idle,
                }
            } else {
                Transition {
                    reply: "Please reply 'Yes' to confirm or 'No' to cancel.".to_string(),
                    state: BookingState::AwaitingConfirmation { draft },
                }
            }
        }

        // The orchestrator never delegates Idle sessions here; if one
        // arrives anyway, reset rather than strand the user.
        BookingState::Idle => Transition {
            reply: "An unexpected error occurred in the booking process. \
                    Please try starting over by saying 'book appointment'."
                .to_string(),
            state: BookingState::Idle,
        },
    }
}

/// Persists the confirmed draft as a pending appointment.
async fn confirm(
    draft: AppointmentDraft,
    user_id: &str,
    appointments: &dyn AppointmentStore,
) -> Transition {
    let record = AppointmentRecord {
        id: new_appointment_id(),
        user_id: user_id.to_string(),
        service: draft.service,
        patient_name: draft.patient_name.clone(),
        date: draft.date,
        time: draft.time.clone(),
        status: AppointmentStatus::Pending,
        created_at: Utc::now(),
    };

    match appointments.insert(&record).await {
        Ok(id) => Transition {
            reply: format!(
                "Appointment for {} for {} on {} at {} has been successfully booked! \
                 Your appointment ID is: {}.",
                draft.patient_name,
                draft.service,
                format_date(draft.date),
                draft.time,
                id
            ),
            state: BookingState::Idle,
        },
        Err(e) => {
            tracing::error!("Failed to save appointment for {}: {}", user_id, e);
            Transition {
                reply: "I'm sorry, there was an error saving your appointment. \
                        Please try again or contact the clinic directly."
                    .to_string(),
                state: BookingState::Idle,
            }
        }
    }
}
