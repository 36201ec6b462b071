//! Appointments command handler
//!
//! Prints the stored appointments for operator inspection.

use crate::booking::format_date;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{AppointmentStore, SledAppointmentStore};

/// Lists all booked appointments
pub async fn run_list(config: Config) -> Result<()> {
    let store = SledAppointmentStore::new(&config.storage.appointments_path)?;
    let records = store.list().await?;

    if records.is_empty() {
        println!("No appointments booked.");
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {}  {}  {} {}  [{}]  {}",
            record.id,
            record.user_id,
            record.service,
            format_date(record.date),
            record.time,
            record.status.as_str(),
            record.patient_name
        );
    }
    println!("{} appointment(s).", records.len());
    Ok(())
}
