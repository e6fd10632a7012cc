//! High-level pipeline: publishes a list of records as a brand-new remote database.
//!
//! This module provides the orchestration for one publish run:
//!   - Builds the fixed-schema create-database request (see [`crate::schema`])
//!   - Creates the database with a single remote call
//!   - Inserts one row per record, strictly in input order, one call at a time
//!   - Reports every inserted row to an optional progress callback
//!   - Assembles a [`PublishOutcome`] with the rows that failed and why
//!
//! # Error Handling
//! Database creation is fail-fast: without a database there is nothing to insert into,
//! so the remote error is returned as [`PublishError::CreateDatabase`]. Row inserts
//! are isolated: a failure is recorded as a [`FailedEntry`] and the run moves on.
//!
//! # Cancellation
//! The [`CancellationToken`] is polled before the run starts, right before the
//! create call, right after it, and before every row. A call already in flight is
//! always allowed to finish. A database created before cancellation is left in place.
//!
//! # Navigation
//! - Main entrypoint: [`publish`]
//! - Supporting types: [`PublishOutcome`], [`FailedEntry`], [`PublishError`].

use chrono::Local;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cancel::CancellationToken;
use crate::contract::{ApiError, Record, TablePublisher};
use crate::schema::{build_create_request, build_row_request, timestamp_label};

/// Message carried by a cancelled run. Callers match on it to stay quiet about cancellation.
pub const CANCELLED_MESSAGE: &str = "Operation cancelled";

/// Progress callback invoked once per inserted row, in input order.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(&Record) + Send);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// Cancellation was observed at a checkpoint.
    #[error("Operation cancelled")]
    Aborted,
    /// The create-database call failed; no rows were attempted.
    #[error("Failed to create database: {0}")]
    CreateDatabase(#[source] ApiError),
}

impl PublishError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PublishError::Aborted)
    }
}

/// A record whose row could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub record: Record,
    pub reason: String,
}

/// Final report of a completed (non-cancelled) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub database_id: String,
    pub database_url: String,
    /// Derived: records attempted minus `failed_entries.len()`.
    pub entries_added: usize,
    pub created_time: String,
    pub last_edited_time: String,
    pub failed_entries: Vec<FailedEntry>,
}

fn checkpoint(cancel: &CancellationToken, stage: &str) -> Result<(), PublishError> {
    if cancel.is_cancelled() {
        warn!(stage, "[PUBLISH] Cancellation observed, aborting run");
        return Err(PublishError::Aborted);
    }
    Ok(())
}

/// Publish `records` as a new database under `page_id`.
pub async fn publish<P>(
    publisher: &P,
    page_id: &str,
    records: &[Record],
    mut on_progress: Option<ProgressFn<'_>>,
    cancel: &CancellationToken,
) -> Result<PublishOutcome, PublishError>
where
    P: TablePublisher + ?Sized,
{
    checkpoint(cancel, "start")?;
    info!(records = records.len(), page_id, "[PUBLISH] Starting publish run");

    let request = build_create_request(page_id, &timestamp_label(&Local::now()));
    debug!(title = %request.title_text(), "[PUBLISH] Built create-database request");

    checkpoint(cancel, "before create")?;
    let database = match publisher.create_database(&request).await {
        Ok(db) => {
            info!(database_id = %db.id, url = %db.url, "[PUBLISH] Database created");
            db
        }
        Err(e) => {
            error!(error = %e, page_id, "[PUBLISH][ERROR] create_database failed");
            return Err(PublishError::CreateDatabase(e));
        }
    };

    checkpoint(cancel, "after create")?;

    let mut failed_entries: Vec<FailedEntry> = Vec::new();
    for record in records {
        checkpoint(cancel, "before row")?;

        let row = build_row_request(&database.id, record);
        debug!(name = %record.name, "[PUBLISH] Adding row");
        match publisher.create_row(&row).await {
            Ok(created) => {
                debug!(name = %record.name, row_id = ?created.id, "[PUBLISH] Row added");
                if let Some(progress) = on_progress.as_deref_mut() {
                    progress(record);
                }
            }
            Err(e) => {
                error!(name = %record.name, error = %e, "[PUBLISH][ERROR] Failed to add row");
                failed_entries.push(FailedEntry {
                    record: record.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let entries_added = records.len() - failed_entries.len();
    info!(
        database_id = %database.id,
        entries_added,
        failed = failed_entries.len(),
        "[PUBLISH] Table published"
    );

    Ok(PublishOutcome {
        database_id: database.id,
        database_url: database.url,
        entries_added,
        created_time: database.created_time,
        last_edited_time: database.last_edited_time,
        failed_entries,
    })
}
