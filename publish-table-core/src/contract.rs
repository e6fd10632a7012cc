//! # contract: the seams of the publishing pipeline
//!
//! This module defines the plain data shared by every stage of a publish run and
//! the two traits the pipeline talks to:
//!
//! - [`TablePublisher`]: the remote table API (probe a page, create a database, add a row).
//! - [`NoteSource`]: the local document store the records are aggregated from.
//!
//! Both traits are async and annotated for `mockall`, so orchestration can be tested
//! without a network or a vault on disk. Mocks are exported behind the
//! `test-export-mocks` feature for use by dependent crates' tests.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{CreateDatabaseRequest, CreatePageRequest};

/// One publishable item, derived from a single note.
///
/// Records are never mutated after construction; a record has no identity beyond
/// structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Display label, taken from the note's base name. Not validated.
    pub name: String,
    /// URL, possibly empty.
    pub link: String,
    /// Base names of the notes this note links to.
    pub tags: Vec<String>,
    /// Free text, possibly empty.
    pub description: String,
    /// Category label such as `tool` or `dataset`, possibly empty.
    #[serde(rename = "type")]
    pub kind: String,
}

/// The database created on the remote side for one publish run.
///
/// All fields are remote-assigned and surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDatabase {
    pub id: String,
    pub url: String,
    pub created_time: String,
    pub last_edited_time: String,
}

/// A row created inside a remote database.
///
/// The id is informational; a row counts as inserted even when the remote side omits it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRow {
    #[serde(default)]
    pub id: Option<String>,
}

/// Error returned by any remote call.
///
/// Transport-agnostic so the core crate does not depend on an HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Trait for the remote table API.
///
/// The implementor owns authentication (the API key is bound at construction) and
/// transport. Calls are issued strictly one at a time by the orchestrator.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TablePublisher: Send + Sync {
    /// Read-only lookup of the page a new database would be created under.
    async fn fetch_page(&self, page_id: &str) -> Result<serde_json::Value, ApiError>;

    /// Create a new database under the page named in the request.
    async fn create_database(&self, req: &CreateDatabaseRequest)
        -> Result<RemoteDatabase, ApiError>;

    /// Insert one row into an existing database.
    async fn create_row(&self, req: &CreatePageRequest) -> Result<CreatedRow, ApiError>;
}

/// One markdown note as seen by the aggregation step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Note {
    /// Vault-relative path with `/` separators, e.g. `Tools/ripgrep.md`.
    pub path: String,
    /// File name without the `.md` extension.
    pub basename: String,
    /// Frontmatter `link`, when present as a scalar.
    pub link: Option<String>,
    /// Frontmatter `type`, when present as a scalar.
    pub kind: Option<String>,
    /// Full file content, frontmatter included.
    pub content: String,
    /// Base names of resolved link targets (notes or attachments), one per target file, in first-reference order.
    pub linked_basenames: Vec<String>,
}

/// Error type for [`NoteSource`] (simple boxed error, like any store backend may raise)
pub type NoteSourceError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for reading every note out of a document store.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// Collect all notes, ordered deterministically.
    async fn collect_notes(&self) -> Result<Vec<Note>, NoteSourceError>;
}
