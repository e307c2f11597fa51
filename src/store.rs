//! Records and the CRUD contract exposed by the persistent store.
//!
//! The orchestration core never owns schema or queries; it talks to whatever
//! implements [`Datastore`]. Records are read for at most one request's
//! lifetime and never cached.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::token::SessionCookie;

pub mod memory;

/// Lifecycle state of an archive job.
///
/// `Ongoing` is the only non-terminal state. Transitions are monotonic:
/// `ongoing` may move to exactly one of the terminal states and a terminal
/// state is write-once; store implementations must refuse anything else.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    /// The worker is still running (or has not reported yet).
    #[default]
    Ongoing,
    /// The archive file was produced and is ready for download.
    Success,
    /// The worker gave up; `failure_reason` says why.
    Failure,
    /// No such job is known to the store.
    NotFound,
}

impl JobStatus {
    /// Terminal states never transition again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// Why a job ended in `failure`, as recorded by the worker.
///
/// The wire strings are fixed; the status payload's human-readable messages
/// are derived from these via a lookup table in `jobs::status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    SubmissionNotFound,
    BadAuthentication,
    BadUrl,
    BadPermissions,
    Unknown,
}

/// One archive request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: String,
    pub submission_id: String,
    pub requester_cookie: SessionCookie,
    pub status: JobStatus,
    pub failure_reason: Option<FailureReason>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub nb_replies: Option<u32>,
    pub filename: Option<String>,
}

/// One browser session and (once the OAuth flow completed) its Reddit grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub cookie: SessionCookie,
    pub refresh_token: Option<String>,
    pub last_used_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A session without a refresh token may only reach the authentication
    /// flow; it can never create a job.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.refresh_token.is_some()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} does not exist")]
    JobNotFound(String),
    #[error("datastore backend error: {0}")]
    Backend(String),
}

/// CRUD contract implemented by the persistent store collaborator.
///
/// Status writes go through [`Datastore::set_job_status`], which must enforce
/// the monotonic transition invariant: once a job has reached a terminal
/// status, further writes are ignored.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Insert a fresh job with `status = ongoing` and `started_at = now`.
    async fn create_job(
        &self,
        id: &str,
        submission_id: &str,
        cookie: &SessionCookie,
    ) -> Result<(), StoreError>;

    async fn read_job(&self, id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Transition a job to a terminal status, recording the failure reason
    /// and/or artifact filename. Writes against an already-terminal job are
    /// dropped, keeping terminal states write-once.
    async fn set_job_status(
        &self,
        id: &str,
        status: JobStatus,
        failure_reason: Option<FailureReason>,
        filename: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Record the thread size as soon as the worker discovers it, so that ETA
    /// estimation can start before the job completes.
    async fn set_reply_count(&self, id: &str, nb_replies: u32) -> Result<(), StoreError>;

    /// Register a brand-new, unauthenticated session.
    async fn create_session(&self, cookie: &SessionCookie) -> Result<(), StoreError>;

    /// Look up a session, refreshing its `last_used_at` as a side effect.
    async fn read_session(
        &self,
        cookie: &SessionCookie,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Persist a refresh token against a session, creating the session if the
    /// callback arrived before the session row did.
    async fn create_token(
        &self,
        cookie: &SessionCookie,
        refresh_token: &str,
    ) -> Result<(), StoreError>;

    /// Delete sessions not used since `older_than`; returns how many went.
    async fn cleanup_sessions(&self, older_than: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Mean throughput over completed successful jobs, in the unit the ETA
    /// formula expects (`nb_replies / average` = estimated total seconds).
    /// `None` when there is no usable history yet.
    async fn average_throughput(&self) -> Result<Option<f64>, StoreError>;
}
