//! Contract with the archiver collaborator.
//!
//! The archiver is the component that actually walks the Reddit comment tree
//! and writes the output file; its internals live outside this crate. It is
//! invoked exactly once per job, on its own task, and reports back through a
//! typed result rather than by writing job state itself — the orchestrator
//! performs the single terminal status write.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::store::{Datastore, FailureReason};

/// What a successful archive run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Artifact name in the output store, served back to the user on download.
    pub filename: String,
    /// Final reply count, if the run had it at completion time.
    pub nb_replies: Option<u32>,
}

/// Handle the archiver uses to publish progress while a job is running.
///
/// The only progress signal the core cares about is the thread size: once
/// recorded, every status poll can compute a remaining-time estimate. Publish
/// failures are logged and swallowed; losing an ETA must never fail a job.
pub struct JobProgress {
    job_id: String,
    store: Arc<dyn Datastore>,
}

impl JobProgress {
    #[must_use]
    pub fn new(job_id: String, store: Arc<dyn Datastore>) -> Self {
        Self { job_id, store }
    }

    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Record the number of replies as soon as the archiver knows it.
    pub async fn record_reply_count(&self, nb_replies: u32) {
        if let Err(e) = self.store.set_reply_count(&self.job_id, nb_replies).await {
            warn!("{}: could not record reply count: {e}", self.job_id);
        }
    }
}

/// Entry point of the archiver collaborator.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Retrieve `submission_id` on behalf of the user owning `refresh_token`
    /// and write the archive artifact.
    ///
    /// Implementations should call [`JobProgress::record_reply_count`] as soon
    /// as the thread size is known, ideally well before completion.
    async fn run(
        &self,
        submission_id: &str,
        refresh_token: &str,
        progress: &JobProgress,
    ) -> Result<ArchiveOutcome, FailureReason>;
}
