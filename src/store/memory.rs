//! In-memory [`Datastore`] implementation.
//!
//! Backs the test suite and small single-process deployments that can afford
//! to lose job history on restart. All invariants the trait documents are
//! enforced here: monotonic status transitions, `last_used_at` refresh on
//! session reads, and `finished_at` stamping on terminal writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::warn;

use crate::store::{Datastore, FailureReason, JobRecord, JobStatus, SessionRecord, StoreError};
use crate::token::SessionCookie;

#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: DashMap<String, JobRecord>,
    sessions: DashMap<String, SessionRecord>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of job records currently held.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn create_job(
        &self,
        id: &str,
        submission_id: &str,
        cookie: &SessionCookie,
    ) -> Result<(), StoreError> {
        self.jobs.insert(
            id.to_string(),
            JobRecord {
                id: id.to_string(),
                submission_id: submission_id.to_string(),
                requester_cookie: cookie.clone(),
                status: JobStatus::Ongoing,
                failure_reason: None,
                started_at: Utc::now(),
                finished_at: None,
                nb_replies: None,
                filename: None,
            },
        );
        Ok(())
    }

    async fn read_job(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.get(id).map(|entry| entry.clone()))
    }

    async fn set_job_status(
        &self,
        id: &str,
        status: JobStatus,
        failure_reason: Option<FailureReason>,
        filename: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut job = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;

        if job.status.is_terminal() {
            warn!(
                "{id}: dropping status write {status}, job already terminal ({})",
                job.status
            );
            return Ok(());
        }

        job.status = status;
        job.failure_reason = failure_reason;
        if let Some(filename) = filename {
            job.filename = Some(filename.to_string());
        }
        if status.is_terminal() {
            job.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn set_reply_count(&self, id: &str, nb_replies: u32) -> Result<(), StoreError> {
        let mut job = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        job.nb_replies = Some(nb_replies);
        Ok(())
    }

    async fn create_session(&self, cookie: &SessionCookie) -> Result<(), StoreError> {
        self.sessions
            .entry(cookie.as_str().to_string())
            .or_insert_with(|| SessionRecord {
                cookie: cookie.clone(),
                refresh_token: None,
                last_used_at: Utc::now(),
            });
        Ok(())
    }

    async fn read_session(
        &self,
        cookie: &SessionCookie,
    ) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.get_mut(cookie.as_str()).map(|mut entry| {
            entry.last_used_at = Utc::now();
            entry.clone()
        }))
    }

    async fn create_token(
        &self,
        cookie: &SessionCookie,
        refresh_token: &str,
    ) -> Result<(), StoreError> {
        let mut session = self
            .sessions
            .entry(cookie.as_str().to_string())
            .or_insert_with(|| SessionRecord {
                cookie: cookie.clone(),
                refresh_token: None,
                last_used_at: Utc::now(),
            });
        session.refresh_token = Some(refresh_token.to_string());
        session.last_used_at = Utc::now();
        Ok(())
    }

    async fn cleanup_sessions(&self, older_than: DateTime<Utc>) -> Result<u64, StoreError> {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_used_at >= older_than);
        Ok((before - self.sessions.len()) as u64)
    }

    async fn average_throughput(&self) -> Result<Option<f64>, StoreError> {
        let mut samples = Vec::new();
        for entry in self.jobs.iter() {
            let job = entry.value();
            let (Some(finished_at), Some(nb_replies)) = (job.finished_at, job.nb_replies) else {
                continue;
            };
            if job.status != JobStatus::Success || nb_replies == 0 {
                continue;
            }
            let duration_secs =
                (finished_at - job.started_at).num_milliseconds() as f64 / 1000.0;
            if duration_secs > 0.0 {
                samples.push(f64::from(nb_replies) / duration_secs);
            }
        }

        if samples.is_empty() {
            Ok(None)
        } else {
            Ok(Some(samples.iter().sum::<f64>() / samples.len() as f64))
        }
    }
}
