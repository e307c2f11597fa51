//! Job creation and the detached worker lifecycle.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::app::App;
use crate::jobs::archiver::{ArchiveOutcome, JobProgress};
use crate::store::{Datastore as _, FailureReason, JobStatus, StoreError};
use crate::submission::extract_submission_id;
use crate::token::{generate_job_id, SessionCookie};

#[derive(Debug, Error)]
pub enum CreateJobError {
    /// The submission reference could not be parsed into an id. Synchronous
    /// precondition failure; no job record is created.
    #[error("the provided link is not a valid Reddit submission")]
    InvalidInput,
    /// The session has no Reddit grant yet and may only reach the
    /// authentication flow.
    #[error("the session has not authorized Reddit access")]
    Unauthenticated,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for CreateJobError {
    fn into_response(self) -> Response {
        let code = match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (code, self.to_string()).into_response()
    }
}

/// Create an archive job and dispatch its worker.
///
/// Validates the submission reference, writes the `ongoing` job record and
/// spawns a detached worker task, then returns the job id immediately so the
/// caller can start polling. The caller never waits on the worker; everything
/// that happens after the spawn is only observable through job state.
pub async fn create_job(
    app: &App,
    submission_input: &str,
    cookie: &SessionCookie,
) -> Result<String, CreateJobError> {
    let Some(submission_id) = extract_submission_id(submission_input) else {
        warn!("URL not valid ({submission_input})");
        return Err(CreateJobError::InvalidInput);
    };

    let session = app
        .store
        .read_session(cookie)
        .await?
        .ok_or(CreateJobError::Unauthenticated)?;
    let Some(refresh_token) = session.refresh_token else {
        return Err(CreateJobError::Unauthenticated);
    };

    let job_id = generate_job_id();
    app.store
        .create_job(&job_id, &submission_id, cookie)
        .await?;

    info!("{job_id}: job starting (submission {submission_id})");
    spawn_worker(app.clone(), job_id.clone(), submission_id, refresh_token);

    Ok(job_id)
}

/// Dispatch the fire-and-forget worker for one job.
///
/// The archiver runs on its own inner task so that even a panic surfaces here
/// as a `JoinError` instead of escaping; every failure mode collapses into a
/// single terminal status write. There is no admission control: one task per
/// job, unbounded. This is a known scalability limit.
fn spawn_worker(app: App, job_id: String, submission_id: String, refresh_token: String) {
    tokio::spawn(async move {
        let progress = JobProgress::new(job_id.clone(), app.store.clone());
        let archiver = app.archiver.clone();

        let handle = tokio::spawn(async move {
            archiver
                .run(&submission_id, &refresh_token, &progress)
                .await
        });

        let outcome = match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                error!("{job_id}: worker crashed: {join_error}");
                Err(FailureReason::Unknown)
            }
        };

        finish_job(&app, &job_id, outcome).await;
    });
}

/// Perform the single terminal status write for a finished worker.
async fn finish_job(app: &App, job_id: &str, outcome: Result<ArchiveOutcome, FailureReason>) {
    let write = match outcome {
        Ok(outcome) => {
            if let Some(nb_replies) = outcome.nb_replies {
                if let Err(e) = app.store.set_reply_count(job_id, nb_replies).await {
                    warn!("{job_id}: could not record final reply count: {e}");
                }
            }
            info!("{job_id}: job completed ({})", outcome.filename);
            app.store
                .set_job_status(job_id, JobStatus::Success, None, Some(&outcome.filename))
                .await
        }
        Err(reason) => {
            error!("{job_id}: job failed ({reason})");
            app.store
                .set_job_status(job_id, JobStatus::Failure, Some(reason), None)
                .await
        }
    };

    // Nothing left to propagate to from a detached worker
    if let Err(e) = write {
        error!("{job_id}: could not record terminal status: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::{authenticated_cookie, test_app, wait_for_terminal, MockArchiver};

    const SUBMISSION_URL: &str = "https://www.reddit.com/r/rust/comments/1abc23/title/";

    #[tokio::test]
    async fn create_job_returns_unique_ids_and_stores_ongoing_jobs() {
        let app = test_app(MockArchiver::hanging());
        let cookie = authenticated_cookie(&app).await;

        let first = create_job(&app, SUBMISSION_URL, &cookie).await.unwrap();
        let second = create_job(&app, SUBMISSION_URL, &cookie).await.unwrap();

        assert_ne!(first, second);
        for id in [&first, &second] {
            let job = app.store.read_job(id).await.unwrap().unwrap();
            assert_eq!(job.status, JobStatus::Ongoing);
            assert_eq!(job.submission_id, "1abc23");
            assert_eq!(job.requester_cookie, cookie);
        }
    }

    #[tokio::test]
    async fn invalid_input_creates_no_job() {
        let (app, memory) = crate::tests::support::test_app_with_store(MockArchiver::hanging());
        let cookie = authenticated_cookie(&app).await;

        for input in ["", "https://example.com/comments/1abc23", "!!not-an-id!!"] {
            let result = create_job(&app, input, &cookie).await;
            assert!(matches!(result, Err(CreateJobError::InvalidInput)));
        }
        assert_eq!(memory.job_count(), 0);
    }

    #[tokio::test]
    async fn unauthenticated_session_cannot_create_a_job() {
        let app = test_app(MockArchiver::hanging());

        // Unknown session
        let unknown = SessionCookie::new("never-seen");
        let result = create_job(&app, SUBMISSION_URL, &unknown).await;
        assert!(matches!(result, Err(CreateJobError::Unauthenticated)));

        // Known session without a refresh token
        let cookie = SessionCookie::new("no-grant");
        app.store.create_session(&cookie).await.unwrap();
        let result = create_job(&app, SUBMISSION_URL, &cookie).await;
        assert!(matches!(result, Err(CreateJobError::Unauthenticated)));
    }

    #[tokio::test]
    async fn successful_worker_records_success_and_filename() {
        let app = test_app(MockArchiver::succeeding("1abc23-thread.html", Some(250)));
        let cookie = authenticated_cookie(&app).await;

        let job_id = create_job(&app, SUBMISSION_URL, &cookie).await.unwrap();
        let job = wait_for_terminal(&app, &job_id).await;

        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(job.filename.as_deref(), Some("1abc23-thread.html"));
        assert_eq!(job.nb_replies, Some(250));
        assert!(job.finished_at.is_some());
    }

    #[tokio::test]
    async fn failing_worker_records_the_failure_reason() {
        let app = test_app(MockArchiver::failing(FailureReason::SubmissionNotFound));
        let cookie = authenticated_cookie(&app).await;

        let job_id = create_job(&app, SUBMISSION_URL, &cookie).await.unwrap();
        let job = wait_for_terminal(&app, &job_id).await;

        assert_eq!(job.status, JobStatus::Failure);
        assert_eq!(job.failure_reason, Some(FailureReason::SubmissionNotFound));
        assert!(job.filename.is_none());
    }

    #[tokio::test]
    async fn panicking_worker_is_recorded_as_unknown_failure() {
        let app = test_app(MockArchiver::panicking());
        let cookie = authenticated_cookie(&app).await;

        let job_id = create_job(&app, SUBMISSION_URL, &cookie).await.unwrap();
        let job = wait_for_terminal(&app, &job_id).await;

        assert_eq!(job.status, JobStatus::Failure);
        assert_eq!(job.failure_reason, Some(FailureReason::Unknown));
    }
}
