//! Job status reporting for the polling caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::app::App;
use crate::jobs::estimate::remaining_time_message;
use crate::store::{Datastore as _, FailureReason, JobStatus, StoreError};

/// Serialized body of a status poll.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusPayload {
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub eta: Option<String>,
}

/// Result of a status poll: an HTTP-equivalent code plus the payload.
///
/// `409` while the job is still processing, `200` on success, `404` for
/// failed or unknown jobs. Implements `IntoResponse` so the external HTTP
/// layer can return it as-is.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub code: StatusCode,
    pub payload: StatusPayload,
}

impl IntoResponse for StatusReport {
    fn into_response(self) -> Response {
        (self.code, Json(self.payload)).into_response()
    }
}

/// Report the current state of a job.
///
/// A pure read: safe to call concurrently and repeatedly, and once a terminal
/// status has been observed every later call reports the same thing. Unknown
/// job ids report `notfound`, never `ongoing`.
pub async fn job_status(app: &App, job_id: &str) -> Result<StatusReport, StoreError> {
    let Some(job) = app.store.read_job(job_id).await? else {
        return Ok(StatusReport {
            code: StatusCode::NOT_FOUND,
            payload: StatusPayload {
                status: JobStatus::NotFound,
                error_message: None,
                eta: None,
            },
        });
    };

    let code = match job.status {
        JobStatus::Ongoing => StatusCode::CONFLICT,
        JobStatus::Success => StatusCode::OK,
        JobStatus::Failure | JobStatus::NotFound => StatusCode::NOT_FOUND,
    };

    Ok(StatusReport {
        code,
        payload: StatusPayload {
            status: job.status,
            error_message: job
                .failure_reason
                .map(|reason| failure_message(reason, &app.config.app.project)),
            eta: remaining_time_message(job.started_at, job.nb_replies, app.throughput.get()),
        },
    })
}

/// Artifact filename of a finished job, for the download endpoint.
pub async fn job_filename(app: &App, job_id: &str) -> Result<Option<String>, StoreError> {
    Ok(app
        .store
        .read_job(job_id)
        .await?
        .and_then(|job| job.filename))
}

/// Fixed lookup table from failure reason to user-facing message.
///
/// `project_url` points at the issue tracker and is linked from the messages
/// where the user cannot fix the problem themselves.
#[must_use]
pub fn failure_message(reason: FailureReason, project_url: &str) -> String {
    match reason {
        FailureReason::SubmissionNotFound => {
            "The submission could not be found. Please check if the submission (still) exists."
                .to_string()
        }
        FailureReason::BadUrl => {
            "The link you provided is not a valid Reddit submission. Please check it and submit it again."
                .to_string()
        }
        FailureReason::BadAuthentication => format!(
            "It looks like your Reddit account does no longer allow this application to read Reddit \
             on its behalf. Please try to allow it again by clicking here. If it still does not work, \
             please <a href=\"{project_url}\" target=\"_blank\">open an issue on the GitHub</a>."
        ),
        FailureReason::BadPermissions | FailureReason::Unknown => format!(
            "Your request cannot be completed because of an issue in the server. Please contact the \
             administrator and tell them to look in the error logs. If you are the administrator and \
             cannot resolve the problem, please <a href=\"{project_url}\" target=\"_blank\">open an \
             issue on the GitHub</a>."
        ),
    }
}
