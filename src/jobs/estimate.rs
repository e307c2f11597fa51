//! Remaining-time estimation from historical throughput.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::app::App;
use crate::store::{Datastore as _, StoreError};

/// Fallback throughput when no job history exists yet.
pub const DEFAULT_AVERAGE: f64 = 30.0;

/// Process-wide throughput scalar shared between every status poll (readers)
/// and the periodic recalibration task (the single writer).
///
/// Stored as `f64` bits in an atomic so readers always observe a consistent
/// snapshot without taking a lock on the polling path.
#[derive(Clone, Debug)]
pub struct Throughput(Arc<AtomicU64>);

impl Throughput {
    #[must_use]
    pub fn new(initial: f64) -> Self {
        Self(Arc::new(AtomicU64::new(initial.to_bits())))
    }

    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new(DEFAULT_AVERAGE)
    }
}

/// Human-readable remaining-time estimate for a running job.
///
/// `None` until the worker has reported the thread size. The formula is
/// `estimated_total_seconds = nb_replies / average`, with `average` being the
/// recalibrated historical throughput; it is deliberately not inverted.
#[must_use]
pub fn remaining_time_message(
    started_at: DateTime<Utc>,
    nb_replies: Option<u32>,
    average: f64,
) -> Option<String> {
    remaining_time_message_at(Utc::now(), started_at, nb_replies, average)
}

fn remaining_time_message_at(
    now: DateTime<Utc>,
    started_at: DateTime<Utc>,
    nb_replies: Option<u32>,
    average: f64,
) -> Option<String> {
    let nb_replies = nb_replies?;

    let elapsed = (now - started_at).num_milliseconds() as f64 / 1000.0;
    let estimated_total = f64::from(nb_replies) / average;
    let remaining = (estimated_total - elapsed) as i64;

    let message = if remaining < 0 {
        "It seems that the retrieval is taking a bit more time than expected. Please stand by..."
            .to_string()
    } else if remaining < 10 {
        "Estimated remaining time: less than 10 seconds".to_string()
    } else if remaining < 60 {
        format!("Estimated remaining time: {remaining} seconds")
    } else {
        let (m, s) = (remaining / 60, remaining % 60);
        format!("Estimated remaining time: {m} minutes, {s} seconds")
    };

    Some(message)
}

/// Recompute the shared throughput scalar from job history.
///
/// Run on a fixed schedule by the maintenance scheduler. With no usable
/// history the scalar falls back to [`DEFAULT_AVERAGE`] rather than going
/// stale or unset.
pub async fn recalibrate_throughput(app: &App) -> Result<(), StoreError> {
    match app.store.average_throughput().await? {
        Some(average) => {
            app.throughput.set(average);
            info!("new throughput average calculated: {average:.2}");
        }
        None => {
            app.throughput.set(DEFAULT_AVERAGE);
            info!("cannot calculate average, default value of {DEFAULT_AVERAGE} is going to be taken");
        }
    }
    Ok(())
}
