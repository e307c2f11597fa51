//! Periodic maintenance: output retention, session expiry, throughput
//! recalibration.
//!
//! Each task runs on its own spawned loop at a fixed cadence, independent of
//! job workers and of the other tasks. A failed run is logged and the loop
//! carries on; maintenance must never take the process down.

use chrono::{Duration as ChronoDuration, Utc};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::app::App;
use crate::jobs::estimate::recalibrate_throughput;
use crate::store::{Datastore as _, StoreError};

/// Artifacts older than this are swept from the output store.
pub const OUTPUT_RETENTION_SECS: u64 = 86_400;
/// Sessions unused for this long are expired.
pub const SESSION_MAX_AGE_DAYS: i64 = 90;

const OUTPUT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(86_400);
const RECALIBRATION_INTERVAL: Duration = Duration::from_secs(86_400);
/// The first recalibration runs shortly after start so the process does not
/// serve the hardcoded default for a whole day.
const RECALIBRATION_INITIAL_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("output store error: {0}")]
    Output(#[from] std::io::Error),
}

type TaskFuture = Pin<Box<dyn Future<Output = Result<(), MaintenanceError>> + Send>>;
type TaskRunner = Arc<dyn Fn(App) -> TaskFuture + Send + Sync>;

/// One fixed-interval maintenance task.
pub struct ScheduledTask {
    pub name: &'static str,
    /// Delay before the first run; every later run follows `interval`.
    pub first_run_after: Duration,
    pub interval: Duration,
    runner: TaskRunner,
}

impl ScheduledTask {
    pub fn new<F, Fut>(
        name: &'static str,
        first_run_after: Duration,
        interval: Duration,
        runner: F,
    ) -> Self
    where
        F: Fn(App) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), MaintenanceError>> + Send + 'static,
    {
        Self {
            name,
            first_run_after,
            interval,
            runner: Arc::new(move |app| Box::pin(runner(app))),
        }
    }
}

/// Scheduler that spawns an independent loop per maintenance task.
pub struct MaintenanceScheduler {
    app: App,
    tasks: Vec<ScheduledTask>,
}

impl MaintenanceScheduler {
    #[must_use]
    pub fn new(app: App, tasks: Vec<ScheduledTask>) -> Self {
        Self { app, tasks }
    }

    /// The three standard tasks: hourly output retention, daily session
    /// expiry, daily throughput recalibration (first run ~10 s after start).
    #[must_use]
    pub fn standard(app: App) -> Self {
        let tasks = vec![
            ScheduledTask::new(
                "cleanup_downloads",
                OUTPUT_SWEEP_INTERVAL,
                OUTPUT_SWEEP_INTERVAL,
                |app: App| async move {
                    let removed =
                        sweep_output_dir(&app.config.output.path, SystemTime::now()).await?;
                    if removed > 0 {
                        info!("removed {removed} expired download(s)");
                    }
                    Ok(())
                },
            ),
            ScheduledTask::new(
                "cleanup_sessions",
                SESSION_SWEEP_INTERVAL,
                SESSION_SWEEP_INTERVAL,
                |app: App| async move {
                    let cutoff = Utc::now() - ChronoDuration::days(SESSION_MAX_AGE_DAYS);
                    let removed = app.store.cleanup_sessions(cutoff).await?;
                    if removed > 0 {
                        info!("removed {removed} expired session(s)");
                    }
                    Ok(())
                },
            ),
            ScheduledTask::new(
                "calculate_average_eta",
                RECALIBRATION_INITIAL_DELAY,
                RECALIBRATION_INTERVAL,
                |app: App| async move {
                    recalibrate_throughput(&app).await?;
                    Ok(())
                },
            ),
        ];

        Self::new(app, tasks)
    }

    /// Spawn every task loop and return their handles. The loops run until
    /// the process exits; the caller may detach or await the handles.
    #[must_use]
    pub fn start(self) -> Vec<JoinHandle<()>> {
        let Self { app, tasks } = self;

        info!("📅 Maintenance scheduler started with {} task(s)", tasks.len());

        // The retention task needs the output directory to exist
        let output_path = app.config.output.path.clone();
        if let Err(e) = std::fs::create_dir_all(&output_path) {
            warn!("could not create output directory {output_path:?}: {e}");
        }

        tasks
            .into_iter()
            .map(|task| {
                let app = app.clone();
                tokio::spawn(async move {
                    run_scheduled_task(task, app).await;
                })
            })
            .collect()
    }
}

/// Run a single maintenance task in its own loop.
async fn run_scheduled_task(task: ScheduledTask, app: App) {
    debug!("📅 Starting maintenance loop for '{}'", task.name);

    sleep(task.first_run_after).await;
    loop {
        match (task.runner)(app.clone()).await {
            Ok(()) => debug!("📅 Maintenance task '{}' completed", task.name),
            Err(e) => error!("❌ Maintenance task '{}' failed: {e}", task.name),
        }
        sleep(task.interval).await;
    }
}

/// Delete artifacts older than [`OUTPUT_RETENTION_SECS`] from the output
/// store.
///
/// Best-effort per file: an unreadable or undeletable entry is logged and
/// skipped, never aborting the sweep. Only files strictly older than the
/// threshold go, which keeps the sweep away from any artifact a running job
/// could plausibly still be writing.
pub async fn sweep_output_dir(dir: &Path, now: SystemTime) -> Result<usize, std::io::Error> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let modified = match entry.metadata().await.and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!("skipping {path:?}: could not read mtime: {e}");
                continue;
            }
        };

        // A file with an mtime in the future counts as age zero
        let age = now.duration_since(modified).unwrap_or_default();
        if age.as_secs() > OUTPUT_RETENTION_SECS {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("removed expired download {path:?}");
                    removed += 1;
                }
                Err(e) => warn!("could not remove {path:?}: {e}"),
            }
        }
    }

    Ok(removed)
}
