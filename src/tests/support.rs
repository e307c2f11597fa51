//! Shared fixtures: a test [`App`] wired to the in-memory store and mock
//! collaborators that capture their invocations.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::app::App;
use crate::auth::broker::AuthError;
use crate::auth::identity::IdentityProvider;
use crate::config::{
    AppConfig, Config, Environment, OutputConfig, RedditConfig, RuntimeConfig, TracingConfig,
};
use crate::jobs::archiver::{ArchiveOutcome, Archiver, JobProgress};
use crate::store::memory::MemoryStore;
use crate::store::{Datastore, FailureReason, JobRecord};
use crate::token::SessionCookie;

#[must_use]
pub fn test_config() -> Config {
    Config {
        tracing: TracingConfig {
            log_level: "warn".to_string(),
        },
        app: AppConfig {
            url: "https://archiver.example.com".to_string(),
            name: "RedditArchiver".to_string(),
            project: "https://github.com/yourusername/redditarchiver-core".to_string(),
        },
        reddit: RedditConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
        },
        output: OutputConfig::default(),
        runtime: RuntimeConfig::default(),
    }
}

#[must_use]
pub fn test_app(archiver: MockArchiver) -> App {
    let (app, _store) = test_app_with_store(archiver);
    app
}

#[must_use]
pub fn test_app_with_store(archiver: MockArchiver) -> (App, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let app = App::new(
        test_config(),
        Environment::Test,
        store.clone(),
        Arc::new(archiver),
        Arc::new(MockIdentityProvider::succeeding()),
    );
    (app, store)
}

#[must_use]
pub fn test_app_with_identity(
    archiver: MockArchiver,
    identity: MockIdentityProvider,
) -> (App, Arc<MockIdentityProvider>) {
    let identity = Arc::new(identity);
    let app = App::new(
        test_config(),
        Environment::Test,
        Arc::new(MemoryStore::new()),
        Arc::new(archiver),
        identity.clone(),
    );
    (app, identity)
}

/// Create a session holding a refresh token, so it may create jobs.
pub async fn authenticated_cookie(app: &App) -> SessionCookie {
    let cookie = SessionCookie::generate();
    app.store
        .create_token(&cookie, "test-refresh-token")
        .await
        .unwrap();
    cookie
}

/// Poll the store until the job leaves `ongoing` (or panic after ~2 s).
pub async fn wait_for_terminal(app: &App, job_id: &str) -> JobRecord {
    for _ in 0..200 {
        let job = app
            .store
            .read_job(job_id)
            .await
            .unwrap()
            .expect("job record exists");
        if job.status.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached a terminal status");
}

enum MockArchiverBehavior {
    Succeed(ArchiveOutcome),
    Fail(FailureReason),
    Panic,
    Hang,
}

/// Scripted archiver collaborator.
pub struct MockArchiver {
    behavior: MockArchiverBehavior,
}

impl MockArchiver {
    #[must_use]
    pub fn succeeding(filename: &str, nb_replies: Option<u32>) -> Self {
        Self::with_behavior(MockArchiverBehavior::Succeed(ArchiveOutcome {
            filename: filename.to_string(),
            nb_replies,
        }))
    }

    #[must_use]
    pub fn failing(reason: FailureReason) -> Self {
        Self::with_behavior(MockArchiverBehavior::Fail(reason))
    }

    #[must_use]
    pub fn panicking() -> Self {
        Self::with_behavior(MockArchiverBehavior::Panic)
    }

    /// Never finishes; jobs stay `ongoing` for the duration of the test.
    #[must_use]
    pub fn hanging() -> Self {
        Self::with_behavior(MockArchiverBehavior::Hang)
    }

    const fn with_behavior(behavior: MockArchiverBehavior) -> Self {
        Self { behavior }
    }
}

#[async_trait]
impl Archiver for MockArchiver {
    async fn run(
        &self,
        _submission_id: &str,
        _refresh_token: &str,
        progress: &JobProgress,
    ) -> Result<ArchiveOutcome, FailureReason> {
        match &self.behavior {
            MockArchiverBehavior::Succeed(outcome) => {
                if let Some(nb_replies) = outcome.nb_replies {
                    progress.record_reply_count(nb_replies).await;
                }
                Ok(outcome.clone())
            }
            MockArchiverBehavior::Fail(reason) => Err(*reason),
            MockArchiverBehavior::Panic => panic!("scripted archiver panic"),
            MockArchiverBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FailureReason::Unknown)
            }
        }
    }
}

/// Scripted identity provider that counts code exchanges.
pub struct MockIdentityProvider {
    succeed: bool,
    calls: AtomicUsize,
    last_redirect_uri: Mutex<Option<String>>,
}

impl MockIdentityProvider {
    #[must_use]
    pub fn succeeding() -> Self {
        Self {
            succeed: true,
            calls: AtomicUsize::new(0),
            last_redirect_uri: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            succeed: false,
            calls: AtomicUsize::new(0),
            last_redirect_uri: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_redirect_uri(&self) -> Option<String> {
        self.last_redirect_uri.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn exchange_code(&self, _code: &str, redirect_uri: &str) -> Result<String, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_redirect_uri.lock().unwrap() = Some(redirect_uri.to_string());

        if self.succeed {
            Ok("mock-refresh-token".to_string())
        } else {
            Err(AuthError::ExchangeFailed(
                "invalid_grant: the code has expired or been used".to_string(),
            ))
        }
    }
}
