use std::fmt;
use std::sync::Arc;

use crate::auth::identity::IdentityProvider;
use crate::config::{Config, Environment};
use crate::jobs::archiver::Archiver;
use crate::jobs::estimate::Throughput;
use crate::store::Datastore;

/// Shared application state handed to workers, maintenance tasks and the
/// external HTTP layer.
///
/// Cheap to clone: the collaborators sit behind `Arc` and the throughput
/// scalar is a shared atomic snapshot.
#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub environment: Environment,
    pub store: Arc<dyn Datastore>,
    pub archiver: Arc<dyn Archiver>,
    pub identity: Arc<dyn IdentityProvider>,
    pub throughput: Throughput,
}

impl App {
    #[must_use]
    pub fn new(
        config: Config,
        environment: Environment,
        store: Arc<dyn Datastore>,
        archiver: Arc<dyn Archiver>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let throughput = Throughput::new(config.runtime.default_average);
        Self {
            config,
            environment,
            store,
            archiver,
            identity,
            throughput,
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("environment", &self.environment)
            .field("throughput", &self.throughput)
            .finish_non_exhaustive()
    }
}
