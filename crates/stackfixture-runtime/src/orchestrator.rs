//! Drives environment injection, setup, the test body, and teardown.
//!
//! Kinds are set up in registry order and torn down in the same order. A
//! failed setup aborts immediately and earlier kinds are left in place.

use std::panic::{self, AssertUnwindSafe};

use stackfixture_common::constants::DEFAULT_REGION;
use stackfixture_common::error::Result;
use stackfixture_common::types::ResourceKind;
use stackfixture_document::session::Session;
use stackfixture_mock::MockCloud;

use crate::env;
use crate::handlers::{REGISTRY, ResourceHandler};

/// Runs the fixture lifecycle for one test against one [`MockCloud`].
#[derive(Debug)]
pub struct Orchestrator<'s> {
    session: &'s Session,
    cloud: MockCloud,
}

impl<'s> Orchestrator<'s> {
    /// Binds a session to a set of mocked services.
    #[must_use]
    pub const fn new(session: &'s Session, cloud: MockCloud) -> Self {
        Self { session, cloud }
    }

    /// Binds a session to fresh services in the document's region.
    #[must_use]
    pub fn for_session(session: &'s Session) -> Self {
        let region = session
            .document()
            .provider_region()
            .unwrap_or(DEFAULT_REGION);
        Self::new(session, MockCloud::new(region))
    }

    /// The mocked services resources are created in.
    #[must_use]
    pub const fn cloud(&self) -> &MockCloud {
        &self.cloud
    }

    /// Applies the environment and sets up every declared kind.
    ///
    /// The returned fixture tears down when [`ActiveFixture::teardown`] is
    /// called or, failing that, when it is dropped.
    ///
    /// # Errors
    ///
    /// Returns the first setup error. Kinds already set up are not torn
    /// down.
    pub fn setup(&self) -> Result<ActiveFixture> {
        if self.session.config().apply_environment {
            let applied = env::apply_environment(self.session.document());
            tracing::debug!(count = applied.len(), "environment applied");
        }
        let mut groups = self.session.resource_groups();
        let mut handlers = Vec::with_capacity(groups.len());
        for (kind, factory) in REGISTRY {
            let Some(definitions) = groups.remove(*kind) else {
                continue;
            };
            let count = definitions.len();
            let mut handler = factory(definitions, &self.cloud);
            handler.setup().inspect_err(|e| {
                tracing::error!(%kind, error = %e, "setup failed, aborting");
            })?;
            tracing::info!(%kind, count, "resources set up");
            handlers.push(handler);
        }
        Ok(ActiveFixture {
            handlers,
            cloud: self.cloud.clone(),
            finished: false,
        })
    }

    /// Sets up, runs `body`, then tears down.
    ///
    /// Teardown runs even if `body` panics; the panic resumes afterwards.
    ///
    /// # Errors
    ///
    /// Returns a setup error (the body is not run), or the first teardown
    /// error after the body returned.
    pub fn run<T>(&self, body: impl FnOnce(&MockCloud) -> T) -> Result<T> {
        let fixture = self.setup()?;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(fixture.cloud())));
        let teardown = fixture.teardown();
        match outcome {
            Ok(value) => teardown.map(|()| value),
            Err(payload) => {
                if let Err(e) = teardown {
                    tracing::error!(error = %e, "teardown failed after test body panicked");
                }
                panic::resume_unwind(payload)
            }
        }
    }
}

/// Resources that are set up and awaiting teardown.
pub struct ActiveFixture {
    handlers: Vec<Box<dyn ResourceHandler>>,
    cloud: MockCloud,
    finished: bool,
}

impl std::fmt::Debug for ActiveFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveFixture")
            .field("kinds", &self.kinds())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ActiveFixture {
    /// The mocked services the resources live in.
    #[must_use]
    pub const fn cloud(&self) -> &MockCloud {
        &self.cloud
    }

    /// Kinds that were set up, in setup order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ResourceKind> {
        self.handlers.iter().map(|h| h.kind()).collect()
    }

    /// Tears down every kind in setup order.
    ///
    /// # Errors
    ///
    /// Returns the first teardown error; later kinds are still torn down.
    pub fn teardown(mut self) -> Result<()> {
        self.teardown_all()
    }

    fn teardown_all(&mut self) -> Result<()> {
        self.finished = true;
        let mut first = None;
        for handler in &mut self.handlers {
            let kind = handler.kind();
            match handler.teardown() {
                Ok(()) => tracing::info!(%kind, "resources torn down"),
                Err(e) => {
                    tracing::warn!(%kind, error = %e, "teardown failed");
                    let _ = first.get_or_insert(e);
                }
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl Drop for ActiveFixture {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.teardown_all() {
            tracing::error!(error = %e, "teardown on drop failed");
        }
    }
}
