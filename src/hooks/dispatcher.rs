use crate::directory::RepositoryDirectory;
use crate::error::{GitHookError, ListenerFailure, ListenerFailures, RepositoryLookup};
use crate::hooks::{Changeset, HookRegistry, Repository};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{info, info_span, warn};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DispatchReport {
    pub invoked: usize,
}

/// Fires post-receive events for pushes the storage engine has committed.
///
/// Never call any `fire` variant for a push that was rejected: listeners must
/// only observe committed refs.
#[derive(Clone)]
pub struct HookDispatcher {
    registry: Arc<HookRegistry>,
    directory: Arc<dyn RepositoryDirectory>,
}

impl HookDispatcher {
    pub fn new(registry: Arc<HookRegistry>, directory: Arc<dyn RepositoryDirectory>) -> Self {
        Self {
            registry,
            directory,
        }
    }

    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// Runs every registered listener in registration order on the calling thread.
    ///
    /// A failing or panicking listener does not stop the pass. All failures are
    /// returned together as [`GitHookError::Listeners`] once every listener has run.
    pub fn fire(
        &self,
        repository: &Repository,
        changesets: &[Changeset],
    ) -> Result<DispatchReport, GitHookError> {
        let span = info_span!("post_receive", repository = %repository.name, repo_type = %repository.repo_type);
        let _enter = span.enter();

        let listeners = self.registry.snapshot();
        let mut failures = Vec::new();
        for listener in &listeners {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                listener.on_post_receive(repository, changesets)
            }));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{:#}", err),
                Err(panic) => panic_message(panic.as_ref()),
            };
            warn!("post-receive listener {} failed: {}", listener.name(), message);
            failures.push(ListenerFailure {
                listener: listener.name().to_string(),
                message,
            });
        }

        let invoked = listeners.len();
        info!(
            listeners = invoked,
            failed = failures.len(),
            changesets = changesets.len(),
            "post-receive dispatched"
        );
        if failures.is_empty() {
            Ok(DispatchReport { invoked })
        } else {
            Err(GitHookError::Listeners(ListenerFailures {
                repository: format!("{}/{}", repository.repo_type, repository.name),
                invoked,
                failures,
            }))
        }
    }

    /// Resolves the repository by type and name, then behaves like [`fire`](Self::fire).
    pub async fn fire_by_name(
        &self,
        repo_type: &str,
        name: &str,
        changesets: &[Changeset],
    ) -> Result<DispatchReport, GitHookError> {
        let repository = self
            .directory
            .resolve(repo_type, name)
            .await?
            .ok_or_else(|| {
                GitHookError::RepositoryNotFound(RepositoryLookup::Name {
                    repo_type: repo_type.to_string(),
                    name: name.to_string(),
                })
            })?;
        self.fire(&repository, changesets)
    }

    /// Resolves the repository by id, then behaves like [`fire`](Self::fire).
    pub async fn fire_by_id(
        &self,
        id: &str,
        changesets: &[Changeset],
    ) -> Result<DispatchReport, GitHookError> {
        let repository = self
            .directory
            .resolve_id(id)
            .await?
            .ok_or_else(|| GitHookError::RepositoryNotFound(RepositoryLookup::Id(id.to_string())))?;
        self.fire(&repository, changesets)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
