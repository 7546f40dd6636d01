//! Post-receive notification.
//!
//! Listeners are registered once at startup (and removed at teardown) in a
//! shared [`HookRegistry`]. After the storage engine has committed a push the
//! [`HookDispatcher`] hands the repository and the pushed changesets to every
//! registered listener.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{DispatchReport, HookDispatcher};
pub use registry::HookRegistry;

#[derive(Deserialize, Serialize, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Repository {
    pub id: String,
    pub repo_type: String,
    pub name: String,
}

impl Repository {
    pub fn new(id: impl Into<String>, repo_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            repo_type: repo_type.into(),
            name: name.into(),
        }
    }

    /// A repository with a freshly generated id.
    pub fn create(repo_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), repo_type, name)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Eq, PartialEq)]
pub struct Changeset {
    pub id: String,
    pub author: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub branches: Vec<String>,
}

pub trait HookListener: Send + Sync {
    /// Called once per committed push. Runs on the pushing request's thread.
    fn on_post_receive(&self, repository: &Repository, changesets: &[Changeset]) -> anyhow::Result<()>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> HookListener for F
where
    F: Fn(&Repository, &[Changeset]) -> anyhow::Result<()> + Send + Sync,
{
    fn on_post_receive(&self, repository: &Repository, changesets: &[Changeset]) -> anyhow::Result<()> {
        (self)(repository, changesets)
    }
}

/// Logs every push it is notified about.
#[derive(Debug, Default)]
pub struct LoggingListener;

impl HookListener for LoggingListener {
    fn on_post_receive(&self, repository: &Repository, changesets: &[Changeset]) -> anyhow::Result<()> {
        tracing::info!(
            repository = %repository.name,
            repo_type = %repository.repo_type,
            changesets = changesets.len(),
            "post-receive"
        );
        for changeset in changesets {
            tracing::debug!(id = %changeset.id, author = %changeset.author, "received changeset");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "logging"
    }
}
