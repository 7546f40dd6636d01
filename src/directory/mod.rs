use crate::error::GitHookError;
use crate::hooks::Repository;
use async_trait::async_trait;
use dashmap::DashMap;

/// Looks repositories up for the hook dispatcher.
///
/// `Ok(None)` means the repository does not exist, `Err` that the lookup
/// itself failed.
#[async_trait]
pub trait RepositoryDirectory: Send + Sync + 'static {
    async fn resolve(&self, repo_type: &str, name: &str) -> Result<Option<Repository>, GitHookError>;
    async fn resolve_id(&self, id: &str) -> Result<Option<Repository>, GitHookError>;
}

/// In-process directory, filled at startup.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    by_id: DashMap<String, Repository>,
    by_name: DashMap<(String, String), String>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any repository with the same id, and evicts the repository
    /// that held the same (type, name) under another id.
    pub fn insert(&self, repository: Repository) {
        let id = repository.id.clone();
        if let Some(previous) = self.by_id.insert(id.clone(), repository.clone()) {
            self.by_name
                .remove_if(&(previous.repo_type, previous.name), |_, owner| *owner == id);
        }
        if let Some(owner) = self
            .by_name
            .insert((repository.repo_type, repository.name), id.clone())
        {
            if owner != id {
                self.by_id.remove(&owner);
            }
        }
    }

    pub fn remove(&self, id: &str) -> Option<Repository> {
        let (_, repository) = self.by_id.remove(id)?;
        self.by_name.remove_if(
            &(repository.repo_type.clone(), repository.name.clone()),
            |_, owner| owner == id,
        );
        Some(repository)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait]
impl RepositoryDirectory for MemoryDirectory {
    async fn resolve(&self, repo_type: &str, name: &str) -> Result<Option<Repository>, GitHookError> {
        let key = (repo_type.to_string(), name.to_string());
        let Some(id) = self.by_name.get(&key).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        Ok(self.by_id.get(&id).map(|repo| repo.value().clone()))
    }

    async fn resolve_id(&self, id: &str) -> Result<Option<Repository>, GitHookError> {
        Ok(self.by_id.get(id).map(|repo| repo.value().clone()))
    }
}
