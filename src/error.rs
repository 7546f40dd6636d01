use std::fmt::{Display, Formatter};

#[derive(Debug, thiserror::Error)]
pub enum GitHookError {
    #[error("repository not found: {0}")]
    RepositoryNotFound(RepositoryLookup),
    #[error("{0}")]
    Listeners(ListenerFailures),
    #[error("repository directory error: {0}")]
    Directory(String),
    #[error("invalid pkt-line: {0}")]
    InvalidPktLine(String),
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// The key a failed repository lookup was made with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryLookup {
    Name { repo_type: String, name: String },
    Id(String),
}

impl Display for RepositoryLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryLookup::Name { repo_type, name } => write!(f, "{}/{}", repo_type, name),
            RepositoryLookup::Id(id) => write!(f, "id {}", id),
        }
    }
}

/// A single listener that failed during a dispatch pass.
#[derive(Debug, Clone)]
pub struct ListenerFailure {
    pub listener: String,
    pub message: String,
}

/// Every failure collected during one dispatch pass.
#[derive(Debug, Clone)]
pub struct ListenerFailures {
    pub repository: String,
    pub invoked: usize,
    pub failures: Vec<ListenerFailure>,
}

impl Display for ListenerFailures {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} post-receive listeners failed for {}",
            self.failures.len(),
            self.invoked,
            self.repository
        )?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.listener, failure.message)?;
        }
        Ok(())
    }
}
