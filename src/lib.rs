pub mod error;

pub mod admission;
pub mod auth;
pub mod branch;
pub mod config;
pub mod directory;
pub mod hooks;
pub mod http;
pub mod logs;

pub use admission::{RequestDescriptor, RuleSet};
pub use branch::{BranchClassification, ChangeType, RefUpdateCommand, classify};
pub use directory::{MemoryDirectory, RepositoryDirectory};
pub use error::GitHookError;
pub use hooks::{Changeset, HookDispatcher, HookListener, HookRegistry, Repository};
