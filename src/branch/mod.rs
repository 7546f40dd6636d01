//! Turns the ref-update commands of a push into created/modified and deleted branch lists.
//!
//! The classification reflects what the push asked for, not whether each
//! update was eventually applied. Commands of type [`ChangeType::Other`] are
//! dropped.

use serde::Serialize;
use tracing::trace;

pub mod command;

pub use command::{ChangeType, RefUpdateCommand, short_branch_name};

#[derive(Serialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct BranchClassification {
    created_or_modified: Vec<String>,
    deleted_or_closed: Vec<String>,
}

impl BranchClassification {
    pub fn created_or_modified(&self) -> &[String] {
        &self.created_or_modified
    }
    pub fn deleted_or_closed(&self) -> &[String] {
        &self.deleted_or_closed
    }
    pub fn is_empty(&self) -> bool {
        self.created_or_modified.is_empty() && self.deleted_or_closed.is_empty()
    }
}

/// Output order follows input order. Ref names are expected to be unique
/// within one push, so no deduplication takes place.
pub fn classify(commands: &[RefUpdateCommand]) -> BranchClassification {
    let mut classification = BranchClassification::default();
    for command in commands {
        let branch = command.short_branch_name().to_string();
        match command.change_type {
            ChangeType::Create | ChangeType::Update | ChangeType::UpdateNonFastForward => {
                classification.created_or_modified.push(branch)
            }
            ChangeType::Delete => classification.deleted_or_closed.push(branch),
            ChangeType::Other => trace!("ignoring {:?} on {}", command.change_type, command.ref_name),
        }
    }
    classification
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(ref_name: &str, change_type: ChangeType) -> RefUpdateCommand {
        RefUpdateCommand::new(ref_name, change_type)
    }

    #[test]
    fn test_classify_empty() {
        let classification = classify(&[]);
        assert!(classification.is_empty());
        assert!(classification.created_or_modified().is_empty());
        assert!(classification.deleted_or_closed().is_empty());
    }

    #[test]
    fn test_classify_update() {
        let classification = classify(&[cmd("refs/heads/main", ChangeType::Update)]);
        assert_eq!(classification.created_or_modified(), ["main"]);
        assert!(classification.deleted_or_closed().is_empty());
    }

    #[test]
    fn test_classify_delete() {
        let classification = classify(&[cmd("refs/heads/feature", ChangeType::Delete)]);
        assert_eq!(classification.deleted_or_closed(), ["feature"]);
        assert!(classification.created_or_modified().is_empty());
    }

    #[test]
    fn test_classify_preserves_input_order() {
        let classification = classify(&[
            cmd("refs/heads/zeta", ChangeType::Create),
            cmd("refs/heads/old", ChangeType::Delete),
            cmd("refs/heads/alpha", ChangeType::UpdateNonFastForward),
            cmd("refs/heads/main", ChangeType::Update),
            cmd("refs/heads/gone", ChangeType::Delete),
        ]);
        assert_eq!(classification.created_or_modified(), ["zeta", "alpha", "main"]);
        assert_eq!(classification.deleted_or_closed(), ["old", "gone"]);
    }

    #[test]
    fn test_classify_accounts_for_every_command() {
        let commands = vec![
            cmd("refs/heads/a", ChangeType::Create),
            cmd("refs/heads/b", ChangeType::Other),
            cmd("refs/heads/c", ChangeType::Delete),
            cmd("refs/heads/d", ChangeType::Other),
            cmd("refs/heads/e", ChangeType::UpdateNonFastForward),
        ];
        let ignored = commands
            .iter()
            .filter(|c| c.change_type == ChangeType::Other)
            .count();
        let classification = classify(&commands);
        assert_eq!(
            classification.created_or_modified().len()
                + classification.deleted_or_closed().len()
                + ignored,
            commands.len()
        );
        assert_eq!(ignored, 2);
    }

    #[test]
    fn test_classify_pushed_commands() {
        let lines: [&[u8]; 2] = [
            b"006b0000000000000000000000000000000000000000 cdfdb42577e2506715f8cfeacdbabc092bf63e8d refs/heads/experiment",
            b"006715027957951b64cf874c3557a0f3547bd83b3ff6 0000000000000000000000000000000000000000 refs/heads/master",
        ];
        let commands = lines
            .iter()
            .filter_map(|line| RefUpdateCommand::from_pkt_line(line).unwrap())
            .collect::<Vec<_>>();
        let classification = classify(&commands);
        assert_eq!(classification.created_or_modified(), ["experiment"]);
        assert_eq!(classification.deleted_or_closed(), ["master"]);
    }
}
