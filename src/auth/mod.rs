use serde::{Deserialize, Serialize};

/// Privilege a principal holds on one repository, as decided by the
/// authorization layer.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    pub fn can_write(&self) -> bool {
        *self >= AccessLevel::Write
    }
}
