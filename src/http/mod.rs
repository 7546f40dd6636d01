//! actix-web binding of the admission rules.

pub mod permission;

pub use permission::{Access, PermissionFilter};
