//! Access rules for file records.

use super::error::FileError;
use super::record::{FileRecord, Principal, Visibility};

/// What a principal is trying to do with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Download,
    Delete,
    ChangeVisibility,
}

/// Downloads are open to the owner and, for public records, to anyone.
/// Every other action is owner-only.
pub fn is_allowed(
    principal: Principal,
    owner: Principal,
    visibility: Visibility,
    action: Action,
) -> bool {
    match action {
        Action::Download => principal == owner || visibility == Visibility::Public,
        Action::Delete | Action::ChangeVisibility => principal == owner,
    }
}

pub fn authorize(principal: Principal, record: &FileRecord, action: Action) -> Result<(), FileError> {
    if is_allowed(principal, record.owner, record.visibility, action) {
        Ok(())
    } else {
        Err(FileError::Forbidden)
    }
}
