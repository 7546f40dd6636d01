use crate::error::GitHookError;
use serde::{Deserialize, Serialize};

const HEADS_PREFIX: &str = "refs/heads/";
const TAGS_PREFIX: &str = "refs/tags/";

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ChangeType {
    Create,
    Update,
    UpdateNonFastForward,
    Delete,
    Other,
}

impl ChangeType {
    pub fn from_ids(old: &str, new: &str) -> Self {
        match (is_zero_id(old), is_zero_id(new)) {
            (true, true) => ChangeType::Other,
            (true, false) => ChangeType::Create,
            (false, true) => ChangeType::Delete,
            (false, false) => ChangeType::Update,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Eq, PartialEq)]
pub struct RefUpdateCommand {
    pub ref_name: String,
    pub change_type: ChangeType,
}

impl RefUpdateCommand {
    pub fn new(ref_name: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            ref_name: ref_name.into(),
            change_type,
        }
    }

    /// Marks an update as non fast-forward once the engine has checked ancestry.
    pub fn with_fast_forward(mut self, fast_forward: bool) -> Self {
        if !fast_forward && self.change_type == ChangeType::Update {
            self.change_type = ChangeType::UpdateNonFastForward;
        }
        self
    }

    pub fn short_branch_name(&self) -> &str {
        short_branch_name(&self.ref_name)
    }

    /// Parses one receive-pack command line, `<len><old> <new> <ref>[\0caps]`.
    ///
    /// Returns `Ok(None)` for a flush-pkt, a truncated line or a line that is not
    /// shaped like a command.
    pub fn from_pkt_line(line: &[u8]) -> Result<Option<Self>, GitHookError> {
        if line.len() < 4 {
            return Ok(None);
        }
        let len_str = std::str::from_utf8(&line[0..4])
            .map_err(|_| GitHookError::InvalidPktLine("invalid length header".to_string()))?;
        let len = usize::from_str_radix(len_str, 16)
            .map_err(|_| GitHookError::InvalidPktLine(format!("invalid length {:?}", len_str)))?;
        if len == 0 || len < 4 || line.len() < len {
            return Ok(None);
        }
        let payload = std::str::from_utf8(&line[4..len])
            .map_err(|_| GitHookError::InvalidPktLine("invalid utf-8".to_string()))?;
        let payload = payload.split('\0').next().unwrap_or_default();
        let parts: Vec<&str> = payload.trim().split(' ').collect();
        if parts.len() < 3 {
            return Ok(None);
        }
        let (old, new, ref_name) = (parts[0], parts[1], parts[2]);
        validate_object_id(old)?;
        validate_object_id(new)?;
        Ok(Some(RefUpdateCommand::new(
            ref_name,
            ChangeType::from_ids(old, new),
        )))
    }
}

/// Strips `refs/heads/` or `refs/tags/` from a ref name.
pub fn short_branch_name(ref_name: &str) -> &str {
    ref_name
        .strip_prefix(HEADS_PREFIX)
        .or_else(|| ref_name.strip_prefix(TAGS_PREFIX))
        .unwrap_or(ref_name)
}

fn is_zero_id(id: &str) -> bool {
    id.bytes().all(|b| b == b'0')
}

fn validate_object_id(id: &str) -> Result<(), GitHookError> {
    if id.len() != 40 && id.len() != 64 {
        return Err(GitHookError::InvalidObjectId(id.to_string()));
    }
    hex::decode(id).map_err(|_| GitHookError::InvalidObjectId(id.to_string()))?;
    Ok(())
}
