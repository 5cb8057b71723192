use crate::{err, Result};

use uuid::Uuid;

/// Returns a fresh savepoint name: `point_` followed by 32 hex digits.
pub fn generate_savepoint_id() -> String {
    format!("point_{}", Uuid::new_v4().simple())
}

pub(crate) fn create(id: &str) -> Result<String> {
    Ok(format!("SAVEPOINT {}", check_id(id)?))
}

pub(crate) fn rollback_to(id: &str) -> Result<String> {
    Ok(format!("ROLLBACK TO SAVEPOINT {}", check_id(id)?))
}

pub(crate) fn release(id: &str) -> Result<String> {
    Ok(format!("RELEASE SAVEPOINT {}", check_id(id)?))
}

// The id is spliced into SQL
fn check_id(id: &str) -> Result<&str> {
    let mut chars = id.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        return Err(err!("invalid savepoint identifier `{id}`"));
    }

    Ok(id)
}
