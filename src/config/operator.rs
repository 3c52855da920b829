//! Staff operator identity.
//!
//! The in-person terminal submits batches on behalf of a staff user. That user id
//! is read once at startup from `OPERATOR_USER_ID` and then passed explicitly into
//! every operation that needs it.

use crate::errors::{Error, Result};

/// Reads the operator's user id from the environment.
///
/// # Errors
/// Returns an error if `OPERATOR_USER_ID` is missing or not a positive integer.
pub fn operator_user_id() -> Result<i64> {
    let raw = std::env::var("OPERATOR_USER_ID")?;
    parse_operator_user_id(&raw)
}

/// Parses an operator user id, which must be a positive integer.
///
/// # Errors
/// Returns `Error::Config` for anything else.
pub fn parse_operator_user_id(raw: &str) -> Result<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::Config {
            message: format!("OPERATOR_USER_ID must be a positive integer, got {raw:?}"),
        }),
    }
}
