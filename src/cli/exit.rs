//! Process exit statuses
//!
//! Every error class gets its own status so scripts can tell a bad
//! kubeconfig from a missing object.

use std::io::Write;

use crate::k8s::{ConfigError, OperationError};
use crate::models::DescriptorError;

pub const FAILURE: u8 = 1;
pub const CONFIG_NOT_FOUND: u8 = 2;
pub const CONFIG_INVALID: u8 = 3;
pub const INVALID: u8 = 4;
pub const ALREADY_EXISTS: u8 = 5;
pub const NOT_FOUND: u8 = 6;
pub const UNAVAILABLE: u8 = 7;
pub const DEADLINE_EXCEEDED: u8 = 8;

/// Print a fatal error to `out` and return its exit status.
///
/// Printed directly so the log filter never hides it.
pub fn report(err: &anyhow::Error, out: &mut impl Write) -> u8 {
    let _ = writeln!(out, "Error: {err:#}");
    exit_code(err)
}

/// Exit status for the first typed error found in the chain
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<ConfigError>() {
            return match err {
                ConfigError::NotFound { .. } => CONFIG_NOT_FOUND,
                ConfigError::Invalid { .. } => CONFIG_INVALID,
            };
        }
        if let Some(err) = cause.downcast_ref::<OperationError>() {
            return match err {
                OperationError::Invalid(_) => INVALID,
                OperationError::AlreadyExists(_) => ALREADY_EXISTS,
                OperationError::NotFound(_) => NOT_FOUND,
                OperationError::Unavailable(_) => UNAVAILABLE,
                OperationError::DeadlineExceeded(_) => DEADLINE_EXCEEDED,
            };
        }
        if cause.downcast_ref::<DescriptorError>().is_some() {
            return INVALID;
        }
    }

    FAILURE
}
