//! Option range checks

use super::ValidationError;

/// Upper bound on in-flight transfers for one batch
pub const MAX_PARALLEL_TRANSFERS: usize = 64;

/// Validate the transfer fan-out bound
///
/// Zero would stall every batch; very large values defeat the point of a bound.
pub fn validate_parallel_transfers(count: usize) -> Result<(), ValidationError> {
	if count == 0 {
		return Err(ValidationError::OutOfRange {
			option: "parallel",
			reason: "must be at least 1".to_string(),
		});
	}
	if count > MAX_PARALLEL_TRANSFERS {
		return Err(ValidationError::OutOfRange {
			option: "parallel",
			reason: format!("must be at most {}, got {}", MAX_PARALLEL_TRANSFERS, count),
		});
	}
	Ok(())
}

/// Longest accepted connection timeout
pub const MAX_CONNECT_TIMEOUT_SECS: u64 = 3600;

/// Validate the connection timeout
pub fn validate_timeout_secs(timeout_secs: u64) -> Result<(), ValidationError> {
	if timeout_secs == 0 {
		return Err(ValidationError::OutOfRange {
			option: "timeout",
			reason: "must be greater than 0".to_string(),
		});
	}
	if timeout_secs > MAX_CONNECT_TIMEOUT_SECS {
		return Err(ValidationError::OutOfRange {
			option: "timeout",
			reason: format!("{} seconds is too large (max {})", timeout_secs, MAX_CONNECT_TIMEOUT_SECS),
		});
	}
	Ok(())
}


// vim: ts=4
