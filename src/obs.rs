//! Optional observability helpers for handshakes, dispatches, and uploads.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth1_storage.operation` with the
//!   `operation` and `stage` (call site) fields, plus per-chunk upload progress events.
//! - Enable `metrics` to increment the `oauth1_storage_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Request-token fetch.
	RequestToken,
	/// Access-token exchange.
	AccessToken,
	/// Any signed API call issued through the dispatcher.
	Dispatch,
	/// Resumable chunked upload loop.
	ChunkedUpload,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::RequestToken => "request_token",
			OperationKind::AccessToken => "access_token",
			OperationKind::Dispatch => "dispatch",
			OperationKind::ChunkedUpload => "chunked_upload",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}

	/// Success or failure label for a finished operation.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		match result {
			Ok(_) => OperationOutcome::Success,
			Err(_) => OperationOutcome::Failure,
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
