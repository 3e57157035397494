//! Per-request `oauth_timestamp` and `oauth_nonce` values.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

const NONCE_LEN: usize = 32;

/// Per-request timestamp and nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthStamp {
	/// Unix seconds sent as `oauth_timestamp`.
	pub timestamp: i64,
	/// Single-use value sent as `oauth_nonce`.
	pub nonce: String,
}
impl OAuthStamp {
	/// Pins both values, for deterministic signing.
	pub fn new(timestamp: i64, nonce: impl Into<String>) -> Self {
		Self { timestamp, nonce: nonce.into() }
	}

	/// Current UTC time plus a fresh alphanumeric nonce.
	pub fn generate() -> Self {
		let nonce = rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect();

		Self { timestamp: OffsetDateTime::now_utc().unix_timestamp(), nonce }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn generated_stamps_use_fresh_nonces() {
		let first = OAuthStamp::generate();
		let second = OAuthStamp::generate();

		assert_eq!(first.nonce.len(), NONCE_LEN);
		assert_ne!(first.nonce, second.nonce);
		assert!(first.timestamp > 1_360_703_164);
	}
}
