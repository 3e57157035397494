//! Redacted holder for the consumer secret and token secrets that key every signature.

// self
use crate::_prelude::*;

/// Signing-key material (consumer secret or `oauth_token_secret`) that never prints itself.
///
/// The empty secret is valid for tokens: a consumer-only signature uses `consumer_secret&`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps raw key material.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw value for building the HMAC signing key; keep it out of logs.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether no key material is held.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(if self.is_empty() { "TokenSecret(<empty>)" } else { "TokenSecret(<redacted>)" })
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
