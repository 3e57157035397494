//! Handshake phases derived from the cached credentials.

// self
use crate::_prelude::*;

/// Observable phase of the two-step OAuth 1.0a handshake.
///
/// User authorization happens out of band between [`TokenState::RequestTokenIssued`] and
/// [`TokenState::AccessTokenIssued`], so it has no state of its own here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
	/// No token has been issued; requests are signed with the consumer secret only.
	Unauthenticated,
	/// A request token is cached and awaits user authorization.
	RequestTokenIssued,
	/// An access token is cached and signs every subsequent call.
	AccessTokenIssued,
}
impl TokenState {
	/// Returns a stable label suitable for span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenState::Unauthenticated => "unauthenticated",
			TokenState::RequestTokenIssued => "request_token_issued",
			TokenState::AccessTokenIssued => "access_token_issued",
		}
	}
}
impl Display for TokenState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
