//! Token/secret pairs issued by the provider's token endpoints.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ProtocolError};

/// An issued OAuth 1.0a token together with its secret.
///
/// Both the temporary request token and the long-lived access token use this shape. "Not yet
/// obtained" is modelled as `Option<Credential>::None`, never as an empty pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Public token value sent as `oauth_token`.
	pub token: String,
	/// Token secret mixed into the signing key.
	pub secret: TokenSecret,
}
impl Credential {
	/// Creates a credential from raw token material.
	pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { token: token.into(), secret: TokenSecret::new(secret) }
	}

	/// Parses an `application/x-www-form-urlencoded` token endpoint body
	/// (`oauth_token=...&oauth_token_secret=...`).
	pub fn from_form_body(body: &str) -> Result<Self, ProtocolError> {
		let mut token = None;
		let mut secret = None;

		for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
			match key.trim_start_matches('?') {
				"oauth_token" => token = Some(value.into_owned()),
				"oauth_token_secret" => secret = Some(value.into_owned()),
				_ => {},
			}
		}

		let token = token
			.filter(|value| !value.is_empty())
			.ok_or(ProtocolError::MissingField { field: "oauth_token" })?;
		let secret = secret.ok_or(ProtocolError::MissingField { field: "oauth_token_secret" })?;

		Ok(Self { token, secret: TokenSecret::new(secret) })
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token", &self.token)
			.field("secret", &self.secret)
			.finish()
	}
}
