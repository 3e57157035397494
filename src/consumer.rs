//! Consumer descriptor: the application's key material plus the handshake endpoints.
//!
//! Endpoints are optional on purpose. An operation that needs an endpoint which was never
//! configured fails with [`ConfigError::MissingEndpoint`](crate::error::ConfigError) before any
//! network attempt.

/// Builder API for assembling consumer descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Handshake endpoints declared by a consumer descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthEndpoints {
	/// Endpoint issuing temporary request tokens.
	pub request_token: Option<Url>,
	/// Page the user visits to authorize a request token.
	pub authorization: Option<Url>,
	/// Endpoint exchanging an authorized request token for an access token.
	pub access_token: Option<Url>,
}
impl OAuthEndpoints {
	/// Returns the request-token endpoint or a configuration error.
	pub fn require_request_token(&self) -> Result<&Url, ConfigError> {
		self.request_token.as_ref().ok_or(ConfigError::MissingEndpoint { endpoint: "request_token" })
	}

	/// Returns the authorization endpoint or a configuration error.
	pub fn require_authorization(&self) -> Result<&Url, ConfigError> {
		self.authorization.as_ref().ok_or(ConfigError::MissingEndpoint { endpoint: "authorization" })
	}

	/// Returns the access-token endpoint or a configuration error.
	pub fn require_access_token(&self) -> Result<&Url, ConfigError> {
		self.access_token.as_ref().ok_or(ConfigError::MissingEndpoint { endpoint: "access_token" })
	}
}

/// Immutable consumer descriptor consumed by sessions.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
	/// Consumer key sent as `oauth_consumer_key`.
	pub key: String,
	/// Consumer secret; first half of every signing key.
	pub secret: TokenSecret,
	/// Handshake endpoints.
	pub endpoints: OAuthEndpoints,
}
impl Consumer {
	/// Creates a new builder for the provided key material.
	pub fn builder(key: impl Into<String>, secret: impl Into<String>) -> ConsumerBuilder {
		ConsumerBuilder::new(key, secret)
	}
}
impl Debug for Consumer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Consumer")
			.field("key", &self.key)
			.field("secret_set", &!self.secret.is_empty())
			.field("endpoints", &self.endpoints)
			.finish()
	}
}
