// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	consumer::{Consumer, OAuthEndpoints},
};

/// Errors raised while constructing or validating consumer descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ConsumerError {
	/// The consumer key is empty.
	#[error("Consumer key must not be empty.")]
	MissingKey,
	/// The consumer secret is empty.
	#[error("Consumer secret must not be empty.")]
	MissingSecret,
}

/// Builder for [`Consumer`] values.
#[derive(Debug)]
pub struct ConsumerBuilder {
	/// Consumer key.
	pub key: String,
	/// Consumer secret.
	pub secret: TokenSecret,
	/// Endpoints configured so far.
	pub endpoints: OAuthEndpoints,
}
impl ConsumerBuilder {
	/// Creates a new builder seeded with the provided key material.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			secret: TokenSecret::new(secret),
			endpoints: OAuthEndpoints::default(),
		}
	}

	/// Sets the request-token endpoint.
	pub fn request_token_endpoint(mut self, url: Url) -> Self {
		self.endpoints.request_token = Some(url);

		self
	}

	/// Sets the user authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.endpoints.authorization = Some(url);

		self
	}

	/// Sets the access-token endpoint.
	pub fn access_token_endpoint(mut self, url: Url) -> Self {
		self.endpoints.access_token = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<Consumer, ConsumerError> {
		if self.key.trim().is_empty() {
			return Err(ConsumerError::MissingKey);
		}
		if self.secret.is_empty() {
			return Err(ConsumerError::MissingSecret);
		}

		Ok(Consumer { key: self.key, secret: self.secret, endpoints: self.endpoints })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builder_rejects_empty_key_material() {
		assert_eq!(Consumer::builder(" ", "secret").build(), Err(ConsumerError::MissingKey));
		assert_eq!(Consumer::builder("key", "").build(), Err(ConsumerError::MissingSecret));
	}

	#[test]
	fn endpoints_stay_optional() {
		let consumer = Consumer::builder("key", "secret")
			.authorization_endpoint(
				Url::parse("https://www.example.com/1/oauth/authorize")
					.expect("Failed to parse authorization endpoint URL."),
			)
			.build()
			.expect("Consumer with only an authorization endpoint should build.");

		assert!(consumer.endpoints.require_authorization().is_ok());
		assert!(consumer.endpoints.require_request_token().is_err());
		assert!(consumer.endpoints.require_access_token().is_err());
		assert!(format!("{consumer:?}").contains("secret_set: true"));
	}
}
