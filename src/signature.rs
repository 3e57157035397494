//! OAuth 1.0a `HMAC-SHA1` signing.
//!
//! [`sign`] is pure: for a fixed method, URL, parameter set, key material, and [`OAuthStamp`] it
//! always yields the same [`Signature`]. The dispatcher supplies a fresh stamp per request; tests
//! pin one.
//!
//! The signature base string is `METHOD&enc(normalized_url)&enc(normalized_parameters)` where the
//! parameters are the caller's parameters, any query pairs already present on the URL, and the
//! `oauth_*` protocol parameters, each RFC 3986 encoded and sorted by name then value.

pub mod encode;
pub mod stamp;

pub use encode::*;
pub use stamp::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
// self
use crate::{_prelude::*, auth::Credential};

/// Signature method advertised in `oauth_signature_method`.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
/// Protocol version advertised in `oauth_version`.
pub const OAUTH_VERSION: &str = "1.0";

/// HTTP methods understood by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Upper-case method name as it appears in the base string.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}

	/// Whether parameters travel in a form body when no binary payload is attached.
	pub const fn carries_form_body(self) -> bool {
		matches!(self, Method::Post | Method::Put)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<Method> for ::http::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => ::http::Method::GET,
			Method::Post => ::http::Method::POST,
			Method::Put => ::http::Method::PUT,
			Method::Delete => ::http::Method::DELETE,
		}
	}
}

/// A single request parameter. Order is preserved for callers but irrelevant to signing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
	/// Unencoded parameter name.
	pub name: String,
	/// Unencoded parameter value.
	pub value: String,
}
impl Parameter {
	/// Creates a parameter from raw (unencoded) name and value.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into() }
	}
}
impl<K, V> From<(K, V)> for Parameter
where
	K: Into<String>,
	V: Into<String>,
{
	fn from((name, value): (K, V)) -> Self {
		Self::new(name, value)
	}
}

/// Key material and per-request entropy needed to sign one request.
#[derive(Clone, Copy, Debug)]
pub struct SigningContext<'a> {
	/// Consumer key (`oauth_consumer_key`).
	pub consumer_key: &'a str,
	/// Consumer secret (first half of the signing key).
	pub consumer_secret: &'a str,
	/// Active token, if any. Absent means consumer-only signing.
	pub token: Option<&'a Credential>,
	/// Timestamp and nonce for this request.
	pub stamp: &'a OAuthStamp,
}
impl SigningContext<'_> {
	/// Standard `oauth_*` protocol parameters, excluding `oauth_signature`.
	///
	/// `oauth_token` is omitted when no token is active.
	pub fn protocol_parameters(&self) -> Vec<Parameter> {
		let mut params = vec![
			Parameter::new("oauth_consumer_key", self.consumer_key),
			Parameter::new("oauth_nonce", self.stamp.nonce.as_str()),
			Parameter::new("oauth_signature_method", SIGNATURE_METHOD),
			Parameter::new("oauth_timestamp", self.stamp.timestamp.to_string()),
			Parameter::new("oauth_version", OAUTH_VERSION),
		];

		if let Some(token) = self.token.filter(|token| !token.token.is_empty()) {
			params.push(Parameter::new("oauth_token", token.token.as_str()));
		}

		params
	}

	/// `enc(consumer_secret)&enc(token_secret)`; the token half is empty without a token.
	pub fn signing_key(&self) -> String {
		let token_secret = self.token.map(|token| token.secret.expose()).unwrap_or_default();

		format!("{}&{}", percent_encode(self.consumer_secret), percent_encode(token_secret))
	}
}

/// Output of [`sign`], keeping the intermediate strings the dispatcher reuses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
	/// Scheme/host/port/path form of the request URL.
	pub normalized_url: String,
	/// Sorted, encoded `name=value&...` string over every signed parameter.
	pub normalized_parameters: String,
	/// Full signature base string.
	pub base_string: String,
	/// Raw base64 HMAC-SHA1 digest.
	pub value: String,
}
impl Signature {
	/// Signature percent-encoded for insertion into a URL or form body.
	///
	/// Base64 output may contain `+`, `/`, and `=`; all three are escaped, `+` as `%2B`.
	pub fn encoded(&self) -> String {
		percent_encode(&self.value)
	}

	/// The signed parameter string with `oauth_signature` appended.
	pub fn signed_parameters(&self) -> String {
		format!("{}&oauth_signature={}", self.normalized_parameters, self.encoded())
	}
}

/// Signs a request.
///
/// `parameters` are the caller's parameters; query pairs embedded in `url` and the protocol
/// parameters from `ctx` are added before normalization.
pub fn sign(
	method: Method,
	url: &Url,
	parameters: &[Parameter],
	ctx: &SigningContext<'_>,
) -> Signature {
	let mut all = parameters.to_vec();

	all.extend(url.query_pairs().map(|(name, value)| Parameter::new(name, value)));
	all.extend(ctx.protocol_parameters());

	let normalized_url = normalize_url(url);
	let normalized_parameters = normalize_parameters(&all);
	let base_string = format!(
		"{}&{}&{}",
		method.as_str(),
		percent_encode(&normalized_url),
		percent_encode(&normalized_parameters)
	);
	let value = base64_hmac_sha1(ctx.signing_key().as_bytes(), base_string.as_bytes());

	Signature { normalized_url, normalized_parameters, base_string, value }
}

/// Base64 encoded HMAC with SHA1 hash.
pub fn base64_hmac_sha1(key: &[u8], content: &[u8]) -> String {
	let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(key)
		.unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));

	mac.update(content);

	STANDARD.encode(mac.finalize().into_bytes())
}
