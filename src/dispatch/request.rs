//! Signed request descriptions and their translation into [`HttpRequest`] values.

// crates.io
use ::http::header::{CONTENT_TYPE, HeaderValue};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{HttpRequest, RequestOptions},
	signature::{self, Method, Parameter, Signature, SigningContext},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// How the response body should be handed back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseKind {
	/// Drain the body into a `String`.
	Text,
	/// Drain the body and parse it as JSON.
	Json,
	/// Hand back the open body for the caller to read.
	Stream,
}

/// A signed API call to be executed by the dispatcher.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Requested response decoding.
	pub kind: ResponseKind,
	/// Target URL; embedded query pairs are signed alongside `params`.
	pub url: Url,
	/// Caller parameters.
	pub params: Vec<Parameter>,
	/// Raw payload. When present, parameters move to the URL.
	pub body: Option<Bytes>,
	/// Per-call transport options.
	pub options: RequestOptions,
}
impl ApiRequest {
	/// Creates a request with no parameters that expects JSON.
	pub fn new(method: Method, url: Url) -> Self {
		Self {
			method,
			kind: ResponseKind::Json,
			url,
			params: Vec::new(),
			body: None,
			options: RequestOptions::default(),
		}
	}

	/// Overrides the response kind.
	pub fn kind(mut self, kind: ResponseKind) -> Self {
		self.kind = kind;

		self
	}

	/// Appends a parameter.
	pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.push(Parameter::new(name, value));

		self
	}

	/// Appends several parameters.
	pub fn params<I, P>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<Parameter>,
	{
		self.params.extend(params.into_iter().map(Into::into));

		self
	}

	/// Attaches a raw payload.
	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Sets a timeout for this call only.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.options.timeout = Some(timeout);

		self
	}

	/// Builds the wire request for an already computed signature.
	///
	/// - POST/PUT without a payload: bare URL, form body equal to the signed parameter string.
	/// - Everything else: the signed parameter string is the URL query; the payload (if any) is
	///   sent untouched with the transport's default content type.
	pub fn to_http_request(&self, signature: &Signature) -> Result<HttpRequest, ConfigError> {
		let signed = signature.signed_parameters();
		let builder = ::http::Request::builder().method(::http::Method::from(self.method));

		match &self.body {
			None if self.method.carries_form_body() => Ok(builder
				.uri(signature.normalized_url.as_str())
				.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
				.body(signed.into_bytes())?),
			body => Ok(builder
				.uri(format!("{}?{signed}", signature.normalized_url))
				.body(body.as_ref().map(|bytes| bytes.to_vec()).unwrap_or_default())?),
		}
	}

	/// Signs the request and builds the wire request in one step.
	pub fn sign(&self, ctx: &SigningContext<'_>) -> Result<(Signature, HttpRequest), ConfigError> {
		let signature = signature::sign(self.method, &self.url, &self.params, ctx);
		let request = self.to_http_request(&signature)?;

		Ok((signature, request))
	}
}
