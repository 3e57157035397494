//! Crate-level error types shared by signing, token handshakes, dispatch, and uploads.
//!
//! Nothing in this crate retries. Every failure surfaces to the immediate caller; the
//! [`Error::retryable`] hint exists only so callers can build their own policy.

// self
use crate::{_prelude::*, consumer::ConsumerError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Response did not have the expected shape.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Non-2xx status or network failure.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The local upload byte source failed or ended early.
	#[error("Upload source could not be read.")]
	Source(#[source] std::io::Error),

	/// A chunked upload was committed before every byte was acknowledged.
	#[error("Chunked upload is incomplete: {offset} of {total_size} bytes acknowledged.")]
	UploadIncomplete {
		/// Server-assigned upload identifier, if any chunk was acknowledged.
		upload_id: Option<String>,
		/// Last acknowledged offset.
		offset: u64,
		/// Declared total size of the upload.
		total_size: u64,
	},
}
impl Error {
	/// Advisory hint telling callers whether repeating the operation may succeed.
	///
	/// The crate never acts on this value; ignoring it leaves behavior unchanged.
	pub fn retryable(&self) -> bool {
		match self {
			Self::Transport(err) => err.retryable(),
			Self::Config(_) | Self::Protocol(_) | Self::Source(_) | Self::UploadIncomplete { .. } =>
				false,
		}
	}
}

/// Configuration and caller-misuse failures detected before any network attempt.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required endpoint URL was never configured.
	#[error("The {endpoint} endpoint must be configured.")]
	MissingEndpoint {
		/// Endpoint label (`request_token`, `authorization`, `access_token`).
		endpoint: &'static str,
	},
	/// A URL could not be parsed.
	#[error("URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// The authorization URL was requested before a request token was issued.
	#[error("No request token has been issued yet; call start_authorization first.")]
	MissingRequestToken,
	/// Resumed upload state violates `offset <= total_size`.
	#[error("Upload offset {offset} exceeds the total size {total_size}.")]
	InvalidUploadState {
		/// Offending offset.
		offset: u64,
		/// Declared total size.
		total_size: u64,
	},
	/// Chunk size must be positive.
	#[error("Chunk size must be greater than zero.")]
	InvalidChunkSize,
	/// Consumer descriptor failed validation.
	#[error(transparent)]
	InvalidConsumer(#[from] ConsumerError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(source: url::ParseError) -> Self {
		Self::InvalidUrl { source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Responses that arrived intact but did not match the expected shape.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// A required response field was absent or empty.
	#[error("Response is missing the required `{field}` field.")]
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// Response body is not valid UTF-8.
	#[error("Response body is not valid UTF-8.")]
	InvalidUtf8(#[source] std::string::FromUtf8Error),
	/// Response body is not valid JSON.
	#[error("Response body is not valid JSON.")]
	InvalidJson(#[source] serde_json::Error),
	/// JSON tree could not be decoded into the requested record.
	#[error("Response JSON could not be decoded at `{}`.", .0.path())]
	Decode(#[source] serde_path_to_error::Error<serde_json::Error>),
	/// Server reported an upload identifier different from the one it assigned earlier.
	#[error("Server changed the upload identifier from `{expected}` to `{reported}`.")]
	UploadIdChanged {
		/// Identifier adopted from the first acknowledgement.
		expected: String,
		/// Identifier reported by the latest acknowledgement.
		reported: String,
	},
	/// Server acknowledged more bytes than the upload declares.
	#[error("Server reported offset {reported}, beyond the total size {total_size}.")]
	OffsetOutOfRange {
		/// Offset reported by the server.
		reported: u64,
		/// Declared total size.
		total_size: u64,
	},
	/// Server acknowledged bytes that were never sent.
	#[error("Server reported offset {reported}, beyond the {sent} bytes sent so far.")]
	OffsetBeyondSent {
		/// Offset reported by the server.
		reported: u64,
		/// End offset of the chunk that was sent.
		sent: u64,
	},
	/// Server kept acknowledging chunks without advancing the offset.
	#[error("Upload made no progress past offset {offset} across repeated acknowledgements.")]
	UploadStalled {
		/// Offset at which the upload stopped progressing.
		offset: u64,
	},
}

/// Transport-level failures (status, network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Server answered with a non-2xx status.
	#[error("Server responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response body kept for diagnostics.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
		/// Whether the failure looks transient (timeouts, refused connections).
		retryable: bool,
	},
	/// Underlying IO failure surfaced while reading a response body.
	#[error("I/O error occurred while reading the response body.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error, retryable: bool) -> Self {
		Self::Network { source: Box::new(src), retryable }
	}

	/// HTTP status code, when the server answered at all.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Raw response body of a non-2xx answer.
	pub fn body(&self) -> Option<&str> {
		match self {
			Self::Status { body, .. } => Some(body),
			_ => None,
		}
	}

	/// Advisory retry hint; see [`Error::retryable`].
	pub fn retryable(&self) -> bool {
		match self {
			Self::Status { status, .. } => *status == 429 || *status >= 500,
			Self::Network { retryable, .. } => *retryable,
			Self::Io(_) => true,
		}
	}
}
