//! RFC 3986 encoding and URL/parameter normalization.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::{_prelude::*, signature::Parameter};

/// Everything except ALPHA, DIGIT, `-`, `.`, `_`, `~` is escaped.
pub const OAUTH_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Same as [`OAUTH_ENCODE_SET`] but leaves `/` intact, for URL paths.
pub const OAUTH_PATH_ENCODE_SET: &AsciiSet = &OAUTH_ENCODE_SET.remove(b'/');

/// Percent-encodes `value` with upper-case hex digits; space becomes `%20`, never `+`.
pub fn percent_encode(value: &str) -> String {
	utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Percent-encodes a path while keeping its `/` separators.
pub fn percent_encode_path(path: &str) -> String {
	utf8_percent_encode(path, OAUTH_PATH_ENCODE_SET).to_string()
}

/// Lower-cased scheme and host, default port dropped, query and fragment dropped.
pub fn normalize_url(url: &Url) -> String {
	let scheme = url.scheme().to_ascii_lowercase();
	let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
	// `Url::port` already hides the scheme's default port.
	let port = match url.port() {
		Some(port) if !is_default_port(&scheme, port) => format!(":{port}"),
		_ => String::new(),
	};

	format!("{scheme}://{host}{port}{}", url.path())
}

/// Encodes every name and value, sorts by encoded name then value, and joins with `&`.
pub fn normalize_parameters(parameters: &[Parameter]) -> String {
	let mut encoded = parameters
		.iter()
		.map(|param| (percent_encode(&param.name), percent_encode(&param.value)))
		.collect::<Vec<_>>();

	encoded.sort();

	let mut buf = String::new();

	for (idx, (name, value)) in encoded.iter().enumerate() {
		if idx > 0 {
			buf.push('&');
		}

		buf.push_str(name);
		buf.push('=');
		buf.push_str(value);
	}

	buf
}

fn is_default_port(scheme: &str, port: u16) -> bool {
	matches!((scheme, port), ("http", 80) | ("https", 443))
}
