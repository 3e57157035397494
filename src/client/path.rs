//! Remote path normalization.

// self
use crate::signature;

/// Normalizes a remote path: leading `/` ensured, trailing `/` dropped, empty segments collapsed.
///
/// The root is returned as `/`.
pub fn normalize_path(path: &str) -> String {
	let segments = path.split('/').filter(|segment| !segment.is_empty()).collect::<Vec<_>>();

	if segments.is_empty() {
		return "/".into();
	}

	format!("/{}", segments.join("/"))
}

/// Normalizes `path` and percent-encodes it for use inside a URL path.
pub fn encode_path(path: &str) -> String {
	signature::percent_encode_path(&normalize_path(path))
}
