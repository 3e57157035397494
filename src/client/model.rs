//! Typed records decoded from API responses.
//!
//! Every field falls back to its default when the server omits it, so a sparse response decodes
//! instead of failing. Only a field of the wrong JSON type is a decoding error.

// self
use crate::_prelude::*;

/// Account owner and quota, from `account/info`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
	/// Numeric user identifier.
	pub uid: u64,
	/// Name shown in the provider's UI.
	pub display_name: String,
	/// Account e-mail.
	pub email: String,
	/// Two-letter country code.
	pub country: String,
	/// Referral URL of the account.
	pub referral_link: String,
	/// Storage usage and limit.
	pub quota_info: QuotaInfo,
}

/// Storage accounting in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaInfo {
	/// Bytes used by files owned by the user.
	pub normal: u64,
	/// Bytes used by shared folders.
	pub shared: u64,
	/// Total allowance.
	#[serde(rename = "quota")]
	pub total: u64,
}
impl QuotaInfo {
	/// Bytes still available.
	pub fn available(&self) -> u64 {
		self.total.saturating_sub(self.normal.saturating_add(self.shared))
	}
}

/// Metadata of a file or folder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEntry {
	/// Size in bytes.
	pub bytes: u64,
	/// Human-readable size, e.g. `225.4KB`.
	pub size: String,
	/// Server modification time as formatted by the server.
	pub modified: String,
	/// Modification time reported by the uploading client.
	pub client_mtime: String,
	/// Folder listing hash, usable for conditional metadata calls.
	pub hash: String,
	/// Root the entry lives in (`app_folder` or `dropbox`).
	pub root: String,
	/// Canonical path of the entry.
	pub path: String,
	/// Icon name suggested by the provider.
	pub icon: String,
	/// MIME type; empty for folders.
	pub mime_type: String,
	/// Legacy numeric revision.
	pub revision: u64,
	/// Opaque revision identifier.
	pub rev: String,
	/// Whether a thumbnail can be fetched.
	pub thumb_exists: bool,
	/// Whether the entry is a folder.
	pub is_dir: bool,
	/// Whether the entry has been deleted.
	pub is_deleted: bool,
	/// Children of a folder listing.
	pub contents: Vec<FileEntry>,
}

/// One page of the change log returned by `delta`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeltaPage {
	/// Local state must be cleared before applying `entries`.
	pub reset: bool,
	/// Opaque position to pass to the next `delta` call.
	pub cursor: String,
	/// Changes in this page.
	pub entries: Vec<DeltaEntry>,
	/// More pages are available immediately.
	pub has_more: bool,
}

/// A single change: `[path, metadata]` on the wire, where `null` metadata means deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, Option<FileEntry>)")]
pub struct DeltaEntry {
	/// Lower-cased path of the changed entry.
	pub path: String,
	/// New metadata, or `None` when the path was removed.
	pub metadata: Option<FileEntry>,
}
impl DeltaEntry {
	/// Whether the path no longer exists.
	pub fn is_deletion(&self) -> bool {
		self.metadata.is_none()
	}
}
impl From<(String, Option<FileEntry>)> for DeltaEntry {
	fn from((path, metadata): (String, Option<FileEntry>)) -> Self {
		Self { path, metadata }
	}
}

/// Publicly reachable link to a file, from `shares` or `media`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedLink {
	/// Link target.
	pub url: String,
	/// Expiry as formatted by the server.
	pub expires: String,
}

/// Reference that lets another account copy a file without downloading it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyRef {
	/// The reference string.
	pub copy_ref: String,
	/// Expiry as formatted by the server.
	pub expires: String,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::dispatch::decode_json;

	#[test]
	fn folder_listing_decodes_nested_contents() {
		let entry: FileEntry = decode_json(serde_json::json!({
			"hash": "37eb1ba1849d4b0fb0b28caf7ef3af52",
			"path": "/Photos",
			"is_dir": true,
			"root": "app_folder",
			"contents": [
				{
					"bytes": 230_783,
					"path": "/Photos/beach.jpg",
					"mime_type": "image/jpeg",
					"rev": "35e97029684fe"
				}
			]
		}))
		.expect("Folder listing should decode.");

		assert!(entry.is_dir);
		assert_eq!(entry.bytes, 0);
		assert_eq!(entry.contents.len(), 1);
		assert_eq!(entry.contents[0].bytes, 230_783);
		assert_eq!(entry.contents[0].rev, "35e97029684fe");
		assert!(entry.contents[0].contents.is_empty());
	}

	#[test]
	fn delta_entries_decode_from_pairs() {
		let page: DeltaPage = decode_json(serde_json::json!({
			"reset": true,
			"cursor": "AAE",
			"has_more": false,
			"entries": [
				["/photos", { "is_dir": true, "path": "/Photos" }],
				["/old.txt", null]
			]
		}))
		.expect("Delta page should decode.");

		assert!(page.reset);
		assert_eq!(page.cursor, "AAE");
		assert_eq!(page.entries.len(), 2);
		assert_eq!(page.entries[0].metadata.as_ref().map(|m| m.path.as_str()), Some("/Photos"));
		assert!(page.entries[1].is_deletion());
	}

	#[test]
	fn account_info_maps_quota() {
		let info: AccountInfo = decode_json(serde_json::json!({
			"uid": 12345678,
			"display_name": "John P. User",
			"country": "US",
			"quota_info": {
				"shared": 253_738_410_565u64,
				"quota": 107_374_182_400_000u64,
				"normal": 680_031_877_871u64
			}
		}))
		.expect("Account info should decode.");

		assert_eq!(info.uid, 12_345_678);
		assert_eq!(info.email, "");
		assert_eq!(info.quota_info.total, 107_374_182_400_000);
		assert_eq!(
			info.quota_info.available(),
			107_374_182_400_000 - 680_031_877_871 - 253_738_410_565,
		);
	}

	#[test]
	fn wrong_types_report_the_path() {
		let err = decode_json::<FileEntry>(serde_json::json!({ "contents": [{ "bytes": "big" }] }))
			.expect_err("String byte count must not decode.");

		assert!(err.to_string().contains("contents[0].bytes"));
	}
}
