//! Storage API convenience layer built on a [`Session`].
//!
//! Each call maps to one endpoint of the provider's v1 API: it assembles the parameters, signs
//! through the session's dispatcher, and decodes the JSON answer into a typed record from
//! [`model`]. Paths are normalized and percent-encoded by [`path`].

pub mod model;
pub mod path;

pub use model::*;
pub use path::*;

// std
use std::io::Read;
// self
use crate::{
	_prelude::*,
	consumer::Consumer,
	dispatch::{self, ApiRequest, ResponseKind, ResponseStream},
	error::ConfigError,
	http::{HttpTransport, TransportErrorMapper},
	session::Session,
	signature::Method,
	upload::{ChunkedUploader, UploadSession},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestStorageClient = Client<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Base URLs of the three provider hosts, including the API version prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHosts {
	/// Metadata and file-operation calls.
	pub api: Url,
	/// File transfer calls.
	pub content: Url,
	/// Pages opened in the user's browser.
	pub web: Url,
}
impl ApiHosts {
	/// Creates a host set from explicit base URLs.
	pub fn new(api: Url, content: Url, web: Url) -> Self {
		Self { api, content, web }
	}

	/// Derives a consumer descriptor whose handshake endpoints live on these hosts.
	pub fn consumer(
		&self,
		key: impl Into<String>,
		secret: impl Into<String>,
	) -> Result<Consumer, ConfigError> {
		Ok(Consumer::builder(key, secret)
			.request_token_endpoint(join(&self.api, "/oauth/request_token")?)
			.authorization_endpoint(join(&self.web, "/oauth/authorize")?)
			.access_token_endpoint(join(&self.api, "/oauth/access_token")?)
			.build()?)
	}
}
impl Default for ApiHosts {
	fn default() -> Self {
		Self {
			api: builtin_url("https://api.dropbox.com/1"),
			content: builtin_url("https://api-content.dropbox.com/1"),
			web: builtin_url("https://www.dropbox.com/1"),
		}
	}
}

/// Root the client's paths are resolved against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessRoot {
	/// The application's own folder.
	#[default]
	AppFolder,
	/// The user's whole storage.
	Full,
}
impl AccessRoot {
	/// Path segment sent to the API.
	pub const fn as_str(self) -> &'static str {
		match self {
			AccessRoot::AppFolder => "sandbox",
			AccessRoot::Full => "dropbox",
		}
	}
}
impl Display for AccessRoot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Optional arguments of [`Client::metadata`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataOptions {
	/// Maximum number of children returned for a folder.
	pub file_limit: u32,
	/// Include the folder's children.
	pub list: bool,
	/// Previous listing hash; an unchanged folder answers `304`.
	pub hash: Option<String>,
	/// Specific revision of a file.
	pub rev: Option<String>,
	/// Include deleted children.
	pub include_deleted: bool,
}
impl Default for MetadataOptions {
	fn default() -> Self {
		Self { file_limit: 10_000, list: true, hash: None, rev: None, include_deleted: false }
	}
}

/// Typed access to the provider's storage API.
pub struct Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Authenticated session every call goes through.
	pub session: Session<C, M>,
	/// Provider hosts.
	pub hosts: ApiHosts,
	/// Root the paths are resolved against.
	pub root: AccessRoot,
	locale: String,
}
impl<C, M> Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client using the `en` locale.
	pub fn new(session: Session<C, M>, hosts: ApiHosts, root: AccessRoot) -> Self {
		Self { session, hosts, root, locale: "en".into() }
	}

	/// Overrides the locale used for server-translated strings.
	pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
		self.locale = locale.into();

		self
	}

	/// Locale sent with every call that accepts one.
	pub fn locale(&self) -> &str {
		&self.locale
	}

	/// `GET {api}/account/info`.
	pub async fn account_info(&self) -> Result<AccountInfo> {
		let request = ApiRequest::new(Method::Get, join(&self.hosts.api, "/account/info")?)
			.param("locale", &self.locale);

		self.fetch(request).await
	}

	/// `GET {api}/metadata/{root}{path}`.
	pub async fn metadata(&self, path: &str, options: &MetadataOptions) -> Result<FileEntry> {
		let url = self.rooted(&self.hosts.api, "metadata", path)?;
		let mut request = ApiRequest::new(Method::Get, url)
			.param("file_limit", options.file_limit.to_string())
			.param("list", options.list.to_string())
			.param("include_deleted", options.include_deleted.to_string())
			.param("locale", &self.locale);

		if let Some(hash) = &options.hash {
			request = request.param("hash", hash);
		}
		if let Some(rev) = &options.rev {
			request = request.param("rev", rev);
		}

		self.fetch(request).await
	}

	/// `POST {api}/fileops/create_folder`.
	pub async fn create_folder(&self, path: &str) -> Result<FileEntry> {
		let request = self
			.file_op("/fileops/create_folder")?
			.param("path", normalize_path(path));

		self.fetch(request).await
	}

	/// `POST {api}/fileops/copy`.
	pub async fn copy(&self, from_path: &str, to_path: &str) -> Result<FileEntry> {
		let request = self
			.file_op("/fileops/copy")?
			.param("from_path", normalize_path(from_path))
			.param("to_path", normalize_path(to_path));

		self.fetch(request).await
	}

	/// `POST {api}/fileops/copy` from a [`CopyRef`] issued by another account.
	pub async fn copy_from_ref(&self, copy_ref: &str, to_path: &str) -> Result<FileEntry> {
		let request = self
			.file_op("/fileops/copy")?
			.param("from_copy_ref", copy_ref)
			.param("to_path", normalize_path(to_path));

		self.fetch(request).await
	}

	/// `POST {api}/fileops/move`.
	pub async fn move_entry(&self, from_path: &str, to_path: &str) -> Result<FileEntry> {
		let request = self
			.file_op("/fileops/move")?
			.param("from_path", normalize_path(from_path))
			.param("to_path", normalize_path(to_path));

		self.fetch(request).await
	}

	/// `POST {api}/fileops/delete`; returns the metadata of the deleted entry.
	pub async fn delete(&self, path: &str) -> Result<FileEntry> {
		let request = self.file_op("/fileops/delete")?.param("path", normalize_path(path));

		self.fetch(request).await
	}

	/// `GET {api}/revisions/{root}{path}`.
	pub async fn revisions(&self, path: &str, rev_limit: Option<u32>) -> Result<Vec<FileEntry>> {
		let mut request =
			ApiRequest::new(Method::Get, self.rooted(&self.hosts.api, "revisions", path)?)
				.param("locale", &self.locale);

		if let Some(rev_limit) = rev_limit {
			request = request.param("rev_limit", rev_limit.to_string());
		}

		self.fetch(request).await
	}

	/// `POST {api}/restore/{root}{path}`.
	pub async fn restore(&self, path: &str, rev: &str) -> Result<FileEntry> {
		let request = ApiRequest::new(Method::Post, self.rooted(&self.hosts.api, "restore", path)?)
			.param("rev", rev)
			.param("locale", &self.locale);

		self.fetch(request).await
	}

	/// `POST {api}/delta`. Pass the previous page's cursor to receive only newer changes.
	pub async fn delta(&self, cursor: Option<&str>) -> Result<DeltaPage> {
		let mut request = ApiRequest::new(Method::Post, join(&self.hosts.api, "/delta")?)
			.param("locale", &self.locale);

		if let Some(cursor) = cursor.filter(|cursor| !cursor.is_empty()) {
			request = request.param("cursor", cursor);
		}

		self.fetch(request).await
	}

	/// `POST {api}/search/{root}{path}`.
	pub async fn search(
		&self,
		path: &str,
		query: &str,
		file_limit: Option<u32>,
		include_deleted: bool,
	) -> Result<Vec<FileEntry>> {
		let url = self.rooted(&self.hosts.api, "search", path)?;
		let mut request = ApiRequest::new(Method::Post, url)
			.param("query", query)
			.param("include_deleted", include_deleted.to_string())
			.param("locale", &self.locale);

		if let Some(file_limit) = file_limit {
			request = request.param("file_limit", file_limit.to_string());
		}

		self.fetch(request).await
	}

	/// `POST {api}/shares/{root}{path}`.
	pub async fn share(&self, path: &str) -> Result<SharedLink> {
		let request = ApiRequest::new(Method::Post, self.rooted(&self.hosts.api, "shares", path)?)
			.param("locale", &self.locale);

		self.fetch(request).await
	}

	/// `POST {api}/media/{root}{path}`; a direct, short-lived streaming link.
	pub async fn media(&self, path: &str) -> Result<SharedLink> {
		let request = ApiRequest::new(Method::Post, self.rooted(&self.hosts.api, "media", path)?)
			.param("locale", &self.locale);

		self.fetch(request).await
	}

	/// `GET {api}/copy_ref/{root}{path}`.
	pub async fn copy_ref(&self, path: &str) -> Result<CopyRef> {
		let request = ApiRequest::new(Method::Get, self.rooted(&self.hosts.api, "copy_ref", path)?);

		self.fetch(request).await
	}

	/// `GET {content}/files/{root}{path}`, returned as an open stream.
	pub async fn download(&self, path: &str) -> Result<ResponseStream> {
		let request = ApiRequest::new(Method::Get, self.rooted(&self.hosts.content, "files", path)?)
			.kind(ResponseKind::Stream);

		self.session.stream(request).await
	}

	/// Starts a chunked upload of `total_size` bytes to `{content}/chunked_upload`.
	pub fn chunked_uploader<R>(
		&self,
		source: R,
		total_size: u64,
	) -> Result<ChunkedUploader<'_, C, M, R>, ConfigError>
	where
		R: Read,
	{
		let endpoint = join(&self.hosts.content, "/chunked_upload")?;

		Ok(self.session.chunked_uploader(endpoint, source, total_size))
	}

	/// Continues a persisted chunked upload; `source` must be positioned at `state.offset()`.
	pub fn resume_chunked_upload<R>(
		&self,
		source: R,
		state: UploadSession,
	) -> Result<ChunkedUploader<'_, C, M, R>, ConfigError>
	where
		R: Read,
	{
		let endpoint = join(&self.hosts.content, "/chunked_upload")?;

		ChunkedUploader::resume(&self.session, endpoint, source, state)
	}

	/// `POST {content}/commit_chunked_upload/{root}{path}`: materializes a finished upload.
	///
	/// Fails with [`Error::UploadIncomplete`] without touching the network when the server has not
	/// acknowledged every byte yet.
	pub async fn commit_chunked_upload(
		&self,
		path: &str,
		upload: &UploadSession,
		overwrite: bool,
	) -> Result<FileEntry> {
		let upload_id = match upload.upload_id() {
			Some(upload_id) if upload.is_complete() => upload_id,
			_ =>
				return Err(Error::UploadIncomplete {
					upload_id: upload.upload_id().map(ToOwned::to_owned),
					offset: upload.offset(),
					total_size: upload.total_size(),
				}),
		};
		let request = ApiRequest::new(
			Method::Post,
			self.rooted(&self.hosts.content, "commit_chunked_upload", path)?,
		)
		.param("upload_id", upload_id)
		.param("overwrite", overwrite.to_string())
		.param("locale", &self.locale);

		self.fetch(request).await
	}

	fn file_op(&self, endpoint: &str) -> Result<ApiRequest, ConfigError> {
		Ok(ApiRequest::new(Method::Post, join(&self.hosts.api, endpoint)?)
			.param("root", self.root.as_str())
			.param("locale", &self.locale))
	}

	fn rooted(&self, base: &Url, call: &str, path: &str) -> Result<Url, ConfigError> {
		join(base, &format!("/{call}/{}{}", self.root, encode_path(path)))
	}

	async fn fetch<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		let value = self.session.json(request).await?;

		Ok(dispatch::decode_json(value)?)
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client for the default provider hosts with a reqwest-backed session.
	pub fn connect(
		key: impl Into<String>,
		secret: impl Into<String>,
		root: AccessRoot,
	) -> Result<Self, ConfigError> {
		let hosts = ApiHosts::default();
		let session = Session::new(hosts.consumer(key, secret)?);

		Ok(Self::new(session, hosts, root))
	}
}
impl<C, M> Debug for Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("session", &self.session)
			.field("hosts", &self.hosts)
			.field("root", &self.root)
			.field("locale", &self.locale)
			.finish()
	}
}

fn join(base: &Url, path: &str) -> Result<Url, ConfigError> {
	Ok(Url::parse(&format!("{}{path}", base.as_str().trim_end_matches('/')))?)
}

fn builtin_url(raw: &'static str) -> Url {
	Url::parse(raw).unwrap_or_else(|_| unreachable!("built-in host `{raw}` must parse"))
}
