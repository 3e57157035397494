//! Resumable chunked uploads.
//!
//! [`ChunkedUploader`] pushes a byte source to the chunked-upload endpoint as a sequence of signed
//! PUT requests. Every response carries the server's `upload_id` and the offset it has durably
//! accepted; the uploader adopts that offset and re-sends whatever tail of the chunk was not
//! acknowledged. Nothing is retried: a failed call leaves [`UploadSession`] at the last
//! acknowledged position so callers can persist it and resume later.
//!
//! The uploader never commits. Finalizing the upload into a file is done with
//! [`Client::commit_chunked_upload`](crate::client::Client::commit_chunked_upload).

// std
use std::io::{ErrorKind, Read};
// self
use crate::{
	_prelude::*,
	dispatch::{self, ApiRequest},
	error::{ConfigError, ProtocolError},
	http::{HttpTransport, TransportErrorMapper},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	session::Session,
	signature::Method,
};

/// Bytes sent per PUT unless overridden with [`ChunkedUploader::with_chunk_size`].
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;
/// Consecutive acknowledgements without progress tolerated before the upload fails as stalled.
pub const MAX_IDLE_ACKS: u32 = 8;

/// Acknowledgement returned by the chunked-upload endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkedUploadStatus {
	/// Server-assigned identifier of the upload.
	pub upload_id: String,
	/// Number of bytes the server has durably accepted.
	pub offset: u64,
	/// Server-formatted expiry of the upload session.
	pub expires: String,
}

/// Progress of one chunked upload: `{upload_id, offset, total_size}`.
///
/// `offset` never decreases and never exceeds `total_size`; `upload_id` is assigned by the first
/// acknowledgement and never changes afterwards. Serialize it to resume across process restarts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
	upload_id: Option<String>,
	offset: u64,
	total_size: u64,
}
impl UploadSession {
	/// Fresh session for `total_size` bytes.
	pub fn new(total_size: u64) -> Self {
		Self { upload_id: None, offset: 0, total_size }
	}

	/// Rebuilds a previously persisted session.
	pub fn resume(
		upload_id: Option<String>,
		offset: u64,
		total_size: u64,
	) -> Result<Self, ConfigError> {
		Self { upload_id, offset, total_size }.validated()
	}

	/// Server-assigned identifier, once the first chunk was acknowledged.
	pub fn upload_id(&self) -> Option<&str> {
		self.upload_id.as_deref()
	}

	/// Bytes durably accepted by the server.
	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// Declared size of the whole upload.
	pub fn total_size(&self) -> u64 {
		self.total_size
	}

	/// Bytes still to be acknowledged.
	pub fn remaining(&self) -> u64 {
		self.total_size.saturating_sub(self.offset)
	}

	/// Whether every byte has been acknowledged.
	pub fn is_complete(&self) -> bool {
		self.offset == self.total_size
	}

	/// Applies a server acknowledgement for a chunk ending at `sent_end` and returns the resulting
	/// offset.
	///
	/// The offset only moves forward: a reported offset at or below the current one leaves it
	/// unchanged. The state is left untouched when the acknowledgement is rejected.
	pub fn acknowledge(
		&mut self,
		status: &ChunkedUploadStatus,
		sent_end: u64,
	) -> Result<u64, ProtocolError> {
		let reported_id = match (&self.upload_id, status.upload_id.as_str()) {
			(None, "") => return Err(ProtocolError::MissingField { field: "upload_id" }),
			(None, reported) => Some(reported.to_owned()),
			(Some(_), "") => None,
			(Some(expected), reported) if expected != reported =>
				return Err(ProtocolError::UploadIdChanged {
					expected: expected.clone(),
					reported: reported.to_owned(),
				}),
			(Some(_), _) => None,
		};
		let reported = status.offset;

		if reported > self.total_size {
			return Err(ProtocolError::OffsetOutOfRange { reported, total_size: self.total_size });
		}
		if reported > sent_end {
			return Err(ProtocolError::OffsetBeyondSent { reported, sent: sent_end });
		}
		if reported_id.is_some() {
			self.upload_id = reported_id;
		}

		self.offset = self.offset.max(reported);

		Ok(self.offset)
	}

	fn validated(self) -> Result<Self, ConfigError> {
		if self.offset > self.total_size {
			return Err(ConfigError::InvalidUploadState {
				offset: self.offset,
				total_size: self.total_size,
			});
		}

		Ok(self)
	}
}

/// Drives one chunked upload through a [`Session`].
///
/// All progress-changing methods take `&mut self`, so a single uploader can never be driven by
/// two callers at once. The source must yield bytes starting at the session's current offset.
///
/// The source is a blocking [`Read`]: each chunk (up to the chunk size) is read on the task that
/// drives [`upload`](Self::upload), between two network round-trips, and stalls that executor
/// thread while the read lasts. Prefer in-memory or buffered sources, or drive uploads of slow
/// sources from a context that tolerates blocking (such as `tokio::task::block_in_place`).
pub struct ChunkedUploader<'a, C, M, R>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	R: Read,
{
	session: &'a Session<C, M>,
	endpoint: Url,
	source: R,
	chunk_size: usize,
	state: UploadSession,
	// Bytes read from the source but not yet acknowledged; `pending[0]` sits at `state.offset`.
	pending: Vec<u8>,
}
impl<'a, C, M, R> ChunkedUploader<'a, C, M, R>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	R: Read,
{
	/// Starts a new upload of `total_size` bytes.
	pub fn new(session: &'a Session<C, M>, endpoint: Url, source: R, total_size: u64) -> Self {
		Self {
			session,
			endpoint,
			source,
			chunk_size: DEFAULT_CHUNK_SIZE,
			state: UploadSession::new(total_size),
			pending: Vec::new(),
		}
	}

	/// Continues a persisted upload. `source` must be positioned at `state.offset()`.
	pub fn resume(
		session: &'a Session<C, M>,
		endpoint: Url,
		source: R,
		state: UploadSession,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			session,
			endpoint,
			source,
			chunk_size: DEFAULT_CHUNK_SIZE,
			state: state.validated()?,
			pending: Vec::new(),
		})
	}

	/// Overrides the chunk size.
	pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self, ConfigError> {
		if chunk_size == 0 {
			return Err(ConfigError::InvalidChunkSize);
		}

		self.chunk_size = chunk_size;

		Ok(self)
	}

	/// Current progress.
	pub fn state(&self) -> &UploadSession {
		&self.state
	}

	/// Consumes the uploader, keeping only its progress.
	pub fn into_state(self) -> UploadSession {
		self.state
	}

	/// Sends chunks until the server has acknowledged `total_size` bytes.
	///
	/// Returns immediately for an already complete session. On failure the state still reflects
	/// the last acknowledged chunk, and calling `upload` again continues from there.
	pub async fn upload(&mut self) -> Result<&UploadSession> {
		const KIND: OperationKind = OperationKind::ChunkedUpload;

		let span = OperationSpan::new(KIND, "upload");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span.instrument(self.drive()).await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result.map(|()| &self.state)
	}

	async fn drive(&mut self) -> Result<()> {
		let mut idle_acks = 0;

		while !self.state.is_complete() {
			self.fill_chunk()?;

			let previous = self.state.offset;
			let sent_end = previous + self.pending.len() as u64;
			let mut request = ApiRequest::new(Method::Put, self.endpoint.clone())
				.param("offset", previous.to_string());

			if let Some(upload_id) = self.state.upload_id() {
				request = request.param("upload_id", upload_id);
			}

			let request = request.body(Bytes::copy_from_slice(&self.pending));
			let ack = self.session.json(request).await?;
			let status: ChunkedUploadStatus = dispatch::decode_json(ack)?;
			let offset = self.state.acknowledge(&status, sent_end)?;

			if offset == previous {
				idle_acks += 1;

				if idle_acks >= MAX_IDLE_ACKS {
					return Err(ProtocolError::UploadStalled { offset }.into());
				}

				continue;
			}

			idle_acks = 0;

			self.pending.drain(..(offset - previous) as usize);

			obs::record_upload_progress(self.state.upload_id(), offset, self.state.total_size);
		}

		Ok(())
	}

	// Tops `pending` up to the next chunk length from the source.
	fn fill_chunk(&mut self) -> Result<()> {
		let target = self.state.remaining().min(self.chunk_size as u64) as usize;

		while self.pending.len() < target {
			let filled = self.pending.len();

			self.pending.resize(target, 0);

			let read = self.source.read(&mut self.pending[filled..]);

			match read {
				Ok(0) => {
					self.pending.truncate(filled);

					return Err(Error::Source(std::io::Error::new(
						ErrorKind::UnexpectedEof,
						format!(
							"source ended {} bytes before the declared total size",
							self.state.remaining() - filled as u64
						),
					)));
				},
				Ok(n) => self.pending.truncate(filled + n),
				Err(e) if e.kind() == ErrorKind::Interrupted => self.pending.truncate(filled),
				Err(e) => {
					self.pending.truncate(filled);

					return Err(Error::Source(e));
				},
			}
		}

		Ok(())
	}
}
impl<C, M, R> Debug for ChunkedUploader<'_, C, M, R>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	R: Read,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ChunkedUploader")
			.field("endpoint", &self.endpoint.as_str())
			.field("chunk_size", &self.chunk_size)
			.field("state", &self.state)
			.field("pending", &self.pending.len())
			.finish()
	}
}
