// std
use std::{
	io::{Cursor, ErrorKind},
	sync::Mutex,
};
// self
use oauth1_storage::{
	auth::Credential,
	consumer::Consumer,
	error::{ConfigError, Error, ProtocolError, TransportError},
	http::{
		HttpRequest, HttpResponse, HttpTransport, RequestOptions, ResponseBody,
		TransportErrorMapper, TransportFuture,
	},
	http_types::StatusCode,
	serde_json::json,
	session::Session,
	upload::{ChunkedUploader, MAX_IDLE_ACKS, UploadSession},
	url::Url,
};

const MIB: usize = 1024 * 1024;

/// One PUT observed by [`ScriptedServer`].
#[derive(Clone, Debug, PartialEq, Eq)]
struct Put {
	offset: u64,
	upload_id: Option<String>,
	len: usize,
	first_byte: Option<u8>,
}

type Responder = Box<dyn Fn(usize, &Put) -> (u16, String) + Send + Sync>;

/// In-process chunked-upload endpoint answering from a script.
struct ScriptedServer {
	responder: Responder,
	puts: Mutex<Vec<Put>>,
}
impl ScriptedServer {
	fn new(responder: impl Fn(usize, &Put) -> (u16, String) + Send + Sync + 'static) -> Self {
		Self { responder: Box::new(responder), puts: Mutex::new(Vec::new()) }
	}

	fn puts(&self) -> Vec<Put> {
		self.puts.lock().expect("Put log lock should not be poisoned.").clone()
	}
}
impl HttpTransport for ScriptedServer {
	type TransportError = std::io::Error;

	fn execute(
		&self,
		request: HttpRequest,
		_: &RequestOptions,
	) -> TransportFuture<'_, Self::TransportError> {
		let url = Url::parse(&request.uri().to_string()).expect("Signed URI should parse.");
		let query = |name: &str| {
			url.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
		};
		let put = Put {
			offset: query("offset")
				.and_then(|offset| offset.parse().ok())
				.expect("Every chunk must carry an offset."),
			upload_id: query("upload_id"),
			len: request.body().len(),
			first_byte: request.body().first().copied(),
		};
		let index = {
			let mut puts = self.puts.lock().expect("Put log lock should not be poisoned.");

			puts.push(put.clone());

			puts.len() - 1
		};
		let (status, body) = (self.responder)(index, &put);

		Box::pin(async move {
			let mut response = HttpResponse::new(ResponseBody::full(body));

			*response.status_mut() = StatusCode::from_u16(status).expect("Script status is valid.");

			Ok(response)
		})
	}
}

struct IoMapper;
impl TransportErrorMapper<std::io::Error> for IoMapper {
	fn map_transport_error(&self, error: std::io::Error) -> Error {
		TransportError::Io(error).into()
	}
}

fn ack(upload_id: &str, offset: u64) -> (u16, String) {
	let body = json!({
		"upload_id": upload_id,
		"offset": offset,
		"expires": "Tue, 19 Jul 2011 21:55:38 +0000",
	});

	(200, body.to_string())
}

fn full_ack(_: usize, put: &Put) -> (u16, String) {
	ack("upload-1", put.offset + put.len as u64)
}

fn pattern(len: usize) -> Vec<u8> {
	(0..len).map(|i| (i % 251) as u8).collect()
}

fn build_session(server: ScriptedServer) -> Session<ScriptedServer, IoMapper> {
	let consumer = Consumer::builder("consumer-key", "consumer-secret")
		.build()
		.expect("Consumer descriptor should build successfully.");

	Session::with_http_client(consumer, server, IoMapper)
		.with_access_token(Credential::new("acc-token", "acc-secret"))
}

fn upload_endpoint() -> Url {
	Url::parse("https://content.example.com/1/chunked_upload")
		.expect("Failed to parse chunked upload URL.")
}

#[tokio::test]
async fn ten_mib_upload_sends_three_full_chunks() {
	let session = build_session(ScriptedServer::new(full_ack));
	let data = pattern(10 * MIB);
	let mut uploader =
		session.chunked_uploader(upload_endpoint(), Cursor::new(data.clone()), data.len() as u64);
	let state = uploader.upload().await.expect("Fully acknowledged upload should finish.").clone();

	assert_eq!(state.offset(), 10_485_760);
	assert_eq!(state.total_size(), 10_485_760);
	assert_eq!(state.upload_id(), Some("upload-1"));
	assert!(state.is_complete());

	let puts = session.dispatcher.http_client.puts();

	assert_eq!(puts.iter().map(|put| put.offset).collect::<Vec<_>>(), [0, 4_194_304, 8_388_608]);
	assert_eq!(puts.iter().map(|put| put.len).collect::<Vec<_>>(), [4 * MIB, 4 * MIB, 2 * MIB]);
	assert_eq!(
		puts.iter().map(|put| put.upload_id.as_deref()).collect::<Vec<_>>(),
		[None, Some("upload-1"), Some("upload-1")]
	);

	for put in &puts {
		assert_eq!(put.first_byte, Some(data[put.offset as usize]));
	}
}

#[tokio::test]
async fn partially_accepted_chunks_resend_the_unacknowledged_tail() {
	let session = build_session(ScriptedServer::new(|index, put: &Put| match index {
		0 => ack("upload-1", 3),
		_ => full_ack(index, put),
	}));
	let data = pattern(10);
	let mut uploader = session
		.chunked_uploader(upload_endpoint(), Cursor::new(data.clone()), 10)
		.with_chunk_size(4)
		.expect("Positive chunk size is valid.");

	uploader.upload().await.expect("Upload should recover from the partial acceptance.");

	let puts = session.dispatcher.http_client.puts();

	assert_eq!(
		puts.iter().map(|put| (put.offset, put.len)).collect::<Vec<_>>(),
		[(0, 4), (3, 4), (7, 3)]
	);
	assert_eq!(puts[1].first_byte, Some(data[3]));
	assert_eq!(puts[2].first_byte, Some(data[7]));
	assert_eq!(uploader.state().offset(), 10);
}

#[tokio::test]
async fn failures_keep_the_last_acknowledged_state_and_resume() {
	let session = build_session(ScriptedServer::new(|index, put: &Put| match index {
		1 => (503, "{\"error\":\"try later\"}".into()),
		_ => full_ack(index, put),
	}));
	let mut uploader = session
		.chunked_uploader(upload_endpoint(), Cursor::new(pattern(10)), 10)
		.with_chunk_size(4)
		.expect("Positive chunk size is valid.");
	let err = uploader.upload().await.expect_err("Second chunk is rejected.");

	assert!(err.retryable());
	assert!(matches!(err, Error::Transport(TransportError::Status { status: 503, .. })));
	assert_eq!(
		uploader.state(),
		&UploadSession::resume(Some("upload-1".into()), 4, 10).expect("State should be valid.")
	);

	uploader.upload().await.expect("Calling upload again should continue.");

	let puts = session.dispatcher.http_client.puts();

	assert_eq!(
		puts.iter().map(|put| (put.offset, put.len)).collect::<Vec<_>>(),
		[(0, 4), (4, 4), (4, 4), (8, 2)]
	);
	assert!(uploader.into_state().is_complete());
}

#[tokio::test]
async fn persisted_state_resumes_at_its_offset() {
	let session = build_session(ScriptedServer::new(full_ack));
	let data = pattern(10);
	let state = UploadSession::resume(Some("upload-1".into()), 6, 10)
		.expect("Persisted state should be valid.");
	let mut uploader =
		ChunkedUploader::resume(&session, upload_endpoint(), Cursor::new(data[6..].to_vec()), state)
			.expect("Resumed uploader should build.");

	uploader.upload().await.expect("Resumed upload should finish.");

	assert_eq!(
		session.dispatcher.http_client.puts(),
		[Put { offset: 6, upload_id: Some("upload-1".into()), len: 4, first_byte: Some(data[6]) }]
	);
}

#[tokio::test]
async fn completed_sessions_send_nothing() {
	let session = build_session(ScriptedServer::new(full_ack));
	let state = UploadSession::resume(Some("upload-1".into()), 10, 10)
		.expect("Complete state should be valid.");
	let mut uploader =
		ChunkedUploader::resume(&session, upload_endpoint(), Cursor::new(Vec::new()), state)
			.expect("Resumed uploader should build.");

	uploader.upload().await.expect("Complete upload is a no-op.");

	assert!(session.dispatcher.http_client.puts().is_empty());
}

#[tokio::test]
async fn acknowledgements_without_progress_resend_from_the_same_offset() {
	let session = build_session(ScriptedServer::new(|index, put: &Put| match index {
		1 => ack("upload-1", put.offset),
		_ => full_ack(index, put),
	}));
	let data = pattern(10);
	let mut uploader = session
		.chunked_uploader(upload_endpoint(), Cursor::new(data.clone()), 10)
		.with_chunk_size(4)
		.expect("Positive chunk size is valid.");

	uploader.upload().await.expect("An idle acknowledgement must not abort the upload.");

	let puts = session.dispatcher.http_client.puts();

	assert_eq!(
		puts.iter().map(|put| (put.offset, put.len)).collect::<Vec<_>>(),
		[(0, 4), (4, 4), (4, 4), (8, 2)]
	);
	assert_eq!(puts[2].first_byte, Some(data[4]));
	assert!(uploader.state().is_complete());
}

#[tokio::test]
async fn stalled_server_fails_instead_of_looping() {
	let session = build_session(ScriptedServer::new(|_, _: &Put| ack("upload-1", 0)));
	let mut uploader = session
		.chunked_uploader(upload_endpoint(), Cursor::new(pattern(10)), 10)
		.with_chunk_size(4)
		.expect("Positive chunk size is valid.");
	let err = uploader.upload().await.expect_err("Endless zero progress must fail.");

	assert!(matches!(err, Error::Protocol(ProtocolError::UploadStalled { offset: 0 })));
	assert_eq!(session.dispatcher.http_client.puts().len(), MAX_IDLE_ACKS as usize);
	assert_eq!(
		uploader.state(),
		&UploadSession::resume(Some("upload-1".into()), 0, 10).expect("State should be valid.")
	);
}

#[tokio::test]
async fn inconsistent_acknowledgements_are_protocol_errors() {
	let session = build_session(ScriptedServer::new(|_, _: &Put| ack("upload-1", 11)));
	let mut uploader = session.chunked_uploader(upload_endpoint(), Cursor::new(pattern(10)), 10);
	let err = uploader.upload().await.expect_err("Offset past the total must fail.");

	assert!(matches!(
		err,
		Error::Protocol(ProtocolError::OffsetOutOfRange { reported: 11, total_size: 10 })
	));

	let session = build_session(ScriptedServer::new(|index, put: &Put| match index {
		0 => full_ack(index, put),
		_ => ack("upload-2", put.offset + put.len as u64),
	}));
	let mut uploader = session
		.chunked_uploader(upload_endpoint(), Cursor::new(pattern(10)), 10)
		.with_chunk_size(4)
		.expect("Positive chunk size is valid.");
	let err = uploader.upload().await.expect_err("Changed upload id must fail.");

	assert!(matches!(err, Error::Protocol(ProtocolError::UploadIdChanged { .. })));
	assert_eq!(uploader.state().offset(), 4);
	assert_eq!(uploader.state().upload_id(), Some("upload-1"));
}

#[tokio::test]
async fn short_sources_fail_with_a_source_error() {
	let session = build_session(ScriptedServer::new(full_ack));
	let mut uploader = session
		.chunked_uploader(upload_endpoint(), Cursor::new(pattern(6)), 10)
		.with_chunk_size(4)
		.expect("Positive chunk size is valid.");
	let err = uploader.upload().await.expect_err("Source ends before the declared size.");

	assert!(matches!(&err, Error::Source(io) if io.kind() == ErrorKind::UnexpectedEof));
	assert_eq!(uploader.state().offset(), 4);
	assert_eq!(session.dispatcher.http_client.puts().len(), 1);
}

#[test]
fn zero_chunk_size_is_rejected() {
	let session = build_session(ScriptedServer::new(full_ack));
	let err = session
		.chunked_uploader(upload_endpoint(), Cursor::new(pattern(4)), 4)
		.with_chunk_size(0)
		.expect_err("Zero chunk size must be rejected.");

	assert!(matches!(err, ConfigError::InvalidChunkSize));
}
