//! Demonstrates plugging a non-reqwest transport into a session.
//!
//! 1. Implement [`HttpTransport`] for the transport and pick its native error type.
//! 2. Provide a [`TransportErrorMapper`] translating that error into the crate [`Error`].
//! 3. Pass both to [`Session::with_http_client`].
//!
//! The transport below answers from memory, so the whole handshake and a chunked upload run
//! offline.

// std
use std::{
	fmt::{Display, Formatter, Result as FmtResult},
	io::Cursor,
	sync::atomic::{AtomicU64, Ordering},
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth1_storage::{
	consumer::Consumer,
	error::{Error, TransportError},
	http::{
		HttpRequest, HttpResponse, HttpTransport, RequestOptions, ResponseBody,
		TransportErrorMapper, TransportFuture,
	},
	http_types::StatusCode,
	session::Session,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let consumer = Consumer::builder("demo-key", "demo-secret")
		.request_token_endpoint(Url::parse("https://storage.example.com/1/oauth/request_token")?)
		.authorization_endpoint(Url::parse("https://www.example.com/1/oauth/authorize")?)
		.access_token_endpoint(Url::parse("https://storage.example.com/1/oauth/access_token")?)
		.build()?;
	let session: Session<InMemoryServer, InMemoryErrorMapper> =
		Session::with_http_client(consumer, InMemoryServer::default(), InMemoryErrorMapper);

	println!("Send your user to {}.", session.start_authorization().await?);

	let access = session.obtain_access_token().await?;

	println!("Obtained access token `{}` ({}).", access.token, session.token_state());

	let payload = b"offline chunked upload payload".to_vec();
	let total_size = payload.len() as u64;
	let mut uploader = session
		.chunked_uploader(
			Url::parse("https://content.example.com/1/chunked_upload")?,
			Cursor::new(payload),
			total_size,
		)
		.with_chunk_size(8)?;
	let state = uploader.upload().await?;

	println!(
		"Uploaded {} of {} bytes as `{}`.",
		state.offset(),
		state.total_size(),
		state.upload_id().unwrap_or_default()
	);

	Ok(())
}

/// Error type the in-memory transport emits for unknown routes.
#[derive(Debug)]
struct UnknownRoute(String);
impl Display for UnknownRoute {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		write!(f, "no route for {}", self.0)
	}
}
impl std::error::Error for UnknownRoute {}

/// Answers the token endpoints and acknowledges every uploaded chunk in full.
#[derive(Default)]
struct InMemoryServer {
	received: AtomicU64,
}
impl HttpTransport for InMemoryServer {
	type TransportError = UnknownRoute;

	fn execute(
		&self,
		request: HttpRequest,
		_: &RequestOptions,
	) -> TransportFuture<'_, Self::TransportError> {
		let path = request.uri().path().to_owned();
		let reply = match path.as_str() {
			"/1/oauth/request_token" =>
				Ok("oauth_token=demo-request&oauth_token_secret=demo-request-secret".to_owned()),
			"/1/oauth/access_token" =>
				Ok("oauth_token=demo-access&oauth_token_secret=demo-access-secret".to_owned()),
			"/1/chunked_upload" => {
				let len = request.body().len() as u64;
				let offset = self.received.fetch_add(len, Ordering::SeqCst) + len;

				Ok(format!("{{\"upload_id\":\"demo-upload\",\"offset\":{offset}}}"))
			},
			_ => Err(UnknownRoute(path)),
		};

		Box::pin(async move {
			let mut response = HttpResponse::new(ResponseBody::full(reply?));

			*response.status_mut() = StatusCode::OK;

			Ok(response)
		})
	}
}

struct InMemoryErrorMapper;
impl TransportErrorMapper<UnknownRoute> for InMemoryErrorMapper {
	fn map_transport_error(&self, error: UnknownRoute) -> Error {
		TransportError::network(error, false).into()
	}
}
