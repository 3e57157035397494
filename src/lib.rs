//! OAuth 1.0a client toolkit for cloud-storage HTTP APIs: deterministic HMAC-SHA1 request signing,
//! memoized request/access token handshakes, a multi-format signed request dispatcher, and a
//! resumable chunked-upload controller.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod consumer;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod obs;
pub mod session;
pub mod signature;
pub mod token;
pub mod upload;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use bytes::Bytes;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
