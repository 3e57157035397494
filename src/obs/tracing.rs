// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by crate operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("oauth1_storage.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event after the server acknowledged a chunk.
pub fn record_upload_progress(upload_id: Option<&str>, offset: u64, total_size: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(upload_id, offset, total_size, "chunk acknowledged");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (upload_id, offset, total_size);
	}
}

/// Emits a debug event when a token is served from the cache instead of the network.
pub fn record_token_cache_hit(kind: OperationKind) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation = kind.as_str(), "token served from cache");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = kind;
	}
}
