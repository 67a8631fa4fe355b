// self
use crate::{_prelude::*, error::TransportError, http::CaBundle};

/// A span builder used around provider requests.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the provided HTTP method + stage.
	pub fn new(method: &Method, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_draft.request", method = method.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, stage);

			Self {}
		}
	}

	/// Enters the span for the duration of the blocking call.
	pub fn entered(self) -> RequestSpanGuard {
		#[cfg(feature = "tracing")]
		{
			RequestSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			RequestSpanGuard {}
		}
	}
}

/// RAII guard returned by [`RequestSpan::entered`].
pub struct RequestSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for RequestSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RequestSpanGuard(..)")
	}
}

pub(crate) fn ca_fallback_event(bundle: &CaBundle) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			bundle_bytes = bundle.as_pem().len(),
			"Invalid or no certificate authority found, using bundled information."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = bundle;
	}
}

pub(crate) fn transport_failure_event(err: &TransportError) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(code = err.code(), message = %err.message(), "Provider request failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_span_noop_without_subscriber() {
		let _guard = RequestSpan::new(&Method::GET, "test").entered();

		ca_fallback_event(&CaBundle::bundled());
		transport_failure_event(&TransportError::Io(std::io::Error::other("closed")));
	}
}
