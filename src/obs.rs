//! Optional observability helpers for provider requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_draft.request` with the `method`
//!   (HTTP verb) and `stage` (call site) fields, plus events for the certificate fallback and
//!   transport failures.
//! - Enable `metrics` to increment the `oauth2_draft_request_total` counter for every
//!   attempt and outcome, labeled by `method` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to [`Client::request`](crate::Client::request).
	Attempt,
	/// Non-error HTTP status.
	Success,
	/// Provider answered 4xx/5xx.
	ProviderError,
	/// The exchange could not be completed.
	TransportFailure,
	/// The response could not be parsed.
	ProtocolFailure,
	/// Retried against the bundled certificate authorities.
	CaFallback,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::ProviderError => "provider_error",
			RequestOutcome::TransportFailure => "transport_failure",
			RequestOutcome::ProtocolFailure => "protocol_failure",
			RequestOutcome::CaFallback => "ca_fallback",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
