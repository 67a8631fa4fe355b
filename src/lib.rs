//! Blocking OAuth 2.0 (draft v10) client: endpoint URL builders, a hardened request primitive
//! with a bundled certificate-authority fallback, and provider error classification.
//!
//! [`Client::request`] is the single network entry point. Provider 4xx/5xx answers come back
//! as [`ProviderOutcome::ProviderError`](response::ProviderOutcome::ProviderError) data so
//! callers can read the status, the reason phrase, and any `WWW-Authenticate` error code;
//! only transport, protocol, and configuration failures are surfaced as [`Error`](error::Error).

#![deny(clippy::all, missing_docs)]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod params;
pub mod response;
pub mod strategy;
#[cfg(feature = "test")]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::{collections::VecDeque, io::Error as IoError};
	// crates.io
	use parking_lot::Mutex;
	// self
	use crate::{
		client::Client,
		config::{ClientConfig, ClientOptions},
		error::TransportError,
		http::{HttpDefaults, HttpTransport, OutgoingRequest, TrustAnchor},
		response::RawResponse,
	};

	/// Site used by [`build_recording_client`].
	pub const TEST_SITE: &str = "https://provider.example.com";

	/// Scripted transport that replays canned results and records every call.
	#[derive(Debug, Default)]
	pub struct RecordingTransport {
		script: Mutex<VecDeque<Result<RawResponse>>>,
		calls: Mutex<Vec<(OutgoingRequest, TrustAnchor)>>,
	}
	impl RecordingTransport {
		/// Queues a completed exchange.
		pub fn respond(self, raw: impl Into<String>) -> Self {
			self.script.lock().push_back(Ok(RawResponse::new(raw)));

			self
		}

		/// Queues a transport failure.
		pub fn fail(self, err: TransportError) -> Self {
			self.script.lock().push_back(Err(err.into()));

			self
		}

		/// Requests seen so far, with the trust anchor each one was sent under.
		pub fn calls(&self) -> Vec<(OutgoingRequest, TrustAnchor)> {
			self.calls.lock().clone()
		}
	}
	impl HttpTransport for RecordingTransport {
		fn execute(&self, request: &OutgoingRequest, trust: &TrustAnchor) -> Result<RawResponse> {
			self.calls.lock().push((request.clone(), trust.clone()));
			self.script.lock().pop_front().unwrap_or_else(|| {
				Err(TransportError::Io(IoError::other("Recording transport script is exhausted."))
					.into())
			})
		}
	}

	/// Builds a client for [`TEST_SITE`] on top of `transport`.
	pub fn build_recording_client(
		options: ClientOptions,
		transport: RecordingTransport,
	) -> (Client<RecordingTransport>, Arc<RecordingTransport>) {
		let transport = Arc::new(transport);
		let config =
			ClientConfig::new("client-id", "client-secret", options.with_site(TEST_SITE));
		let client = Client::with_transport(config, transport.clone(), HttpDefaults::default());

		(client, transport)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		path::{Path, PathBuf},
		sync::Arc,
	};

	pub use oauth2::http::{HeaderMap, HeaderValue, Method};
	#[cfg(feature = "reqwest")] pub use reqwest::Error as ReqwestError;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use client::Client;
pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
