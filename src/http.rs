//! Transport primitives for provider requests.
//!
//! The module exposes [`HttpTransport`], the client's only dependency on an HTTP stack,
//! together with the request shape it receives ([`OutgoingRequest`]) and the immutable
//! [`HttpDefaults`] every call starts from. The default implementation,
//! [`ReqwestTransport`], performs one blocking exchange per call and renders the reply into
//! the raw wire form consumed by [`classify`](crate::response::classify).

#[cfg(feature = "reqwest")] mod reqwest_transport;
#[cfg(feature = "reqwest")] pub use reqwest_transport::*;

// std
use std::{borrow::Cow, fs, time::Duration as StdDuration};
// crates.io
use oauth2::http::header::{ACCEPT, USER_AGENT};
// self
use crate::{_prelude::*, error::ConfigError, params::Params, response::RawResponse};

/// User agent sent on every request.
pub const DEFAULT_USER_AGENT: &str = "oauth2-draft-v10";
/// `Accept` header sent on every request.
pub const DEFAULT_ACCEPT: &str = "application/json";
/// PEM certificate authorities compiled into the crate for the certificate fallback.
pub const BUNDLED_CA_PEM: &[u8] = include_bytes!("../certs/ca_chain_bundle.crt");

/// Abstraction over blocking HTTP stacks able to execute a single provider exchange.
///
/// Implementations must be `Send + Sync + 'static` so a [`Client`](crate::Client) can share
/// them behind an [`Arc`]. Each call owns whatever connection it opens and releases it
/// before returning, on success and failure alike.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request`, validating TLS peers against `trust`.
	///
	/// # Error Contract
	///
	/// - Report a missing or unusable certificate authority as
	///   [`TransportError::UntrustedCertificate`](crate::error::TransportError::UntrustedCertificate);
	///   the client retries exactly once with [`TrustAnchor::Bundled`] on that variant only.
	/// - Return every completed HTTP exchange as a [`RawResponse`], whatever its status.
	fn execute(&self, request: &OutgoingRequest, trust: &TrustAnchor) -> Result<RawResponse>;
}

/// Certificate authorities used to validate the provider's TLS certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrustAnchor {
	/// Platform or transport-default roots.
	System,
	/// PEM bundle shipped with the client, added as extra roots.
	Bundled(CaBundle),
}

/// PEM-encoded certificate authorities used by the certificate fallback.
#[derive(Clone, PartialEq, Eq)]
pub struct CaBundle(Cow<'static, [u8]>);
impl CaBundle {
	/// Bundle compiled into the crate.
	pub const fn bundled() -> Self {
		Self(Cow::Borrowed(BUNDLED_CA_PEM))
	}

	/// Wraps PEM bytes held in memory.
	pub fn from_pem(pem: impl Into<Vec<u8>>) -> Self {
		Self(Cow::Owned(pem.into()))
	}

	/// Reads a PEM bundle from disk.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let pem = fs::read(path)
			.map_err(|source| ConfigError::CaBundleRead { path: path.to_owned(), source })?;

		Ok(Self::from_pem(pem))
	}

	/// PEM bytes.
	pub fn as_pem(&self) -> &[u8] {
		&self.0
	}
}
impl Default for CaBundle {
	fn default() -> Self {
		Self::bundled()
	}
}
impl Debug for CaBundle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CaBundle").field("bytes", &self.0.len()).finish()
	}
}

/// Fully assembled request handed to an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct OutgoingRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute target URL, query included.
	pub url: Url,
	/// Complete header set: defaults, caller headers, and the `Expect` suppression.
	pub headers: HeaderMap,
	/// Encoded body; `None` for GET requests and for empty parameter sets.
	pub body: Option<RequestBody>,
}

/// Request body variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
	/// `application/x-www-form-urlencoded` payload.
	Form(String),
	/// `multipart/form-data` fields, including file parts.
	Multipart(Params),
}

/// Immutable transport configuration shared by every call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpDefaults {
	/// Connection establishment timeout.
	pub connect_timeout: StdDuration,
	/// Whole-exchange timeout.
	pub timeout: StdDuration,
	/// `User-Agent` header value.
	pub user_agent: String,
	/// `Accept` header value.
	pub accept: String,
	/// Whether 3xx responses are followed automatically.
	pub follow_redirects: bool,
	/// Certificate authorities used by the certificate fallback.
	pub ca_bundle: CaBundle,
}
impl HttpDefaults {
	/// Connect timeout applied by default.
	pub const CONNECT_TIMEOUT: StdDuration = StdDuration::from_secs(10);
	/// Total timeout applied by default.
	pub const TIMEOUT: StdDuration = StdDuration::from_secs(60);

	/// Overrides the bundle used by the certificate fallback.
	pub fn with_ca_bundle(mut self, bundle: CaBundle) -> Self {
		self.ca_bundle = bundle;

		self
	}

	/// Builds the header set every request starts from.
	pub fn default_headers(&self) -> Result<HeaderMap, ConfigError> {
		let mut headers = HeaderMap::new();

		headers.insert(ACCEPT, header_value("accept", &self.accept)?);
		headers.insert(USER_AGENT, header_value("user-agent", &self.user_agent)?);

		Ok(headers)
	}
}
impl Default for HttpDefaults {
	fn default() -> Self {
		Self {
			connect_timeout: Self::CONNECT_TIMEOUT,
			timeout: Self::TIMEOUT,
			user_agent: DEFAULT_USER_AGENT.into(),
			accept: DEFAULT_ACCEPT.into(),
			follow_redirects: false,
			ca_bundle: CaBundle::bundled(),
		}
	}
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
	HeaderValue::from_str(value).map_err(|source| ConfigError::InvalidHeader { name, source })
}
