//! Client-level error types shared by the transport, classifier, and strategies.

// std
use std::io::Error as IoError;
// crates.io
use oauth2::http::header::InvalidHeaderValue;
// self
use crate::{_prelude::*, response::ProviderError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Provider 4xx/5xx answers are not part of this enum when they come back from
/// [`Client::request`](crate::client::Client::request); they are returned as
/// [`ProviderOutcome::ProviderError`](crate::response::ProviderOutcome) data instead.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The HTTP exchange could not be completed.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The provider answered with something that is not a well-formed HTTP response.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	/// Provider rejected a strategy-level exchange.
	#[error("Provider rejected the request with HTTP {}: {}.", .0.code, .0.message)]
	Provider(ProviderError),
	/// Authorization redirect carried an unexpected `state` value.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Request or provider URL cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A default header carries bytes that are not valid in an HTTP header.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name.
		name: &'static str,
		/// Underlying validation failure.
		#[source]
		source: InvalidHeaderValue,
	},
	/// Client options could not be deserialized.
	#[error("Client options are invalid at `{}`.", .source.path())]
	InvalidOptions {
		/// Structured parsing failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Certificate authority bundle file could not be read.
	#[error("Certificate bundle `{}` could not be read.", .path.display())]
	CaBundleRead {
		/// Bundle location.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: IoError,
	},
	/// Certificate authority bundle holds no usable PEM certificates.
	#[error("Certificate bundle is invalid.")]
	InvalidCaBundle {
		/// Underlying parsing failure.
		#[source]
		source: BoxError,
	},
	/// File field used where only text can be encoded.
	#[error("File field `{field}` requires a non-GET request with file upload support enabled.")]
	FileFieldRequiresUpload {
		/// Parameter name of the file field.
		field: String,
	},
	/// File referenced by a multipart field could not be opened.
	#[error("File `{}` for field `{field}` could not be read.", .path.display())]
	FileRead {
		/// Parameter name of the file field.
		field: String,
		/// File location.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: IoError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (DNS, TCP, TLS, timeouts, IO).
///
/// Every variant maps onto the numeric code a curl-based client would report, see
/// [`TransportError::code`].
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Server certificate does not chain to a trusted certificate authority.
	#[error("Server certificate could not be verified against a known certificate authority.")]
	UntrustedCertificate {
		/// Transport-specific TLS failure.
		#[source]
		source: BoxError,
	},
	/// Connect or total timeout elapsed.
	#[error("Request to the provider timed out.")]
	Timeout {
		/// Transport-specific timeout failure.
		#[source]
		source: BoxError,
	},
	/// Connection could not be established.
	#[error("Could not connect to the provider.")]
	Connect {
		/// Transport-specific connect failure.
		#[source]
		source: BoxError,
	},
	/// Any other network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network failure.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] IoError),
}
impl TransportError {
	/// Wraps a TLS failure caused by a missing or unusable certificate authority.
	pub fn untrusted_certificate(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::UntrustedCertificate { source: Box::new(src) }
	}

	/// Wraps a timeout failure.
	pub fn timeout(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Timeout { source: Box::new(src) }
	}

	/// Wraps a connect failure.
	pub fn connect(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Connect { source: Box::new(src) }
	}

	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns `true` when retrying against the bundled certificate authorities may help.
	pub fn is_untrusted_certificate(&self) -> bool {
		matches!(self, Self::UntrustedCertificate { .. })
	}

	/// Numeric failure code (`CURLE_*` compatible).
	pub fn code(&self) -> u16 {
		match self {
			Self::UntrustedCertificate { .. } => 60,
			Self::Timeout { .. } => 28,
			Self::Connect { .. } => 7,
			Self::Network { .. } => 56,
			Self::Io(_) => 26,
		}
	}

	/// Message reported by the underlying transport.
	pub fn message(&self) -> String {
		match self {
			Self::UntrustedCertificate { source }
			| Self::Timeout { source }
			| Self::Connect { source }
			| Self::Network { source } => source.to_string(),
			Self::Io(e) => e.to_string(),
		}
	}
}

/// Malformed provider responses.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// No blank line separates the header block from the body.
	#[error("Response has no blank line between headers and body.")]
	MissingHeaderTerminator,
	/// First response line is not an HTTP status line.
	#[error("Response status line `{line}` is malformed.")]
	InvalidStatusLine {
		/// Offending line.
		line: String,
	},
	/// Token endpoint body could not be decoded.
	#[error("Token endpoint returned a malformed body.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint body has no `access_token`.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// Token endpoint returned a non-numeric `expires_in`.
	#[error("The expires_in value `{value}` is not a number of seconds.")]
	InvalidExpiresIn {
		/// Raw value.
		value: String,
	},
}
