//! Protocol client: endpoint URL builders and the request primitive.
//!
//! [`Client`] pairs a [`ClientConfig`] with an [`HttpTransport`] and the shared
//! [`HttpDefaults`]. [`Client::request`] performs one blocking exchange (plus at most one
//! retry against the bundled certificate authorities) and classifies the reply. Provider
//! 4xx/5xx statuses come back as [`ProviderOutcome::ProviderError`] data; only transport,
//! protocol, and configuration failures are returned as [`Error`].

// std
use std::borrow::Cow;
// crates.io
use oauth2::http::header::EXPECT;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::ConfigError,
	http::{HttpDefaults, HttpTransport, OutgoingRequest, RequestBody, TrustAnchor},
	obs::{self, RequestOutcome, RequestSpan},
	params::Params,
	response::{self, ProviderOutcome},
	strategy::WebServer,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default blocking reqwest transport.
pub type ReqwestDraftClient = Client<ReqwestTransport>;

/// OAuth 2.0 draft-v10 protocol client.
///
/// The config is read on every call; mutate it through [`Client::config_mut`] only while no
/// request is in flight (the borrow checker enforces this for a single owner).
pub struct Client<T>
where
	T: ?Sized + HttpTransport,
{
	config: ClientConfig,
	transport: Arc<T>,
	defaults: Arc<HttpDefaults>,
}
impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client over a caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		defaults: impl Into<Arc<HttpDefaults>>,
	) -> Self {
		Self { config, transport: transport.into(), defaults: defaults.into() }
	}

	/// Client configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Mutable client configuration.
	pub fn config_mut(&mut self) -> &mut ClientConfig {
		&mut self.config
	}

	/// Transport defaults shared by every call.
	pub fn defaults(&self) -> &HttpDefaults {
		&self.defaults
	}

	/// Underlying transport.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Authorization endpoint followed by `?` and the URL-encoded text params.
	///
	/// The endpoint comes from `authorize_url`, then `authorize_path`, then
	/// [`DEFAULT_AUTHORIZE_PATH`](crate::config::DEFAULT_AUTHORIZE_PATH); empty values are
	/// skipped. An empty `params` yields a trailing bare `?`.
	pub fn authorize_url(&self, params: &Params) -> String {
		format!("{}?{}", self.config.options().authorize_endpoint(), params.to_query())
	}

	/// Token endpoint followed by `?` and the URL-encoded text params.
	///
	/// Same resolution order as [`Client::authorize_url`] with `access_token_url`,
	/// `access_token_path`, and [`DEFAULT_ACCESS_TOKEN_PATH`](crate::config::DEFAULT_ACCESS_TOKEN_PATH).
	pub fn access_token_url(&self, params: &Params) -> String {
		format!("{}?{}", self.config.options().access_token_endpoint(), params.to_query())
	}

	/// [`Client::authorize_url`] resolved against the configured site.
	pub fn authorize_endpoint(&self, params: &Params) -> Result<Url> {
		self.resolve_url(&self.authorize_url(params))
	}

	/// [`Client::access_token_url`] resolved against the configured site.
	pub fn access_token_endpoint(&self, params: &Params) -> Result<Url> {
		self.resolve_url(&self.access_token_url(params))
	}

	/// Parses `url`, joining relative references onto the configured site.
	pub fn resolve_url(&self, url: &str) -> Result<Url> {
		match Url::parse(url) {
			Ok(url) => Ok(url),
			Err(url::ParseError::RelativeUrlWithoutBase) if !self.config.site().is_empty() => {
				let site = Url::parse(self.config.site())
					.map_err(|source| invalid_url(self.config.site(), source))?;

				site.join(url).map_err(|source| invalid_url(url, source).into())
			},
			Err(source) => Err(invalid_url(url, source).into()),
		}
	}

	/// Performs one provider exchange and classifies the response.
	///
	/// - GET requests carry `params` in the query string and never send a body.
	/// - Other verbs send `params` as a URL-encoded form, or as multipart fields when the
	///   `file_upload_support` option is set.
	/// - `headers` are appended to the `Accept` and `User-Agent` defaults and never replace
	///   them: a caller `Accept` is sent next to `application/json` as a second value. Change
	///   [`HttpDefaults::accept`] or [`HttpDefaults::user_agent`] to override a default. An empty
	///   `Expect` header is always set so no `100-continue` round trip happens.
	/// - A TLS failure caused by an unknown certificate authority is retried exactly once
	///   against [`HttpDefaults::ca_bundle`].
	pub fn request(
		&self,
		method: Method,
		url: &str,
		params: &Params,
		headers: &HeaderMap,
	) -> Result<ProviderOutcome> {
		let _span = RequestSpan::new(&method, "request").entered();

		obs::record_request_outcome(&method, RequestOutcome::Attempt);

		let request = self.prepare(method.clone(), url, params, headers)?;
		let outcome = self.exchange(&request);
		let label = match &outcome {
			Ok(ProviderOutcome::Success(_)) => RequestOutcome::Success,
			Ok(ProviderOutcome::ProviderError(_)) => RequestOutcome::ProviderError,
			Err(Error::Protocol(_)) => RequestOutcome::ProtocolFailure,
			Err(_) => RequestOutcome::TransportFailure,
		};

		obs::record_request_outcome(&method, label);

		outcome
	}

	/// Returns the authorization-code strategy bound to this client.
	pub fn web_server(&self) -> WebServer<'_, T> {
		WebServer::new(self)
	}

	fn prepare(
		&self,
		method: Method,
		url: &str,
		params: &Params,
		headers: &HeaderMap,
	) -> Result<OutgoingRequest> {
		let mut target = Cow::Borrowed(url);
		let mut body = None;

		if !params.is_empty() {
			if method == Method::GET {
				target = Cow::Owned(append_query(url, &params.to_text_only_query()?));
			} else if self.config.options().file_upload_support {
				body = Some(RequestBody::Multipart(params.clone()));
			} else {
				body = Some(RequestBody::Form(params.to_text_only_query()?));
			}
		}

		let url = self.resolve_url(&target)?;
		let mut merged = self.defaults.default_headers()?;

		for (name, value) in headers {
			merged.append(name.clone(), value.clone());
		}

		merged.insert(EXPECT, HeaderValue::from_static(""));

		Ok(OutgoingRequest { method, url, headers: merged, body })
	}

	fn exchange(&self, request: &OutgoingRequest) -> Result<ProviderOutcome> {
		let raw = match self.transport.execute(request, &TrustAnchor::System) {
			Err(Error::Transport(err)) if err.is_untrusted_certificate() => {
				obs::ca_fallback_event(&self.defaults.ca_bundle);
				obs::record_request_outcome(&request.method, RequestOutcome::CaFallback);

				self.transport.execute(request, &TrustAnchor::Bundled(self.defaults.ca_bundle.clone()))
			},
			result => result,
		};
		let raw = raw.inspect_err(|e| {
			if let Error::Transport(err) = e {
				obs::transport_failure_event(err);
			}
		})?;

		Ok(response::classify(&raw)?)
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a client backed by the blocking reqwest transport and [`HttpDefaults::default`].
	pub fn new(config: ClientConfig) -> Result<Self> {
		Self::with_defaults(config, HttpDefaults::default())
	}

	/// Creates a reqwest-backed client with custom transport defaults.
	pub fn with_defaults(config: ClientConfig, defaults: HttpDefaults) -> Result<Self> {
		let defaults = Arc::new(defaults);
		let transport = ReqwestTransport::new(defaults.clone())?;

		Ok(Self::with_transport(config, transport, defaults))
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("config", &self.config)
			.field("defaults", &self.defaults)
			.finish()
	}
}

fn append_query(url: &str, query: &str) -> String {
	let separator = if !url.contains('?') {
		"?"
	} else if url.ends_with('?') || url.ends_with('&') {
		""
	} else {
		"&"
	};

	format!("{url}{separator}{query}")
}

fn invalid_url(url: &str, source: url::ParseError) -> ConfigError {
	ConfigError::InvalidUrl { url: url.to_owned(), source }
}
