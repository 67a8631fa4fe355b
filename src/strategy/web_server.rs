//! Authorization-code ("web server") strategy: redirect construction, `state` validation,
//! and the code-for-token exchange.

// crates.io
use oauth2::{AccessToken, RefreshToken};
use rand::{Rng, distr::Alphanumeric};
use serde_json::{Map, Value};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	client::Client,
	error::ProtocolError,
	http::HttpTransport,
	params::Params,
	response::ProviderOutcome,
};

const STATE_LEN: usize = 32;

/// Authorization-code ("web server") strategy.
///
/// Sends the user agent to the authorization endpoint, then trades the returned code for an
/// access token at the token endpoint through [`Client::request`].
pub struct WebServer<'a, T>
where
	T: ?Sized + HttpTransport,
{
	client: &'a Client<T>,
}
impl<'a, T> WebServer<'a, T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) fn new(client: &'a Client<T>) -> Self {
		Self { client }
	}

	/// Parameters for the authorization redirect, followed by `extra`.
	pub fn authorize_params(&self, redirect_uri: &str, extra: &Params) -> Params {
		let mut params = Params::new()
			.text("response_type", "code")
			.text("client_id", self.client.config().id().as_str())
			.text("redirect_uri", redirect_uri);

		params.extend(extra);

		params
	}

	/// Absolute authorization URL to send the user agent to.
	pub fn authorize_url(&self, redirect_uri: &str, extra: &Params) -> Result<Url> {
		self.client.authorize_endpoint(&self.authorize_params(redirect_uri, extra))
	}

	/// Builds the authorization URL with a fresh random `state` to verify on the callback.
	pub fn start_authorization(
		&self,
		redirect_uri: &str,
		extra: &Params,
	) -> Result<AuthorizationRequest> {
		let state = random_string(STATE_LEN);
		let mut params = extra.clone();

		params.push_text("state", state.as_str());

		let url = self.authorize_url(redirect_uri, &params)?;

		Ok(AuthorizationRequest { url, state, redirect_uri: redirect_uri.to_owned() })
	}

	/// Parameters for the code exchange, followed by `extra`.
	pub fn access_token_params(&self, code: &str, redirect_uri: &str, extra: &Params) -> Params {
		let config = self.client.config();
		let mut params = Params::new()
			.text("grant_type", "authorization_code")
			.text("client_id", config.id().as_str())
			.text("client_secret", config.secret().secret().as_str())
			.text("code", code)
			.text("redirect_uri", redirect_uri);

		params.extend(extra);

		params
	}

	/// Exchanges an authorization code for an access token.
	///
	/// A 4xx/5xx answer from the token endpoint is returned as [`Error::Provider`].
	pub fn get_access_token(
		&self,
		code: &str,
		redirect_uri: &str,
		extra: &Params,
	) -> Result<AccessTokenGrant> {
		let url = self.client.access_token_url(&Params::new());
		let params = self.access_token_params(code, redirect_uri, extra);

		match self.client.request(Method::POST, &url, &params, &HeaderMap::new())? {
			ProviderOutcome::Success(body) => AccessTokenGrant::parse(&body),
			ProviderOutcome::ProviderError(error) => Err(Error::Provider(error)),
		}
	}
}
impl<T> Debug for WebServer<'_, T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebServer").field("client", self.client).finish()
	}
}

/// Authorization redirect metadata returned by [`WebServer::start_authorization`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Fully-formed authorization URL.
	pub url: Url,
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI to repeat during the code exchange.
	pub redirect_uri: String,
}
impl AuthorizationRequest {
	/// Validates the `state` parameter returned on the callback.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::StateMismatch) }
	}
}

/// Token endpoint answer.
#[derive(Clone, Debug)]
pub struct AccessTokenGrant {
	/// Issued access token.
	pub access_token: AccessToken,
	/// Refresh token, when issued.
	pub refresh_token: Option<RefreshToken>,
	/// Token type, e.g. `bearer`.
	pub token_type: Option<String>,
	/// Granted scope as sent by the provider.
	pub scope: Option<String>,
	/// Lifetime reported via `expires_in` (or `expires`).
	pub expires_in: Option<Duration>,
	/// Moment the grant was parsed.
	pub issued_at: OffsetDateTime,
	/// Fields the client does not interpret.
	pub extra: BTreeMap<String, Value>,
}
impl AccessTokenGrant {
	/// Parses a token endpoint body issued now.
	pub fn parse(body: &str) -> Result<Self> {
		Self::parse_at(body, OffsetDateTime::now_utc())
	}

	/// Parses a JSON or `application/x-www-form-urlencoded` token endpoint body.
	pub fn parse_at(body: &str, issued_at: OffsetDateTime) -> Result<Self> {
		let raw = if body.trim_start().starts_with('{') {
			let mut de = serde_json::Deserializer::from_str(body);

			serde_path_to_error::deserialize::<_, RawGrant>(&mut de)
		} else {
			let fields = form_urlencoded::parse(body.trim().as_bytes())
				.map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
				.collect::<Map<_, _>>();

			serde_path_to_error::deserialize::<_, RawGrant>(Value::Object(fields))
		}
		.map_err(|source| ProtocolError::TokenResponseParse { source })?;
		let access_token = raw
			.access_token
			.filter(|token| !token.is_empty())
			.ok_or(ProtocolError::MissingAccessToken)?;
		let expires_in =
			raw.expires_in.map(|lifetime| lifetime.into_duration(issued_at)).transpose()?;

		Ok(Self {
			access_token: AccessToken::new(access_token),
			refresh_token: raw.refresh_token.map(RefreshToken::new),
			token_type: raw.token_type,
			scope: raw.scope,
			expires_in,
			issued_at,
			extra: raw.extra,
		})
	}

	/// Expiry instant, when the provider reported a lifetime that fits the calendar.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_in.and_then(|lifetime| self.issued_at.checked_add(lifetime))
	}

	/// Returns `true` once `now` reaches the expiry instant.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expires_at| now >= expires_at)
	}
}

#[derive(Deserialize)]
struct RawGrant {
	access_token: Option<String>,
	refresh_token: Option<String>,
	token_type: Option<String>,
	scope: Option<String>,
	#[serde(alias = "expires")]
	expires_in: Option<Lifetime>,
	#[serde(flatten)]
	extra: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lifetime {
	Seconds(i64),
	Text(String),
}
impl Lifetime {
	// The expiry instant must be representable from `issued_at`.
	fn into_duration(self, issued_at: OffsetDateTime) -> Result<Duration, ProtocolError> {
		let (secs, value) = match self {
			Lifetime::Seconds(secs) => (Some(secs), secs.to_string()),
			Lifetime::Text(text) => (text.trim().parse().ok(), text),
		};

		secs.map(Duration::seconds)
			.filter(|lifetime| issued_at.checked_add(*lifetime).is_some())
			.ok_or(ProtocolError::InvalidExpiresIn { value })
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
