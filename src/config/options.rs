//! Provider options and endpoint resolution.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default authorization endpoint path.
pub const DEFAULT_AUTHORIZE_PATH: &str = "/oauth/authorize";
/// Default token endpoint path.
pub const DEFAULT_ACCESS_TOKEN_PATH: &str = "/oauth/access_token";

/// Provider options recognized by the client, plus passthrough keys it does not interpret.
///
/// Unknown keys land in [`ClientOptions::extra`] and are preserved verbatim. The `site` key is
/// accepted only as an input carrier: [`ClientConfig`](crate::config::ClientConfig) moves it into
/// its dedicated field on construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
	/// Provider base URL supplied alongside the other options.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub site: Option<String>,
	/// Full authorization endpoint URL; wins over `authorize_path`.
	pub authorize_url: Option<String>,
	/// Authorization endpoint path.
	pub authorize_path: Option<String>,
	/// Full token endpoint URL; wins over `access_token_path`.
	pub access_token_url: Option<String>,
	/// Token endpoint path.
	pub access_token_path: Option<String>,
	/// Sends non-GET parameters as multipart fields instead of a URL-encoded form.
	pub file_upload_support: bool,
	/// Keys the client does not interpret.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl ClientOptions {
	/// Parses options from a JSON object, reporting the offending path on failure.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::InvalidOptions { source })
	}

	/// Sets the provider base URL.
	pub fn with_site(mut self, site: impl Into<String>) -> Self {
		self.site = Some(site.into());

		self
	}

	/// Sets the full authorization endpoint URL.
	pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
		self.authorize_url = Some(url.into());

		self
	}

	/// Sets the authorization endpoint path.
	pub fn with_authorize_path(mut self, path: impl Into<String>) -> Self {
		self.authorize_path = Some(path.into());

		self
	}

	/// Sets the full token endpoint URL.
	pub fn with_access_token_url(mut self, url: impl Into<String>) -> Self {
		self.access_token_url = Some(url.into());

		self
	}

	/// Sets the token endpoint path.
	pub fn with_access_token_path(mut self, path: impl Into<String>) -> Self {
		self.access_token_path = Some(path.into());

		self
	}

	/// Toggles multipart encoding for non-GET parameters.
	pub fn with_file_upload_support(mut self, enabled: bool) -> Self {
		self.file_upload_support = enabled;

		self
	}

	/// Stores a passthrough key.
	pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.extra.insert(key.into(), value.into());

		self
	}

	/// Authorization endpoint chosen by the `authorize_url` → `authorize_path` → default chain.
	pub fn authorize_endpoint(&self) -> &str {
		resolve_endpoint(&self.authorize_url, &self.authorize_path, DEFAULT_AUTHORIZE_PATH)
	}

	/// Token endpoint chosen by the `access_token_url` → `access_token_path` → default chain.
	pub fn access_token_endpoint(&self) -> &str {
		resolve_endpoint(&self.access_token_url, &self.access_token_path, DEFAULT_ACCESS_TOKEN_PATH)
	}
}

// Empty strings count as unset.
fn resolve_endpoint<'a>(
	url: &'a Option<String>,
	path: &'a Option<String>,
	default: &'static str,
) -> &'a str {
	[url, path]
		.into_iter()
		.filter_map(|value| value.as_deref())
		.find(|value| !value.is_empty())
		.unwrap_or(default)
}
