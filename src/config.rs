//! Client identity and provider configuration.
//!
//! [`ClientConfig`] is plain data: the OAuth client identifier and secret, the provider base
//! site, and the [`ClientOptions`] consumed by the protocol client. Setters perform no
//! validation; treat a config as immutable once it is shared with a [`Client`](crate::Client).

pub mod options;

pub use options::*;

// crates.io
use oauth2::{ClientId, ClientSecret};
// self
use crate::_prelude::*;

/// Client credentials and provider configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	id: ClientId,
	secret: ClientSecret,
	site: String,
	options: ClientOptions,
}
impl ClientConfig {
	/// Builds a config, moving `options.site` (when present) into the dedicated site field.
	pub fn new(id: impl Into<String>, secret: impl Into<String>, options: ClientOptions) -> Self {
		let mut config = Self {
			id: ClientId::new(id.into()),
			secret: ClientSecret::new(secret.into()),
			site: String::new(),
			options: ClientOptions::default(),
		};

		config.set_options(options);

		config
	}

	/// Builds a config from a JSON options object.
	pub fn from_json_str(
		id: impl Into<String>,
		secret: impl Into<String>,
		options: &str,
	) -> Result<Self> {
		Ok(Self::new(id, secret, ClientOptions::from_json_str(options)?))
	}

	/// Client identifier.
	pub fn id(&self) -> &ClientId {
		&self.id
	}

	/// Replaces the client identifier.
	pub fn set_id(&mut self, id: impl Into<String>) {
		self.id = ClientId::new(id.into());
	}

	/// Client secret. Callers must avoid logging the exposed value.
	pub fn secret(&self) -> &ClientSecret {
		&self.secret
	}

	/// Replaces the client secret.
	pub fn set_secret(&mut self, secret: impl Into<String>) {
		self.secret = ClientSecret::new(secret.into());
	}

	/// Provider base URL; empty when none was configured.
	pub fn site(&self) -> &str {
		&self.site
	}

	/// Replaces the provider base URL.
	pub fn set_site(&mut self, site: impl Into<String>) {
		self.site = site.into();
	}

	/// Provider options. `site` is always `None` here.
	pub fn options(&self) -> &ClientOptions {
		&self.options
	}

	/// Replaces the provider options, absorbing any `site` entry first.
	pub fn set_options(&mut self, mut options: ClientOptions) {
		if let Some(site) = options.site.take() {
			self.site = site;
		}

		self.options = options;
	}
}
