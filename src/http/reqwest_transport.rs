// std
use std::{borrow::Cow, io::Error as IoError};
// crates.io
use hyper::ext::ReasonPhrase;
use oauth2::http::header::CONTENT_TYPE;
use reqwest::{
	Certificate,
	blocking::{
		Client as BlockingClient, ClientBuilder, Response,
		multipart::{Form, Part},
	},
	redirect::Policy,
};
use rustls::{CertificateError, Error as TlsError};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	http::{CaBundle, HttpDefaults, HttpTransport, OutgoingRequest, RequestBody, TrustAnchor},
	params::{FilePart, Params},
	response::RawResponse,
};

/// Blocking reqwest transport configured from [`HttpDefaults`].
///
/// Redirects are never followed unless the defaults ask for it, because token endpoints
/// answer directly. Idle connections are not pooled, so every call opens and drops its own.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: BlockingClient,
	defaults: Arc<HttpDefaults>,
}
impl ReqwestTransport {
	/// Builds a transport whose system-trust client follows `defaults`.
	pub fn new(defaults: impl Into<Arc<HttpDefaults>>) -> Result<Self> {
		let defaults = defaults.into();
		let client = client_builder(&defaults).build().map_err(ConfigError::from)?;

		Ok(Self { client, defaults })
	}

	/// Wraps an existing reqwest client. The bundled-CA fallback still builds its client from
	/// `defaults`.
	pub fn with_client(client: BlockingClient, defaults: impl Into<Arc<HttpDefaults>>) -> Self {
		Self { client, defaults: defaults.into() }
	}

	fn client_for(&self, trust: &TrustAnchor) -> Result<Cow<'_, BlockingClient>> {
		match trust {
			TrustAnchor::System => Ok(Cow::Borrowed(&self.client)),
			TrustAnchor::Bundled(bundle) => Ok(Cow::Owned(bundled_client(&self.defaults, bundle)?)),
		}
	}
}
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: &OutgoingRequest, trust: &TrustAnchor) -> Result<RawResponse> {
		let client = self.client_for(trust)?;
		let mut builder =
			client.request(request.method.clone(), request.url.clone()).headers(request.headers.clone());

		match &request.body {
			None => {},
			Some(RequestBody::Form(encoded)) => {
				builder = builder
					.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
					.body(encoded.clone());
			},
			Some(RequestBody::Multipart(params)) => {
				builder = builder.multipart(multipart_form(params)?);
			},
		}

		let response = builder.send().map_err(map_reqwest_error)?;

		render_raw_response(response)
	}
}

fn client_builder(defaults: &HttpDefaults) -> ClientBuilder {
	let redirect = if defaults.follow_redirects { Policy::default() } else { Policy::none() };

	BlockingClient::builder()
		.connect_timeout(defaults.connect_timeout)
		.timeout(defaults.timeout)
		.redirect(redirect)
		.pool_max_idle_per_host(0)
}

fn bundled_client(defaults: &HttpDefaults, bundle: &CaBundle) -> Result<BlockingClient> {
	let certificates = Certificate::from_pem_bundle(bundle.as_pem())
		.map_err(|e| ConfigError::InvalidCaBundle { source: Box::new(e) })?;

	if certificates.is_empty() {
		let source = "no PEM certificates found".into();

		return Err(ConfigError::InvalidCaBundle { source }.into());
	}

	let mut builder = client_builder(defaults);

	for certificate in certificates {
		builder = builder.add_root_certificate(certificate);
	}

	Ok(builder.build().map_err(ConfigError::from)?)
}

fn multipart_form(params: &Params) -> Result<Form> {
	let mut form = Form::new();

	for (name, value) in params.fields() {
		form = form.text(name.to_owned(), value.to_owned());
	}
	for (name, part) in params.files() {
		form = match part {
			FilePart::Path(path) => form.file(name.to_owned(), path).map_err(|source| {
				ConfigError::FileRead { field: name.to_owned(), path: path.clone(), source }
			})?,
			FilePart::Bytes { file_name, data } =>
				form.part(name.to_owned(), Part::bytes(data.clone()).file_name(file_name.clone())),
		};
	}

	Ok(form)
}

// Status line, header lines, blank line, body. The reason phrase is the one the provider sent;
// hyper only records it when it differs from the canonical one.
fn render_raw_response(response: Response) -> Result<RawResponse> {
	let status = response.status();
	let mut raw = format!("{:?} {}", response.version(), status.as_str());
	let reason = match response.extensions().get::<ReasonPhrase>() {
		Some(reason) => Some(String::from_utf8_lossy(reason.as_bytes()).into_owned()),
		None => status.canonical_reason().map(str::to_owned),
	};

	if let Some(reason) = reason.filter(|reason| !reason.is_empty()) {
		raw.push(' ');
		raw.push_str(&reason);
	}

	raw.push_str("\r\n");

	for (name, value) in response.headers() {
		raw.push_str(name.as_str());
		raw.push_str(": ");
		raw.push_str(&String::from_utf8_lossy(value.as_bytes()));
		raw.push_str("\r\n");
	}

	raw.push_str("\r\n");
	raw.push_str(&response.text().map_err(map_reqwest_error)?);

	Ok(RawResponse::new(raw))
}

fn map_reqwest_error(err: ReqwestError) -> TransportError {
	if is_unknown_issuer(&err) {
		TransportError::untrusted_certificate(err)
	} else if err.is_timeout() {
		TransportError::timeout(err)
	} else if err.is_connect() {
		TransportError::connect(err)
	} else {
		TransportError::network(err)
	}
}

// TLS failures arrive inside nested `io::Error`s, whose `source()` skips the wrapped value, so
// custom IO errors are unwrapped through `get_ref` instead.
fn is_unknown_issuer(err: &(dyn StdError + 'static)) -> bool {
	let mut current = Some(err);

	while let Some(err) = current {
		if let Some(tls) = err.downcast_ref::<TlsError>() {
			return matches!(tls, TlsError::InvalidCertificate(CertificateError::UnknownIssuer));
		}

		current = match err.downcast_ref::<IoError>().and_then(IoError::get_ref) {
			Some(inner) => Some(inner as &(dyn StdError + 'static)),
			None => err.source(),
		};
	}

	false
}

#[cfg(test)]
mod tests {
	// std
	use std::io::ErrorKind;
	// self
	use super::*;

	#[derive(Debug)]
	struct ConnectFailure(IoError);
	impl Display for ConnectFailure {
		fn fmt(&self, f: &mut Formatter) -> FmtResult {
			f.write_str("client error (Connect)")
		}
	}
	impl StdError for ConnectFailure {
		fn source(&self) -> Option<&(dyn StdError + 'static)> {
			Some(&self.0)
		}
	}

	fn tls_chain(tls: TlsError) -> ConnectFailure {
		ConnectFailure(IoError::other(IoError::new(ErrorKind::InvalidData, tls)))
	}

	#[test]
	fn unknown_issuer_is_found_through_nested_io_errors() {
		assert!(is_unknown_issuer(&tls_chain(TlsError::InvalidCertificate(
			CertificateError::UnknownIssuer
		))));
		assert!(is_unknown_issuer(&IoError::new(
			ErrorKind::InvalidData,
			TlsError::InvalidCertificate(CertificateError::UnknownIssuer),
		)));
		assert!(!is_unknown_issuer(&tls_chain(TlsError::InvalidCertificate(
			CertificateError::Expired
		))));
		assert!(!is_unknown_issuer(&ConnectFailure(IoError::other("connection reset"))));
		assert!(!is_unknown_issuer(&IoError::from(ErrorKind::ConnectionRefused)));
	}

	#[test]
	fn bundled_client_rejects_bundles_without_certificates() {
		let err = bundled_client(&HttpDefaults::default(), &CaBundle::from_pem(b"not pem".to_vec()))
			.expect_err("A bundle without certificates cannot build a client.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidCaBundle { .. })));
	}

	#[test]
	fn shipped_bundle_builds_a_client() {
		let defaults = HttpDefaults::default();

		bundled_client(&defaults, &defaults.ca_bundle)
			.expect("The shipped certificate bundle should load.");
	}
}
