// std
use std::{
	io::{BufRead, BufReader, Write},
	net::TcpListener,
	thread,
};
// crates.io
use httpmock::prelude::*;
// self
use oauth2_draft::{
	_preludet::{Method, *},
	client::ReqwestDraftClient,
	config::{ClientConfig, ClientOptions},
	error::{ConfigError, TransportError},
	http::{CaBundle, HttpDefaults, ReqwestTransport},
	params::Params,
	response::{ProviderError, ProviderOutcome},
};

fn client_for(server: &MockServer, options: ClientOptions) -> ReqwestDraftClient {
	let site = format!("http://{}", server.address());
	let config = ClientConfig::new("client-id", "client-secret", options.with_site(site));

	ReqwestDraftClient::new(config).expect("Failed to build reqwest-backed client.")
}

#[test]
fn get_appends_params_to_the_query_string() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(GET)
			.path("/me")
			.query_param("access_token", "abc 123")
			.query_param("fields", "id,name")
			.header("accept", "application/json")
			.header("user-agent", "oauth2-draft-v10")
			.header_exists("expect");
		then.status(200).header("content-type", "application/json").body(r#"{"id":"1"}"#);
	});
	let client = client_for(&server, ClientOptions::default());
	let params = Params::from([("access_token", "abc 123"), ("fields", "id,name")]);
	let outcome = client
		.request(Method::GET, "/me", &params, &HeaderMap::new())
		.expect("GET request should complete.");

	mock.assert();
	assert_eq!(outcome, ProviderOutcome::Success(r#"{"id":"1"}"#.into()));
}

#[test]
fn post_sends_url_encoded_form() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST)
			.path("/oauth/access_token")
			.header("content-type", "application/x-www-form-urlencoded")
			.header_exists("expect")
			.body("grant_type=authorization_code&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb");
		then.status(200).body("access_token=abc");
	});
	let client = client_for(&server, ClientOptions::default());
	let url = client.access_token_url(&Params::new());
	let params = Params::from([
		("grant_type", "authorization_code"),
		("redirect_uri", "https://app.example.com/cb"),
	]);
	let outcome = client
		.request(Method::POST, &url, &params, &HeaderMap::new())
		.expect("POST request should complete.");

	mock.assert();
	assert_eq!(outcome.into_body(), "access_token=abc");
}

#[test]
fn caller_headers_are_added_to_defaults() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(DELETE)
			.path("/session")
			.header("authorization", "OAuth abc")
			.header("accept", "application/json");
		then.status(204);
	});
	let client = client_for(&server, ClientOptions::default());
	let mut headers = HeaderMap::new();

	headers.insert("authorization", HeaderValue::from_static("OAuth abc"));

	let outcome = client
		.request(Method::DELETE, "/session", &Params::new(), &headers)
		.expect("DELETE request should complete.");

	mock.assert();
	assert_eq!(outcome, ProviderOutcome::Success(String::new()));
}

#[test]
fn unauthorized_answers_are_classified_with_challenge_error() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(GET).path("/me");
		then.status(401)
			.header("www-authenticate", "OAuth realm='Example', error='invalid_token'")
			.body("ignored");
	});
	let client = client_for(&server, ClientOptions::default());
	let outcome = client
		.request(Method::GET, "/me", &Params::new(), &HeaderMap::new())
		.expect("A provider error is still a completed exchange.");

	mock.assert();
	assert_eq!(
		outcome,
		ProviderOutcome::ProviderError(ProviderError {
			code: 401,
			message: "Unauthorized".into(),
			error: Some("invalid_token".into()),
		})
	);
	assert_eq!(
		outcome.body(),
		r#"{"code":"401","message":"Unauthorized","error":"invalid_token"}"#
	);
}

#[test]
fn server_errors_without_challenge_omit_error() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path("/oauth/access_token");
		then.status(503).body("maintenance");
	});
	let client = client_for(&server, ClientOptions::default());
	let outcome = client
		.request(Method::POST, "/oauth/access_token", &Params::new(), &HeaderMap::new())
		.expect("A provider error is still a completed exchange.");

	mock.assert();
	assert_eq!(outcome.into_body(), r#"{"code":"503","message":"Service Unavailable"}"#);
}

#[test]
fn redirects_are_not_followed() {
	let server = MockServer::start();
	let redirect = server.mock(|when, then| {
		when.method(GET).path("/old");
		then.status(302).header("location", "/new");
	});
	let target = server.mock(|when, then| {
		when.method(GET).path("/new");
		then.status(200).body("moved");
	});
	let client = client_for(&server, ClientOptions::default());
	let outcome = client
		.request(Method::GET, "/old", &Params::new(), &HeaderMap::new())
		.expect("Redirect responses are returned as-is.");

	redirect.assert();
	target.assert_calls(0);
	assert!(outcome.is_success());
}

#[test]
fn refused_connections_are_transport_errors() {
	let config = ClientConfig::new("client-id", "client-secret", ClientOptions::default());
	let client = ReqwestDraftClient::new(config).expect("Failed to build reqwest-backed client.");
	let err = client
		.request(Method::GET, "http://127.0.0.1:9/unreachable", &Params::new(), &HeaderMap::new())
		.expect_err("Nothing listens on the discard port.");

	assert!(matches!(err, Error::Transport(TransportError::Connect { .. })));
}

#[test]
fn transport_construction_does_not_parse_the_bundle() {
	let defaults = HttpDefaults::default().with_ca_bundle(CaBundle::from_pem(b"not pem".to_vec()));

	ReqwestTransport::new(defaults).expect("The system-trust client does not parse the bundle.");
}

#[test]
fn custom_reason_phrases_are_reported() {
	let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind a local listener.");
	let address = listener.local_addr().expect("Listener should have an address.");
	let server = thread::spawn(move || {
		let (stream, _) = listener.accept().expect("Client should connect.");
		let mut reader = BufReader::new(stream);
		let mut line = String::new();

		while reader.read_line(&mut line).expect("Request should be readable.") > 0 {
			if line == "\r\n" {
				break;
			}

			line.clear();
		}

		reader
			.get_mut()
			.write_all(
				b"HTTP/1.1 401 Invalid Token\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
			)
			.expect("Response should be writable.");
	});
	let config = ClientConfig::new("client-id", "client-secret", ClientOptions::default());
	let client = ReqwestDraftClient::new(config).expect("Failed to build reqwest-backed client.");
	let outcome = client
		.request(Method::GET, &format!("http://{address}/me"), &Params::new(), &HeaderMap::new())
		.expect("A provider error is still a completed exchange.");

	server.join().expect("Server thread should finish.");
	assert_eq!(
		outcome,
		ProviderOutcome::ProviderError(ProviderError {
			code: 401,
			message: "Invalid Token".into(),
			error: None,
		})
	);
	assert_eq!(outcome.body(), r#"{"code":"401","message":"Invalid Token"}"#);
}

#[test]
fn file_fields_in_form_mode_are_rejected_before_sending() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.path("/upload");
		then.status(200);
	});
	let client = client_for(&server, ClientOptions::default());
	let params = Params::new().bytes("avatar", "avatar.png", b"png".to_vec());
	let err = client
		.request(Method::POST, "/upload", &params, &HeaderMap::new())
		.expect_err("File fields need file upload support.");

	mock.assert_calls(0);
	assert!(matches!(
		err,
		Error::Config(ConfigError::FileFieldRequiresUpload { ref field }) if field == "avatar"
	));
}
