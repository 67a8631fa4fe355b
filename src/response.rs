//! Response framing and provider outcome classification.
//!
//! Transports hand back a [`RawResponse`]: status line, header lines, a blank line, then the
//! body. [`classify`] turns it into a [`ProviderOutcome`]. A 4xx/5xx status becomes a
//! structured [`ProviderError`] (with the `error` parameter of any `WWW-Authenticate`
//! challenge attached); every other status returns the body untouched.
//!
//! Any `HTTP/<version>` prefix is accepted on the status line, so HTTP/1.0 and HTTP/2 error
//! statuses are classified the same way as HTTP/1.1 ones.

// std
use std::borrow::Cow;
// crates.io
use serde::{Deserializer, de::Error as DeError};
use serde_json::Value;
// self
use crate::{_prelude::*, error::ProtocolError};

const HEADER_TERMINATOR: &str = "\r\n\r\n";
const LINE_BREAK: &str = "\r\n";

/// Complete HTTP response in wire form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse(String);
impl RawResponse {
	/// Wraps a response rendered as text.
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	/// Returns the wire text.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Splits the response at the first blank line into `(head, body)`.
	pub fn split(&self) -> Result<(&str, &str), ProtocolError> {
		self.0.split_once(HEADER_TERMINATOR).ok_or(ProtocolError::MissingHeaderTerminator)
	}
}

/// Parsed `HTTP/<version> <code> <reason>` line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusLine<'a> {
	/// Protocol token, e.g. `HTTP/1.1`.
	pub version: &'a str,
	/// Three-digit status code.
	pub code: u16,
	/// Reason phrase; empty when the server sent none.
	pub reason: &'a str,
}
impl<'a> StatusLine<'a> {
	/// Parses a status line.
	pub fn parse(line: &'a str) -> Result<Self, ProtocolError> {
		let invalid = || ProtocolError::InvalidStatusLine { line: line.to_owned() };
		let (version, rest) = line.split_once(' ').ok_or_else(invalid)?;

		if !version.starts_with("HTTP/") {
			return Err(invalid());
		}

		let (code, reason) = rest.split_once(' ').unwrap_or((rest, ""));

		if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
			return Err(invalid());
		}

		let code = code.parse().map_err(|_| invalid())?;

		Ok(Self { version, code, reason: reason.trim() })
	}

	/// Returns `true` for 4xx and 5xx statuses.
	pub fn is_error(&self) -> bool {
		(400..600).contains(&self.code)
	}
}

/// Structured provider error built from an error status line.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProviderError {
	/// HTTP status code.
	#[serde(deserialize_with = "deserialize_code")]
	pub code: u16,
	/// Status reason phrase.
	pub message: String,
	/// `error` parameter of a `WWW-Authenticate` challenge, when one was sent.
	#[serde(default)]
	pub error: Option<String>,
}
impl ProviderError {
	/// Encodes the error as `{"code":"<code>","message":"<reason>","error":"<error>"}`.
	///
	/// `code` is emitted as a string and `error` is omitted when absent, which keeps the body
	/// byte-compatible with existing consumers of this format.
	pub fn to_wire(&self) -> String {
		let mut wire = format!(
			"{{\"code\":{},\"message\":{}",
			Value::from(self.code.to_string()),
			Value::from(self.message.as_str())
		);

		if let Some(error) = &self.error {
			wire.push_str(",\"error\":");
			wire.push_str(&Value::from(error.as_str()).to_string());
		}

		wire.push('}');

		wire
	}

	/// Decodes a body produced by [`ProviderError::to_wire`]; `code` may be a string or number.
	pub fn from_wire(body: &str) -> Option<Self> {
		serde_json::from_str(body).ok()
	}
}

/// Result of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderOutcome {
	/// Non-error status; the body is returned verbatim.
	Success(String),
	/// 4xx/5xx status.
	ProviderError(ProviderError),
}
impl ProviderOutcome {
	/// Returns `true` for [`ProviderOutcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	/// Body as a caller of the string-returning API would see it: the raw body on success, the
	/// wire-encoded error otherwise.
	pub fn body(&self) -> Cow<'_, str> {
		match self {
			Self::Success(body) => Cow::Borrowed(body),
			Self::ProviderError(error) => Cow::Owned(error.to_wire()),
		}
	}

	/// Owned variant of [`ProviderOutcome::body`].
	pub fn into_body(self) -> String {
		match self {
			Self::Success(body) => body,
			Self::ProviderError(error) => error.to_wire(),
		}
	}

	/// Converts into a `Result`, treating provider errors as `Err`.
	pub fn into_result(self) -> Result<String, ProviderError> {
		match self {
			Self::Success(body) => Ok(body),
			Self::ProviderError(error) => Err(error),
		}
	}
}

/// Classifies a raw response.
pub fn classify(raw: &RawResponse) -> Result<ProviderOutcome, ProtocolError> {
	let (head, body) = raw.split()?;
	let mut lines = head.split(LINE_BREAK);
	let status = StatusLine::parse(lines.next().unwrap_or_default())?;

	if !status.is_error() {
		return Ok(ProviderOutcome::Success(body.to_owned()));
	}

	let error = lines.filter_map(challenge_error).last();

	Ok(ProviderOutcome::ProviderError(ProviderError {
		code: status.code,
		message: status.reason.to_owned(),
		error,
	}))
}

fn challenge_error(line: &str) -> Option<String> {
	let (name, value) = line.split_once(':')?;

	if !name.trim().eq_ignore_ascii_case("www-authenticate") {
		return None;
	}

	error_param(value)
}

// Accepts `error='x'`, `error="x"` and `error=x`.
fn error_param(challenge: &str) -> Option<String> {
	const KEY: &str = "error=";

	let mut rest = challenge;

	while let Some(idx) = rest.find(KEY) {
		let standalone =
			rest[..idx].chars().next_back().is_none_or(|c| c.is_whitespace() || c == ',');
		let value = &rest[idx + KEY.len()..];

		if standalone {
			return param_value(value);
		}

		rest = value;
	}

	None
}

fn param_value(value: &str) -> Option<String> {
	let mut chars = value.chars();

	match chars.next()? {
		quote @ ('\'' | '"') => {
			let inner = chars.as_str();

			inner.find(quote).map(|end| inner[..end].to_owned())
		},
		_ => {
			let end = value.find(|c: char| c == ',' || c.is_whitespace()).unwrap_or(value.len());

			Some(value[..end].to_owned())
		},
	}
}

fn deserialize_code<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Code {
		Number(u16),
		Text(String),
	}

	match Code::deserialize(deserializer)? {
		Code::Number(code) => Ok(code),
		Code::Text(code) => code.parse().map_err(DeError::custom),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn raw(status: &str, headers: &[&str], body: &str) -> RawResponse {
		let mut text = format!("{status}\r\n");

		for header in headers {
			text.push_str(header);
			text.push_str("\r\n");
		}

		text.push_str("\r\n");
		text.push_str(body);

		RawResponse::new(text)
	}

	#[test]
	fn unauthorized_challenge_becomes_wire_error() {
		let response = raw(
			"HTTP/1.1 401 Unauthorized",
			&["Content-Type: application/json", "WWW-Authenticate: Bearer error='invalid_token'"],
			"{\"ignored\":true}",
		);
		let outcome = classify(&response).expect("Response framing is valid.");

		assert_eq!(
			outcome,
			ProviderOutcome::ProviderError(ProviderError {
				code: 401,
				message: "Unauthorized".into(),
				error: Some("invalid_token".into()),
			})
		);
		assert_eq!(
			outcome.into_body(),
			"{\"code\":\"401\",\"message\":\"Unauthorized\",\"error\":\"invalid_token\"}"
		);
	}

	#[test]
	fn success_body_is_returned_unchanged() {
		let response = raw("HTTP/1.1 200 OK", &["Content-Type: application/json"], "{\"access_token\":\"abc\"}");

		assert_eq!(
			classify(&response).expect("Response framing is valid."),
			ProviderOutcome::Success("{\"access_token\":\"abc\"}".into())
		);
	}

	#[test]
	fn body_may_contain_blank_lines() {
		let response = raw("HTTP/1.1 200 OK", &[], "first\r\n\r\nsecond");

		assert_eq!(
			classify(&response).expect("Response framing is valid.").into_body(),
			"first\r\n\r\nsecond"
		);
	}

	#[test]
	fn server_error_without_challenge_omits_error_field() {
		let response = raw("HTTP/1.1 503 Service Unavailable", &["Retry-After: 5"], "");
		let outcome = classify(&response).expect("Response framing is valid.");

		assert_eq!(outcome.body(), "{\"code\":\"503\",\"message\":\"Service Unavailable\"}");
		assert!(!outcome.is_success());
	}

	#[test]
	fn other_http_versions_are_classified() {
		for status in ["HTTP/1.0 400 Bad Request", "HTTP/2.0 400 Bad Request", "HTTP/2 400"] {
			let outcome = classify(&raw(status, &[], "")).expect("Response framing is valid.");

			assert!(
				matches!(&outcome, ProviderOutcome::ProviderError(error) if error.code == 400),
				"{status} should classify as a provider error."
			);
		}
	}

	#[test]
	fn redirects_and_informational_statuses_are_successes() {
		let outcome = classify(&raw("HTTP/1.1 302 Found", &["Location: /next"], "moved"))
			.expect("Response framing is valid.");

		assert_eq!(outcome, ProviderOutcome::Success("moved".into()));
	}

	#[test]
	fn challenge_parsing_accepts_standard_quoting() {
		let outcome = classify(&raw(
			"HTTP/1.1 401 Unauthorized",
			&[
				"www-authenticate: Bearer realm=\"example\", error=\"insufficient_scope\", error_description=\"needs write\"",
			],
			"",
		))
		.expect("Response framing is valid.");

		assert_eq!(
			outcome.into_result().expect_err("401 is a provider error.").error.as_deref(),
			Some("insufficient_scope")
		);
	}

	#[test]
	fn last_matching_challenge_wins() {
		let outcome = classify(&raw(
			"HTTP/1.1 401 Unauthorized",
			&["WWW-Authenticate: Bearer error=first", "WWW-Authenticate: OAuth error='second'"],
			"",
		))
		.expect("Response framing is valid.");

		assert_eq!(
			outcome.into_result().expect_err("401 is a provider error.").error.as_deref(),
			Some("second")
		);
	}

	#[test]
	fn error_param_ignores_lookalike_keys() {
		assert_eq!(error_param(" Bearer xerror=nope"), None);
		assert_eq!(error_param(" Bearer error_description='x', error='y'"), Some("y".into()));
		assert_eq!(error_param(" Bearer error='unterminated"), None);
	}

	#[test]
	fn missing_blank_line_is_a_protocol_error() {
		let err = classify(&RawResponse::new("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n"))
			.expect_err("Framing without a blank line is malformed.");

		assert!(matches!(err, ProtocolError::MissingHeaderTerminator));
	}

	#[test]
	fn garbage_status_line_is_a_protocol_error() {
		for line in ["ICY 200 OK", "HTTP/1.1", "HTTP/1.1 4xx Nope", "HTTP/1.1 4000 Nope"] {
			let err = classify(&raw(line, &[], "")).expect_err("Status line is malformed.");

			assert!(matches!(err, ProtocolError::InvalidStatusLine { .. }), "{line}");
		}
	}

	#[test]
	fn wire_form_round_trips_and_escapes() {
		let error = ProviderError {
			code: 400,
			message: "Bad \"Request\"".into(),
			error: None,
		};
		let wire = error.to_wire();

		assert_eq!(wire, "{\"code\":\"400\",\"message\":\"Bad \\\"Request\\\"\"}");
		assert_eq!(ProviderError::from_wire(&wire), Some(error));
		assert_eq!(
			ProviderError::from_wire("{\"code\":401,\"message\":\"Unauthorized\"}")
				.map(|error| error.code),
			Some(401)
		);
	}
}
