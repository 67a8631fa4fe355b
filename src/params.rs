//! Ordered request parameters shared by URL builders and request bodies.

// crates.io
use url::form_urlencoded::Serializer;
// self
use crate::{_prelude::*, error::ConfigError};

/// File payload carried by a multipart field.
#[derive(Clone, PartialEq, Eq)]
pub enum FilePart {
	/// File read from disk when the request is sent.
	Path(PathBuf),
	/// In-memory payload.
	Bytes {
		/// File name reported in the part's `Content-Disposition`.
		file_name: String,
		/// Raw payload.
		data: Vec<u8>,
	},
}
impl Debug for FilePart {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
			Self::Bytes { file_name, data } => f
				.debug_struct("Bytes")
				.field("file_name", file_name)
				.field("len", &data.len())
				.finish(),
		}
	}
}

/// Insertion-ordered parameter bag.
///
/// Text fields feed query strings and form bodies. File fields only travel inside
/// multipart bodies, which the client uses when `file_upload_support` is enabled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
	fields: Vec<(String, String)>,
	files: Vec<(String, FilePart)>,
}
impl Params {
	/// Creates an empty parameter bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.push_text(name, value);

		self
	}

	/// Appends a file field backed by a path on disk.
	pub fn file(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
		self.files.push((name.into(), FilePart::Path(path.into())));

		self
	}

	/// Appends a file field backed by an in-memory payload.
	pub fn bytes(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		data: impl Into<Vec<u8>>,
	) -> Self {
		self.files
			.push((name.into(), FilePart::Bytes { file_name: file_name.into(), data: data.into() }));

		self
	}

	/// Appends a text field in place.
	pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.fields.push((name.into(), value.into()));
	}

	/// Appends every field of `other`, keeping its order.
	pub fn extend(&mut self, other: &Params) {
		self.fields.extend(other.fields.iter().cloned());
		self.files.extend(other.files.iter().cloned());
	}

	/// Returns `true` when neither text nor file fields are present.
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty() && self.files.is_empty()
	}

	/// Returns the first text value registered under `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.fields.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
	}

	/// Iterates over text fields in insertion order.
	pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
		self.fields.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}

	/// Iterates over file fields in insertion order.
	pub fn files(&self) -> impl Iterator<Item = (&str, &FilePart)> {
		self.files.iter().map(|(key, part)| (key.as_str(), part))
	}

	/// Encodes the text fields as `application/x-www-form-urlencoded`.
	///
	/// Pairs are joined with `&`; spaces become `+`.
	pub fn to_query(&self) -> String {
		let mut serializer = Serializer::new(String::new());

		for (key, value) in &self.fields {
			serializer.append_pair(key, value);
		}

		serializer.finish()
	}

	/// Encodes the text fields, refusing file fields that cannot be represented.
	pub(crate) fn to_text_only_query(&self) -> Result<String, ConfigError> {
		if let Some((field, _)) = self.files.first() {
			return Err(ConfigError::FileFieldRequiresUpload { field: field.clone() });
		}

		Ok(self.to_query())
	}
}
impl<K, V> FromIterator<(K, V)> for Params
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut params = Params::new();

		for (key, value) in iter {
			params.push_text(key, value);
		}

		params
	}
}
impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
	K: Into<String>,
	V: Into<String>,
{
	fn from(pairs: [(K, V); N]) -> Self {
		pairs.into_iter().collect()
	}
}
