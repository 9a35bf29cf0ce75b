//! Base64url encoding and construction of the secured input.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

use crate::{Error, Header, JsonValue, Result};

/// Encode bytes as unpadded base64url.
pub fn base64url(data: impl AsRef<[u8]>) -> String {
	URL_SAFE_NO_PAD.encode(data)
}

/// Decode unpadded base64url data.
pub fn base64url_decode(data: impl AsRef<[u8]>) -> Result<Vec<u8>> {
	Ok(URL_SAFE_NO_PAD.decode(data)?)
}

/// Text encoding used to convert a textual payload to and from bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
	#[default]
	Utf8,
	/// One byte per character, code points above 255 are truncated to their low byte.
	Latin1,
	/// Lowercase hexadecimal digits.
	Hex,
	/// Standard padded base64.
	Base64,
}

impl Encoding {
	/// Convert text to bytes.
	pub fn encode(self, text: &str) -> Result<Vec<u8>> {
		match self {
			Encoding::Utf8   => Ok(text.as_bytes().to_vec()),
			Encoding::Latin1 => Ok(text.chars().map(|c| c as u32 as u8).collect()),
			Encoding::Hex    => Ok(hex::decode(text)?),
			Encoding::Base64 => Ok(STANDARD.decode(text)?),
		}
	}

	/// Convert bytes to text.
	pub fn decode(self, data: Vec<u8>) -> Result<String> {
		match self {
			Encoding::Utf8   => Ok(String::from_utf8(data)?),
			Encoding::Latin1 => Ok(data.into_iter().map(char::from).collect()),
			Encoding::Hex    => Ok(hex::encode(data)),
			Encoding::Base64 => Ok(STANDARD.encode(data)),
		}
	}
}

impl FromStr for Encoding {
	type Err = Error;

	fn from_str(name: &str) -> Result<Self> {
		match name.to_ascii_lowercase().as_str() {
			"utf8" | "utf-8"      => Ok(Encoding::Utf8),
			"latin1" | "binary"   => Ok(Encoding::Latin1),
			"hex"                 => Ok(Encoding::Hex),
			"base64"              => Ok(Encoding::Base64),
			_                     => Err(Error::UnknownEncoding(name.to_string())),
		}
	}
}

/// Data to be signed or used as key material.
///
/// Every variant has one fixed conversion to bytes, see [`Input::to_bytes`].
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
	/// Raw bytes, used as-is.
	Bytes(Vec<u8>),
	/// Text, converted with the requested [`Encoding`].
	Text(String),
	/// A JSON value, serialized compactly and then treated as text.
	Json(JsonValue),
}

impl Input {
	/// Convert the input to bytes.
	///
	/// The encoding only applies to text: bytes are passed through
	/// and JSON is always serialized as UTF-8.
	pub fn to_bytes(&self, encoding: Encoding) -> Result<Vec<u8>> {
		match self {
			Input::Bytes(data) => Ok(data.clone()),
			Input::Text(text)  => encoding.encode(text),
			Input::Json(value) => Ok(serde_json::to_vec(value)?),
		}
	}
}

impl From<Vec<u8>> for Input {
	fn from(data: Vec<u8>) -> Self {
		Input::Bytes(data)
	}
}

impl From<&[u8]> for Input {
	fn from(data: &[u8]) -> Self {
		Input::Bytes(data.to_vec())
	}
}

impl From<String> for Input {
	fn from(text: String) -> Self {
		Input::Text(text)
	}
}

impl From<&str> for Input {
	fn from(text: &str) -> Self {
		Input::Text(text.to_string())
	}
}

impl From<JsonValue> for Input {
	fn from(value: JsonValue) -> Self {
		Input::Json(value)
	}
}

/// Join already encoded header and payload bytes into the secured input.
pub fn secured_input_from_parts(header: &[u8], payload: &[u8]) -> String {
	format!("{}.{}", base64url(header), base64url(payload))
}

/// Build the secured input `base64url(header).base64url(payload)` over which the signature is computed.
///
/// The header is serialized as compact JSON with `alg` first.
/// The payload is converted to bytes with `encoding`, see [`Input::to_bytes`].
pub fn secured_input(header: &Header, payload: &Input, encoding: Encoding) -> Result<String> {
	let header  = header.to_json()?;
	let payload = payload.to_bytes(encoding)?;
	Ok(secured_input_from_parts(&header, &payload))
}
