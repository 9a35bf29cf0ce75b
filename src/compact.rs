//! JWS Compact Serialization implementaton.
//!
//! A compact message consists of three base64url encoded parts separated by period '.' characters:
//! the header, the payload and the signature.
//! The encoded header and payload joined by a period form the secured input over which the signature is computed.

use crate::{
	base64url,
	base64url_decode,
	codec,
	Algorithm,
	AlgorithmProvider,
	Encoding,
	Error,
	Header,
	Input,
	JsonObject,
	JsonValue,
	Result,
};

/// The individual (still encoded) parts of a JWS Compact Serialized message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompactSerializedParts<'a> {
	pub header:    &'a str,
	pub payload:   &'a str,
	pub signature: &'a str,
	message:       &'a str,
}

impl<'a> CompactSerializedParts<'a> {
	/// The secured input, sliced from the original message without re-encoding anything.
	pub fn secured_input(&self) -> &'a str {
		&self.message[..self.header.len() + 1 + self.payload.len()]
	}

	/// Check the parts against the compact serialization grammar.
	///
	/// The header and payload must be non-empty base64url text, the signature may be empty.
	pub fn is_well_formed(&self) -> bool {
		!self.header.is_empty()
			&& !self.payload.is_empty()
			&& is_base64url_text(self.header)
			&& is_base64url_text(self.payload)
			&& is_base64url_text(self.signature)
	}
}

fn is_base64url_text(data: &str) -> bool {
	data.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_')
}

/// Split the parts of a JWS Compact Serialization message.
///
/// This only checks that there are exactly three parts.
/// Use [`CompactSerializedParts::is_well_formed`] or [`is_valid`] to check the grammar.
pub fn split_encoded_parts(token: &str) -> Result<CompactSerializedParts<'_>> {
	let mut parts = token.splitn(4, '.');

	let header    = parts.next().ok_or_else(|| Error::invalid_shape(token))?;
	let payload   = parts.next().ok_or_else(|| Error::invalid_shape(token))?;
	let signature = parts.next().ok_or_else(|| Error::invalid_shape(token))?;

	// Make sure there are no additional message parts in the input.
	if parts.next().is_some() {
		return Err(Error::invalid_shape(token));
	}

	Ok(CompactSerializedParts { header, payload, signature, message: token })
}

/// Check if a string is a structurally valid compact JWS.
///
/// The string must match the compact serialization grammar
/// and the header part must decode to a JSON object.
/// The header parameters themselves are not interpreted.
pub fn is_valid(token: &str) -> bool {
	let parts = match split_encoded_parts(token) {
		Ok(parts) if parts.is_well_formed() => parts,
		_ => return false,
	};

	base64url_decode(parts.header)
		.ok()
		.and_then(|header| serde_json::from_slice::<JsonObject>(&header).ok())
		.is_some()
}

fn decode_header(encoded: &str) -> Result<Header> {
	let header = base64url_decode(encoded).map_err(Error::malformed_header)?;
	Header::from_json(&header).map_err(Error::malformed_header)
}

/// Decode the header of a compact JWS.
pub fn header_from_token(token: &str) -> Result<Header> {
	decode_header(split_encoded_parts(token)?.header)
}

/// Get the secured input of a compact JWS, exactly as it appears in the token.
pub fn secured_input_from_token(token: &str) -> Result<&str> {
	Ok(split_encoded_parts(token)?.secured_input())
}

/// Decode the payload of a compact JWS to raw bytes.
pub fn payload_bytes_from_token(token: &str) -> Result<Vec<u8>> {
	base64url_decode(split_encoded_parts(token)?.payload)
}

/// Decode the payload of a compact JWS to text using the given encoding.
pub fn payload_from_token(token: &str, encoding: Encoding) -> Result<String> {
	encoding.decode(payload_bytes_from_token(token)?)
}

/// Get the signature part of a compact JWS, still base64url encoded.
pub fn signature_from_token(token: &str) -> Result<&str> {
	Ok(split_encoded_parts(token)?.signature)
}

/// Options for [`decode`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
	/// Parse the payload as JSON even if the header doesn't declare a JWT.
	pub json: bool,

	/// Text encoding of the payload.
	pub encoding: Encoding,

	/// Extension header parameters that may be listed in `crit`.
	pub critical: Vec<String>,
}

impl DecodeOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn json(mut self, json: bool) -> Self {
		self.json = json;
		self
	}

	pub fn encoding(mut self, encoding: Encoding) -> Self {
		self.encoding = encoding;
		self
	}

	/// Mark an extension header parameter as understood.
	pub fn understand(mut self, name: impl Into<String>) -> Self {
		self.critical.push(name.into());
		self
	}
}

/// The interpreted payload of a decoded message.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
	Text(String),
	Json(JsonValue),
}

/// A decoded compact JWS.
///
/// Decoding does not verify the signature.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
	pub header:    Header,
	pub payload:   Payload,
	/// The signature part, still base64url encoded.
	pub signature: String,
}

/// Decode a compact JWS into its header, payload and signature.
///
/// The payload is parsed as JSON if the header has `"typ": "JWT"` or if [`DecodeOptions::json`] is set.
/// A token that is not [valid](is_valid) is rejected with [`Error::InvalidShape`],
/// any later failure is reported as [`Error::Decode`] wrapping the cause.
pub fn decode(token: &str, options: &DecodeOptions) -> Result<Decoded> {
	tracing::debug!(json = options.json, encoding = ?options.encoding, "decode");

	if !is_valid(token) {
		return Err(Error::invalid_shape(token));
	}
	let parts = split_encoded_parts(token)?;

	let header = decode_header(parts.header).map_err(Error::decode)?;
	header.check_critical(options.critical.as_slice()).map_err(Error::decode)?;

	let payload = base64url_decode(parts.payload)
		.and_then(|payload| options.encoding.decode(payload))
		.map_err(Error::decode)?;

	let payload = if header.is_jwt() || options.json {
		Payload::Json(serde_json::from_str(&payload).map_err(Error::decode)?)
	} else {
		Payload::Text(payload)
	};

	Ok(Decoded {
		header,
		payload,
		signature: parts.signature.to_string(),
	})
}

/// Sign a payload, producing a compact JWS.
///
/// The algorithm is taken from `header.alg` and resolved by the provider.
pub fn sign(header: &Header, payload: &Input, encoding: Encoding, key: impl AsRef<[u8]>, provider: impl AlgorithmProvider) -> Result<String> {
	tracing::debug!(alg = %header.alg, "sign");

	let secured_input = codec::secured_input(header, payload, encoding)?;
	sign_secured_input(header.alg, secured_input, key.as_ref(), provider)
}

/// Sign a payload with an already serialized header, producing a compact JWS.
///
/// The header bytes end up in the token untouched, so member order and whitespace are preserved.
/// Text is taken as UTF-8 and JSON is serialized compactly.
/// The bytes must still parse as a header: the algorithm is read from their `alg` member.
pub fn sign_encoded(header: &Input, payload: &Input, encoding: Encoding, key: impl AsRef<[u8]>, provider: impl AlgorithmProvider) -> Result<String> {
	let header = header.to_bytes(Encoding::Utf8)?;
	let alg    = Header::from_json(&header).map_err(Error::malformed_header)?.alg;
	tracing::debug!(%alg, "sign encoded header");

	let secured_input = codec::secured_input_from_parts(&header, &payload.to_bytes(encoding)?);
	sign_secured_input(alg, secured_input, key.as_ref(), provider)
}

fn sign_secured_input(alg: Algorithm, secured_input: String, key: &[u8], provider: impl AlgorithmProvider) -> Result<String> {
	let signature = provider.sign(alg, secured_input.as_bytes(), key)?;
	Ok(format!("{}.{}", secured_input, base64url(signature)))
}

/// Verify the signature of a compact JWS.
///
/// The caller decides the algorithm: the `alg` header parameter of the token is not consulted.
/// An empty algorithm fails with [`Error::MissingAlgorithm`] before the token is looked at.
/// A signature that doesn't match, or that isn't base64url at all, yields `Ok(false)`.
pub fn verify(token: &str, algorithm: &str, key: impl AsRef<[u8]>, provider: impl AlgorithmProvider) -> Result<bool> {
	let algorithm: Algorithm = algorithm.parse()?;
	tracing::debug!(alg = %algorithm, "verify");

	let parts = split_encoded_parts(token)?;
	let signature = match base64url_decode(parts.signature) {
		Ok(signature) => signature,
		Err(error) => {
			tracing::debug!(%error, "signature is not base64url");
			return Ok(false);
		},
	};

	provider.verify(algorithm, parts.secured_input().as_bytes(), &signature, key.as_ref())
}
