//! This library provides JSON Web Signature encoding, decoding, signing and verification
//! for the JWS Compact Serialization.
//!
//! The free functions in the [`compact`] module cover the synchronous case:
//! [`sign`], [`sign_encoded`], [`verify`], [`decode`] and [`is_valid`].
//! When the key material or the payload only becomes available later, the drivers in the [`stream`] module
//! wait for both inputs and run the signature operation exactly once.
//!
//! The signature math itself is delegated to an [`AlgorithmProvider`].
//! An HMAC provider based on [RustCrypto](https://github.com/RustCrypto) is available as [`hmac::HmacProvider`].

pub mod codec;
pub mod compact;
pub mod error;
pub mod header;
pub mod hmac;
pub mod stream;

pub use serde_json::Value as JsonValue;
pub type JsonObject = serde_json::Map<String, JsonValue>;

pub use crate::codec::{base64url, base64url_decode, secured_input, Encoding, Input};
pub use crate::compact::{decode, is_valid, sign, sign_encoded, verify, DecodeOptions, Decoded, Payload};
pub use crate::error::{Error, Result};
pub use crate::header::{Algorithm, Header};
pub use crate::stream::{create_sign, create_verify, DataSink, DataSource, JoinState, SignStream, Verified, VerifyStream};

/// Implementation of the signature algorithms named by the `alg` header parameter.
///
/// Implementations that do not support a given algorithm must return [`Error::UnsupportedAlgorithm`].
/// Any other failure, such as unusable key material, should be reported as [`Error::ProviderFailure`].
pub trait AlgorithmProvider {
	/// Compute the signature over the secured input.
	///
	/// The returned signature must be plain bytes, not hex or base64 encoded.
	fn sign(&self, algorithm: Algorithm, input: &[u8], key: &[u8]) -> Result<Vec<u8>>;

	/// Check a signature over the secured input.
	///
	/// A signature that simply doesn't match is not an error: it yields `Ok(false)`.
	fn verify(&self, algorithm: Algorithm, input: &[u8], signature: &[u8], key: &[u8]) -> Result<bool>;
}

impl<P: AlgorithmProvider + ?Sized> AlgorithmProvider for &P {
	fn sign(&self, algorithm: Algorithm, input: &[u8], key: &[u8]) -> Result<Vec<u8>> {
		(**self).sign(algorithm, input, key)
	}

	fn verify(&self, algorithm: Algorithm, input: &[u8], signature: &[u8], key: &[u8]) -> Result<bool> {
		(**self).verify(algorithm, input, signature, key)
	}
}
