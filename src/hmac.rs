//! HMAC [`AlgorithmProvider`] implementation using [RustCrypto](https://github.com/RustCrypto).

use ::hmac::{Hmac, Mac};
use ::hmac::digest::KeyInit;

use crate::{Algorithm, AlgorithmProvider, Error, Result};

type HmacSha256 = Hmac<sha2::Sha256>;
type HmacSha384 = Hmac<sha2::Sha384>;
type HmacSha512 = Hmac<sha2::Sha512>;

/// Algorithm provider that supports HMAC-SHA-256, HMAC-SHA-384 and HMAC-SHA-512.
///
/// Any other algorithm is reported as [`Error::UnsupportedAlgorithm`].
/// The key material is used as the raw HMAC key.
#[derive(Clone, Copy, Debug, Default)]
pub struct HmacProvider;

impl AlgorithmProvider for HmacProvider {
	fn sign(&self, algorithm: Algorithm, input: &[u8], key: &[u8]) -> Result<Vec<u8>> {
		match algorithm {
			Algorithm::HS256 => compute_mac(new_mac::<HmacSha256>(key)?, input),
			Algorithm::HS384 => compute_mac(new_mac::<HmacSha384>(key)?, input),
			Algorithm::HS512 => compute_mac(new_mac::<HmacSha512>(key)?, input),
			other            => Err(Error::UnsupportedAlgorithm(other.to_string())),
		}
	}

	fn verify(&self, algorithm: Algorithm, input: &[u8], signature: &[u8], key: &[u8]) -> Result<bool> {
		match algorithm {
			Algorithm::HS256 => Ok(verify_mac(new_mac::<HmacSha256>(key)?, input, signature)),
			Algorithm::HS384 => Ok(verify_mac(new_mac::<HmacSha384>(key)?, input, signature)),
			Algorithm::HS512 => Ok(verify_mac(new_mac::<HmacSha512>(key)?, input, signature)),
			other            => Err(Error::UnsupportedAlgorithm(other.to_string())),
		}
	}
}

fn new_mac<M: Mac + KeyInit>(key: &[u8]) -> Result<M> {
	<M as Mac>::new_from_slice(key).map_err(|e| Error::provider(e.to_string()))
}

/// Compute the Message Authentication Code over the secured input.
fn compute_mac<M: Mac>(mut mac: M, input: &[u8]) -> Result<Vec<u8>> {
	mac.update(input);
	Ok(mac.finalize().into_bytes().to_vec())
}

/// Check the Message Authentication Code in constant time.
fn verify_mac<M: Mac>(mut mac: M, input: &[u8], signature: &[u8]) -> bool {
	mac.update(input);
	mac.verify_slice(signature).is_ok()
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{compact, Encoding, Header, Input};
	use assert2::assert;

	fn sign_foo(alg: Algorithm) -> String {
		let header = Header::new(alg).with_typ("JWT");
		compact::sign(&header, &Input::from("foo"), Encoding::Utf8, b"secretkey", HmacProvider).expect("sign failed")
	}

	#[test]
	fn test_sign_hmac_sha2() {
		let signed_hs256 = sign_foo(Algorithm::HS256);
		let signed_hs384 = sign_foo(Algorithm::HS384);
		let signed_hs512 = sign_foo(Algorithm::HS512);

		assert!(signed_hs256 == "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.Zm9v.4o4hfsHG_tN4bMqxCi0CYt-OArTTogFmgZuN54HS7ZY");
		assert!(signed_hs384 == "eyJhbGciOiJIUzM4NCIsInR5cCI6IkpXVCJ9.Zm9v.OoAr5wyN5KnBRY0OFYCqsk1mHrxuR_Lot33HVV43udouF1wlD1lvXL2oINrGU-9v");
		assert!(signed_hs512 == "eyJhbGciOiJIUzUxMiIsInR5cCI6IkpXVCJ9.Zm9v.Al1_vJpGnm78IRKDm48NkAoYkpR4KE1hA5jN09_QnGktPKgP4QB7MJnXgeXuC5E6BVlOp7oaR-FSphbq206vxA");
	}

	#[test]
	fn test_verify_hmac_sha2() {
		for (alg, name) in [(Algorithm::HS256, "HS256"), (Algorithm::HS384, "HS384"), (Algorithm::HS512, "HS512")] {
			let signed = sign_foo(alg);
			assert!(compact::verify(&signed, name, b"secretkey", HmacProvider).unwrap() == true);
			assert!(compact::verify(&signed, name, b"notthekey", HmacProvider).unwrap() == false);
		}
	}

	#[test]
	fn test_truncated_mac() {
		let mac = HmacProvider.sign(Algorithm::HS256, b"input", b"key").unwrap();
		assert!(mac.len() == 32);
		assert!(HmacProvider.verify(Algorithm::HS256, b"input", &mac, b"key").unwrap() == true);
		assert!(HmacProvider.verify(Algorithm::HS256, b"input", &mac[..16], b"key").unwrap() == false);
		assert!(HmacProvider.verify(Algorithm::HS256, b"input", b"", b"key").unwrap() == false);
	}

	#[test]
	fn test_unsupported() {
		for alg in [Algorithm::RS256, Algorithm::PS384, Algorithm::ES512] {
			assert!(let Err(Error::UnsupportedAlgorithm(_)) = HmacProvider.sign(alg, b"input", b"key"));
			assert!(let Err(Error::UnsupportedAlgorithm(_)) = HmacProvider.verify(alg, b"input", b"sig", b"key"));
		}
	}
}
