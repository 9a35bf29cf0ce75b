//! Types for working with message headers.

use std::fmt;
use std::str::FromStr;

use serde_derive::{Deserialize, Serialize};

use crate::{Error, JsonObject, JsonValue, Result};

/// A signature algorithm from the fixed set a compact JWS may name in `alg`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
	HS256,
	HS384,
	HS512,
	RS256,
	RS384,
	RS512,
	PS256,
	PS384,
	PS512,
	ES256,
	ES384,
	ES512,
}

impl Algorithm {
	pub const ALL: [Algorithm; 12] = [
		Algorithm::HS256, Algorithm::HS384, Algorithm::HS512,
		Algorithm::RS256, Algorithm::RS384, Algorithm::RS512,
		Algorithm::PS256, Algorithm::PS384, Algorithm::PS512,
		Algorithm::ES256, Algorithm::ES384, Algorithm::ES512,
	];

	/// The identifier as it appears in the `alg` header parameter.
	pub fn as_str(self) -> &'static str {
		match self {
			Algorithm::HS256 => "HS256",
			Algorithm::HS384 => "HS384",
			Algorithm::HS512 => "HS512",
			Algorithm::RS256 => "RS256",
			Algorithm::RS384 => "RS384",
			Algorithm::RS512 => "RS512",
			Algorithm::PS256 => "PS256",
			Algorithm::PS384 => "PS384",
			Algorithm::PS512 => "PS512",
			Algorithm::ES256 => "ES256",
			Algorithm::ES384 => "ES384",
			Algorithm::ES512 => "ES512",
		}
	}
}

impl fmt::Display for Algorithm {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Algorithm {
	type Err = Error;

	/// Parse an algorithm identifier.
	///
	/// An empty identifier is reported as [`Error::MissingAlgorithm`],
	/// anything outside the fixed set as [`Error::UnsupportedAlgorithm`].
	fn from_str(name: &str) -> Result<Self> {
		if name.is_empty() {
			return Err(Error::MissingAlgorithm);
		}
		Self::ALL.iter()
			.copied()
			.find(|alg| alg.as_str() == name)
			.ok_or_else(|| Error::UnsupportedAlgorithm(name.to_string()))
	}
}

/// Header parameter names registered for JWS, which may not be listed in `crit`.
const REGISTERED: &[&str] = &["alg", "jku", "jwk", "kid", "x5u", "x5c", "x5t", "x5t#S256", "typ", "cty", "crit"];

/// A JOSE header.
///
/// The registered parameters are available as fields.
/// Any other parameter ends up in `extra` and is carried along untouched.
/// Fields serialize in declaration order, so `alg` is always the first member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Header {
	pub alg: Algorithm,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jku: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jwk: Option<JsonValue>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kid: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x5u: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x5c: Option<Vec<String>>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x5t: Option<String>,

	#[serde(default, rename = "x5t#S256", skip_serializing_if = "Option::is_none")]
	pub x5t_s256: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub typ: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cty: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crit: Option<Vec<String>>,

	/// Unregistered header parameters.
	#[serde(flatten)]
	pub extra: JsonObject,
}

impl Header {
	/// Create a header with only the `alg` parameter set.
	pub fn new(alg: Algorithm) -> Self {
		Self {
			alg,
			jku: None,
			jwk: None,
			kid: None,
			x5u: None,
			x5c: None,
			x5t: None,
			x5t_s256: None,
			typ: None,
			cty: None,
			crit: None,
			extra: JsonObject::new(),
		}
	}

	/// Set the `typ` parameter.
	pub fn with_typ(mut self, typ: impl Into<String>) -> Self {
		self.typ = Some(typ.into());
		self
	}

	/// Set the `kid` parameter.
	pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
		self.kid = Some(kid.into());
		self
	}

	/// Add an unregistered parameter.
	///
	/// Registered names belong in their own fields: a header holding one in `extra` fails to serialize.
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
		self.extra.insert(name.into(), value.into());
		self
	}

	/// Check if the header declares a JWT, in which case the payload is JSON.
	pub fn is_jwt(&self) -> bool {
		self.typ.as_deref() == Some("JWT")
	}

	/// Parse a header from raw JSON bytes.
	pub fn from_json(data: &[u8]) -> Result<Self> {
		Ok(serde_json::from_slice(data)?)
	}

	/// Serialize the header to JSON bytes.
	///
	/// Fails with [`Error::DuplicateHeaderParam`] if `extra` holds a registered parameter name,
	/// since the member would otherwise appear twice.
	pub fn to_json(&self) -> Result<Vec<u8>> {
		if let Some(name) = self.extra.keys().find(|name| REGISTERED.contains(&name.as_str())) {
			return Err(Error::DuplicateHeaderParam(name.clone()));
		}
		Ok(serde_json::to_vec(self)?)
	}

	/// Check the `crit` parameter against the extension parameters the caller understands.
	///
	/// Every listed name must be an extension parameter present in this header and contained in `understood`.
	pub fn check_critical<S: AsRef<str>>(&self, understood: &[S]) -> Result<()> {
		let crit = match &self.crit {
			None => return Ok(()),
			Some(crit) => crit,
		};

		if crit.is_empty() {
			return Err(Error::InvalidCritical("list must not be empty".to_string()));
		}

		for (i, name) in crit.iter().enumerate() {
			if crit[..i].contains(name) {
				return Err(Error::InvalidCritical(format!("parameter {:?} is listed twice", name)));
			}
			if REGISTERED.contains(&name.as_str()) {
				return Err(Error::InvalidCritical(format!("registered parameter {:?} may not be listed", name)));
			}
			if !self.extra.contains_key(name) {
				return Err(Error::InvalidCritical(format!("listed parameter {:?} is not present", name)));
			}
			if !understood.iter().any(|known| known.as_ref() == name) {
				return Err(Error::UnsupportedCritical(name.clone()));
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::assert;
	use serde_json::json;

	#[test]
	fn test_algorithm_from_str() {
		for alg in Algorithm::ALL {
			assert!(alg.as_str().parse::<Algorithm>().unwrap() == alg);
		}
		assert!(let Err(Error::MissingAlgorithm) = "".parse::<Algorithm>());
		assert!(matches!("none".parse::<Algorithm>(), Err(Error::UnsupportedAlgorithm(name)) if name == "none"));
		assert!(let Err(Error::UnsupportedAlgorithm(_)) = "hs256".parse::<Algorithm>());
	}

	#[test]
	fn test_serialize_alg_first() {
		let header = Header::new(Algorithm::HS256).with_typ("JWT");
		assert!(header.to_json().unwrap() == br#"{"alg":"HS256","typ":"JWT"}"#);

		let header = Header::new(Algorithm::ES384).with_kid("key-1").with_param("zip", "DEF");
		assert!(header.to_json().unwrap() == br#"{"alg":"ES384","kid":"key-1","zip":"DEF"}"#);
	}

	#[test]
	fn test_serialize_rejects_registered_extra() {
		let header = Header::new(Algorithm::HS256).with_typ("JWT").with_param("typ", "x");
		assert!(matches!(header.to_json(), Err(Error::DuplicateHeaderParam(name)) if name == "typ"));

		let header = Header::new(Algorithm::HS256).with_param("alg", "HS512");
		assert!(let Err(Error::DuplicateHeaderParam(_)) = header.to_json());
	}

	#[test]
	fn test_parse_keeps_unknown_params() {
		let header = Header::from_json(br#"{"typ":"JWT","alg":"RS512","x5t#S256":"abc","foo":[1,2]}"#).unwrap();
		assert!(header.alg == Algorithm::RS512);
		assert!(header.is_jwt());
		assert!(header.x5t_s256.as_deref() == Some("abc"));
		assert!(header.extra.get("foo") == Some(&json!([1, 2])));
	}

	#[test]
	fn test_parse_rejects_missing_or_unknown_alg() {
		assert!(let Err(Error::InvalidJson(_)) = Header::from_json(br#"{"typ":"JWT"}"#));
		assert!(let Err(Error::InvalidJson(_)) = Header::from_json(br#"{"alg":"none"}"#));
		assert!(let Err(Error::InvalidJson(_)) = Header::from_json(br#"["alg"]"#));
	}

	#[test]
	fn test_check_critical() {
		let none: &[&str] = &[];
		let header = Header::new(Algorithm::ES256).with_param("exp", 1363284000);
		assert!(let Ok(()) = header.check_critical(none));

		let mut header = header;
		header.crit = Some(vec!["exp".to_string()]);
		assert!(matches!(header.check_critical(none), Err(Error::UnsupportedCritical(name)) if name == "exp"));
		assert!(let Ok(()) = header.check_critical(&["exp"]));

		header.crit = Some(vec![]);
		assert!(let Err(Error::InvalidCritical(_)) = header.check_critical(&["exp"]));

		header.crit = Some(vec!["kid".to_string()]);
		assert!(let Err(Error::InvalidCritical(_)) = header.check_critical(&["kid"]));

		header.crit = Some(vec!["exp".to_string(), "exp".to_string()]);
		assert!(let Err(Error::InvalidCritical(_)) = header.check_critical(&["exp"]));

		header.crit = Some(vec!["b64".to_string()]);
		assert!(let Err(Error::InvalidCritical(_)) = header.check_critical(&["b64"]));
	}
}
