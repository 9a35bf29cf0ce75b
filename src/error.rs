//! Error types for this crate.

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by an external algorithm provider.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The token does not have the shape of a JWS Compact Serialization.
	#[error("invalid JWS given: {0}")]
	InvalidShape(String),

	/// The header segment is not base64url encoded JSON describing a header.
	#[error("malformed header: {0}")]
	MalformedHeader(#[source] Box<Error>),

	/// Decoding a structurally valid token failed.
	#[error("could not decode JWS: {0}")]
	Decode(#[source] Box<Error>),

	#[error("missing algorithm parameter for verify")]
	MissingAlgorithm,

	#[error("unsupported algorithm: {0}")]
	UnsupportedAlgorithm(String),

	/// The algorithm provider raised an error while signing or verifying.
	#[error("algorithm provider failed: {0}")]
	ProviderFailure(#[source] BoxError),

	#[error("invalid base64url data: {0}")]
	InvalidBase64(#[from] base64::DecodeError),

	#[error("invalid JSON: {0}")]
	InvalidJson(#[from] serde_json::Error),

	#[error("invalid UTF-8: {0}")]
	InvalidUtf8(#[from] std::string::FromUtf8Error),

	#[error("invalid hex data: {0}")]
	InvalidHex(#[from] hex::FromHexError),

	/// A header parameter listed in `crit` is not understood.
	#[error("unsupported critical header parameter: {0}")]
	UnsupportedCritical(String),

	/// A registered header parameter was also given as an extension parameter.
	#[error("duplicate header parameter: {0}")]
	DuplicateHeaderParam(String),

	#[error("invalid crit header parameter: {0}")]
	InvalidCritical(String),

	#[error("unknown payload encoding: {0}")]
	UnknownEncoding(String),

	/// A data source was dropped before it was finished.
	#[error("data source closed before it was finished")]
	SourceClosed,
}

impl Error {
	pub(crate) fn malformed_header(cause: impl Into<Error>) -> Self {
		Self::MalformedHeader(Box::new(cause.into()))
	}

	pub(crate) fn decode(cause: impl Into<Error>) -> Self {
		Self::Decode(Box::new(cause.into()))
	}

	pub(crate) fn provider(cause: impl Into<BoxError>) -> Self {
		Self::ProviderFailure(cause.into())
	}

	pub(crate) fn invalid_shape(token: impl Into<String>) -> Self {
		Self::InvalidShape(token.into())
	}
}
