//! Session-level error types shared by the credential cache, signer, and exchange.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (missing consumer, unbuildable client, bad URL).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Authorization-code exchange failed.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// Outgoing request could not be signed.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Signed request failed in transit (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A transport was requested before consumer credentials were set.
	#[error("Consumer credentials are not set.")]
	MissingConsumer,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Authorization or token endpoint could not be parsed.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures of the OAuth 2.0 authorization-code exchange.
///
/// None of these are retried locally.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Provider rejected the authorization code.
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or the consumer pair is not registered.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Token endpoint returned an unexpected or unclassified error.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Network failure while calling the token endpoint.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The authorization code could not be obtained from its source.
	#[error("Authorization code is unavailable: {reason}.")]
	CodeUnavailable {
		/// Source-supplied reason string.
		reason: String,
	},
	/// Obtaining the code and exchanging it did not finish in time.
	#[error("Authorization-code exchange timed out after {after}.")]
	TimedOut {
		/// Configured timeout that elapsed.
		after: Duration,
	},
}
impl ExchangeError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Failures raised while attaching OAuth 1.0a signatures.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// A form-encoded body is streamed, so its parameters cannot enter the signature.
	#[error("Form-encoded request body is not buffered and cannot be signed.")]
	UnreadableFormBody,
	/// The computed `Authorization` header is not a valid header value.
	#[error("Authorization header value is invalid.")]
	InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Transport-level failures while sending signed requests.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending a signed request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
