//! Consumer and user credential pairs plus the store that versions them.

pub mod secret;
pub mod store;

pub use secret::*;
pub use store::*;

// self
use crate::_prelude::*;

/// Application-level OAuth 1.0a key/secret identifying the calling application.
///
/// Neither half is validated locally; the lending API decides whether a pair is usable.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerCredentials {
	/// Consumer key sent as `oauth_consumer_key`.
	pub key: String,
	/// Consumer secret; the first half of the signing key.
	pub secret: Secret,
}
impl ConsumerCredentials {
	/// Creates a consumer pair from raw strings.
	pub fn new(key: impl Into<String>, secret: impl Into<Secret>) -> Self {
		Self { key: key.into(), secret: secret.into() }
	}
}
impl Debug for ConsumerCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConsumerCredentials")
			.field("key", &self.key)
			.field("secret", &self.secret)
			.finish()
	}
}

/// Per-user access token pair authorizing requests on that user's behalf.
///
/// The anonymous sentinel (empty token and secret) stands in for "no user" so the signer
/// always has a token structure to work with, including during the authorization
/// handshake and for read-only discovery endpoints.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
	/// Access token sent as `oauth_token`.
	pub token: String,
	/// Token secret; the second half of the signing key.
	pub secret: Secret,
}
impl UserCredentials {
	/// Creates a user pair from raw strings.
	pub fn new(token: impl Into<String>, secret: impl Into<Secret>) -> Self {
		Self { token: token.into(), secret: secret.into() }
	}

	/// The anonymous sentinel used until a real user token is attached.
	pub fn anonymous() -> Self {
		Self::default()
	}

	/// Returns `true` for the anonymous sentinel.
	pub fn is_anonymous(&self) -> bool {
		self.token.is_empty() && self.secret.is_empty()
	}
}
impl Debug for UserCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		if self.is_anonymous() {
			return f.write_str("UserCredentials(anonymous)");
		}

		f.debug_struct("UserCredentials")
			.field("token", &"<redacted>")
			.field("secret", &self.secret)
			.finish()
	}
}
