//! Access credential returned by the authorization-code exchange.

// self
use crate::{
	_prelude::*,
	credentials::{Secret, UserCredentials},
};

/// OAuth 2.0 access grant for one end user.
///
/// Refresh and expiry are reported but not managed; run the exchange again once the
/// token lapses.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessCredential {
	/// Access token; callers must avoid logging it.
	pub access_token: Secret,
	/// Refresh token, if the provider issued one.
	pub refresh_token: Option<Secret>,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `expires_in`, if the provider supplied one.
	pub expires_at: Option<OffsetDateTime>,
	/// Scope string echoed by the provider, if any.
	pub scope: Option<String>,
}
impl AccessCredential {
	/// Creates a credential issued now, without refresh token, expiry, or scope.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: Secret::new(access_token),
			refresh_token: None,
			issued_at: OffsetDateTime::now_utc(),
			expires_at: None,
			scope: None,
		}
	}

	/// Returns `true` once `expires_at` has passed at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expiry| instant >= expiry)
	}

	/// Returns `true` if the credential is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Maps the grant onto the user pair consumed by the signer.
	///
	/// OAuth 2.0 bearer grants carry no token secret, so the secret half is empty.
	pub fn user_credentials(&self) -> UserCredentials {
		UserCredentials::new(self.access_token.expose(), Secret::default())
	}
}
impl Debug for AccessCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessCredential")
			.field("access_token", &self.access_token)
			.field("refresh_token", &self.refresh_token)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("scope", &self.scope)
			.finish()
	}
}
