//! Authorize URL construction and redirect state validation.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{_prelude::*, error::ExchangeError};

const STATE_LEN: usize = 32;

/// Redirect handshake metadata returned by
/// [`AuthorizationCodeExchange::authorize_url`](crate::exchange::AuthorizationCodeExchange::authorize_url).
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Fully formed authorize URL that callers should send end users to.
	pub authorize_url: Url,
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI embedded in the authorize URL.
	pub redirect_uri: String,
}
impl AuthorizationRequest {
	/// Validates the `state` parameter returned with the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(ExchangeError::InvalidGrant { reason: "Authorization state mismatch".into() }.into())
		}
	}
}

pub(super) fn build_request(
	authorization: &Url,
	client_id: &str,
	redirect_uri: &str,
	scope: &str,
) -> AuthorizationRequest {
	let state = random_string(STATE_LEN);
	let mut url = authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri);

	if !scope.is_empty() {
		pairs.append_pair("scope", scope);
	}

	pairs.append_pair("state", &state);

	drop(pairs);

	AuthorizationRequest { authorize_url: url, state, redirect_uri: redirect_uri.to_owned() }
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
