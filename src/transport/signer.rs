//! OAuth 1.0a request signing.
//!
//! [`RequestSigner`] is the seam between a [`SignedTransport`](crate::transport::SignedTransport)
//! and the signing scheme. [`HmacSha1Signer`] gathers the query and form-body parameters of a
//! built request and hands them to `oauth1-request`, which produces the RFC 5849 `HMAC-SHA1`
//! `Authorization` header.

// std
use std::num::NonZeroU64;
// crates.io
use oauth1_request::{Builder, Credentials, HmacSha1, ParameterList};
use reqwest::{
	Request,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	credentials::{ConsumerCredentials, UserCredentials},
	error::SigningError,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Attaches authorization material to an outgoing request in place.
pub trait RequestSigner
where
	Self: Send + Sync,
{
	/// Signs `request`, typically by setting its `Authorization` header.
	fn sign(&self, request: &mut Request) -> Result<(), SigningError>;
}

/// RFC 5849 `HMAC-SHA1` signer bound to one consumer pair and one user pair.
///
/// Parameter names enter the signature base string verbatim, so they must consist of
/// unreserved characters; the lending API's parameter names all do.
#[derive(Clone, Debug)]
pub struct HmacSha1Signer {
	consumer: ConsumerCredentials,
	user: UserCredentials,
}
impl HmacSha1Signer {
	/// Binds the signer to the provided credentials.
	pub fn new(consumer: ConsumerCredentials, user: UserCredentials) -> Self {
		Self { consumer, user }
	}

	/// Consumer key carried in every signature.
	pub fn consumer_key(&self) -> &str {
		&self.consumer.key
	}

	/// Returns `true` when requests are signed without a user token.
	pub fn is_anonymous(&self) -> bool {
		self.user.is_anonymous()
	}

	#[cfg(test)]
	pub(crate) fn authorization_at(
		&self,
		request: &Request,
		nonce: &str,
		timestamp: u64,
	) -> Result<String, SigningError> {
		self.authorization(request, Some(nonce), NonZeroU64::new(timestamp))
	}

	fn authorization(
		&self,
		request: &Request,
		nonce: Option<&str>,
		timestamp: Option<NonZeroU64>,
	) -> Result<String, SigningError> {
		let params: ParameterList<String, String> = ParameterList::new(request_params(request)?);
		let mut uri = request.url().clone();

		uri.set_query(None);
		uri.set_fragment(None);

		let mut builder = Builder::<_, &str, &str>::new(
			Credentials::new(self.consumer.key.as_str(), self.consumer.secret.expose()),
			HmacSha1::new(),
		);

		// The anonymous sentinel signs with an empty token secret and no `oauth_token`.
		if !self.user.is_anonymous() {
			builder.token(Credentials::new(self.user.token.as_str(), self.user.secret.expose()));
		}

		builder.nonce(nonce).timestamp(timestamp).version(true);

		Ok(builder.authorize(request.method().as_str(), uri.as_str(), &params))
	}
}
impl RequestSigner for HmacSha1Signer {
	fn sign(&self, request: &mut Request) -> Result<(), SigningError> {
		let value = self.authorization(request, None, None)?;
		let mut value = HeaderValue::from_str(&value)?;

		value.set_sensitive(true);
		request.headers_mut().insert(AUTHORIZATION, value);

		Ok(())
	}
}

fn request_params(request: &Request) -> Result<Vec<(String, String)>, SigningError> {
	let mut params = request.url().query_pairs().into_owned().collect::<Vec<_>>();

	if is_form(request)
		&& let Some(body) = request.body()
	{
		let bytes = body.as_bytes().ok_or(SigningError::UnreadableFormBody)?;

		params.extend(url::form_urlencoded::parse(bytes).into_owned());
	}

	Ok(params)
}

fn is_form(request: &Request) -> bool {
	request
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(';').next())
		.is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}
