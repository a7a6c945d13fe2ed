//! Signed HTTP transport handed out by [`ClientSession`](crate::session::ClientSession).
//!
//! A [`SignedTransport`] pairs a reqwest client that never follows redirects with a
//! [`RequestSigner`] bound to one credential generation. Redirects from the lending API
//! often point at content the caller must inspect first (final download URLs, for example),
//! so 3xx responses are returned as-is instead of being replayed against the `Location`.

pub mod signer;

pub use signer::*;

// std
use std::time::Duration as StdDuration;
// crates.io
use reqwest::{IntoUrl, Method, Request, RequestBuilder, Response, redirect::Policy};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	obs::{self, OpKind, OpOutcome},
};

/// HTTP settings applied to every transport a session builds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
	/// `User-Agent` header sent with every request.
	pub user_agent: String,
	/// Total per-request timeout.
	pub timeout: Option<Duration>,
	/// TCP/TLS connect timeout.
	pub connect_timeout: Option<Duration>,
}
impl TransportConfig {
	const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::seconds(10);
	const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);

	/// Overrides the `User-Agent` header.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Overrides the per-request timeout; `None` disables it.
	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the connect timeout; `None` disables it.
	pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.connect_timeout = timeout;

		self
	}

	/// Builds a reqwest client that surfaces redirects instead of following them.
	pub(crate) fn build_client(&self) -> Result<ReqwestClient> {
		let mut builder =
			ReqwestClient::builder().redirect(Policy::none()).user_agent(self.user_agent.as_str());

		if let Some(timeout) = self.timeout.and_then(to_std) {
			builder = builder.timeout(timeout);
		}
		if let Some(timeout) = self.connect_timeout.and_then(to_std) {
			builder = builder.connect_timeout(timeout);
		}

		builder.build().map_err(|e| ConfigError::from(e).into())
	}
}
impl Default for TransportConfig {
	fn default() -> Self {
		Self {
			user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
			timeout: Some(Self::DEFAULT_TIMEOUT),
			connect_timeout: Some(Self::DEFAULT_CONNECT_TIMEOUT),
		}
	}
}

/// HTTP transport that signs every request with the credentials it was built from.
///
/// Instances are immutable. Requests already in flight keep signing with the old
/// credentials after the owning session mutates; the next
/// [`ClientSession::transport`](crate::session::ClientSession::transport) call hands out a
/// fresh instance.
pub struct SignedTransport<S = HmacSha1Signer>
where
	S: RequestSigner,
{
	client: ReqwestClient,
	signer: S,
	generation: u64,
}
impl<S> SignedTransport<S>
where
	S: RequestSigner,
{
	/// Wraps a client and signer for the given credential generation.
	///
	/// The client must be configured with [`Policy::none`]; sessions always build it through
	/// [`TransportConfig`].
	pub fn new(client: ReqwestClient, signer: S, generation: u64) -> Self {
		Self { client, signer, generation }
	}

	/// Credential generation this transport was built from.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Signer bound into this transport.
	pub fn signer(&self) -> &S {
		&self.signer
	}

	/// Starts an unsigned request; pass the built request to [`SignedTransport::execute`].
	pub fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
		self.client.request(method, url)
	}

	/// Signs `request` in place without sending it.
	pub fn sign(&self, request: &mut Request) -> Result<()> {
		obs::record_op_outcome(OpKind::Sign, OpOutcome::Attempt);

		match self.signer.sign(request) {
			Ok(()) => {
				obs::record_op_outcome(OpKind::Sign, OpOutcome::Success);

				Ok(())
			},
			Err(e) => {
				obs::record_op_outcome(OpKind::Sign, OpOutcome::Failure);

				Err(e.into())
			},
		}
	}

	/// Signs and sends one request, returning the response without following redirects.
	pub async fn execute(&self, mut request: Request) -> Result<Response> {
		self.sign(&mut request)?;

		self.client.execute(request).await.map_err(|e| TransportError::from(e).into())
	}

	/// Signs and sends a `GET` request.
	pub async fn get(&self, url: impl IntoUrl) -> Result<Response> {
		let request = self.request(Method::GET, url).build().map_err(TransportError::from)?;

		self.execute(request).await
	}
}
impl<S> Debug for SignedTransport<S>
where
	S: RequestSigner + Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignedTransport")
			.field("signer", &self.signer)
			.field("generation", &self.generation)
			.finish()
	}
}

fn to_std(duration: Duration) -> Option<StdDuration> {
	StdDuration::try_from(duration).ok()
}
