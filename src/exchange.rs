//! OAuth 2.0 authorization-code exchange against the lending API's authorization server.
//!
//! The exchange produces an [`AccessCredential`] that
//! [`ClientSession::apply_access_credential`](crate::session::ClientSession::apply_access_credential)
//! turns into user credentials. Endpoints are fixed; the caller supplies the consumer pair,
//! the library-account scope, the redirect URI, and an [`AuthorizationCodeSource`]. Every
//! failure is returned to the caller and nothing is retried.

pub mod authorize;
pub mod code_source;
pub mod credential;

pub use authorize::*;
pub use code_source::*;
pub use credential::*;
pub use oauth2;

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	credentials::Secret,
	error::{ConfigError, ExchangeError},
	http::{ExchangeHttpClient, ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Authorization endpoint of the lending API's OAuth 2.0 provider.
pub const AUTHORIZATION_ENDPOINT: &str = "https://oauth.overdrive.com/auth";
/// Token endpoint of the lending API's OAuth 2.0 provider.
pub const TOKEN_ENDPOINT: &str = "https://oauth.overdrive.com/token";

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Performs the authorization-code grant for one consumer pair and library account.
///
/// The library-account identifier travels as the OAuth `scope` of the authorize request,
/// which is how the provider selects the library the user signs in to.
pub struct AuthorizationCodeExchange<C = ReqwestHttpClient>
where
	C: ?Sized + ExchangeHttpClient,
{
	client_id: String,
	client_secret: Secret,
	library_scope: String,
	redirect_uri: String,
	authorization_endpoint: Url,
	token_endpoint: Url,
	timeout: Option<Duration>,
	http_client: Arc<C>,
}
impl AuthorizationCodeExchange<ReqwestHttpClient> {
	/// Creates an exchange backed by a redirect-free reqwest client.
	pub fn new(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<String>,
		library_scope: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> Result<Self> {
		Self::with_http_client(
			consumer_key,
			consumer_secret,
			library_scope,
			redirect_uri,
			ReqwestHttpClient::new()?,
		)
	}
}
impl<C> AuthorizationCodeExchange<C>
where
	C: ?Sized + ExchangeHttpClient,
{
	const DEFAULT_TIMEOUT: Duration = Duration::minutes(5);

	/// Creates an exchange that reuses the caller-provided transport.
	pub fn with_http_client(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<String>,
		library_scope: impl Into<String>,
		redirect_uri: impl Into<String>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		Ok(Self {
			client_id: consumer_key.into(),
			client_secret: Secret::new(consumer_secret),
			library_scope: library_scope.into(),
			redirect_uri: redirect_uri.into(),
			authorization_endpoint: parse_endpoint(AUTHORIZATION_ENDPOINT)?,
			token_endpoint: parse_endpoint(TOKEN_ENDPOINT)?,
			timeout: Some(Self::DEFAULT_TIMEOUT),
			http_client: http_client.into(),
		})
	}

	/// Bounds obtaining the code plus the token request; `None` waits indefinitely and a
	/// non-positive bound times out at once.
	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;

		self
	}

	#[cfg(test)]
	pub(crate) fn with_endpoints(mut self, authorization: Url, token: Url) -> Self {
		self.authorization_endpoint = authorization;
		self.token_endpoint = token;

		self
	}

	/// Builds the authorize URL (with a fresh CSRF `state`) to send the end user to.
	pub fn authorize_url(&self) -> AuthorizationRequest {
		authorize::build_request(
			&self.authorization_endpoint,
			&self.client_id,
			&self.redirect_uri,
			&self.library_scope,
		)
	}

	/// Exchanges an already-known authorization code.
	pub async fn exchange_code(&self, code: &str) -> Result<AccessCredential> {
		self.exchange(&StaticCode::new(code)).await
	}

	/// Awaits a code from `source` and exchanges it, bounded by the configured timeout.
	///
	/// Dropping the returned future cancels both steps.
	pub async fn exchange(&self, source: &dyn AuthorizationCodeSource) -> Result<AccessCredential> {
		const KIND: OpKind = OpKind::Exchange;

		let span = OpSpan::new(KIND, "exchange");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(self.bounded(async move {
				let code = source.authorization_code().await?;

				self.request_token(code).await
			}))
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
		let Some(timeout) = self.timeout else {
			return fut.await;
		};
		// Non-positive bounds expire on the first poll.
		let limit = StdDuration::try_from(timeout).unwrap_or(StdDuration::ZERO);

		tokio::time::timeout(limit, fut)
			.await
			.map_err(|_| ExchangeError::TimedOut { after: timeout })?
	}

	async fn request_token(&self, code: String) -> Result<AccessCredential> {
		let oauth_client = self.oauth_client()?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = oauth_client
			.exchange_code(AuthorizationCode::new(code))
			.request_async(&handle)
			.await
			.map_err(|e| map_request_error(meta.take(), e))?;

		Ok(map_token_response(response))
	}

	fn oauth_client(&self) -> Result<ConfiguredBasicClient> {
		let auth_url = AuthUrl::new(self.authorization_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let token_url = TokenUrl::new(self.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let redirect_url = RedirectUrl::new(self.redirect_uri.clone())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;

		Ok(BasicClient::new(ClientId::new(self.client_id.clone()))
			.set_client_secret(ClientSecret::new(self.client_secret.expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url))
	}
}
impl<C> Debug for AuthorizationCodeExchange<C>
where
	C: ?Sized + ExchangeHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCodeExchange")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("library_scope", &self.library_scope)
			.field("redirect_uri", &self.redirect_uri)
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("timeout", &self.timeout)
			.finish()
	}
}

fn parse_endpoint(raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { source }.into())
}

fn map_token_response(response: BasicTokenResponse) -> AccessCredential {
	let issued_at = OffsetDateTime::now_utc();
	let expires_at = response
		.expires_in()
		.and_then(|expires_in| Duration::try_from(expires_in).ok())
		.and_then(|expires_in| issued_at.checked_add(expires_in));
	let scope = response.scopes().map(|scopes| {
		scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" ")
	});

	AccessCredential {
		access_token: Secret::new(response.access_token().secret().as_str()),
		refresh_token: response.refresh_token().map(|token| Secret::new(token.secret().as_str())),
		issued_at,
		expires_at,
		scope,
	}
}

fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let status = meta.as_ref().and_then(|value| value.status);
	let retry_after = meta.as_ref().and_then(|value| value.retry_after);

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, status, retry_after),
		RequestTokenError::Request(error) => map_transport_error(error, status, retry_after),
		RequestTokenError::Parse(source, _body) =>
			ExchangeError::TokenResponseParse { source, status }.into(),
		RequestTokenError::Other(message) =>
			ExchangeError::TokenEndpoint { message, status, retry_after }.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> Error {
	let code = response.error().as_ref().to_owned();
	let reason = match response.error_description() {
		Some(description) => format!("{code}: {description}"),
		None => code.clone(),
	};

	match code.as_str() {
		"invalid_grant" => ExchangeError::InvalidGrant { reason },
		"invalid_client" | "unauthorized_client" => ExchangeError::InvalidClient { reason },
		_ => ExchangeError::TokenEndpoint { message: reason, status, retry_after },
	}
	.into()
}

fn map_transport_error<E>(
	err: HttpClientError<E>,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => ExchangeError::Network { source: inner }.into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => ExchangeError::network(inner).into(),
		HttpClientError::Other(message) => ExchangeError::TokenEndpoint {
			message: format!("HTTP client error: {message}"),
			status,
			retry_after,
		}
		.into(),
		_ => ExchangeError::TokenEndpoint {
			message: "HTTP client error".into(),
			status,
			retry_after,
		}
		.into(),
	}
}
