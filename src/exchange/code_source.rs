//! Injected sources of authorization codes.
//!
//! The code reaches the application through a channel the caller owns: a redirect handler,
//! a prompt, a message queue. [`AuthorizationCodeSource`] lets the exchange await it
//! without knowing which.

// self
use crate::_prelude::*;

/// Boxed future returned by [`AuthorizationCodeSource::authorization_code`].
pub type CodeFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a + Send>>;

/// Supplies the one-time authorization code obtained after the user's redirect.
pub trait AuthorizationCodeSource
where
	Self: Send + Sync,
{
	/// Resolves to the authorization code, or an error if none can be obtained.
	fn authorization_code(&self) -> CodeFuture<'_>;
}

/// Source that yields a code the caller already holds.
#[derive(Clone)]
pub struct StaticCode(String);
impl StaticCode {
	/// Wraps an already-known code.
	pub fn new(code: impl Into<String>) -> Self {
		Self(code.into())
	}
}
impl Debug for StaticCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("StaticCode(<redacted>)")
	}
}
impl AuthorizationCodeSource for StaticCode {
	fn authorization_code(&self) -> CodeFuture<'_> {
		let code = self.0.clone();

		Box::pin(async move { Ok(code) })
	}
}

impl<F, Fut> AuthorizationCodeSource for F
where
	F: Fn() -> Fut + Send + Sync,
	Fut: Future<Output = Result<String>> + Send + 'static,
{
	fn authorization_code(&self) -> CodeFuture<'_> {
		Box::pin(self())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ExchangeError;

	#[tokio::test]
	async fn static_code_resolves_immediately() {
		let code = StaticCode::new("abc").authorization_code().await.expect("Static code should resolve.");

		assert_eq!(code, "abc");
		assert_eq!(format!("{:?}", StaticCode::new("abc")), "StaticCode(<redacted>)");
	}

	#[tokio::test]
	async fn closures_act_as_sources() {
		let ok = || async { Ok::<_, Error>("from-closure".to_owned()) };
		let failing = || async {
			Err::<String, Error>(ExchangeError::CodeUnavailable { reason: "user cancelled".into() }.into())
		};

		assert_eq!(ok.authorization_code().await.expect("Closure should resolve."), "from-closure");
		assert!(matches!(
			failing.authorization_code().await,
			Err(Error::Exchange(ExchangeError::CodeUnavailable { .. }))
		));
	}
}
