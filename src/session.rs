//! Client session: credential store plus a lazily built, cached signed transport.
//!
//! All state sits behind one mutex. [`ClientSession::transport`] performs its
//! check-then-build sequence while holding it, so concurrent calls to
//! [`ClientSession::set_consumer`] or [`ClientSession::set_user_token`] can never feed a
//! half-updated credential pair into the signer. The cached transport is valid only while
//! its generation equals the store's; mutators merely advance the generation.

// self
use crate::{
	_prelude::*,
	credentials::CredentialStore,
	error::ConfigError,
	exchange::AccessCredential,
	obs::{self, OpKind, OpOutcome, OpSpan},
	transport::{HmacSha1Signer, SignedTransport, TransportConfig},
};

/// Owns one credential store and at most one cached [`SignedTransport`].
///
/// Clones share the same state, so a session can be handed to several tasks and mutated
/// from any of them.
#[derive(Clone, Default)]
pub struct ClientSession {
	state: Arc<Mutex<SessionState>>,
}
impl ClientSession {
	/// Creates a session with consumer credentials and an anonymous user.
	pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
		Self::from_store(CredentialStore::new(consumer_key, consumer_secret))
	}

	/// Creates a session with both consumer and user credentials.
	pub fn with_token(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<String>,
		token: impl Into<String>,
		token_secret: impl Into<String>,
	) -> Self {
		let mut store = CredentialStore::new(consumer_key, consumer_secret);

		store.set_user_token(token, token_secret);

		Self::from_store(store)
	}

	/// Wraps an existing credential store.
	pub fn from_store(credentials: CredentialStore) -> Self {
		Self {
			state: Arc::new(Mutex::new(SessionState {
				credentials,
				config: TransportConfig::default(),
				cached: None,
			})),
		}
	}

	/// Replaces the transport configuration used for future transports.
	pub fn with_config(self, config: TransportConfig) -> Self {
		self.set_config(config);

		self
	}

	/// Replaces the transport configuration and invalidates the cached transport.
	pub fn set_config(&self, config: TransportConfig) {
		let mut state = self.state.lock();

		state.config = config;
		state.credentials.bump();
	}

	/// Replaces the consumer credentials; the next [`ClientSession::transport`] call rebuilds.
	pub fn set_consumer(&self, key: impl Into<String>, secret: impl Into<String>) {
		let mut state = self.state.lock();

		state.credentials.set_consumer(key, secret);

		obs::trace_credentials_changed("consumer", state.credentials.generation());
	}

	/// Replaces the user credentials; two empty strings restore the anonymous sentinel.
	pub fn set_user_token(&self, token: impl Into<String>, secret: impl Into<String>) {
		let mut state = self.state.lock();

		state.credentials.set_user_token(token, secret);

		obs::trace_credentials_changed("user", state.credentials.generation());
	}

	/// Attaches the user credentials produced by an authorization-code exchange.
	pub fn apply_access_credential(&self, credential: &AccessCredential) {
		let user = credential.user_credentials();

		self.set_user_token(user.token, user.secret.expose());
	}

	/// Returns the signed transport for the current credentials, building it on first use.
	///
	/// Fails with [`ConfigError::MissingConsumer`] when no consumer credentials were set;
	/// the failure leaves the session untouched. Without user credentials the transport
	/// signs anonymously. Repeated calls return the same [`Arc`] until a credential changes.
	pub fn transport(&self) -> Result<Arc<SignedTransport>> {
		let mut state = self.state.lock();
		let generation = state.credentials.generation();

		if let Some(cached) = state.cached.as_ref().filter(|t| t.generation() == generation) {
			obs::record_op_outcome(OpKind::TransportReuse, OpOutcome::Success);

			return Ok(Arc::clone(cached));
		}

		let _span = OpSpan::new(OpKind::TransportBuild, "transport").entered();

		obs::record_op_outcome(OpKind::TransportBuild, OpOutcome::Attempt);

		match state.build_transport() {
			Ok(transport) => {
				obs::record_op_outcome(OpKind::TransportBuild, OpOutcome::Success);
				obs::trace_transport_built(generation, transport.signer().is_anonymous());

				state.cached = Some(Arc::clone(&transport));

				Ok(transport)
			},
			Err(e) => {
				obs::record_op_outcome(OpKind::TransportBuild, OpOutcome::Failure);

				Err(e)
			},
		}
	}

	/// Current credential generation; it advances on every mutation.
	pub fn generation(&self) -> u64 {
		self.state.lock().credentials.generation()
	}

	/// Returns `true` once consumer credentials have been set.
	pub fn has_consumer(&self) -> bool {
		self.state.lock().credentials.has_consumer()
	}
}
impl Debug for ClientSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("ClientSession")
			.field("credentials", &state.credentials)
			.field("config", &state.config)
			.field("cached_generation", &state.cached.as_ref().map(|t| t.generation()))
			.finish()
	}
}

#[derive(Default)]
struct SessionState {
	credentials: CredentialStore,
	config: TransportConfig,
	cached: Option<Arc<SignedTransport>>,
}
impl SessionState {
	fn build_transport(&self) -> Result<Arc<SignedTransport>> {
		let consumer = self.credentials.consumer().ok_or(ConfigError::MissingConsumer)?;
		let signer = HmacSha1Signer::new(consumer.clone(), self.credentials.user().clone());
		let client = self.config.build_client()?;

		Ok(Arc::new(SignedTransport::new(client, signer, self.credentials.generation())))
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::thread;
	// self
	use super::*;
	use crate::credentials::{ConsumerCredentials, UserCredentials};

	fn fixture_request(transport: &SignedTransport) -> reqwest::Request {
		transport
			.request(reqwest::Method::GET, "https://api.example.com/v1/me?x=1")
			.build()
			.expect("Fixture request should build.")
	}

	fn expected_header(consumer: (&str, &str), user: (&str, &str), request: &reqwest::Request) -> String {
		HmacSha1Signer::new(
			ConsumerCredentials::new(consumer.0, consumer.1),
			UserCredentials::new(user.0, user.1),
		)
		.authorization_at(request, "fixed-nonce", 1_700_000_000)
		.expect("Reference signing should succeed.")
	}

	fn actual_header(transport: &SignedTransport, request: &reqwest::Request) -> String {
		transport
			.signer()
			.authorization_at(request, "fixed-nonce", 1_700_000_000)
			.expect("Transport signing should succeed.")
	}

	#[test]
	fn unconfigured_session_fails_without_mutation() {
		let session = ClientSession::default();
		let before = session.generation();

		for _ in 0..2 {
			let err = session.transport().expect_err("Transport must require consumer credentials.");

			assert!(matches!(err, Error::Config(ConfigError::MissingConsumer)));
		}

		assert_eq!(session.generation(), before);
		assert!(!session.has_consumer());
	}

	#[test]
	fn anonymous_user_is_implied() {
		let session = ClientSession::new("ck", "cs");
		let transport = session.transport().expect("Anonymous transport should build.");
		let request = fixture_request(&transport);

		assert!(transport.signer().is_anonymous());
		assert_eq!(actual_header(&transport, &request), expected_header(("ck", "cs"), ("", ""), &request));
	}

	#[test]
	fn repeated_calls_share_one_transport() {
		let session = ClientSession::with_token("ck", "cs", "t", "ts");
		let first = session.transport().expect("First transport should build.");
		let second = session.transport().expect("Second call should reuse the cache.");

		assert!(Arc::ptr_eq(&first, &second));
	}

	#[test]
	fn latest_consumer_wins() {
		let session = ClientSession::default();

		session.set_consumer("k", "s");
		session.set_consumer("k2", "s2");

		let transport = session.transport().expect("Transport should build.");
		let request = fixture_request(&transport);

		assert_eq!(transport.signer().consumer_key(), "k2");
		assert_eq!(actual_header(&transport, &request), expected_header(("k2", "s2"), ("", ""), &request));
		assert_ne!(actual_header(&transport, &request), expected_header(("k", "s"), ("", ""), &request));
	}

	#[test]
	fn user_token_change_invalidates_cache() {
		let session = ClientSession::new("ck", "cs");

		session.set_user_token("t", "ts");

		let t1 = session.transport().expect("T1 should build.");

		session.set_user_token("t2", "ts2");

		let t2 = session.transport().expect("T2 should build.");
		let request = fixture_request(&t2);

		assert!(!Arc::ptr_eq(&t1, &t2));
		assert!(t2.generation() > t1.generation());
		assert_eq!(actual_header(&t2, &request), expected_header(("ck", "cs"), ("t2", "ts2"), &request));
		assert_eq!(actual_header(&t1, &request), expected_header(("ck", "cs"), ("t", "ts"), &request));
	}

	#[test]
	fn config_change_invalidates_cache() {
		let session = ClientSession::new("ck", "cs");
		let before = session.transport().expect("Transport should build.");

		session.set_config(TransportConfig::default().with_user_agent("reader/1.0"));

		let after = session.transport().expect("Transport should rebuild.");

		assert!(!Arc::ptr_eq(&before, &after));
	}

	#[test]
	fn access_credential_becomes_user_token() {
		let session = ClientSession::new("ck", "cs");
		let credential = AccessCredential::new("access-123");

		session.apply_access_credential(&credential);

		let transport = session.transport().expect("Transport should build.");

		assert!(!transport.signer().is_anonymous());
	}

	#[test]
	fn concurrent_mutation_never_serves_stale_transport() {
		let session = ClientSession::new("ck", "cs");
		// Generation -> user pair that produced it; writers record under this lock.
		let issued = Arc::new(Mutex::new(HashMap::from([(
			session.generation(),
			(String::new(), String::new()),
		)])));
		let writers = (0..4)
			.map(|i| {
				let session = session.clone();
				let issued = issued.clone();

				thread::spawn(move || {
					for n in 0..50 {
						let (token, secret) = (format!("t{i}-{n}"), format!("s{i}-{n}"));
						let mut issued = issued.lock();

						session.set_user_token(&token, &secret);
						issued.insert(session.generation(), (token, secret));
					}
				})
			})
			.collect::<Vec<_>>();
		let readers = (0..4)
			.map(|_| {
				let session = session.clone();

				thread::spawn(move || {
					(0..50)
						.map(|_| {
							let transport = session.transport().expect("Transport should build.");

							assert!(transport.generation() <= session.generation());

							let request = fixture_request(&transport);

							(transport.generation(), actual_header(&transport, &request))
						})
						.collect::<Vec<_>>()
				})
			})
			.collect::<Vec<_>>();

		for handle in writers {
			handle.join().expect("Writer thread should not panic.");
		}

		let observed = readers
			.into_iter()
			.flat_map(|handle| handle.join().expect("Reader thread should not panic."))
			.collect::<Vec<_>>();
		let last = session.transport().expect("Final transport should build.");
		let request = fixture_request(&last);
		let issued = issued.lock();

		assert_eq!(observed.len(), 200);

		for (generation, header) in observed {
			let (token, secret) =
				issued.get(&generation).expect("Every served generation should have been issued.");

			assert_eq!(
				header,
				expected_header(("ck", "cs"), (token.as_str(), secret.as_str()), &request)
			);
		}

		let (token, secret) = &issued[&last.generation()];

		assert_eq!(last.generation(), session.generation());
		assert_eq!(
			actual_header(&last, &request),
			expected_header(("ck", "cs"), (token.as_str(), secret.as_str()), &request)
		);
		assert!(Arc::ptr_eq(&last, &session.transport().expect("Cached transport expected.")));
	}
}
