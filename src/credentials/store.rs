//! Versioned credential store.
//!
//! Every mutation advances a generation counter. Anything derived from the credentials
//! (the signed transport in particular) records the generation it was built from and is
//! stale as soon as the numbers differ, so mutators never need to clear derived state
//! themselves.

// self
use crate::{
	_prelude::*,
	credentials::{ConsumerCredentials, Secret, UserCredentials},
};

/// Holds the consumer pair and the user pair for one client session.
#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
	consumer: Option<ConsumerCredentials>,
	user: UserCredentials,
	generation: u64,
}
impl CredentialStore {
	/// Creates a store with consumer credentials and the anonymous user sentinel.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
		let mut store = Self::unconfigured();

		store.set_consumer(key, secret);

		store
	}

	/// Creates a store without consumer credentials.
	///
	/// Transports cannot be built from it until [`CredentialStore::set_consumer`] runs.
	pub fn unconfigured() -> Self {
		Self::default()
	}

	/// Replaces the consumer credentials.
	///
	/// Inputs are not validated; empty strings are accepted.
	pub fn set_consumer(&mut self, key: impl Into<String>, secret: impl Into<String>) {
		self.consumer = Some(ConsumerCredentials::new(key, Secret::new(secret)));

		self.bump();
	}

	/// Replaces the user credentials; two empty strings restore the anonymous sentinel.
	pub fn set_user_token(&mut self, token: impl Into<String>, secret: impl Into<String>) {
		self.user = UserCredentials::new(token, Secret::new(secret));

		self.bump();
	}

	/// Returns `true` once consumer credentials have been set.
	pub fn has_consumer(&self) -> bool {
		self.consumer.is_some()
	}

	/// Returns `true` while the user pair is the anonymous sentinel.
	pub fn is_anonymous(&self) -> bool {
		self.user.is_anonymous()
	}

	/// Current credential generation.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub(crate) fn consumer(&self) -> Option<&ConsumerCredentials> {
		self.consumer.as_ref()
	}

	pub(crate) fn user(&self) -> &UserCredentials {
		&self.user
	}

	pub(crate) fn bump(&mut self) {
		self.generation = self.generation.wrapping_add(1);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn new_store_has_consumer_and_anonymous_user() {
		let store = CredentialStore::new("ck", "cs");

		assert!(store.has_consumer());
		assert!(store.is_anonymous());
		assert_eq!(store.consumer().map(|c| c.key.as_str()), Some("ck"));
		assert_eq!(store.consumer().map(|c| c.secret.expose()), Some("cs"));
	}

	#[test]
	fn unconfigured_store_lacks_consumer() {
		let store = CredentialStore::unconfigured();

		assert!(!store.has_consumer());
		assert!(store.is_anonymous());
		assert_eq!(store.generation(), 0);
	}

	#[test]
	fn every_mutation_advances_generation() {
		let mut store = CredentialStore::unconfigured();
		let g0 = store.generation();

		store.set_consumer("ck", "cs");

		let g1 = store.generation();

		store.set_user_token("t", "ts");

		let g2 = store.generation();

		// Setting identical values still counts as a mutation.
		store.set_user_token("t", "ts");

		let g3 = store.generation();

		assert!(g0 < g1 && g1 < g2 && g2 < g3);
		assert!(!store.is_anonymous());
	}

	#[test]
	fn empty_user_token_restores_sentinel() {
		let mut store = CredentialStore::new("ck", "cs");

		store.set_user_token("t", "ts");
		store.set_user_token("", "");

		assert!(store.is_anonymous());
		assert_eq!(store.user(), &UserCredentials::anonymous());
	}

	#[test]
	fn empty_consumer_strings_are_accepted() {
		let mut store = CredentialStore::unconfigured();

		store.set_consumer("", "");

		assert!(store.has_consumer());
	}
}
