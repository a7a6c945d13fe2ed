//! Credential lifecycle and lazily cached OAuth 1.0a signed transports for the OverDrive
//! lending API, plus the OAuth 2.0 authorization-code exchange that yields user tokens.
//!
//! A [`session::ClientSession`] owns the consumer and user credentials. Every mutation
//! invalidates the cached [`transport::SignedTransport`]; the next
//! [`session::ClientSession::transport`] call rebuilds it from the latest credentials.
//! Signed transports never follow redirects, so download endpoints hand back their `302`
//! for the caller to inspect.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod credentials;
pub mod error;
pub mod exchange;
pub mod http;
pub mod obs;
pub mod session;
pub mod transport;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use color_eyre as _;
