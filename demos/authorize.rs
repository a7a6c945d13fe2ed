//! Walks an end user through the authorization-code redirect, exchanges the code, and
//! switches a session from anonymous to user-signed requests.
//!
//! Set `OVERDRIVE_CLIENT_KEY`, `OVERDRIVE_CLIENT_SECRET`, and `OVERDRIVE_LIBRARY_ID`, then
//! paste the full redirect URL when prompted.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use url::Url;
// self
use overdrive_session::{
	error::{Error, ExchangeError},
	exchange::AuthorizationCodeExchange,
	session::ClientSession,
};

const REDIRECT_URI: &str = "https://app.example.com/oauth/callback";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let key = env::var("OVERDRIVE_CLIENT_KEY")?;
	let secret = env::var("OVERDRIVE_CLIENT_SECRET")?;
	let library = env::var("OVERDRIVE_LIBRARY_ID")?;
	let session = ClientSession::new(&key, &secret);
	let anonymous = session.transport()?;

	println!("Anonymous transport ready (generation {}).", anonymous.generation());

	let exchange = AuthorizationCodeExchange::new(&key, &secret, library, REDIRECT_URI)?;
	let request = exchange.authorize_url();

	println!("Send your user to {}.", request.authorize_url);
	println!("Paste the URL the browser was redirected to:");

	let mut line = String::new();

	BufReader::new(io::stdin()).read_line(&mut line).await?;

	let redirected = Url::parse(line.trim())?;
	let param = |name: &str| {
		redirected.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
	};
	let state = param("state").ok_or_else(|| eyre!("Redirect URL carries no `state`."))?;

	request.validate_state(&state)?;

	let code = param("code");
	let source = move || {
		let code = code.clone();

		async move {
			code.ok_or_else(|| -> Error {
				ExchangeError::CodeUnavailable { reason: "redirect carried no code".into() }.into()
			})
		}
	};
	let credential = exchange.exchange(&source).await?;

	session.apply_access_credential(&credential);

	let signed = session.transport()?;

	println!(
		"User transport ready (generation {}, expires at {:?}).",
		signed.generation(),
		credential.expires_at
	);

	Ok(())
}
