// crates.io
use httpmock::prelude::*;
use reqwest::{Method, StatusCode, header};
// self
use overdrive_session::{
	error::{ConfigError, Error},
	session::ClientSession,
	transport::TransportConfig,
};

fn authorization_of(request: &reqwest::Request) -> String {
	request
		.headers()
		.get(header::AUTHORIZATION)
		.expect("Signed requests should carry an Authorization header.")
		.to_str()
		.expect("Authorization header should be visible ASCII.")
		.to_owned()
}

#[tokio::test]
async fn redirects_are_returned_to_the_caller() {
	let server = MockServer::start_async().await;
	let download = server
		.mock_async(|when, then| {
			when.method(GET).path("/download").header_exists("authorization");
			then.status(302).header("location", "/final");
		})
		.await;
	let target = server
		.mock_async(|when, then| {
			when.method(GET).path("/final");
			then.status(200).body("content");
		})
		.await;
	let session = ClientSession::with_token("ck", "cs", "t", "ts");
	let transport = session.transport().expect("Transport should build.");
	let response =
		transport.get(server.url("/download")).await.expect("Download request should succeed.");

	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(
		response.headers().get(header::LOCATION).and_then(|value| value.to_str().ok()),
		Some("/final")
	);

	download.assert_calls_async(1).await;
	target.assert_calls_async(0).await;
}

#[tokio::test]
async fn form_bodies_are_signed_and_sent() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/patrons/me/checkouts")
				.header("content-type", "application/x-www-form-urlencoded")
				.header_exists("authorization")
				.body("reserveId=abc&format=ebook-epub");
			then.status(201);
		})
		.await;
	let session = ClientSession::with_token("ck", "cs", "t", "ts");
	let transport = session.transport().expect("Transport should build.");
	let request = transport
		.request(Method::POST, server.url("/v1/patrons/me/checkouts"))
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body("reserveId=abc&format=ebook-epub")
		.build()
		.expect("Form request should build.");
	let response = transport.execute(request).await.expect("Form request should succeed.");

	assert_eq!(response.status(), StatusCode::CREATED);

	mock.assert_async().await;
}

#[test]
fn anonymous_signature_omits_user_token() {
	let session = ClientSession::new("ck", "cs");
	let transport = session.transport().expect("Anonymous transport should build.");
	let mut request = transport
		.request(Method::GET, "https://api.example.com/v1/libraries/1234")
		.build()
		.expect("Request should build.");

	transport.sign(&mut request).expect("Anonymous signing should succeed.");

	let authorization = authorization_of(&request);

	assert!(authorization.starts_with("OAuth "));
	assert!(authorization.contains("oauth_consumer_key=\"ck\""));
	assert!(authorization.contains("oauth_signature_method=\"HMAC-SHA1\""));
	assert!(!authorization.contains("oauth_token="));
}

#[test]
fn new_user_token_is_used_after_change() {
	let session = ClientSession::new("ck", "cs");

	session.set_user_token("t", "ts");

	let first = session.transport().expect("First transport should build.");

	session.set_user_token("t2", "ts2");

	let second = session.transport().expect("Second transport should build.");
	let mut old = first
		.request(Method::GET, "https://api.example.com/v1/me")
		.build()
		.expect("Request should build.");
	let mut new = second
		.request(Method::GET, "https://api.example.com/v1/me")
		.build()
		.expect("Request should build.");

	first.sign(&mut old).expect("Stale transport should still sign.");
	second.sign(&mut new).expect("Fresh transport should sign.");

	assert!(authorization_of(&old).contains("oauth_token=\"t\""));
	assert!(authorization_of(&new).contains("oauth_token=\"t2\""));
}

#[test]
fn consumer_is_required_before_any_transport() {
	let session = ClientSession::default();

	assert!(matches!(session.transport(), Err(Error::Config(ConfigError::MissingConsumer))));

	session.set_consumer("ck", "cs");

	let transport = session.transport().expect("Transport should build once configured.");

	assert!(transport.signer().is_anonymous());
	assert_eq!(transport.signer().consumer_key(), "ck");
}

#[test]
fn reset_to_anonymous_drops_user_token() {
	let session = ClientSession::with_token("ck", "cs", "t", "ts")
		.with_config(TransportConfig::default().with_user_agent("reader-it/1.0"));
	let user = session.transport().expect("User transport should build.");

	session.set_user_token("", "");

	let anonymous = session.transport().expect("Anonymous transport should build.");

	assert!(!user.signer().is_anonymous());
	assert!(anonymous.signer().is_anonymous());
}
