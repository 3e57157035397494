//! Walks through the three-legged handshake against the provider's v1 hosts.
//!
//! Set `STORAGE_APP_KEY` and `STORAGE_APP_SECRET`, run the demo, open the printed URL, approve the
//! application, then press enter. The resulting access token can be persisted and restored later
//! with `Session::with_access_token`.

// std
use std::{env, io};
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use oauth1_storage::client::{AccessRoot, Client};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let key = env::var("STORAGE_APP_KEY").map_err(|_| eyre!("STORAGE_APP_KEY is not set."))?;
	let secret =
		env::var("STORAGE_APP_SECRET").map_err(|_| eyre!("STORAGE_APP_SECRET is not set."))?;
	let client = Client::connect(key, secret, AccessRoot::AppFolder)?;
	let url = client.session.start_authorization().await?;

	println!("Open {url} in a browser, approve the app, then press enter.");

	io::stdin().read_line(&mut String::new())?;

	let access = client.session.obtain_access_token().await?;

	println!("Access token: {} (state: {}).", access.token, client.session.token_state());

	let info = client.account_info().await?;

	println!(
		"Signed in as {} <{}>; {} bytes available.",
		info.display_name,
		info.email,
		info.quota_info.available()
	);

	Ok(())
}
