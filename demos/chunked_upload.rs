//! Uploads a local file with the chunked-upload protocol and commits it.
//!
//! Usage: `cargo run --example chunked_upload -- <local file> <remote path>` with
//! `STORAGE_APP_KEY`, `STORAGE_APP_SECRET`, `STORAGE_ACCESS_TOKEN`, and
//! `STORAGE_ACCESS_SECRET` set. When a chunk fails, the printed progress is everything needed to
//! resume with `Client::resume_chunked_upload`.

// std
use std::{env, fs::File, io::BufReader};
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use oauth1_storage::{
	auth::Credential,
	client::{AccessRoot, ApiHosts, Client},
	session::Session,
};

fn var(name: &str) -> Result<String> {
	env::var(name).map_err(|_| eyre!("{name} is not set."))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let mut args = env::args().skip(1);
	let (Some(local), Some(remote)) = (args.next(), args.next()) else {
		return Err(eyre!("Usage: chunked_upload <local file> <remote path>"));
	};
	let hosts = ApiHosts::default();
	let consumer = hosts.consumer(var("STORAGE_APP_KEY")?, var("STORAGE_APP_SECRET")?)?;
	let session = Session::new(consumer).with_access_token(Credential::new(
		var("STORAGE_ACCESS_TOKEN")?,
		var("STORAGE_ACCESS_SECRET")?,
	));
	let client = Client::new(session, hosts, AccessRoot::AppFolder);
	let file = File::open(&local)?;
	let total_size = file.metadata()?.len();
	let mut uploader = client.chunked_uploader(BufReader::new(file), total_size)?;

	if let Err(e) = uploader.upload().await {
		let state = uploader.state();

		eprintln!(
			"Upload stopped at {} of {} bytes (upload_id {:?}).",
			state.offset(),
			state.total_size(),
			state.upload_id()
		);

		return Err(e.into());
	}

	let entry = client.commit_chunked_upload(&remote, uploader.state(), true).await?;

	println!("Stored {} ({}, rev {}).", entry.path, entry.size, entry.rev);

	Ok(())
}
