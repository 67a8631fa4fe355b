//! Builds an authorization redirect for the web-server flow and shows the token request the
//! callback handler would send.

// std
use std::collections::HashMap;
// crates.io
use color_eyre::Result;
// self
use oauth2_draft::{
	Client,
	config::{ClientConfig, ClientOptions},
	params::Params,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let options = ClientOptions::default()
		.with_site("https://provider.example.com")
		.with_access_token_path("/oauth/token");
	let client = Client::new(ClientConfig::new("demo-client", "demo-secret", options))?;
	let strategy = client.web_server();
	let redirect_uri = "https://app.example.com/oauth/callback";
	let request =
		strategy.start_authorization(redirect_uri, &Params::from([("scope", "email")]))?;

	println!("Send your user to {}.", request.url);

	let mut pending = HashMap::new();

	pending.insert(request.state.clone(), request.clone());

	// Simulate the redirect handler looking up the pending request by `state`.
	let returned_state = request.state.clone();

	if let Some(stashed) = pending.remove(&returned_state) {
		stashed.validate_state(&returned_state)?;

		let params = strategy.access_token_params(
			"code-from-callback",
			&stashed.redirect_uri,
			&Params::new(),
		);

		println!("Token endpoint: {}.", client.access_token_endpoint(&Params::new())?);
		println!("Exchange body: {}.", params.to_query());
		println!("Call `WebServer::get_access_token` from the callback to redeem the code.");
	} else {
		eprintln!("State `{returned_state}` was not recognized.");
	}

	Ok(())
}
