//! Authorization-code and PKCE flows (C8.1).
//!
//! Grounded on `phylum-dev-cli`'s `auth/server.rs`
//! `spawn_server_and_get_auth_code`/`handle_auth_flow`: build the URL, open
//! the browser, run the loopback server, return the resulting tokens.

use std::sync::Arc;

use reqwest::Client;

use crate::error::Result;
use crate::model::{GrantType, OidcClientWithSecret, TokenResultSet};
use crate::oidc::{authorization, crypto, discovery};
use crate::server::{self, CallbackContext};
use crate::store::CredentialStore;
use crate::{browser, print_user_failure, print_user_success};

pub struct AuthCodeFlowOptions {
    pub dry_run: bool,
    pub port: u16,
    pub expected_audience: Option<String>,
}

/// Runs the authorization-code or PKCE flow for `client`, per the grant
/// type on the stored `OidcClient`. Returns the persisted token set unless
/// `dry_run` is set, in which case it prints the URL and returns `Ok(None)`.
pub async fn run(
    http: &Client,
    store: Arc<CredentialStore>,
    client: OidcClientWithSecret,
    options: AuthCodeFlowOptions,
) -> Result<Option<TokenResultSet>> {
    let well_known = discovery::get_metadata(http, &client.client.authority).await?;

    let redirect_uri = format!("http://localhost:{}/callback", options.port);
    let state = crypto::random_url_safe(24)?;

    let code_verifier = if client.client.grant_type == GrantType::Pkce {
        Some(crypto::pkce_verifier()?)
    } else {
        None
    };

    let auth_url = authorization::build_code_authorization_request(
        &well_known,
        &client.client.client_id,
        &redirect_uri,
        &client.client.scopes,
        &state,
        code_verifier.as_ref().map(|c| c.challenge.as_str()),
    )?;

    if options.dry_run {
        print_user_success!("authorization url: {auth_url}");
        return Ok(None);
    }

    let ctx = CallbackContext {
        http: http.clone(),
        well_known,
        client_id: client.client.client_id.clone(),
        client_secret: client.client_secret.clone(),
        code_verifier: code_verifier.as_ref().map(|c| c.verifier.clone()),
        redirect_uri,
        expected_state: state,
        expected_audience: options.expected_audience,
        store,
        alias: client.client.alias.clone(),
    };

    print_user_success!("opening browser to complete sign-in for '{}'", client.client.alias);
    browser::open_browser(auth_url.as_str())?;

    match server::run_callback_server(options.port, ctx).await {
        Ok(tokens) => Ok(Some(tokens)),
        Err(e) => {
            print_user_failure!("authentication failed: {e}");
            Err(e)
        },
    }
}
