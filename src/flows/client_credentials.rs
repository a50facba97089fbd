//! Client-credentials flow (C8.2): no local server, no browser.
//!
//! Grounded on `pkg/connect/clientCredsFlow/request.go`'s
//! `ClientCredsFlowInteractor::Request`.

use std::sync::Arc;

use reqwest::Client;

use crate::error::Result;
use crate::model::{AccessTokenResultSet, OidcClientWithSecret, TokenResultSet};
use crate::oidc::{discovery, token_client, validate};
use crate::print_user_warning;
use crate::store::CredentialStore;

pub struct ClientCredentialsOptions {
    pub expected_audience: Option<String>,
}

/// Requests an access token and persists it. The access token is validated
/// with C5 only when the provider issued one shaped like a JWT; providers
/// that issue opaque tokens are not penalized for it.
pub async fn run(
    http: &Client,
    store: Arc<CredentialStore>,
    client: OidcClientWithSecret,
    options: ClientCredentialsOptions,
) -> Result<TokenResultSet> {
    let well_known = discovery::get_metadata(http, &client.client.authority).await?;

    let response: AccessTokenResultSet = token_client::request_client_credentials(
        http,
        &well_known.token_endpoint,
        &client.client.client_id,
        &client.client_secret,
        &client.client.scopes,
    )
    .await?;

    if looks_like_jwt(&response.access_token) {
        if let Err(e) = validate::validate_id_token(
            http,
            &response.access_token,
            &well_known,
            &well_known.issuer,
            options.expected_audience.as_deref(),
        )
        .await
        {
            print_user_warning!("access token failed validation: {e}");
        }
    }

    let tokens = TokenResultSet {
        access_token: response.access_token,
        id_token: None,
        refresh_token: None,
        token_type: response.token_type,
        expires_in: response.expires_in,
        expires_at: response.expires_at,
    };

    if let Err(e) = store.save_tokens(&client.client.alias, &tokens) {
        print_user_warning!("failed to persist tokens: {e}");
    }

    Ok(tokens)
}

fn looks_like_jwt(token: &str) -> bool {
    token.splitn(3, '.').count() == 3
}
