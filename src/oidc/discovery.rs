//! Discovery (C2): fetches and parses the `.well-known/openid-configuration`
//! document.
//!
//! Grounded on `phylum-dev-cli`'s `auth/oidc.rs` `get_oidc_server_settings`
//! (reqwest GET + typed JSON decode), generalized to the four-field
//! `WellKnownConfiguration` and explicit missing-endpoint checks from
//! `pkg/oidc/discovery.go`.

use reqwest::Client;

use crate::error::{OidcError, Result};
use crate::model::WellKnownConfiguration;

const WELL_KNOWN_SUFFIX: &str = ".well-known/openid-configuration";

/// Fetches and validates the discovery document for `authority`.
///
/// The discovery URL is built by plain string concatenation, not
/// `Url::join` -- `join` applies RFC 3986 relative-reference resolution and
/// strips the last path segment of `authority`, which truncates any
/// authority with a non-trivial path (`https://id.example/realms/myrealm`
/// would lose `myrealm`). `pkg/oidc/discovery.go`'s `GetSchemeAndHost()`
/// concatenates instead, and that's the contract here too.
pub async fn get_metadata(client: &Client, authority: &str) -> Result<WellKnownConfiguration> {
    let well_known = format!("{}/{WELL_KNOWN_SUFFIX}", authority.trim_end_matches('/'));

    let response = client
        .get(well_known)
        .send()
        .await
        .map_err(|e| OidcError::Discovery { reason: e.to_string() })?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(OidcError::Discovery {
            reason: format!("discovery endpoint returned {}", response.status()),
        });
    }

    let config: WellKnownConfiguration = response
        .json()
        .await
        .map_err(|e| OidcError::Discovery { reason: format!("invalid discovery body: {e}") })?;

    if config.token_endpoint.is_empty() {
        return Err(OidcError::Discovery { reason: "missing token_endpoint".into() });
    }
    if config.authorization_endpoint.is_empty() {
        return Err(OidcError::Discovery { reason: "missing authorization_endpoint".into() });
    }
    if config.jwks_uri.is_empty() {
        return Err(OidcError::Discovery { reason: "missing jwks_uri".into() });
    }
    if config.issuer.is_empty() {
        return Err(OidcError::Discovery { reason: "missing issuer".into() });
    }

    Ok(config)
}
