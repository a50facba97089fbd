//! Authorization request builder (C3).
//!
//! Grounded on `phylum-dev-cli`'s `auth/oidc.rs` `build_auth_url`,
//! generalized to accept an arbitrary scope list, state, and optional PKCE
//! challenge per `pkg/oidc/authorisation.go`'s `BuildCodeAuthorisationRequest`.

use url::Url;

use crate::error::{OidcError, Result};
use crate::model::WellKnownConfiguration;

/// Builds the browser-facing authorization URL. `code_challenge` is `None`
/// for the plain authorization-code grant and `Some` for PKCE.
pub fn build_code_authorization_request(
    cfg: &WellKnownConfiguration,
    client_id: &str,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
    code_challenge: Option<&str>,
) -> Result<Url> {
    let mut url = Url::parse(&cfg.authorization_endpoint)
        .map_err(|e| OidcError::Config(format!("invalid authorization_endpoint: {e}")))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("response_type", "code");
        query.append_pair("response_mode", "query");
        query.append_pair("client_id", client_id);
        query.append_pair("redirect_uri", redirect_uri);
        query.append_pair("scope", &scopes.join(" "));
        query.append_pair("state", state);
        if let Some(challenge) = code_challenge.filter(|c| !c.is_empty()) {
            query.append_pair("code_challenge", challenge);
            query.append_pair("code_challenge_method", "S256");
        }
    }

    Ok(url)
}
