//! Refresh & token surface (C9).
//!
//! Grounded on `pkg/tokens/tokens.go` (`ShowTokens`, `PrintEnvVars`,
//! `Refresh`) and `phylum-dev-cli`'s `auth/oidc.rs` `refresh_tokens`.

use chrono::Utc;
use reqwest::Client;

use crate::error::{OidcError, Result};
use crate::model::{absolute_expiry, TokenResultSet};
use crate::oidc::{discovery, token_client};
use crate::store::CredentialStore;

/// Performs `grant_type=refresh_token` against the connection's discovered
/// token endpoint and re-persists the merged result.
pub async fn refresh(http: &Client, store: &CredentialStore, alias: &str) -> Result<TokenResultSet> {
    let mut tokens = store.get_tokens(alias)?;
    let refresh_token =
        tokens.refresh_token.clone().filter(|t| !t.is_empty()).ok_or(OidcError::NoRefreshToken)?;

    let with_secret = store.get_with_secret(alias)?;
    let well_known = discovery::get_metadata(http, &with_secret.client.authority).await?;

    let response = token_client::refresh(
        http,
        &well_known.token_endpoint,
        &with_secret.client.client_id,
        &with_secret.client_secret,
        &refresh_token,
    )
    .await?;

    tokens.access_token = response.access_token;
    if let Some(rotated) = response.refresh_token {
        tokens.refresh_token = Some(rotated);
    }
    tokens.expires_in = response.expires_in;
    tokens.expires_at = absolute_expiry(Utc::now(), response.expires_in);

    store.save_tokens(alias, &tokens)?;
    Ok(tokens)
}

/// Loads the stored token set, refreshing first when forced or expired.
pub async fn show_tokens(
    http: &Client,
    store: &CredentialStore,
    alias: &str,
    force_refresh: bool,
) -> Result<TokenResultSet> {
    if !store.exists(alias)? {
        return Err(OidcError::NotFound(alias.to_string()));
    }

    let tokens = store.get_tokens(alias)?;
    let expired = Utc::now().timestamp() >= tokens.expires_at;

    if force_refresh || expired {
        refresh(http, store, alias).await
    } else {
        Ok(tokens)
    }
}

/// `export X_ACCESS_TOKEN=... X_ID_TOKEN=... X_REFRESH_TOKEN=...`, name
/// derived from the alias upper-snake-cased.
pub fn format_env_exports(alias: &str, tokens: &TokenResultSet) -> String {
    let prefix = alias.to_uppercase().replace('-', "_");
    let mut parts = vec![format!("{prefix}_ACCESS_TOKEN={}", tokens.access_token)];
    if let Some(id_token) = &tokens.id_token {
        parts.push(format!("{prefix}_ID_TOKEN={id_token}"));
    }
    if let Some(refresh_token) = &tokens.refresh_token {
        parts.push(format!("{prefix}_REFRESH_TOKEN={refresh_token}"));
    }
    format!("export {}", parts.join(" "))
}

pub fn format_json(tokens: &TokenResultSet) -> Result<String> {
    serde_json::to_string_pretty(tokens).map_err(OidcError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_export_format_uses_upper_snake_case_name() {
        let tokens = TokenResultSet {
            access_token: "A".into(),
            id_token: Some("J".into()),
            refresh_token: Some("R".into()),
            token_type: "Bearer".into(),
            expires_in: 3600,
            expires_at: 0,
        };
        let line = format_env_exports("my-conn", &tokens);
        assert_eq!(line, "export MY_CONN_ACCESS_TOKEN=A MY_CONN_ID_TOKEN=J MY_CONN_REFRESH_TOKEN=R");
    }

    #[test]
    fn env_export_omits_absent_optional_tokens() {
        let tokens = TokenResultSet {
            access_token: "A".into(),
            id_token: None,
            refresh_token: None,
            token_type: "Bearer".into(),
            expires_in: 3600,
            expires_at: 0,
        };
        let line = format_env_exports("svc", &tokens);
        assert_eq!(line, "export SVC_ACCESS_TOKEN=A");
    }
}
