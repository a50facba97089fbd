//! Token endpoint client (C4).
//!
//! Grounded on `phylum-dev-cli`'s `auth/oidc.rs` `acquire_tokens`/
//! `refresh_tokens` (reqwest form-POST, Basic auth when a secret is
//! present), generalized to the three higher-level forms described in
//! `pkg/oidc/authorisation.go` and `pkg/oidc/refresh.go`.

use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{OidcError, Result};
use crate::model::{absolute_expiry, AccessTokenResultSet, RefreshResult, TokenResultSet};

/// Raw wire shape returned by a provider's token endpoint, before
/// `expires_at` is derived.
#[derive(Debug, serde::Deserialize)]
struct TokenResponseWire {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Form-POSTs `form_values` to `endpoint`, applying HTTP Basic auth when
/// `client_secret` is non-empty (RFC 6749 §2.3.1), otherwise folding
/// `client_id` into the form body (§4.1.3). Decodes the JSON success body
/// into `T`; any non-200 response is surfaced verbatim as
/// `TokenEndpointError`.
async fn form_post<T: DeserializeOwned>(
    client: &Client,
    endpoint: &str,
    client_id: &str,
    client_secret: &str,
    mut form_values: Vec<(&str, String)>,
) -> Result<T> {
    let mut request = client.post(endpoint);

    if !client_secret.is_empty() {
        request = request.basic_auth(client_id, Some(client_secret));
    } else {
        form_values.push(("client_id", client_id.to_string()));
    }

    let response = request.form(&form_values).send().await?;
    let status = response.status();

    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        let pretty = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| serde_json::to_string_pretty(&v).ok())
            .unwrap_or(body);
        return Err(OidcError::TokenEndpointError { status: status.as_u16(), body: pretty });
    }

    response.json::<T>().await.map_err(|e| OidcError::TokenInvalid { reason: e.to_string() })
}

/// `grant_type=authorization_code` exchange. `verifier` is `Some` for PKCE,
/// `None` for the plain code flow.
pub async fn exchange_code(
    client: &Client,
    endpoint: &str,
    code: &str,
    client_id: &str,
    client_secret: &str,
    verifier: Option<&str>,
    redirect_uri: &str,
) -> Result<TokenResultSet> {
    let mut form = vec![
        ("grant_type", "authorization_code".to_string()),
        ("code", code.to_string()),
        ("redirect_uri", redirect_uri.to_string()),
    ];
    if let Some(v) = verifier.filter(|v| !v.is_empty()) {
        form.push(("code_verifier", v.to_string()));
    }

    let wire: TokenResponseWire = form_post(client, endpoint, client_id, client_secret, form).await?;
    let now = Utc::now();
    Ok(TokenResultSet {
        access_token: wire.access_token,
        id_token: wire.id_token,
        refresh_token: wire.refresh_token,
        token_type: wire.token_type,
        expires_in: wire.expires_in,
        expires_at: absolute_expiry(now, wire.expires_in),
    })
}

/// `grant_type=client_credentials`.
pub async fn request_client_credentials(
    client: &Client,
    endpoint: &str,
    client_id: &str,
    client_secret: &str,
    scopes: &[String],
) -> Result<AccessTokenResultSet> {
    let form = vec![
        ("grant_type", "client_credentials".to_string()),
        ("scope", scopes.join(" ")),
    ];

    let wire: TokenResponseWire = form_post(client, endpoint, client_id, client_secret, form).await?;
    let now = Utc::now();
    Ok(AccessTokenResultSet {
        access_token: wire.access_token,
        token_type: wire.token_type,
        expires_in: wire.expires_in,
        expires_at: absolute_expiry(now, wire.expires_in),
    })
}

/// `grant_type=refresh_token`.
pub async fn refresh(
    client: &Client,
    endpoint: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<RefreshResult> {
    let form = vec![
        ("grant_type", "refresh_token".to_string()),
        ("refresh_token", refresh_token.to_string()),
    ];

    let wire: TokenResponseWire = form_post(client, endpoint, client_id, client_secret, form).await?;
    let now = Utc::now();
    Ok(RefreshResult {
        access_token: wire.access_token,
        refresh_token: wire.refresh_token,
        token_type: wire.token_type,
        expires_in: wire.expires_in,
        expires_at: absolute_expiry(now, wire.expires_in),
    })
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn exchange_code_with_secret_uses_basic_auth_not_client_id_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A", "id_token": "J", "refresh_token": "R",
                "token_type": "Bearer", "expires_in": 3600,
            })))
            .mount(&server)
            .await;

        let client = Client::new();
        let endpoint = format!("{}/token", server.uri());
        let tokens =
            exchange_code(&client, &endpoint, "XYZ", "abc", "s3cr3t", None, "http://localhost:8080/callback")
                .await
                .unwrap();
        assert_eq!(tokens.access_token, "A");
        assert_eq!(tokens.refresh_token.as_deref(), Some("R"));
    }

    #[tokio::test]
    async fn exchange_code_without_secret_includes_verifier_and_client_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A", "token_type": "Bearer", "expires_in": 3600,
            })))
            .mount(&server)
            .await;

        let client = Client::new();
        let endpoint = format!("{}/token", server.uri());
        let tokens = exchange_code(
            &client,
            &endpoint,
            "XYZ",
            "pk",
            "",
            Some("verifier-value"),
            "http://localhost:8080/callback",
        )
        .await
        .unwrap();
        assert_eq!(tokens.access_token, "A");
    }

    #[tokio::test]
    async fn non_200_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
            })))
            .mount(&server)
            .await;

        let client = Client::new();
        let endpoint = format!("{}/token", server.uri());
        let err = exchange_code(&client, &endpoint, "XYZ", "abc", "s3cr3t", None, "http://localhost:8080/callback")
            .await
            .unwrap_err();
        match err {
            OidcError::TokenEndpointError { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("expected TokenEndpointError, got {other:?}"),
        }
    }
}
