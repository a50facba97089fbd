//! Core data model: [`OidcClient`], [`TokenResultSet`] and the transient
//! structures that pass between flow stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum GrantType {
    AuthorizationCode,
    #[serde(rename = "PKCE")]
    Pkce,
    ClientCredentials,
}

impl GrantType {
    pub fn requires_secret(self) -> bool {
        !matches!(self, GrantType::Pkce)
    }
}

/// One registered connection. Never carries `client_secret` in its
/// serialized form -- that lives only in the keyring (Invariant I2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OidcClient {
    pub alias: String,
    pub authority: String,
    pub grant_type: GrantType,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub created_date: DateTime<Utc>,
}

impl OidcClient {
    pub fn add_scopes(&mut self, scopes: &[String]) {
        for scope in scopes {
            if !self.scopes.contains(scope) {
                self.scopes.push(scope.clone());
            }
        }
    }

    pub fn remove_scopes(&mut self, scopes: &[String]) {
        self.scopes.retain(|s| !scopes.contains(s));
    }
}

/// A loaded client plus its secret, the shape `get_with_secret` hands to a flow.
#[derive(Debug, Clone)]
pub struct OidcClientWithSecret {
    pub client: OidcClient,
    pub client_secret: String,
}

/// Full token response for the authorization-code and PKCE flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResultSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: i64,
}

/// Client-credentials response shape: no `id_token`, no `refresh_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResultSet {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: i64,
}

/// Refresh-endpoint response shape: no `id_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResult {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: i64,
}

/// Absolute expiry, floor(now + expires_in - 60s). The 60-second subtraction
/// is part of the contract, not an estimate -- do not drop it.
pub fn absolute_expiry(now: DateTime<Utc>, expires_in: i64) -> i64 {
    (now.timestamp() + expires_in) - 60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WellKnownConfiguration {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    pub issuer: String,
}

/// Query parameters carried by the loopback callback request.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationResponse {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// A PKCE verifier/challenge pair. Transient -- never persisted.
#[derive(Debug, Clone)]
pub struct CodeVerifier {
    pub verifier: String,
    pub challenge: String,
}
