//! Flow orchestrators (C8): authorization code, PKCE, and client
//! credentials. Grounded on `phylum-dev-cli`'s `auth/oidc.rs`
//! `acquire_tokens`/`handle_auth_flow` orchestration shape.

pub mod auth_code;
pub mod client_credentials;
