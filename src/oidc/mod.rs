//! The OIDC client engine: crypto primitives, discovery, request building,
//! the token endpoint client, and ID-token validation (C1-C5).

pub mod authorization;
pub mod crypto;
pub mod discovery;
pub mod token_client;
pub mod validate;
