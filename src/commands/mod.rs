//! CLI command handlers, one module per subcommand family -- mirroring the
//! shape of `pkg/config/*.go` and `pkg/connect/*.go`, and the
//! one-`handle_*`-function-per-subcommand layout of `phylum-dev-cli`'s
//! `commands/auth.rs`.

pub mod clean;
pub mod connect;
pub mod delete;
pub mod doctor;
pub mod list;
pub mod scopes;
pub mod secret;
pub mod setup;
pub mod token;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{OidcError, Result};

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Shared by `alias` and `client_id`, both of which the spec constrains to
/// `[A-Za-z0-9_-]+`.
pub fn validate_name(value: &str) -> Result<()> {
    if NAME_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(OidcError::Config(format!("'{value}' must match [A-Za-z0-9_-]+")))
    }
}

pub fn validate_authority(value: &str) -> Result<()> {
    let url = url::Url::parse(value).map_err(|e| OidcError::Config(format!("invalid authority: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(OidcError::Config("authority scheme must be http or https".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_pattern_rejects_punctuation() {
        assert!(validate_name("acme-1").is_ok());
        assert!(validate_name("acme 1").is_err());
        assert!(validate_name("acme/1").is_err());
    }

    #[test]
    fn authority_must_be_http_or_https() {
        assert!(validate_authority("https://id.example").is_ok());
        assert!(validate_authority("http://id.example").is_ok());
        assert!(validate_authority("ftp://id.example").is_err());
    }
}
