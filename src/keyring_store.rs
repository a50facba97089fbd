//! Keyring abstraction (C6): a platform-polymorphic secret store.
//!
//! Grounded on `phylum-dev-cli`'s reliance on OS-native credential storage
//! and on `baszalmstra-rattler`'s use of the `keyring` crate for the same
//! purpose. The two variants described by the original `pkg/keyring/*.go`
//! are modeled as one trait with two implementations, dispatched once at
//! start-up by host OS (matching `NewKeyRingService`'s `runtime.GOOS` switch).

use keyring::Entry;
use serde::{Deserialize, Serialize};

use crate::error::{OidcError, Result};
use crate::model::TokenResultSet;

pub const SERVICE_NAME: &str = "com.xero.xoauth";

/// Capability set every variant must provide.
pub trait KeyringService: Send + Sync {
    fn set(&self, item: &str, value: &str) -> Result<()>;
    fn get(&self, item: &str) -> Result<String>;
    fn delete(&self, item: &str) -> Result<()>;

    fn set_tokens(&self, item: &str, tokens: &TokenResultSet) -> Result<()>;
    fn get_tokens(&self, item: &str) -> Result<TokenResultSet>;
    fn delete_tokens(&self, item: &str) -> Result<()>;
}

fn entry(item: &str) -> Result<Entry> {
    Entry::new(SERVICE_NAME, item).map_err(|e| OidcError::Storage(e.to_string()))
}

fn is_not_found(err: &keyring::Error) -> bool {
    matches!(err, keyring::Error::NoEntry)
}

/// Unix/macOS variant: the whole token set is a single JSON blob stored
/// under `<alias>:token_set`.
pub struct BlobKeyring;

impl BlobKeyring {
    pub fn new() -> Self {
        BlobKeyring
    }
}

impl Default for BlobKeyring {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringService for BlobKeyring {
    fn set(&self, item: &str, value: &str) -> Result<()> {
        entry(item)?.set_password(value).map_err(OidcError::from)
    }

    fn get(&self, item: &str) -> Result<String> {
        entry(item)?.get_password().map_err(OidcError::from)
    }

    fn delete(&self, item: &str) -> Result<()> {
        entry(item)?.delete_credential().map_err(OidcError::from)
    }

    fn set_tokens(&self, item: &str, tokens: &TokenResultSet) -> Result<()> {
        let blob = serde_json::to_string(tokens)?;
        self.set(&format!("{item}:token_set"), &blob)
    }

    fn get_tokens(&self, item: &str) -> Result<TokenResultSet> {
        let blob = self.get(&format!("{item}:token_set"))?;
        serde_json::from_str(&blob).map_err(OidcError::from)
    }

    fn delete_tokens(&self, item: &str) -> Result<()> {
        self.delete(&format!("{item}:token_set"))
    }
}

/// Windows variant: entries are capped around 2.5 KB, so the token set is
/// split into four keys. `access` is mandatory; `identity` and `refresh`
/// are optional (client-credentials responses have neither); `expiry` is
/// stored as a decimal integer string.
///
/// The original Go implementation guarded the identity/refresh reads with
/// `err.Error() != NotFound`, which inverts the intended check and returns
/// early on the wrong condition. This implementation tolerates a genuine
/// not-found for those two fields and only propagates other errors.
pub struct SplitKeyring;

impl SplitKeyring {
    pub fn new() -> Self {
        SplitKeyring
    }

    fn optional_field(&self, item: &str, suffix: &str) -> Result<Option<String>> {
        match entry(&format!("{item}.{suffix}"))?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(ref e) if is_not_found(e) => Ok(None),
            Err(e) => Err(OidcError::from(e)),
        }
    }
}

impl Default for SplitKeyring {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringService for SplitKeyring {
    fn set(&self, item: &str, value: &str) -> Result<()> {
        entry(item)?.set_password(value).map_err(OidcError::from)
    }

    fn get(&self, item: &str) -> Result<String> {
        entry(item)?.get_password().map_err(OidcError::from)
    }

    fn delete(&self, item: &str) -> Result<()> {
        entry(item)?.delete_credential().map_err(OidcError::from)
    }

    fn set_tokens(&self, item: &str, tokens: &TokenResultSet) -> Result<()> {
        entry(&format!("{item}.access"))?.set_password(&tokens.access_token).map_err(OidcError::from)?;
        if let Some(id_token) = &tokens.id_token {
            entry(&format!("{item}.identity"))?.set_password(id_token).map_err(OidcError::from)?;
        }
        if let Some(refresh) = &tokens.refresh_token {
            entry(&format!("{item}.refresh"))?.set_password(refresh).map_err(OidcError::from)?;
        }
        entry(&format!("{item}.expiry"))?
            .set_password(&tokens.expires_at.to_string())
            .map_err(OidcError::from)?;
        Ok(())
    }

    fn get_tokens(&self, item: &str) -> Result<TokenResultSet> {
        let access_token = entry(&format!("{item}.access"))?.get_password().map_err(OidcError::from)?;
        let id_token = self.optional_field(item, "identity")?;
        let refresh_token = self.optional_field(item, "refresh")?;
        let expiry_raw = entry(&format!("{item}.expiry"))?.get_password().map_err(OidcError::from)?;
        let expires_at: i64 = expiry_raw
            .parse()
            .map_err(|_| OidcError::Storage(format!("non-numeric expiry for {item}")))?;

        Ok(TokenResultSet {
            access_token,
            id_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: 0,
            expires_at,
        })
    }

    fn delete_tokens(&self, item: &str) -> Result<()> {
        for suffix in ["access", "identity", "refresh", "expiry"] {
            match entry(&format!("{item}.{suffix}"))?.delete_credential() {
                Ok(()) => {},
                Err(ref e) if is_not_found(e) => {},
                Err(e) => return Err(OidcError::from(e)),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyringVariant {
    Blob,
    Split,
}

impl KeyringVariant {
    /// Chosen from an explicit override, falling back to the host OS.
    pub fn resolve(override_str: Option<&str>) -> Self {
        match override_str.unwrap_or(std::env::consts::OS) {
            "windows" => KeyringVariant::Split,
            _ => KeyringVariant::Blob,
        }
    }

    pub fn build(self) -> Box<dyn KeyringService> {
        match self {
            KeyringVariant::Blob => Box::new(BlobKeyring::new()),
            KeyringVariant::Split => Box::new(SplitKeyring::new()),
        }
    }
}
