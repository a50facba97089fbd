//! Credential store (C7): JSON file of client metadata plus keyring for
//! secrets and tokens.
//!
//! The atomic write (temp file + rename, 0700 directory / 0600 file) is
//! grounded on `phylum-dev-cli`'s `config.rs` `save_config`; the original
//! `pkg/db/db.go` writes in place, which SPEC_FULL.md calls out as an
//! intentional upgrade (see DESIGN.md).

use std::collections::HashMap;
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

use chrono::Utc;

use crate::error::{OidcError, Result};
use crate::keyring_store::KeyringService;
use crate::model::{GrantType, OidcClient, OidcClientWithSecret, TokenResultSet};

pub struct CredentialStore {
    metadata_path: PathBuf,
    keyring: Box<dyn KeyringService>,
}

impl CredentialStore {
    pub fn new(metadata_path: PathBuf, keyring: Box<dyn KeyringService>) -> Self {
        CredentialStore { metadata_path, keyring }
    }

    /// Idempotent: creates the directory (0700) then an empty metadata file
    /// (0600) if either is absent.
    pub fn ensure_exists(&self) -> Result<()> {
        let dir = self
            .metadata_path
            .parent()
            .ok_or_else(|| OidcError::Storage("metadata path has no parent directory".into()))?;

        #[cfg(unix)]
        DirBuilder::new().recursive(true).mode(0o700).create(dir).or_else(|e| {
            if dir.is_dir() {
                Ok(())
            } else {
                Err(e)
            }
        })?;
        #[cfg(not(unix))]
        fs::create_dir_all(dir)?;

        if !self.metadata_path.exists() {
            self.write_all(&HashMap::new())?;
        }
        Ok(())
    }

    /// Returns an empty map if the file does not exist yet.
    pub fn get_clients(&self) -> Result<HashMap<String, OidcClient>> {
        if !self.metadata_path.exists() {
            return Ok(HashMap::new());
        }
        let contents = fs::read_to_string(&self.metadata_path)?;
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }
        let clients: HashMap<String, OidcClient> = serde_json::from_str(&contents)?;
        Ok(clients)
    }

    pub fn exists(&self, alias: &str) -> Result<bool> {
        Ok(self.get_clients()?.contains_key(alias))
    }

    fn require(&self, alias: &str) -> Result<OidcClient> {
        self.get_clients()?.remove(alias).ok_or_else(|| OidcError::NotFound(alias.to_string()))
    }

    pub fn get_without_secret(&self, alias: &str) -> Result<OidcClient> {
        self.require(alias)
    }

    /// For PKCE, the secret is treated as empty and the keyring is not
    /// consulted at all.
    pub fn get_with_secret(&self, alias: &str) -> Result<OidcClientWithSecret> {
        let client = self.require(alias)?;
        let client_secret = if client.grant_type == GrantType::Pkce {
            String::new()
        } else {
            self.keyring.get(alias)?
        };
        Ok(OidcClientWithSecret { client, client_secret })
    }

    fn write_all(&self, clients: &HashMap<String, OidcClient>) -> Result<()> {
        let json = serde_json::to_string_pretty(clients)?;
        let dir = self
            .metadata_path
            .parent()
            .ok_or_else(|| OidcError::Storage("metadata path has no parent directory".into()))?;
        let file_name = self
            .metadata_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| OidcError::Storage("invalid metadata file name".into()))?;
        let tmp_path = dir.join(format!(".{file_name}.new"));

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        drop(file);
        fs::rename(&tmp_path, &self.metadata_path)?;
        Ok(())
    }

    /// Upsert by alias; writes atomically.
    pub fn save_metadata(&self, client: OidcClient) -> Result<()> {
        self.ensure_exists()?;
        let mut clients = self.get_clients()?;
        clients.insert(client.alias.clone(), client);
        self.write_all(&clients)
    }

    /// Saves metadata and, unless the grant type is PKCE, the secret.
    /// Rejects an empty secret outside of PKCE with `NoSecret`.
    pub fn save_with_secret(&self, client: OidcClient, secret: &str) -> Result<()> {
        if client.grant_type != GrantType::Pkce && secret.is_empty() {
            return Err(OidcError::NoSecret);
        }
        let alias = client.alias.clone();
        self.save_metadata(client)?;
        if secret.is_empty() {
            return Ok(());
        }
        self.keyring.set(&alias, secret)
    }

    pub fn set_secret(&self, alias: &str, secret: &str) -> Result<()> {
        self.keyring.set(alias, secret)
    }

    pub fn delete_secret(&self, alias: &str) -> Result<()> {
        self.keyring.delete(alias)
    }

    pub fn save_tokens(&self, alias: &str, tokens: &TokenResultSet) -> Result<()> {
        self.keyring.set_tokens(alias, tokens)
    }

    pub fn get_tokens(&self, alias: &str) -> Result<TokenResultSet> {
        self.keyring.get_tokens(alias)
    }

    pub fn delete_tokens(&self, alias: &str) -> Result<()> {
        self.keyring.delete_tokens(alias)
    }

    /// Cascades: deletes keyring secret, deletes keyring tokens (absence
    /// tolerated with a warning), removes the metadata entry.
    pub fn delete(&self, alias: &str) -> Result<()> {
        if !self.exists(alias)? {
            return Err(OidcError::NotFound(alias.to_string()));
        }

        match self.keyring.delete(alias) {
            Ok(()) | Err(OidcError::NotFound(_)) => {},
            Err(e) => return Err(e),
        }

        match self.keyring.delete_tokens(alias) {
            Ok(()) => {},
            Err(OidcError::NotFound(_)) => {
                log::warn!("no stored tokens for '{alias}' during delete");
            },
            Err(e) => return Err(e),
        }

        let mut clients = self.get_clients()?;
        clients.remove(alias);
        self.write_all(&clients)
    }
}

pub fn default_metadata_path() -> Result<PathBuf> {
    crate::dirs::metadata_path()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    #[cfg(unix)]
    DirBuilder::new().recursive(true).mode(0o700).create(path)?;
    #[cfg(not(unix))]
    fs::create_dir_all(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// In-memory test double standing in for the real OS keyring, grounded
    /// on the teacher's `test::mockito` helper-module pattern.
    #[derive(Default)]
    struct MemoryKeyring {
        secrets: Mutex<HashMap<String, String>>,
    }

    impl KeyringService for MemoryKeyring {
        fn set(&self, item: &str, value: &str) -> Result<()> {
            self.secrets.lock().unwrap().insert(item.to_string(), value.to_string());
            Ok(())
        }

        fn get(&self, item: &str) -> Result<String> {
            self.secrets
                .lock()
                .unwrap()
                .get(item)
                .cloned()
                .ok_or_else(|| OidcError::NotFound(item.to_string()))
        }

        fn delete(&self, item: &str) -> Result<()> {
            self.secrets
                .lock()
                .unwrap()
                .remove(item)
                .map(|_| ())
                .ok_or_else(|| OidcError::NotFound(item.to_string()))
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

    fn sample_client(alias: &str, grant_type: GrantType) -> OidcClient {
        OidcClient {
            alias: alias.to_string(),
            authority: "https://id.example".to_string(),
            grant_type,
            client_id: "abc".to_string(),
            scopes: vec!["openid".to_string()],
            created_date: Utc::now(),
        }
    }

    fn store(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("xoauth.json"), Box::new(MemoryKeyring::default()))
    }

    #[test]
    fn save_with_secret_rejects_empty_secret_outside_pkce() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let err = store
            .save_with_secret(sample_client("acme", GrantType::AuthorizationCode), "")
            .unwrap_err();
        assert!(matches!(err, OidcError::NoSecret));
    }

    #[test]
    fn pkce_client_never_touches_the_keyring_for_its_secret() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save_with_secret(sample_client("pk", GrantType::Pkce), "").unwrap();
        let loaded = store.get_with_secret("pk").unwrap();
        assert_eq!(loaded.client_secret, "");
    }

    #[test]
    fn metadata_file_never_contains_the_secret_string() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store
            .save_with_secret(sample_client("acme", GrantType::AuthorizationCode), "s3cr3t-value")
            .unwrap();
        let contents = fs::read_to_string(dir.path().join("xoauth.json")).unwrap();
        assert!(!contents.contains("s3cr3t-value"));
    }

    #[test]
    fn delete_cascades_metadata_secret_and_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save_with_secret(sample_client("x", GrantType::AuthorizationCode), "s3cr3t").unwrap();
        store
            .save_tokens(
                "x",
                &TokenResultSet {
                    access_token: "A".into(),
                    id_token: Some("J".into()),
                    refresh_token: Some("R".into()),
                    token_type: "Bearer".into(),
                    expires_in: 3600,
                    expires_at: Utc::now().timestamp() + 3540,
                },
            )
            .unwrap();

        store.delete("x").unwrap();

        assert!(!store.exists("x").unwrap());
        assert!(matches!(store.get_with_secret("x"), Err(OidcError::NotFound(_))));
    }

    #[test]
    fn delete_of_missing_tokens_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save_with_secret(sample_client("x", GrantType::ClientCredentials), "s3cr3t").unwrap();
        store.delete("x").unwrap();
        assert!(!store.exists("x").unwrap());
    }

    #[test]
    fn round_trips_tokens_through_set_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let tokens = TokenResultSet {
            access_token: "A".into(),
            id_token: Some("J".into()),
            refresh_token: Some("R".into()),
            token_type: "Bearer".into(),
            expires_in: 3600,
            expires_at: Utc::now().timestamp() + 3540,
        };
        store.save_tokens("acme", &tokens).unwrap();
        let loaded = store.get_tokens("acme").unwrap();
        assert_eq!(loaded.access_token, tokens.access_token);
        assert_eq!(loaded.refresh_token, tokens.refresh_token);
    }
}
