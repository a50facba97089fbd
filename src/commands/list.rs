//! `list` and `info` -- grounded on `pkg/config/list.go`'s `ListAll`/`Info`.

use crate::error::{OidcError, Result};
use crate::model::OidcClient;
use crate::store::CredentialStore;

fn masked(secret_len_hint: usize) -> String {
    "•".repeat(secret_len_hint.max(1))
}

fn print_client(store: &CredentialStore, client: &OidcClient, show_secrets: bool) -> Result<()> {
    let secret_display = if show_secrets {
        match store.get_with_secret(&client.alias) {
            Ok(loaded) if !loaded.client_secret.is_empty() => loaded.client_secret,
            _ => String::new(),
        }
    } else {
        masked("shhhhh! it's a secret!".len())
    };

    eprintln!(
        "name: {}\nclient_id: {}\ngrant_type: {:?}\nclient_secret: {}\nauthority: {}\nscopes:\n  • {}\n",
        client.alias,
        client.client_id,
        client.grant_type,
        secret_display,
        client.authority,
        client.scopes.join("\n  • "),
    );
    Ok(())
}

pub fn list_all(store: &CredentialStore, show_secrets: bool) -> Result<()> {
    let clients = store.get_clients()?;
    let mut aliases: Vec<_> = clients.keys().cloned().collect();
    aliases.sort();
    for alias in aliases {
        print_client(store, &clients[&alias], show_secrets)?;
    }
    Ok(())
}

pub fn info(store: &CredentialStore, name: &str, show_secrets: bool) -> Result<()> {
    let clients = store.get_clients()?;
    let client = clients.get(name).ok_or_else(|| OidcError::NotFound(name.to_string()))?;
    print_client(store, client, show_secrets)
}
