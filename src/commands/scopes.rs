//! `add-scope` and `remove-scope` -- grounded on `pkg/config/scopes.go`.

use crate::error::Result;
use crate::print_user_success;
use crate::store::CredentialStore;

pub fn add_scope(store: &CredentialStore, name: &str, scopes: &[String]) -> Result<()> {
    let mut client = store.get_without_secret(name)?;
    client.add_scopes(scopes);
    store.save_metadata(client.clone())?;
    print_user_success!("scopes for '{name}':\n  • {}", client.scopes.join("\n  • "));
    Ok(())
}

pub fn remove_scope(store: &CredentialStore, name: &str, scopes: &[String]) -> Result<()> {
    let mut client = store.get_without_secret(name)?;
    client.remove_scopes(scopes);
    store.save_metadata(client.clone())?;
    print_user_success!("scopes for '{name}':\n  • {}", client.scopes.join("\n  • "));
    Ok(())
}
