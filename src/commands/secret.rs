//! `update-secret` -- grounded on `pkg/config/secret.go`'s `UpdateSecret`.

use crate::error::Result;
use crate::print_user_success;
use crate::store::CredentialStore;

pub fn update_secret(store: &CredentialStore, name: &str, secret: &str) -> Result<()> {
    let client = store.get_without_secret(name)?;
    store.set_secret(&client.alias, secret)?;
    print_user_success!("updated client secret for '{name}'");
    Ok(())
}
