//! `clean` -- deletes only the stored token set for a connection, leaving
//! its metadata and secret untouched.

use crate::error::{OidcError, Result};
use crate::print_user_success;
use crate::store::CredentialStore;

pub fn run(store: &CredentialStore, name: &str) -> Result<()> {
    if !store.exists(name)? {
        return Err(OidcError::NotFound(name.to_string()));
    }
    store.delete_tokens(name)?;
    print_user_success!("cleared stored tokens for '{name}'");
    Ok(())
}
