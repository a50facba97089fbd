//! `delete` -- grounded on `pkg/config/delete.go`'s `ConfirmDelete`.

use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

use crate::error::Result;
use crate::print_user_success;
use crate::store::CredentialStore;

pub fn run(store: &CredentialStore, name: &str, assume_yes: bool) -> Result<()> {
    if !assume_yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Are you sure you want to delete this connection?")
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            println!("exiting without deleting");
            return Ok(());
        }
    }

    store.delete(name)?;
    print_user_success!("connection '{name}' deleted");
    Ok(())
}
