//! Filesystem locations for the credential store.
//!
//! Grounded on `phylum-dev-cli`'s `dirs.rs` (`home::home_dir()` plus an
//! environment-variable override usable by tests), narrowed to the single
//! `$HOME/.xoauth/` directory the spec requires rather than the teacher's
//! XDG data/config/bin split.

use std::path::PathBuf;

use crate::error::{OidcError, Result};

const CONFIG_DIR_OVERRIDE_VAR: &str = "XOAUTH_CONFIG_DIR";
const METADATA_FILE_NAME: &str = "xoauth.json";

/// `$HOME/.xoauth`, or the path named by `XOAUTH_CONFIG_DIR` when set --
/// the override exists purely so tests don't touch the real home directory.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_DIR_OVERRIDE_VAR) {
        return Ok(PathBuf::from(path));
    }
    let home =
        home::home_dir().ok_or_else(|| OidcError::Config("could not resolve home directory".into()))?;
    Ok(home.join(".xoauth"))
}

pub fn metadata_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(METADATA_FILE_NAME))
}
