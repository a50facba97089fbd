//! `token` -- grounded on `pkg/tokens/tokens.go`'s `ShowTokens`.

use reqwest::Client;

use crate::error::Result;
use crate::refresh::{format_env_exports, format_json, show_tokens};
use crate::store::CredentialStore;

pub async fn run(
    http: &Client,
    store: &CredentialStore,
    name: &str,
    export_env: bool,
    force_refresh: bool,
) -> Result<()> {
    let tokens = show_tokens(http, store, name, force_refresh).await?;
    if export_env {
        println!("{}", format_env_exports(name, &tokens));
    } else {
        println!("{}", format_json(&tokens)?);
    }
    Ok(())
}
