//! `connect` -- grant-type dispatcher, grounded on `pkg/connect/connect.go`'s
//! `Authorise`.

use std::sync::Arc;

use reqwest::Client;

use crate::error::Result;
use crate::flows::auth_code::{self, AuthCodeFlowOptions};
use crate::flows::client_credentials::{self, ClientCredentialsOptions};
use crate::model::GrantType;
use crate::print_user_success;
use crate::refresh::format_json;
use crate::store::CredentialStore;

pub struct ConnectOptions {
    pub dry_run: bool,
    pub port: u16,
    pub expected_audience: Option<String>,
}

pub async fn run(
    http: &Client,
    store: Arc<CredentialStore>,
    name: &str,
    options: ConnectOptions,
) -> Result<()> {
    let client = store.get_with_secret(name)?;

    match client.client.grant_type {
        GrantType::ClientCredentials => {
            let tokens = client_credentials::run(
                http,
                store,
                client,
                ClientCredentialsOptions { expected_audience: options.expected_audience },
            )
            .await?;
            println!("{}", format_json(&tokens)?);
        },
        GrantType::AuthorizationCode | GrantType::Pkce => {
            let result = auth_code::run(
                http,
                store,
                client,
                AuthCodeFlowOptions {
                    dry_run: options.dry_run,
                    port: options.port,
                    expected_audience: options.expected_audience,
                },
            )
            .await?;
            if let Some(tokens) = result {
                println!("{}", format_json(&tokens)?);
                print_user_success!("connected '{name}'");
            }
        },
    }

    Ok(())
}
