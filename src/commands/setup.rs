//! `setup` -- interactive wizard. Grounded on `pkg/config/setup.go`'s
//! `InteractiveSetup` (survey prompts), reimplemented with `dialoguer` per
//! `phylum-dev-cli`'s `prompt.rs`.

use chrono::Utc;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};

use crate::commands::{validate_authority, validate_name};
use crate::error::Result;
use crate::model::{GrantType, OidcClient};
use crate::print_user_success;
use crate::store::CredentialStore;

const SCOPE_DONE_SENTINEL: &str = "d";

fn default_scopes(grant_type: GrantType) -> Vec<String> {
    match grant_type {
        GrantType::Pkce => vec!["openid".to_string()],
        GrantType::AuthorizationCode => vec!["openid".to_string(), "offline_access".to_string()],
        GrantType::ClientCredentials => vec![],
    }
}

fn prompt_scopes(mut scopes: Vec<String>) -> Vec<String> {
    println!("Enter scopes (type `{SCOPE_DONE_SENTINEL}` to finish)");
    loop {
        println!("Scopes are {scopes:?}");
        let entry: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Add scope (`{SCOPE_DONE_SENTINEL}` when done)"))
            .allow_empty(false)
            .interact_text()
            .unwrap_or_else(|_| SCOPE_DONE_SENTINEL.to_string());

        if entry == SCOPE_DONE_SENTINEL {
            break;
        }
        if !scopes.contains(&entry) {
            scopes.push(entry);
        }
    }
    scopes
}

/// Runs the wizard for `name` (prompted for when absent) and persists the
/// result. Rejects replacing an existing connection without confirmation.
pub fn run(store: &CredentialStore, name: Option<String>, default_port: u16) -> Result<()> {
    let theme = ColorfulTheme::default();

    let alias = match name {
        Some(n) => n,
        None => Input::with_theme(&theme)
            .with_prompt("Enter a name for your client")
            .validate_with(|input: &String| validate_name(input).map_err(|e| e.to_string()))
            .interact_text()
            .map_err(|e| crate::error::OidcError::Config(e.to_string()))?,
    };

    if store.exists(&alias)? {
        let replace = Confirm::with_theme(&theme)
            .with_prompt("Client already exists. Replace it?")
            .default(false)
            .interact()
            .unwrap_or(false);
        if !replace {
            println!("Exiting without saving");
            return Ok(());
        }
    }

    let authority: String = Input::with_theme(&theme)
        .with_prompt("What's the Authority?")
        .default("https://identity.xero.com".to_string())
        .validate_with(|input: &String| validate_authority(input).map_err(|e| e.to_string()))
        .interact_text()
        .map_err(|e| crate::error::OidcError::Config(e.to_string()))?;

    let client_id: String = Input::with_theme(&theme)
        .with_prompt("What's your client_id?")
        .validate_with(|input: &String| validate_name(input).map_err(|e| e.to_string()))
        .interact_text()
        .map_err(|e| crate::error::OidcError::Config(e.to_string()))?;

    let grant_labels = ["AuthorizationCode", "PKCE", "ClientCredentials"];
    let selection = Select::with_theme(&theme)
        .with_prompt("Select Grant Type")
        .items(&grant_labels)
        .default(0)
        .interact()
        .map_err(|e| crate::error::OidcError::Config(e.to_string()))?;
    let grant_type = match selection {
        0 => GrantType::AuthorizationCode,
        1 => GrantType::Pkce,
        _ => GrantType::ClientCredentials,
    };

    let secret_label = if grant_type == GrantType::Pkce {
        "What's your client_secret (optional)?"
    } else {
        "What's your client_secret?"
    };
    let mut secret_prompt = Password::with_theme(&theme).with_prompt(secret_label);
    if grant_type != GrantType::Pkce {
        secret_prompt = secret_prompt.allow_empty_password(false);
    } else {
        secret_prompt = secret_prompt.allow_empty_password(true);
    }
    let client_secret =
        secret_prompt.interact().map_err(|e| crate::error::OidcError::Config(e.to_string()))?;

    let scopes = prompt_scopes(default_scopes(grant_type));

    let client = OidcClient {
        alias: alias.clone(),
        authority: authority.clone(),
        grant_type,
        client_id: client_id.clone(),
        scopes: scopes.clone(),
        created_date: Utc::now(),
    };

    store.save_with_secret(client, &client_secret)?;

    print_user_success!(
        "saved settings for '{alias}'\n  authority: {authority}\n  client_id: {client_id}\n  grant_type: {grant_type:?}\n  scopes: {}",
        scopes.join(", ")
    );

    if matches!(grant_type, GrantType::Pkce | GrantType::AuthorizationCode) {
        println!(
            "\nmake sure you've added http://localhost:{default_port}/callback as a redirect_uri in your identity provider's portal\n"
        );
    }

    Ok(())
}
