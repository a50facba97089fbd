//! The `clap`-derived command surface, one subcommand per row of spec.md
//! section 6. Grounded on `phylum-dev-cli`'s `app.rs` tree shape, narrowed
//! to derive macros (`clap::Parser`) since this crate has only one binary
//! and no need for the builder API the teacher uses for its much larger
//! subcommand set.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use reqwest::Client;

use crate::commands;
use crate::commands::connect::ConnectOptions;
use crate::error::{ExitCode, OidcError, Result};
use crate::store::CredentialStore;

const DEFAULT_PORT: u16 = 8080;
const PORT_ENV_VAR: &str = "XOAUTH_PORT";

#[derive(Parser)]
#[command(name = "xoauth", about = "OIDC client credential manager", version)]
pub struct Cli {
    /// Increase log verbosity (stacks, e.g. -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List connections.
    List {
        #[arg(long)]
        secrets: bool,
    },
    /// Print one connection.
    Info {
        name: String,
        #[arg(long)]
        secrets: bool,
    },
    /// Interactive wizard to register a connection.
    Setup { name: Option<String> },
    /// Union-add scopes to a connection.
    AddScope {
        name: String,
        #[arg(required = true)]
        scopes: Vec<String>,
    },
    /// Set-difference scopes from a connection.
    RemoveScope {
        name: String,
        #[arg(required = true)]
        scopes: Vec<String>,
    },
    /// Write a new client secret to the keyring.
    UpdateSecret { name: String, secret: String },
    /// Delete a connection and cascade its secret and tokens.
    Delete {
        name: String,
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Run the grant-type flow for a connection.
    Connect {
        name: Option<String>,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        audience: Option<String>,
    },
    /// Print (and refresh if needed) a connection's tokens.
    Token {
        name: Option<String>,
        #[arg(long)]
        env: bool,
        #[arg(long)]
        refresh: bool,
    },
    /// Delete only the stored tokens for a connection.
    Clean { name: String },
    /// Verify entropy, config directory, and port bindability. When a
    /// connection name is given, also checks its authorization host's
    /// routability.
    Doctor {
        name: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

fn resolve_port(flag: Option<u16>) -> u16 {
    if let Some(port) = flag {
        return port;
    }
    std::env::var(PORT_ENV_VAR).ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_PORT)
}

/// Resolves an optional connection `name`, prompting the operator to pick
/// one of the stored connections when it is omitted. Grounded on
/// `pkg/config/choose.go`'s `ChooseClient`, called the same way by the
/// original's `connect`/`token` commands when invoked without an argument.
fn choose_client(store: &CredentialStore, name: Option<String>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name);
    }

    let clients = store.get_clients()?;
    if clients.is_empty() {
        return Err(OidcError::Config("no connections yet, run `xoauth setup` first".into()));
    }

    let mut aliases: Vec<String> = clients.into_keys().collect();
    aliases.sort();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Choose a connection")
        .items(&aliases)
        .default(0)
        .interact()
        .map_err(|e| OidcError::Config(format!("selection failed: {e}")))?;

    Ok(aliases[selection].clone())
}

pub async fn dispatch(cli: Cli, store: Arc<CredentialStore>, http: Client) -> ExitCode {
    let result = run(cli, store, http).await;
    match &result {
        Ok(()) => ExitCode::Ok,
        Err(e) => {
            crate::print_user_failure!("{e}");
            ExitCode::from(e)
        },
    }
}

async fn run(cli: Cli, store: Arc<CredentialStore>, http: Client) -> Result<()> {
    store.ensure_exists()?;

    match cli.command {
        Commands::List { secrets } => commands::list::list_all(&store, secrets),
        Commands::Info { name, secrets } => commands::list::info(&store, &name, secrets),
        Commands::Setup { name } => commands::setup::run(&store, name, DEFAULT_PORT),
        Commands::AddScope { name, scopes } => commands::scopes::add_scope(&store, &name, &scopes),
        Commands::RemoveScope { name, scopes } => commands::scopes::remove_scope(&store, &name, &scopes),
        Commands::UpdateSecret { name, secret } => commands::secret::update_secret(&store, &name, &secret),
        Commands::Delete { name, yes } => commands::delete::run(&store, &name, yes),
        Commands::Connect { name, dry_run, port, audience } => {
            let name = choose_client(&store, name)?;
            commands::connect::run(
                &http,
                store,
                &name,
                ConnectOptions { dry_run, port: resolve_port(port), expected_audience: audience },
            )
            .await
        },
        Commands::Token { name, env, refresh } => {
            let name = choose_client(&store, name)?;
            commands::token::run(&http, &store, &name, env, refresh).await
        },
        Commands::Clean { name } => commands::clean::run(&store, &name),
        Commands::Doctor { name, port } => commands::doctor::run(&store, resolve_port(port), name).await,
    }
}
