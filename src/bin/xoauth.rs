//! Binary entry point, grounded on `phylum-dev-cli`'s `cli/src/bin/phylum.rs`:
//! initialize logging from verbosity, build the shared collaborators, dispatch
//! the parsed command, and exit with the resulting process code.

use std::sync::Arc;

use clap::Parser;
use env_logger::Env;
use xoauth::cli::{self, Cli};
use xoauth::keyring_store::KeyringVariant;
use xoauth::store::CredentialStore;

fn default_filter_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter_for(cli.verbose)))
        .init();

    let metadata_path = match xoauth::dirs::metadata_path() {
        Ok(path) => path,
        Err(e) => {
            xoauth::print_user_failure!("{e}");
            std::process::exit(xoauth::error::ExitCode::Config as i32);
        },
    };

    let keyring = KeyringVariant::resolve(None).build();
    let store = Arc::new(CredentialStore::new(metadata_path, keyring));

    let http = match reqwest::Client::builder().build() {
        Ok(client) => client,
        Err(e) => {
            xoauth::print_user_failure!("{e}");
            std::process::exit(xoauth::error::ExitCode::Transport as i32);
        },
    };

    let code = cli::dispatch(cli, store, http).await;
    std::process::exit(code as i32);
}
