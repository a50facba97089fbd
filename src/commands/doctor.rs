//! `doctor` -- health check (C11), grounded on `pkg/config/doctor.go`'s
//! `Doctor`: CSPRNG, config directory, and port bindability.

use std::net::ToSocketAddrs;

use url::Url;

use crate::error::{OidcError, Result};
use crate::ip_addr_ext::IpAddrExt;
use crate::oidc::crypto;
use crate::print_user_success;
use crate::server::check_port_bindable;
use crate::store::CredentialStore;

pub async fn run(store: &CredentialStore, port: u16, name: Option<String>) -> Result<()> {
    crypto::assert_prng()?;
    store.ensure_exists()?;
    check_port_bindable(port).await?;

    if let Some(name) = name {
        check_authority_routability(store, &name)?;
    }

    print_user_success!("looking good");
    Ok(())
}

/// Warns when `name`'s authorization host is routable beyond the local
/// network segment and still uses plain `http` -- the same
/// `is_routable && auth_scheme == "http"` gate `auth/server.rs` applies to
/// the authorization URL it is about to send a browser to.
fn check_authority_routability(store: &CredentialStore, name: &str) -> Result<()> {
    let client = store.get_without_secret(name)?;
    let authority = Url::parse(&client.authority)
        .map_err(|e| OidcError::Config(format!("invalid authority: {e}")))?;

    let auth_host = authority
        .host_str()
        .ok_or_else(|| OidcError::Config("authority url must be absolute".into()))?;
    let auth_scheme = authority.scheme();
    let fallback_port: u16 = if auth_scheme == "https" { 443 } else { 80 };
    let auth_port = authority.port().unwrap_or(fallback_port);

    let is_routable = format!("{auth_host}:{auth_port}")
        .to_socket_addrs()
        .map_err(|e| OidcError::Config(format!("could not resolve {auth_host}: {e}")))?
        .map(|addr| addr.ip().is_routable())
        .reduce(|a, b| a || b)
        .unwrap_or(false);

    if is_routable && auth_scheme == "http" {
        log::warn!(
            "authorization host {auth_host} is publicly routable and uses plain http; traffic \
             to it is not protected in transit"
        );
    }

    Ok(())
}
