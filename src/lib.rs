pub mod browser;
pub mod cli;
pub mod commands;
pub mod dirs;
pub mod error;
pub mod flows;
pub mod ip_addr_ext;
pub mod keyring_store;
pub mod model;
pub mod oidc;
pub mod print;
pub mod refresh;
pub mod server;
pub mod store;
pub mod templates;


#[cfg(test)]
#[allow(unused_imports)]
use test::logging;
