//! Browser launcher (C10).
//!
//! Grounded on `phylum-dev-cli`'s use of the `open` crate in
//! `auth/server.rs` (`open::that(...)`), generalized to the explicit
//! per-OS command dispatch in `pkg/interop/interop.go` so the `&`-escaping
//! behavior on Windows is preserved exactly.

use std::process::Command;

use crate::error::{OidcError, Result};

pub fn open_browser(url: &str) -> Result<()> {
    let result = if cfg!(target_os = "windows") {
        let escaped = url.replace('&', "^&");
        Command::new("cmd").args(["/c", "start", &escaped]).spawn()
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    result.map(|_| ()).map_err(|e| OidcError::Transport(format!("failed to open browser: {e}")))
}
