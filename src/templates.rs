//! The HTML page rendered back to the browser after the loopback callback.
//!
//! Grounded on `pkg/connect/authCodeFlow/templates.go`: a single static page
//! with placeholders for the token values and validated claims, reimplemented
//! with plain `format!` substitution since the teacher repo has no HTML
//! templating dependency to reach for.

use serde_json::Value;

pub const PROBE_PAGE: &str = "<html><body>Already handled.</body></html>";

pub fn render_success_page(
    access_token: &str,
    refresh_token: Option<&str>,
    id_token: Option<&str>,
    claims: Option<&Value>,
    authority: &str,
) -> String {
    let claims_pretty =
        claims.and_then(|c| serde_json::to_string_pretty(c).ok()).unwrap_or_else(|| "{}".to_string());

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>xoauth</title></head>
<body>
<h1>Authenticated against {authority}</h1>
<p>You can close this tab and return to the terminal.</p>
<h2>Access token</h2>
<textarea readonly rows="4" cols="80">{access_token}</textarea>
<h2>Refresh token</h2>
<textarea readonly rows="4" cols="80">{refresh}</textarea>
<h2>ID token</h2>
<textarea readonly rows="4" cols="80">{id_token}</textarea>
<h2>Claims</h2>
<pre>{claims_pretty}</pre>
</body>
</html>"#,
        authority = authority,
        access_token = access_token,
        refresh = refresh_token.unwrap_or_default(),
        id_token = id_token.unwrap_or_default(),
        claims_pretty = claims_pretty,
    )
}

pub fn render_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>xoauth: error</title></head>
<body>
<h1>Authentication failed</h1>
<p>{message}</p>
<p>You can close this tab and return to the terminal.</p>
</body>
</html>"#,
    )
}
