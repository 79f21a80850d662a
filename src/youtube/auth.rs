//! OAuth for installed apps: a cached token, refresh, and the loopback browser flow.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::settings::YoutubeSettings;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";
/// Tokens this close to expiry are treated as expired.
const EXPIRY_SLACK_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SLACK_SECS) > now,
            None => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    /// Google omits the refresh token on refresh responses, so the previous one is kept.
    fn into_stored(self, previous_refresh: Option<String>, now: DateTime<Utc>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }
}

/// A usable access token, from cache, refresh, or a fresh browser sign-in.
pub(super) fn access_token(
    http: &reqwest::blocking::Client,
    settings: &YoutubeSettings,
    credentials_file: &Path,
) -> Result<String> {
    if settings.client_id.trim().is_empty() || settings.client_secret.trim().is_empty() {
        bail!(
            "youtube.client_id and youtube.client_secret must be set in settings.toml to fetch subscriptions"
        );
    }
    info!(path = %credentials_file.display(), "youtube token cache file");

    let now = Utc::now();
    let token = match load_token(credentials_file) {
        Some(token) if token.is_fresh(now) => return Ok(token.access_token),
        Some(StoredToken {
            refresh_token: Some(refresh),
            ..
        }) => match refresh_token(http, settings, &refresh) {
            Ok(token) => token,
            Err(err) => {
                warn!("token refresh failed, signing in again: {err:#}");
                println!("Cached authentication credential file seems invalid. Re-authing.");
                authorize_in_browser(http, settings)?
            }
        },
        _ => authorize_in_browser(http, settings)?,
    };

    save_token(credentials_file, &token)?;
    Ok(token.access_token)
}

fn load_token(path: &Path) -> Option<StoredToken> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(token) => Some(token),
        Err(err) => {
            warn!(
                "ignoring unreadable credential file '{}': {}",
                path.display(),
                err
            );
            None
        }
    }
}

fn save_token(path: &Path, token: &StoredToken) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create credentials directory '{}'", parent.display())
        })?;
    }
    println!("Saving credential file to: {}", path.display());
    let contents = serde_json::to_string(token).context("failed to serialize oauth token")?;
    fs::write(path, contents).context("unable to cache oauth token")?;
    restrict_permissions(path)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict permissions on '{}'", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn post_token_form(
    http: &reqwest::blocking::Client,
    pairs: &[(&str, &str)],
    label: &str,
) -> Result<TokenResponse> {
    let resp = http
        .post(TOKEN_URL)
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(form_body(pairs))
        .send()
        .with_context(|| label.to_string())?;
    let token: TokenResponse = resp
        .error_for_status()
        .with_context(|| format!("{label} status"))?
        .json()
        .with_context(|| format!("parse {label} response"))?;
    Ok(token)
}

fn refresh_token(
    http: &reqwest::blocking::Client,
    settings: &YoutubeSettings,
    refresh: &str,
) -> Result<StoredToken> {
    let response = post_token_form(
        http,
        &[
            ("client_id", settings.client_id.as_str()),
            ("client_secret", settings.client_secret.as_str()),
            ("refresh_token", refresh),
            ("grant_type", "refresh_token"),
        ],
        "refresh oauth token",
    )?;
    info!("refreshed youtube access token");
    Ok(response.into_stored(Some(refresh.to_string()), Utc::now()))
}

fn auth_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "{AUTH_URL}?{}",
        form_body(&[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", SCOPE),
            ("state", state),
            ("access_type", "offline"),
        ])
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Callback {
    Code(String),
    Ignored,
    Rejected(&'static str),
}

/// Interprets the request line the browser sends to the loopback listener.
fn parse_callback(request_line: &str, expected_state: &str) -> Callback {
    let target = request_line.split_whitespace().nth(1).unwrap_or_default();
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path == "/favicon.ico" {
        return Callback::Ignored;
    }

    let mut state = None;
    let mut code = None;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_default();
        match key {
            "state" => state = Some(value),
            "code" => code = Some(value),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Callback::Rejected("state mismatch");
    }
    match code {
        Some(code) if !code.is_empty() => Callback::Code(code),
        _ => Callback::Rejected("no code"),
    }
}

fn authorize_in_browser(
    http: &reqwest::blocking::Client,
    settings: &YoutubeSettings,
) -> Result<StoredToken> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind oauth callback listener")?;
    let port = listener
        .local_addr()
        .context("read oauth callback address")?
        .port();
    let redirect_uri = format!("http://127.0.0.1:{port}");
    let state = Uuid::new_v4().simple().to_string();
    let url = auth_url(&settings.client_id, &redirect_uri, &state);

    println!(
        "Check your browser. It should have opened the following page (use this link if it hasn't): {url}"
    );
    if let Err(err) = open::that(&url) {
        warn!("error opening url in browser: {err}");
    }

    let code = loop {
        let (mut stream, _) = listener.accept().context("accept oauth callback")?;
        let mut request_line = String::new();
        BufReader::new(&stream)
            .read_line(&mut request_line)
            .context("read oauth callback")?;

        match parse_callback(&request_line, &state) {
            Callback::Code(code) => {
                let _ = stream.write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
                      <h1>Success</h1>Authorized. You may now close this window.",
                );
                break code;
            }
            Callback::Ignored => {
                let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nConnection: close\r\n\r\n");
            }
            Callback::Rejected(reason) => {
                warn!("rejected oauth callback: {reason}");
                let _ = stream
                    .write_all(b"HTTP/1.1 500 Internal Server Error\r\nConnection: close\r\n\r\n");
            }
        }
    };

    let response = post_token_form(
        http,
        &[
            ("code", code.as_str()),
            ("client_id", settings.client_id.as_str()),
            ("client_secret", settings.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ],
        "token exchange",
    )?;
    info!("obtained youtube access token");
    Ok(response.into_stored(None, Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn callback_requires_matching_state() {
        assert_eq!(
            parse_callback("GET /?state=abc&code=4%2F0Ab HTTP/1.1\r\n", "abc"),
            Callback::Code("4/0Ab".to_string())
        );
        assert_eq!(
            parse_callback("GET /?state=zzz&code=1 HTTP/1.1", "abc"),
            Callback::Rejected("state mismatch")
        );
        assert_eq!(
            parse_callback("GET /?state=abc HTTP/1.1", "abc"),
            Callback::Rejected("no code")
        );
        assert_eq!(
            parse_callback("GET /favicon.ico HTTP/1.1", "abc"),
            Callback::Ignored
        );
    }

    #[test]
    fn auth_url_encodes_parameters() {
        let url = auth_url("id", "http://127.0.0.1:9999", "st");
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A9999"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fyoutube.readonly"));
        assert!(url.contains("state=st"));
    }

    #[test]
    fn refresh_response_keeps_previous_refresh_token() {
        let now = Utc::now();
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "new", "expires_in": 3600}"#)
                .expect("valid token response");
        let token = response.into_stored(Some("keep".to_string()), now);
        assert_eq!(token.refresh_token.as_deref(), Some("keep"));
        assert_eq!(token.token_type, "Bearer");
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(3600)));
    }

    #[test]
    fn token_cache_roundtrip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("credentials").join("ysm-youtube-creds.json");
        let token = StoredToken {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            token_type: "Bearer".to_string(),
            expiry: None,
        };
        save_token(&path, &token)?;
        assert_eq!(load_token(&path), Some(token));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path)?.permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        Ok(())
    }

    #[test]
    fn unreadable_cache_is_ignored() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("creds.json");
        fs::write(&path, "not json")?;
        assert_eq!(load_token(&path), None);
        Ok(())
    }

    #[test]
    fn missing_client_credentials_fail_early() {
        let http = reqwest::blocking::Client::new();
        let err = access_token(&http, &YoutubeSettings::default(), Path::new("/nonexistent"))
            .expect_err("credentials are required");
        assert!(err.to_string().contains("client_id"));
    }
}
