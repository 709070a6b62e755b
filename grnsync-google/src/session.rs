//! Creates a valid Google session (access token) that we can use to call the
//! Calendar API.
//!
//! Tokens are cached under the user's cache directory in a file named after a
//! hash of the OAuth client and scope, so switching client credentials never
//! reuses a stale token.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use google_calendar::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

pub const SCOPE: &str = "https://www.googleapis.com/auth/calendar";

const REDIRECT_PORT: u16 = 8085;

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

pub fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

pub fn redirect_address() -> String {
    format!("127.0.0.1:{}", REDIRECT_PORT)
}

/// The installed-app OAuth client from the config file.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
}

impl OAuthClient {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        OAuthClient {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    /// Stable hash of client id, secret and scope.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.client_id.as_bytes());
        hasher.update(self.client_secret.as_bytes());
        hasher.update(SCOPE.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// OAuth client for the consent flow or, with `tokens`, for refreshing them.
    fn client(&self, tokens: Option<&Tokens>) -> Client {
        let (access_token, refresh_token) = tokens
            .map(|t| (t.access_token.clone(), t.refresh_token.clone()))
            .unwrap_or_default();

        Client::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            redirect_uri(),
            access_token,
            refresh_token,
        )
    }

    /// `<cache_dir>/grnsync/token-<key>.toml`
    pub fn token_cache_path(&self) -> Result<PathBuf> {
        Ok(dirs::cache_dir()
            .context("Could not determine cache directory")?
            .join("grnsync")
            .join(format!("token-{}.toml", &self.cache_key()[..16])))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct Session {
    path: PathBuf,
    tokens: Tokens,
}

impl Session {
    pub fn new(path: PathBuf, tokens: Tokens) -> Self {
        Session { path, tokens }
    }

    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    /// Cached session for `app`, refreshed if expired. Runs the browser flow
    /// when there is no cached token yet.
    pub async fn load_or_authorize(app: &OAuthClient) -> Result<Self> {
        let path = app.token_cache_path()?;

        match Self::load(&path)? {
            Some(mut session) => {
                if session.is_expired() {
                    tracing::info!("Access token expired, refreshing");
                    session.refresh(app).await?;
                }
                Ok(session)
            }
            None => Self::authorize(app, path).await,
        }
    }

    /// Cached session at `path`, or None when nothing is cached.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read Google OAuth session from {}", path.display())
        })?;

        let tokens: Tokens = toml::from_str(&contents).with_context(|| {
            format!("Failed to parse Google OAuth session from {}", path.display())
        })?;

        Ok(Some(Session {
            path: path.to_path_buf(),
            tokens,
        }))
    }

    pub fn save(&self) -> Result<()> {
        let contents =
            toml::to_string_pretty(&self.tokens).context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))?;

        // Set to owner-only (0600) since file contains OAuth tokens:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.tokens.expires_at
    }

    async fn refresh(&mut self, app: &OAuthClient) -> Result<()> {
        if self.tokens.refresh_token.is_empty() {
            bail!("Cached session has no refresh token; run `grnsync auth` again");
        }

        let access_token = app
            .client(Some(&self.tokens))
            .refresh_access_token()
            .await
            .context("Failed to refresh token")?;

        // Google typically doesn't return a new refresh_token on refresh
        let refresh_token = if access_token.refresh_token.is_empty() {
            self.tokens.refresh_token.clone()
        } else {
            access_token.refresh_token
        };

        self.tokens = Tokens {
            access_token: access_token.access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(access_token.expires_in),
        };
        self.save()
    }

    /// Run the browser consent flow and cache the resulting tokens at `path`.
    pub async fn authorize(app: &OAuthClient, path: PathBuf) -> Result<Self> {
        let mut client = app.client(None);
        let (auth_url, state) = consent_url(&client)?;

        eprintln!("\nOpen this URL in your browser to authorize grnsync:\n");
        eprintln!("{}\n", auth_url);

        // Try to open the browser automatically
        if open::that(auth_url.as_str()).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let (code, returned_state) = wait_for_callback().await?;
        if returned_state != state {
            bail!("OAuth state mismatch; refusing the callback");
        }

        eprintln!("\nReceived authorization code, exchanging for tokens...");

        let access_token = client
            .get_access_token(&code, &returned_state)
            .await
            .context("Failed to exchange code for tokens")?;

        let session = Session {
            path,
            tokens: Tokens {
                access_token: access_token.access_token,
                refresh_token: access_token.refresh_token,
                expires_at: Utc::now() + Duration::seconds(access_token.expires_in),
            },
        };
        session.save()?;

        eprintln!("Authorization successful!");

        Ok(session)
    }
}

/// Consent URL for `client` and the `state` value embedded in it.
fn consent_url(client: &Client) -> Result<(Url, String)> {
    let scopes = vec![SCOPE.to_string()];
    let url = Url::parse(&client.user_consent_url(&scopes)).context("Invalid consent URL")?;

    let state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .context("Consent URL carries no state")?;

    Ok((url, state))
}

async fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(redirect_address())
        .await
        .context("Failed to bind OAuth callback listener")?;

    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    let result = parse_callback(&request_line);

    let message = match &result {
        Ok(_) => "<h1>Authorization successful!</h1>\
            <p>You can close this window and return to the terminal.</p>",
        Err(_) => "<h1>Authorization failed</h1>\
            <p>Check the terminal for details.</p>",
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>{}</body></html>",
        message
    );

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    result
}

/// Pull `code` and `state` out of the callback's HTTP request line.
fn parse_callback(request_line: &str) -> Result<(String, String)> {
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow!("Invalid HTTP request"))?;

    let url = Url::parse(&format!("http://localhost{}", url_part))?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        bail!("Authorization was denied: {}", error);
    }

    let code = param("code").ok_or_else(|| anyhow!("No code in callback"))?;
    let state = param("state").ok_or_else(|| anyhow!("No state in callback"))?;

    Ok((code, state))
}
