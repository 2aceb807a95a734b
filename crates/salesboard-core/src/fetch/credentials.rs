use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{body_text, FetchError};

pub const SHEETS_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/drive.metadata.readonly",
];

pub const ACCESS_TOKEN_VAR: &str = "SALESBOARD_ACCESS_TOKEN";
pub const SERVICE_ACCOUNT_VAR: &str = "SALESBOARD_SERVICE_ACCOUNT";
pub const SERVICE_ACCOUNT_FILE_VAR: &str = "SALESBOARD_SERVICE_ACCOUNT_FILE";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Tokens are renewed this long before Google says they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The fields of a Google service-account key file this client needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_json(text: &str) -> Result<Self, FetchError> {
        serde_json::from_str(text)
            .map_err(|err| FetchError::Credentials(format!("invalid service account JSON: {err}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, FetchError> {
        let text = std::fs::read_to_string(path).map_err(|source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Service-account flow: a signed RS256 assertion exchanged at `token_uri`.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            key,
            http,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, FetchError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPES.join(" "),
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &signing_key)?)
    }

    async fn access_token(&self) -> Result<String, FetchError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at > now {
                return Ok(token.token.clone());
            }
        }

        let assertion = self.signed_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = body_text(response.text().await);
            return Err(FetchError::Credentials(format!(
                "token exchange failed ({status}): {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = (token.expires_in - EXPIRY_MARGIN_SECS).max(0);
        debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Exchanged service account assertion for access token"
        );
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: now + chrono::Duration::seconds(lifetime),
        });
        Ok(token.access_token)
    }
}

pub enum TokenProvider {
    /// A pre-issued bearer token, used as is.
    Static(String),
    ServiceAccount(Box<ServiceAccountAuth>),
}

impl TokenProvider {
    pub fn service_account(key: ServiceAccountKey, timeout: Duration) -> Result<Self, FetchError> {
        Ok(TokenProvider::ServiceAccount(Box::new(ServiceAccountAuth::new(
            key, timeout,
        )?)))
    }

    pub fn from_env(timeout: Duration) -> Result<Self, FetchError> {
        Self::from_lookup(|name| std::env::var(name).ok(), timeout)
    }

    /// Resolves credentials from variables, first match wins: a bearer token,
    /// then an inline key, then a key file.
    pub fn from_lookup<F>(lookup: F, timeout: Duration) -> Result<Self, FetchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(token) = present(ACCESS_TOKEN_VAR) {
            return Ok(TokenProvider::Static(token.trim().to_string()));
        }
        if let Some(json) = present(SERVICE_ACCOUNT_VAR) {
            return Self::service_account(ServiceAccountKey::from_json(&json)?, timeout);
        }
        if let Some(path) = present(SERVICE_ACCOUNT_FILE_VAR) {
            return Self::service_account(ServiceAccountKey::from_file(Path::new(&path))?, timeout);
        }

        Err(FetchError::Credentials(format!(
            "set {ACCESS_TOKEN_VAR}, {SERVICE_ACCOUNT_VAR} or {SERVICE_ACCOUNT_FILE_VAR}"
        )))
    }

    pub async fn access_token(&self) -> Result<String, FetchError> {
        match self {
            TokenProvider::Static(token) => Ok(token.clone()),
            TokenProvider::ServiceAccount(auth) => auth.access_token().await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TokenProvider::Static(_) => "static bearer token".to_string(),
            TokenProvider::ServiceAccount(auth) => {
                format!("service account {}", auth.client_email())
            }
        }
    }
}
