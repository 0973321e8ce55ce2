//! Service account authorization for Google APIs.
//!
//! A service account signs a JWT with its private key and exchanges it at
//! the token endpoint for a short lived access token.

use std::sync::Arc;

use camino::Utf8Path;
use chrono::{DateTime, Duration, Utc};
use colabme::error;
use futures::Future;
pub use oauth2::{AccessToken, Scope};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub trait GetToken: Send + Sync + 'static {
    fn get_token(
        &self,
        scopes: Vec<Scope>,
    ) -> impl Future<Output = colabme::Result<AccessToken>> + Send;
}

/// Content of the JSON key file of a Google service account
#[derive(Clone, Deserialize, Serialize)]
pub struct AccountKey {
    #[serde(rename = "type")]
    pub typ: String,
    pub project_id: Option<String>,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: Option<String>,
    pub token_uri: String,
}

impl std::fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountKey")
            .field("typ", &self.typ)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl AccountKey {
    pub async fn load_from_file(path: &Utf8Path) -> colabme::Result<Self> {
        let json = tokio::fs::read(path).await?;
        let key: AccountKey = serde_json::from_slice(&json)
            .map_err(|err| colabme::Error::Config(format!("Invalid service account file {path}: {err}")))?;
        if key.typ != "service_account" {
            colabme::config_bail!(
                "{path} is not a service account key (type is \"{}\")",
                key.typ
            );
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResp {
    access_token: String,
    expires_in: i64,
    #[allow(dead_code)]
    token_type: String,
}

#[derive(Debug, Clone)]
struct TokenEntry {
    scopes: Vec<Scope>,
    access_token: AccessToken,
    expiration: DateTime<Utc>,
}

/// Margin before expiration at which a cached token is renewed
const EXPIRATION_MARGIN: i64 = 60;

/// Assertion lifetime, at most one hour per Google's documentation
const ASSERTION_LIFETIME: u64 = 1800;

#[derive(Debug)]
struct Inner {
    key: AccountKey,
    http: reqwest::Client,
    cache: RwLock<Vec<TokenEntry>>,
}

#[derive(Clone, Debug)]
pub struct ServiceAccount {
    inner: Arc<Inner>,
}

impl ServiceAccount {
    pub fn new(key: AccountKey, http: Option<reqwest::Client>) -> Self {
        let http = http.unwrap_or_default();
        log::info!("Authorizing as service account {}", key.client_email);
        Self {
            inner: Arc::new(Inner {
                key,
                http,
                cache: RwLock::new(Vec::new()),
            }),
        }
    }

    async fn cached(&self, scopes: &[Scope]) -> Option<AccessToken> {
        let cache = self.inner.cache.read().await;
        let now = Utc::now() + Duration::seconds(EXPIRATION_MARGIN);
        cache
            .iter()
            .find(|ent| scopes.iter().all(|s| ent.scopes.contains(s)) && ent.expiration > now)
            .map(|ent| ent.access_token.clone())
    }

    async fn fetch_token(&self, scopes: &[Scope]) -> colabme::Result<TokenEntry> {
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

        let key = &self.inner.key;

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = Some(key.private_key_id.clone());

        let iat = jsonwebtoken::get_current_timestamp();
        let claims = JwtClaims {
            iss: &key.client_email,
            scope: scopes
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            aud: &key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME,
        };

        let encoding_key =
            EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(error::auth)?;
        let jwt = encode(&header, &claims, &encoding_key).map_err(error::auth)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", jwt.as_str()),
        ];

        log::trace!("requesting access token at {}", key.token_uri);
        let resp = self
            .inner
            .http
            .post(key.token_uri.as_str())
            .form(&params)
            .send()
            .await
            .map_err(error::auth)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            colabme::auth_bail!("token request returned {status}\n{body}");
        }
        let resp: TokenResp = resp.json().await.map_err(error::auth)?;

        Ok(TokenEntry {
            scopes: scopes.to_vec(),
            access_token: AccessToken::new(resp.access_token),
            expiration: Utc::now() + Duration::seconds(resp.expires_in),
        })
    }
}

impl GetToken for ServiceAccount {
    async fn get_token(&self, scopes: Vec<Scope>) -> colabme::Result<AccessToken> {
        if let Some(token) = self.cached(&scopes).await {
            return Ok(token);
        }
        let entry = self.fetch_token(&scopes).await?;
        let token = entry.access_token.clone();

        let mut cache = self.inner.cache.write().await;
        cache.retain(|ent| ent.scopes != entry.scopes);
        cache.push(entry);

        Ok(token)
    }
}
