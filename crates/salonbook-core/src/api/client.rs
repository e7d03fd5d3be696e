//! Session-scoped HTTP client for the salonbook backend.
//!
//! A `SessionClient` is built for one session epoch (anonymous or
//! authenticated) by `SessionClient::initialize` and never mutated
//! afterwards; a login or logout builds a fresh one. Every request goes
//! through the same pipeline:
//!
//! 1. the mobile-origin query flag is appended
//! 2. for requests to the backend's own origin, the token currently in the
//!    `CredentialStore` overwrites any `Authorization` header. Storage read
//!    at request time is the source of truth; the token given at
//!    construction is only a fallback when storage is empty. Requests to
//!    any other origin never get a session token.
//! 3. a 401 answer clears the stored token and the response cache,
//!    optionally logs the auth state out, and is returned to the caller
//!    unchanged. Nothing is retried.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::auth::{AuthStore, CredentialStore};
use crate::cache::{LruCache, DEFAULT_CAPACITY};
use crate::config::UnauthorizedPolicy;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in milliseconds
pub const REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Query parameter added to every request so the backend knows the caller is the mobile app
pub const MOBILE_FLAG: (&str, &str) = ("is_mobile", "true");

const REGISTER_PATH: &str = "/api/auth/register";
const LOGIN_PATH: &str = "/api/auth/login";

/// Settings shared by every client built for this app
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub on_unauthorized: UnauthorizedPolicy,
    pub cache_capacity: usize,
    pub cache_ttl: Option<chrono::Duration>,
}

impl SessionConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            on_unauthorized: UnauthorizedPolicy::default(),
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl: None,
        }
    }

    pub fn with_policy(mut self, policy: UnauthorizedPolicy) -> Self {
        self.on_unauthorized = policy;
        self
    }
}

/// Which kind of session a client is being built for
#[derive(Debug, Clone, Default)]
pub struct InitParams {
    pub authenticated: bool,
    pub token: Option<String>,
}

impl InitParams {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            token: Some(token.into()),
        }
    }
}

/// HTTP client bound to one session epoch.
/// Clone is cheap - clones share the connection pool and the response cache.
#[derive(Clone)]
pub struct SessionClient {
    client: Client,
    config: SessionConfig,
    store: CredentialStore,
    auth: AuthStore,
    cache: Arc<Mutex<LruCache<String>>>,
    /// Bearer value from construction, sent when storage holds nothing
    default_auth: Option<HeaderValue>,
    authenticated: bool,
}

impl SessionClient {
    /// Build a client for a new session epoch.
    ///
    /// Authenticated with a token: the token is persisted and kept as the
    /// fallback `Authorization` value. Anonymous: the persisted token is
    /// cleared. Authenticated without a token leaves storage untouched.
    pub fn initialize(
        config: &SessionConfig,
        store: CredentialStore,
        auth: AuthStore,
        params: InitParams,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let default_auth = match (params.authenticated, params.token.as_deref()) {
            (true, Some(token)) => {
                let value = bearer(token)?;
                store.save(token)?;
                Some(value)
            }
            (true, None) => {
                warn!("Authenticated session requested without a token");
                None
            }
            (false, _) => {
                store.clear()?;
                None
            }
        };
        let authenticated = default_auth.is_some();

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        debug!(
            base_url = %config.base_url,
            authenticated,
            "Session client initialized"
        );

        Ok(Self {
            client,
            config: config.clone(),
            store,
            auth,
            cache: Arc::new(Mutex::new(LruCache::with_ttl(
                config.cache_capacity,
                config.cache_ttl,
            ))),
            default_auth,
            authenticated,
        })
    }

    /// Whether this client was built with a token
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolve a request path against the base URL.
    /// Absolute URLs pass through untouched; if they point at another origin
    /// they are sent without the session token.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)));
        }
        let base = self.config.base_url.as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    /// Start a request with the session's base URL and mobile flag applied
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        Ok(self.client.request(method, url).query(&[MOBILE_FLAG]))
    }

    /// Run a prepared request through the session pipeline
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let mut request = builder.build()?;
        self.attach_token(&mut request)?;
        debug!(method = %request.method(), url = %request.url().path(), "Sending request");

        let response = self.client.execute(request).await?;
        self.check_response(response).await
    }

    /// Overwrite `Authorization` with whatever token storage holds right now.
    /// With storage empty, the construction token fills in only if the
    /// request has no `Authorization` of its own.
    fn attach_token(&self, request: &mut Request) -> Result<(), ApiError> {
        if request.url().origin() != self.config.base_url.origin() {
            debug!(host = ?request.url().host_str(), "Foreign origin, not attaching token");
            return Ok(());
        }
        match self.store.read()? {
            Some(token) => {
                request.headers_mut().insert(header::AUTHORIZATION, bearer(&token)?);
            }
            None => {
                if let Some(value) = &self.default_auth {
                    request
                        .headers_mut()
                        .entry(header::AUTHORIZATION)
                        .or_insert_with(|| value.clone());
                }
            }
        }
        Ok(())
    }

    /// Check if response is successful, returning an error with body if not
    async fn check_response(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized();
        } else {
            debug!(status = %status, "Request failed");
        }
        Err(ApiError::from_status(status, &body))
    }

    fn on_unauthorized(&self) {
        warn!("Unauthorized request, clearing stored token");
        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear token after 401");
        }
        // Cached bodies were fetched with the rejected token
        self.clear_cache();
        if self.config.on_unauthorized == UnauthorizedPolicy::AutoLogout {
            self.auth.logout();
        }
    }

    fn cache(&self) -> MutexGuard<'_, LruCache<String>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// GET a JSON resource, answering repeated identical calls from the cache
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path)?;
        let key = cache_key(&builder)?;

        let cached = self.cache().get(&key);
        if let Some(body) = cached {
            debug!(key = %key, "Cache hit");
            return parse_json(&body, path);
        }

        let body = self.send(builder).await?.text().await?;
        let parsed = parse_json(&body, path)?;
        self.cache().insert(key, body);
        Ok(parsed)
    }

    /// GET a JSON resource, always going to the network
    pub async fn get_json_fresh<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path)?;
        let body = self.send(builder).await?.text().await?;
        parse_json(&body, path)
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path)?.json(body);
        let text = self.send(builder).await?.text().await?;
        parse_json(&text, path)
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cached_responses(&self) -> usize {
        self.cache().len()
    }

    // ===== Auth endpoints =====

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.post_json(REGISTER_PATH, request).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post_json(LOGIN_PATH, request).await
    }
}

fn bearer(token: &str) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ApiError::InvalidToken("token contains characters not allowed in a header".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Cache key from the fully built request URL, query included
fn cache_key(builder: &RequestBuilder) -> Result<String, ApiError> {
    let request = builder
        .try_clone()
        .ok_or_else(|| ApiError::InvalidResponse("request body cannot be cloned".to_string()))?
        .build()?;
    Ok(format!("{} {}", request.method(), request.url()))
}

fn parse_json<T: DeserializeOwned>(body: &str, path: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
    })
}
