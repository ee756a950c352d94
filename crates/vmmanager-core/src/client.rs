//! The session primitive shared by every API area.
//!
//! An [`ApiSession`] owns one `reqwest` client (one connection pool) for its
//! whole lifetime. Requests compose `base URL + area prefix + path`, forward a
//! [`RequestOptions`] bag to the client, reject statuses of 400 and above and
//! decode the body as JSON. The connection is released exactly once, when the
//! session is closed or dropped.

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::query::QueryParams;
use crate::types::ApiArea;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("vmmanager-rs/", env!("CARGO_PKG_VERSION"));

/// Future returned by the closure passed to [`ApiSession::scoped`].
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

type RequestHook = Box<dyn FnOnce(RequestBuilder) -> RequestBuilder + Send>;

/// Options forwarded to a single request.
///
/// Query parameters are encoded by the session so that filter expressions
/// keep their literal `+`; everything else is handed to `reqwest` as is.
/// [`RequestOptions::with_request`] reaches any builder option not listed here.
#[derive(Default)]
pub struct RequestOptions {
    query: QueryParams,
    json: Option<Value>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    hook: Option<RequestHook>,
}

impl RequestOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.query.push(key, value);
        self
    }

    /// Append every pair of a prepared parameter set.
    #[must_use]
    pub fn query_params(mut self, params: QueryParams) -> Self {
        for (key, value) in params.into_pairs() {
            self.query.push(key, value);
        }
        self
    }

    /// Send a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Serialize any value as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the value cannot be represented as JSON.
    pub fn try_json<B>(self, body: &B) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        let value = serde_json::to_value(body).map_err(|err| Error::Encode(err.to_string()))?;
        Ok(self.json(value))
    }

    /// Add a header to this request only.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Override the session timeout for this request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adjust the underlying request builder directly.
    #[must_use]
    pub fn with_request<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder + Send + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    /// The query parameters collected so far.
    #[must_use]
    pub const fn query_pairs(&self) -> &QueryParams {
        &self.query
    }

    /// The JSON body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    fn apply(self, mut request: RequestBuilder) -> Result<RequestBuilder> {
        for (name, value) in self.headers {
            let (name, value) = parse_header(&name, &value)?;
            request = request.header(name, value);
        }
        if let Some(body) = self.json {
            request = request.json(&body);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(hook) = self.hook {
            request = hook(request);
        }
        Ok(request)
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("query", &self.query)
            .field("json", &self.json)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Compose a request URL from the base URL, the area prefix and a path.
///
/// Empty segments and repeated slashes are dropped so exactly one `/`
/// separates each part. A query embedded in `path` is kept, and `query` is
/// appended after it.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the result does not parse.
pub fn compose_url(base_url: &Url, prefix: &str, path: &str, query: &str) -> Result<Url> {
    let (path, embedded_query) = match path.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path, ""),
    };

    let mut base = base_url.clone();
    base.set_query(None);
    base.set_fragment(None);

    let mut composed = base.as_str().trim_end_matches('/').to_string();
    for segment in prefix.split('/').chain(path.split('/')) {
        if !segment.is_empty() {
            composed.push('/');
            composed.push_str(segment);
        }
    }

    let query = [embedded_query, query]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("&");
    if !query.is_empty() {
        composed.push('?');
        composed.push_str(&query);
    }

    Url::parse(&composed).map_err(|err| Error::InvalidUrl(format!("`{composed}`: {err}")))
}

#[derive(Debug, Default)]
struct ConnectionState {
    closed: AtomicBool,
    releases: AtomicUsize,
}

impl ConnectionState {
    fn release(&self, area: &ApiArea) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.releases.fetch_add(1, Ordering::SeqCst);
            debug!(%area, "released VMmanager session");
        }
    }
}

/// Read-only view of a session's connection lifecycle.
///
/// The handle outlives the session, so callers can confirm the connection
/// was released.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    state: Arc<ConnectionState>,
}

impl ConnectionHandle {
    /// True once the owning session has released its connection.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// How many times the connection has been released (0 or 1).
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }
}

/// A scoped connection to one VMmanager API area.
///
/// `&ApiSession` is `Send + Sync`, so any number of requests may be in flight
/// on the same session; they share the connection pool and complete in no
/// particular order.
pub struct ApiSession {
    http: Client,
    base_url: Url,
    area: ApiArea,
    state: Arc<ConnectionState>,
}

impl ApiSession {
    /// Open a session for `area` using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn open(config: &SessionConfig, area: impl Into<ApiArea>) -> Result<Self> {
        config.check()?;
        let base_url = config.parse_base_url()?;
        let area = area.into();
        let http = build_http_client(config)?;

        debug!(base_url = %base_url, %area, "opened VMmanager session");

        Ok(Self {
            http,
            base_url,
            area,
            state: Arc::new(ConnectionState::default()),
        })
    }

    /// Open a session, run `f` with it and release the connection afterwards,
    /// whether `f` succeeds or fails.
    ///
    /// # Errors
    ///
    /// Returns the error from opening the session or from `f`.
    pub async fn scoped<T, F>(config: &SessionConfig, area: impl Into<ApiArea>, f: F) -> Result<T>
    where
        F: for<'s> FnOnce(&'s Self) -> SessionFuture<'s, T>,
    {
        let session = Self::open(config, area)?;
        let outcome = f(&session).await;
        session.close();
        outcome
    }

    /// Return the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the API area.
    #[must_use]
    pub const fn area(&self) -> &ApiArea {
        &self.area
    }

    /// The fixed path prefix, e.g. `/vm/v3`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.area.prefix()
    }

    /// Observe the connection lifecycle.
    #[must_use]
    pub fn connection(&self) -> ConnectionHandle {
        ConnectionHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Release the connection.
    pub fn close(self) {
        drop(self);
    }

    /// Compose the full URL for `path` under this session's area.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the result does not parse.
    pub fn url_for(&self, path: &str, query: &QueryParams) -> Result<Url> {
        compose_url(&self.base_url, &self.area.prefix(), path, &query.encode())
    }

    /// HTTP GET.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, statuses of 400 and above, and bodies that
    /// are not JSON.
    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.request(Method::GET, path, options).await
    }

    /// HTTP POST.
    ///
    /// # Errors
    ///
    /// See [`ApiSession::get`].
    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.request(Method::POST, path, options).await
    }

    /// HTTP DELETE.
    ///
    /// # Errors
    ///
    /// See [`ApiSession::get`].
    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.request(Method::DELETE, path, options).await
    }

    /// Issue a request and decode the body into `T`.
    ///
    /// # Errors
    ///
    /// See [`ApiSession::get`]; a body that does not match `T` is a
    /// [`Error::Decode`].
    pub async fn request_as<T>(
        &self,
        method: Method,
        path: &str,
        mut options: RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let query = std::mem::take(&mut options.query);
        let url = self.url_for(path, &query)?;

        debug!(%method, %url, "sending VMmanager request");

        let request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json");
        let response = options.apply(request)?.send().await?;

        debug!(status = %response.status(), url = %response.url(), "received VMmanager response");

        let response = error_for_status(response).await?;
        decode_json(response).await
    }

    /// Issue a request with any method.
    ///
    /// # Errors
    ///
    /// See [`ApiSession::get`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value> {
        self.request_as(method, path, options).await
    }
}

impl Drop for ApiSession {
    fn drop(&mut self) {
        self.state.release(&self.area);
    }
}

impl fmt::Debug for ApiSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSession")
            .field("base_url", &self.base_url.as_str())
            .field("area", &self.area)
            .finish_non_exhaustive()
    }
}

fn build_http_client(config: &SessionConfig) -> Result<Client> {
    let user_agent = config.user_agent.as_deref().unwrap_or(USER_AGENT);

    let mut builder = ClientBuilder::new()
        .user_agent(user_agent)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .default_headers(default_headers(config)?);

    if !config.tls_verify {
        warn!(base_url = %config.base_url, "TLS verification disabled for VMmanager session");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ca_cert) = &config.tls_ca_cert {
        debug!("loading VMmanager CA certificate from {}", ca_cert.display());
        let bytes = std::fs::read(ca_cert).map_err(|err| {
            Error::ConfigError(format!(
                "Failed to read CA certificate {}: {err}",
                ca_cert.display()
            ))
        })?;
        let cert = reqwest::Certificate::from_pem(&bytes)
            .map_err(|err| Error::ConfigError(format!("Invalid CA certificate: {err}")))?;
        builder = builder.add_root_certificate(cert);
    }

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|err| Error::ConfigError(format!("Invalid proxy `{proxy}`: {err}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))
}

fn default_headers(config: &SessionConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let (name, value) = parse_header(name, value)?;
        headers.insert(name, value);
    }
    if let Some(token) = &config.auth_token {
        let (name, mut value) = parse_header(config.auth_header(), token.expose_secret())?;
        value.set_sensitive(true);
        headers.insert(name, value);
    }
    Ok(headers)
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| Error::ConfigError(format!("Invalid header name `{name}`: {err}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|err| Error::ConfigError(format!("Invalid value for header `{name}`: {err}")))?;
    Ok((header_name, header_value))
}

async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.as_u16() < 400 {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    debug!(%status, %url, "VMmanager rejected request");

    Err(Error::HttpResponse {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        body,
        url,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let url = response.url().to_string();
    let bytes = response.bytes().await?;

    if bytes.is_empty() {
        return Err(Error::Decode {
            url,
            message: "empty response body".to_string(),
        });
    }

    serde_json::from_slice(&bytes).map_err(|err| Error::Decode {
        url,
        message: err.to_string(),
    })
}
