//! DNS proxy API session for VMmanager 6.

#![deny(missing_docs)]

pub use vmmanager_core::AreaSession;
use vmmanager_core::{ApiDefinition, ApiSession, SessionConfig};

/// Convenient result alias that reuses the shared VMmanager error type.
pub type Result<T> = vmmanager_core::Result<T>;

/// Session for the DNS proxy service API (`/dnsproxy/v3`).
#[derive(Debug)]
pub struct DnsProxySession {
    inner: ApiSession,
}

impl DnsProxySession {
    /// Open a session against `config.base_url` at `/dnsproxy/v3`.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Self::open(config)
    }
}

impl AreaSession for DnsProxySession {
    const DEFINITION: ApiDefinition = ApiDefinition::DnsProxy;

    fn from_session(session: ApiSession) -> Self {
        Self { inner: session }
    }

    fn session(&self) -> &ApiSession {
        &self.inner
    }

    fn into_session(self) -> ApiSession {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vmmanager_core::RequestOptions;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn post_under_dnsproxy_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dnsproxy/v3/domain"))
            .and(body_json(json!({"name": "example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 8})))
            .mount(&server)
            .await;

        let config = SessionConfig::new(server.uri()).unwrap();
        let session = DnsProxySession::new(&config).unwrap();
        let handle = session.connection();
        let body = session
            .post(
                "/domain",
                RequestOptions::new().json(json!({"name": "example.com"})),
            )
            .await
            .unwrap();
        assert_eq!(body["id"], 8);

        session.close();
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dnsproxy/v3/domain"))
            .respond_with(ResponseTemplate::new(503).set_body_string("suspended"))
            .mount(&server)
            .await;

        let config = SessionConfig::new(server.uri()).unwrap();
        let session = DnsProxySession::new(&config).unwrap();
        let err = session.get("/domain", RequestOptions::new()).await.unwrap_err();
        assert!(err.is_server_error());
        assert_eq!(err.body(), Some("suspended"));
    }
}
