//! Asynchronous auth API session.

use crate::models::{AuthToken, Credentials};
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use vmmanager_core::ids::UserRef;
use vmmanager_core::{ApiDefinition, ApiSession, AreaSession, Method, RequestOptions, SessionConfig};

const TOKEN_PATH: &str = "/public/token";
const WHOAMI_PATH: &str = "/whoami";

/// Session for the authorization and authentication API (`/auth/v4`).
#[derive(Debug)]
pub struct AuthSession {
    inner: ApiSession,
}

impl AreaSession for AuthSession {
    const DEFINITION: ApiDefinition = ApiDefinition::Auth;

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

impl AuthSession {
    /// Open a session against `config.base_url` at `/auth/v4`.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Self::open(config)
    }

    /// Obtain a session token with an email and password.
    ///
    /// Returns the decoded payload, e.g. `{"token": "..."}`.
    pub async fn get_token(&self, email: &str, password: &str) -> Result<Value> {
        self.get_token_with(email, password, RequestOptions::new())
            .await
    }

    /// [`AuthSession::get_token`] with extra request options.
    pub async fn get_token_with(
        &self,
        email: &str,
        password: &str,
        options: RequestOptions,
    ) -> Result<Value> {
        self.request_token(&Credentials::new(email, password), options)
            .await
    }

    /// Obtain a session token and decode it.
    pub async fn token(&self, credentials: &Credentials) -> Result<AuthToken> {
        self.token_with(credentials, RequestOptions::new()).await
    }

    /// [`AuthSession::token`] with extra request options.
    pub async fn token_with(
        &self,
        credentials: &Credentials,
        options: RequestOptions,
    ) -> Result<AuthToken> {
        self.request_token(credentials, options).await
    }

    /// Fetch the end-to-end authorization key of a user.
    pub async fn get_key(&self, email_or_id: impl Into<UserRef>) -> Result<Value> {
        self.get_key_with(email_or_id, RequestOptions::new()).await
    }

    /// [`AuthSession::get_key`] with extra request options.
    pub async fn get_key_with(
        &self,
        email_or_id: impl Into<UserRef>,
        options: RequestOptions,
    ) -> Result<Value> {
        let user = email_or_id.into();
        debug!(%user, "requesting VMmanager user key");
        let path = format!("/user/{}/key", user.path_segment());
        self.inner.get(&path, options).await
    }

    /// Describe the account the session is authenticated as.
    pub async fn whoami(&self) -> Result<Value> {
        self.whoami_with(RequestOptions::new()).await
    }

    /// [`AuthSession::whoami`] with extra request options, e.g. a per-call
    /// token header.
    pub async fn whoami_with(&self, options: RequestOptions) -> Result<Value> {
        self.inner.get(WHOAMI_PATH, options).await
    }

    async fn request_token<T>(&self, credentials: &Credentials, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!(email = credentials.email(), "requesting VMmanager auth token");
        self.inner
            .request_as(Method::POST, TOKEN_PATH, options.json(credentials.to_body()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vmmanager_core::Error;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_session(server: &MockServer) -> AuthSession {
        AuthSession::new(&SessionConfig::new(server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn get_token_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v4/public/token"))
            .and(body_json(json!({"email": "admin@example.com", "password": "password"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_session(&server);
        let payload = session
            .get_token("admin@example.com", "password")
            .await
            .unwrap();
        assert_eq!(payload, json!({"token": "abc123"}));
    }

    #[tokio::test]
    async fn token_decodes_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v4/public/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "4", "token": "4-abc"})),
            )
            .mount(&server)
            .await;

        let session = test_session(&server);
        let token = session
            .token(&Credentials::new("admin@example.com", "password"))
            .await
            .unwrap();
        assert_eq!(token.token, "4-abc");
    }

    #[tokio::test]
    async fn token_without_token_field_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v4/public/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "4"})))
            .mount(&server)
            .await;

        let session = test_session(&server);
        let err = session
            .token(&Credentials::new("admin@example.com", "password"))
            .await
            .unwrap_err();
        let expected = format!("{}/auth/v4/public/token", server.uri());
        assert!(matches!(err, Error::Decode { ref url, .. } if *url == expected));
    }

    #[tokio::test]
    async fn bad_credentials_surface_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v4/public/token"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"code": 1000, "msg": "Invalid credentials"}})),
            )
            .mount(&server)
            .await;

        let session = test_session(&server);
        let err = session
            .get_token("admin@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.body().unwrap().contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn get_key_by_email_and_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v4/user/admin@example.com/key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "k-email"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v4/user/3/key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "k-id"})))
            .mount(&server)
            .await;

        let session = test_session(&server);
        assert_eq!(
            session.get_key("admin@example.com").await.unwrap(),
            json!({"key": "k-email"})
        );
        assert_eq!(session.get_key(3_u64).await.unwrap(), json!({"key": "k-id"}));
    }

    #[tokio::test]
    async fn get_key_escapes_email_delimiters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v4/user/a%23b@x.com/key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "k-hash"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v4/user/a%3Fb@x.com/key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "k-question"})))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_session(&server);
        assert_eq!(session.get_key("a#b@x.com").await.unwrap()["key"], "k-hash");
        assert_eq!(session.get_key("a?b@x.com").await.unwrap()["key"], "k-question");

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|request| request.url.query().is_none()));
    }

    #[tokio::test]
    async fn convenience_calls_forward_request_options() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v4/whoami"))
            .and(header("x-xsrf-token", "per-call"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v4/public/token"))
            .and(header("x-request-id", "r-1"))
            .and(body_json(json!({"email": "admin@example.com", "password": "password"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_session(&server);
        let me = session
            .whoami_with(RequestOptions::new().header("x-xsrf-token", "per-call"))
            .await
            .unwrap();
        assert_eq!(me["id"], 3);

        let token = session
            .token_with(
                &Credentials::new("admin@example.com", "password"),
                RequestOptions::new().header("x-request-id", "r-1"),
            )
            .await
            .unwrap();
        assert_eq!(token.token, "abc123");
    }

    #[tokio::test]
    async fn whoami_sends_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v4/whoami"))
            .and(header("x-xsrf-token", "abc123"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 3, "email": "admin@example.com"})),
            )
            .mount(&server)
            .await;

        let config = SessionConfig::new(server.uri())
            .unwrap()
            .with_auth_token("abc123");
        let session = AuthSession::new(&config).unwrap();
        let me = session.whoami().await.unwrap();
        assert_eq!(me["email"], "admin@example.com");
    }
}
