use crate::api::admin::grants::{AdminGrant, GrantStore};
use crate::config::GateConfig;
use crate::create_app;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::store::Store;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

/// Test fixture wiring the full application over an in-memory store and a
/// wiremock stand-in for the Roblox OAuth endpoints.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///
///     Mock::given(matchers::method("POST"))
///         .and(matchers::path("/oauth/v1/token"))
///         .respond_with(ResponseTemplate::new(200)
///             .set_body_json(json!({"access_token": "tok"})))
///         .mount(&fixture.provider_mock)
///         .await;
///
///     let response = fixture.get("/auth/roblox/callback?code=c&state=s").await;
///     response.assert_status(StatusCode::BAD_REQUEST);
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration the app was built with
    pub config: GateConfig,
    /// Application state, for seeding and inspecting the store directly
    pub state: AppState,
    /// Mock server standing in for the identity provider
    pub provider_mock: MockServer,
}

impl TestFixture {
    /// Creates a new test fixture with a mocked identity provider
    pub async fn new() -> Self {
        Self::build(|_| {}).await
    }

    /// Fixture variant with a configured front-end redirect target
    pub async fn with_frontend(frontend_url: &str) -> Self {
        let frontend_url = frontend_url.to_string();
        Self::build(move |config| config.frontend_url = Some(frontend_url.clone())).await
    }

    async fn build(customize: impl FnOnce(&mut GateConfig)) -> Self {
        // Initialize test logger
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let provider_mock = MockServer::start().await;
        let mut config = GateConfig::for_test_with_mocks(&provider_mock);
        customize(&mut config);

        let state = AppState::with_store(config.clone(), Store::Memory(MemoryStore::new()));
        let app = create_app(state.clone()).await;

        Self {
            app,
            config,
            state,
            provider_mock,
        }
    }

    /// Insert a grant directly into the store, bypassing the gate
    pub async fn seed_grant(&self, grant: &AdminGrant) {
        GrantStore::new(self.state.store.clone())
            .insert(grant)
            .await
            .expect("Failed to seed grant");
    }

    /// Creates a request builder carrying the test API key
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
    }

    /// Sends a GET request to the specified URI
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// GET without any Authorization header
    pub async fn get_unauthenticated(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// GET with an arbitrary bearer token
    pub async fn get_with_bearer(&self, uri: impl AsRef<str>, token: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a POST request with a JSON body
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::POST, uri)
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// POST without any Authorization header
    pub async fn post_unauthenticated<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a DELETE request with a JSON body
    pub async fn delete<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::DELETE, uri)
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a prepared request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body: bytes.to_vec(),
        }
    }
}

/// Captured response with assertion helpers
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            self.text()
        );
    }

    /// Response body as text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Response body parsed as loose JSON
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Response body is not valid JSON")
    }

    /// Response body parsed into a typed value
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Response body did not match expected type")
    }

    /// A named response header, panicking if absent
    pub fn header(&self, name: &str) -> String {
        self.headers
            .get(name)
            .unwrap_or_else(|| panic!("missing {} header", name))
            .to_str()
            .expect("header is not valid UTF-8")
            .to_string()
    }
}
