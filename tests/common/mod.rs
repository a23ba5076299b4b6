//! Shared test infrastructure
//!
//! - `MockKeycloakServer`: wiremock stand-in for the Keycloak Admin API
//! - `TestApp`: the production router wired to a mock Keycloak
//! - token minting and request helpers

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use keycloak_user_admin::config::{AuthConfig, Config, KeycloakConfig, TelemetryConfig};
use keycloak_user_admin::jwt::TokenVerifier;
use keycloak_user_admin::keycloak::KeycloakClient;
use keycloak_user_admin::middleware::AuthMiddlewareState;
use keycloak_user_admin::server::{build_router, AppState};
use keycloak_user_admin::service::{KeycloakUserService, UserAdminService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request as ReceivedRequest, ResponseTemplate};

pub const REALM: &str = "test";
pub const RESOURCE_CLIENT: &str = "spring-client-api-rest";
pub const ADMIN_ROLE: &str = "admin_client_role";
const JWT_SECRET: &str = "test-secret-key-for-http-testing";

// ============================================================================
// Test Configuration
// ============================================================================

pub fn create_keycloak_config(base_url: &str) -> KeycloakConfig {
    KeycloakConfig {
        url: base_url.to_string(),
        realm: REALM.to_string(),
        admin_realm: "master".to_string(),
        admin_client_id: "admin-cli".to_string(),
        admin_client_secret: "test-secret".to_string(),
        admin_username: Some("admin".to_string()),
        admin_password: "admin".to_string(),
        timeout_secs: 5,
    }
}

pub fn create_auth_config() -> AuthConfig {
    AuthConfig {
        public_key_pem: None,
        secret: Some(JWT_SECRET.to_string()),
        issuer: None,
        audience: None,
        resource_client_id: Some(RESOURCE_CLIENT.to_string()),
        required_role: ADMIN_ROLE.to_string(),
    }
}

pub fn create_test_config(base_url: &str) -> Config {
    Config {
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        keycloak: create_keycloak_config(base_url),
        auth: create_auth_config(),
        telemetry: TelemetryConfig::default(),
    }
}

pub fn create_test_client(base_url: &str) -> KeycloakClient {
    KeycloakClient::new(create_keycloak_config(base_url)).unwrap()
}

// ============================================================================
// Tokens
// ============================================================================

/// Sign an access token carrying the given roles on the resource client
pub fn token_with_roles(roles: &[&str]) -> String {
    let claims = json!({
        "sub": "3a1e0c5d-admin",
        "preferred_username": "root",
        "exp": chrono::Utc::now().timestamp() + 300,
        "realm_access": {"roles": ["offline_access", "uma_authorization"]},
        "resource_access": {RESOURCE_CLIENT: {"roles": roles}}
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn admin_token() -> String {
    token_with_roles(&[ADMIN_ROLE])
}

// ============================================================================
// Mock Keycloak
// ============================================================================

pub struct MockKeycloakServer {
    server: MockServer,
}

impl MockKeycloakServer {
    /// Start a mock Keycloak with the admin token endpoint mounted
    pub async fn new() -> Self {
        let mock = Self::without_token_endpoint().await;
        mock.mock_token_endpoint().await;
        mock
    }

    pub async fn without_token_endpoint() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    fn realm_path(suffix: &str) -> String {
        format!("/admin/realms/{}{}", REALM, suffix)
    }

    async fn mock_token_endpoint(&self) {
        Mock::given(method("POST"))
            .and(path("/realms/master/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "mock-token",
                "expires_in": 300,
                "token_type": "Bearer"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_list_users(&self, users: Value) {
        Mock::given(method("GET"))
            .and(path(Self::realm_path("/users")))
            .respond_with(ResponseTemplate::new(200).set_body_json(users))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_user_success(&self, user_id: &str) {
        Mock::given(method("POST"))
            .and(path(Self::realm_path("/users")))
            .respond_with(ResponseTemplate::new(201).append_header(
                "Location",
                format!("{}{}", self.uri(), Self::realm_path(&format!("/users/{}", user_id))),
            ))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_user_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(Self::realm_path("/users")))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "errorMessage": "User exists with same username"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_reset_password(&self, user_id: &str, times: u64) {
        Mock::given(method("PUT"))
            .and(path(Self::realm_path(&format!(
                "/users/{}/reset-password",
                user_id
            ))))
            .respond_with(ResponseTemplate::new(204))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_realm_roles(&self, names: &[&str]) {
        let roles: Vec<Value> = names.iter().map(|name| role_json(name)).collect();
        Mock::given(method("GET"))
            .and(path(Self::realm_path("/roles")))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(roles)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_get_realm_role(&self, name: &str) {
        Mock::given(method("GET"))
            .and(path(Self::realm_path(&format!("/roles/{}", name))))
            .respond_with(ResponseTemplate::new(200).set_body_json(role_json(name)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_add_realm_roles(&self, user_id: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(Self::realm_path(&format!(
                "/users/{}/role-mappings/realm",
                user_id
            ))))
            .respond_with(ResponseTemplate::new(204))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_update_user(&self, user_id: &str, status: u16) {
        Mock::given(method("PUT"))
            .and(path(Self::realm_path(&format!("/users/{}", user_id))))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_delete_user(&self, user_id: &str, status: u16) {
        Mock::given(method("DELETE"))
            .and(path(Self::realm_path(&format!("/users/{}", user_id))))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Requests received for a method and path, in arrival order
    pub async fn requests_to(&self, http_method: &str, request_path: &str) -> Vec<ReceivedRequest> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path() == request_path)
            .collect()
    }

    /// JSON bodies sent to a realm-relative path
    pub async fn bodies_sent_to(&self, http_method: &str, suffix: &str) -> Vec<Value> {
        self.requests_to(http_method, &Self::realm_path(suffix))
            .await
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}

pub fn role_json(name: &str) -> Value {
    json!({
        "id": format!("role-{}", name.to_lowercase()),
        "name": name,
        "composite": false,
        "clientRole": false,
        "containerId": "realm-test"
    })
}

// ============================================================================
// App
// ============================================================================

/// Production router wired to a mock Keycloak
pub fn build_test_router(keycloak_url: &str) -> Router {
    let config = create_test_config(keycloak_url);
    let client = KeycloakClient::new(config.keycloak.clone()).unwrap();
    let user_service: Arc<dyn UserAdminService> =
        Arc::new(KeycloakUserService::new(Arc::new(client)));
    let verifier = TokenVerifier::new(config.auth.clone()).unwrap();

    build_router(
        AppState::new(user_service),
        AuthMiddlewareState::new(Arc::new(verifier)),
    )
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Send a request through the router
pub async fn send(
    app: &Router,
    http_method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let body = body.map(|value| serde_json::to_vec(&value).unwrap());
    dispatch(app, http_method, uri, token, body).await
}

/// Send a raw JSON-typed body, for payloads that do not parse
pub async fn send_raw(
    app: &Router,
    http_method: Method,
    uri: &str,
    token: Option<&str>,
    body: &str,
) -> TestResponse {
    dispatch(app, http_method, uri, token, Some(body.as_bytes().to_vec())).await
}

async fn dispatch(
    app: &Router,
    http_method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Vec<u8>>,
) -> TestResponse {
    let mut builder = Request::builder().method(http_method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(bytes) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(bytes)
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}
