use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use backend::{
    jwt::{JwsPayload, JwtManager},
    server,
    test_utils::{FakeObjectStore, InMemoryImageStore},
    types::Environment,
};
use chrono::Utc;
use tower::ServiceExt;

use super::utils::{multipart_body, MULTIPART_BOUNDARY};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to in-memory stores
pub struct TestContext {
    pub router: Router,
    pub environment: Environment,
    pub image_store: Arc<InMemoryImageStore>,
    pub media_storage: Arc<FakeObjectStore>,
    pub jwt_manager: Arc<JwtManager>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_environment(Environment::Development {
            disable_auth: false,
        })
    }

    pub fn with_environment(environment: Environment) -> Self {
        setup_test_env();

        let image_store = Arc::new(InMemoryImageStore::default());
        let media_storage = Arc::new(FakeObjectStore::default());
        let jwt_manager = Arc::new(JwtManager::new(TEST_JWT_SECRET));

        let router = server::app(
            environment.clone(),
            image_store.clone(),
            media_storage.clone(),
            jwt_manager.clone(),
        );

        Self {
            router,
            environment,
            image_store,
            media_storage,
            jwt_manager,
        }
    }

    /// Issues a valid access token for the given account
    pub fn token_for(&self, user_id: i64, username: &str) -> String {
        let payload = JwsPayload::access(user_id, username, Utc::now().timestamp(), 300);
        self.jwt_manager
            .issue_token(&payload)
            .expect("Failed to issue token")
    }

    pub async fn send_get_request(
        &self,
        route: &str,
        token: Option<&str>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder().uri(route).method("GET");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = builder.body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    /// Posts a single file field to the upload route
    pub async fn send_upload_request(
        &self,
        token: Option<&str>,
        field_name: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder()
            .uri("/api/images/upload")
            .method("POST")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = builder.body(Body::from(multipart_body(field_name, file_name, content)))?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}
