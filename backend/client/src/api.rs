use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use cybersafer_config::CyberSaferConfig;
use cybersafer_core::ScenarioStatus;

use crate::error::ApiError;
use crate::stream::ChatStream;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Client for the scenario server's `/api` routes.
///
/// Stateless apart from the connection pool: every call issues exactly one
/// request and reports failures as they happened, without retrying.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Build a client from the resolved `server` config section.
    pub fn from_config(config: &CyberSaferConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs()))
            .build()
            .map_err(ApiError::Setup)?;
        Ok(Self::with_client(client, config.base_url()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Server liveness check.
    pub async fn health(&self) -> Result<Value, ApiError> {
        self.get_json("/api").await
    }

    /// All scenarios, grouped by category.
    pub async fn list_scenarios(&self) -> Result<Value, ApiError> {
        self.get_json("/api/scenarios").await
    }

    pub async fn get_scenario(&self, scenario_id: &str) -> Result<Value, ApiError> {
        let path = format!("/api/scenario/{}", urlencoding::encode(scenario_id));
        self.get_json(&path).await
    }

    pub async fn start_scenario(&self, scenario_id: &str) -> Result<Value, ApiError> {
        let path = format!("/api/scenario/{}/start", urlencoding::encode(scenario_id));
        self.post_json(&path).await
    }

    /// Send one chat message and return the streamed reply body.
    ///
    /// The status is checked before streaming starts; the body itself is
    /// not interpreted here.
    pub async fn send_message(&self, message: &str) -> Result<ChatStream, ApiError> {
        let url = self.url("/api/chat/stream");
        debug!(url = %url, len = message.len(), "Opening chat stream");
        let request = self.client.post(&url).json(&ChatRequest { message });
        let response = Self::send(request, &url).await?;
        Ok(ChatStream::from_response(url, response))
    }

    pub async fn complete_scenario(&self) -> Result<Value, ApiError> {
        self.post_json("/api/scenario/complete").await
    }

    pub async fn exit_scenario(&self) -> Result<Value, ApiError> {
        self.post_json("/api/scenario/exit").await
    }

    /// Whether a scenario is running and its red-flag counts.
    pub async fn scenario_status(&self) -> Result<ScenarioStatus, ApiError> {
        let url = self.url("/api/scenario/status");
        self.fetch(self.client.get(&url), url).await
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        self.fetch(self.client.get(&url), url).await
    }

    async fn post_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        self.fetch(self.client.post(&url), url).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: String,
    ) -> Result<T, ApiError> {
        debug!(url = %url, "Sending request");
        let response = Self::send(request, &url).await?;
        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode { url, source })
    }

    async fn send(request: RequestBuilder, url: &str) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use axum::body::Body;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use futures_util::stream;
    use serde_json::json;
    use tokio::net::TcpListener;

    fn catalog() -> Value {
        json!({
            "categories": {
                "phishing": [
                    {"id": "bank_email", "title": "Bank Email", "difficulty": "easy", "description": "A message from your bank..."}
                ]
            }
        })
    }

    fn scenario_server() -> Router {
        Router::new()
            .route("/api", get(|| async { Json(json!({"status": "ok", "app": "Cyber Safer"})) }))
            .route("/api/scenarios", get(|| async { Json(catalog()) }))
            .route(
                "/api/scenario/status",
                get(|| async {
                    Json(json!({"active": true, "red_flags_found": 2, "red_flags_required": 5}))
                }),
            )
            .route(
                "/api/scenario/complete",
                post(|| async { Json(json!({"score": 75, "passed": true, "feedback": "Well done!"})) }),
            )
            .route(
                "/api/scenario/exit",
                post(|| async { Json(json!({"ok": true, "message": "Exited scenario mode"})) }),
            )
            .route("/api/scenario/:id", get(scenario_detail))
            .route(
                "/api/scenario/:id/start",
                post(|Path(id): Path<String>| async move {
                    Json(json!({"ok": true, "scenario": {"id": id}, "initial_message": "Hi!"}))
                }),
            )
            .route("/api/chat/stream", post(chat))
    }

    async fn scenario_detail(
        Path(id): Path<String>,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        if id == "bank_email" {
            Ok(Json(json!({"title": "Bank Email", "red_flags": ["urgency", "link"], "nested": {"n": [1, 2.5, null]}})))
        } else {
            Err((
                StatusCode::NOT_FOUND,
                Json(json!({"detail": format!("Scenario '{id}' not found")})),
            ))
        }
    }

    async fn chat(Json(body): Json<Value>) -> Result<Body, StatusCode> {
        let message = body["message"].as_str().unwrap_or_default().to_string();
        if message.is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        let chunks = vec![
            Ok::<_, Infallible>("[COUNTER:1/3]\n".to_string()),
            Ok(format!("You said: {message}")),
        ];
        Ok(Body::from_stream(stream::iter(chunks)))
    }

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn returns_json_exactly_as_sent() {
        let client = ApiClient::new(serve(scenario_server()).await);

        assert_eq!(client.list_scenarios().await.unwrap(), catalog());
        assert_eq!(
            client.get_scenario("bank_email").await.unwrap(),
            json!({"title": "Bank Email", "red_flags": ["urgency", "link"], "nested": {"n": [1, 2.5, null]}})
        );
        assert_eq!(
            client.health().await.unwrap(),
            json!({"status": "ok", "app": "Cyber Safer"})
        );
        assert_eq!(
            client.complete_scenario().await.unwrap(),
            json!({"score": 75, "passed": true, "feedback": "Well done!"})
        );
        assert_eq!(
            client.exit_scenario().await.unwrap(),
            json!({"ok": true, "message": "Exited scenario mode"})
        );
    }

    #[tokio::test]
    async fn encodes_scenario_id_as_one_segment() {
        let client = ApiClient::new(serve(scenario_server()).await);
        let started = client.start_scenario("bank email/2").await.unwrap();
        assert_eq!(started["scenario"]["id"], "bank email/2");
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_ignored() {
        let base = serve(scenario_server()).await;
        let client = ApiClient::new(format!("{base}/"));
        assert!(client.health().await.is_ok());
    }

    #[tokio::test]
    async fn decodes_status() {
        let client = ApiClient::new(serve(scenario_server()).await);
        let status = client.scenario_status().await.unwrap();
        assert!(status.active);
        assert_eq!(status.counter().to_string(), "2/5");
    }

    #[tokio::test]
    async fn not_found_surfaces_status() {
        let client = ApiClient::new(serve(scenario_server()).await);
        let err = client.get_scenario("missing").await.unwrap_err();
        assert!(err.is_not_found());
        match err {
            ApiError::Status { body, .. } => assert!(body.contains("missing")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn streams_chat_body() {
        let client = ApiClient::new(serve(scenario_server()).await);
        let mut stream = client.send_message("hello").await.unwrap();
        let text = stream.collect_text().await.unwrap();
        assert_eq!(text, "[COUNTER:1/3]\nYou said: hello");
    }

    #[tokio::test]
    async fn rejected_chat_fails_before_streaming() {
        let client = ApiClient::new(serve(scenario_server()).await);
        let err = client.send_message("").await.err().unwrap();
        assert_eq!(err.status(), Some(reqwest::StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_error() {
        let app = Router::new().route("/api/scenarios", get(|| async { "not json" }));
        let client = ApiClient::new(serve(app).await);
        let err = client.list_scenarios().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(format!("http://{addr}"));
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
        assert!(err.url().unwrap().ends_with("/api"));
    }
}
