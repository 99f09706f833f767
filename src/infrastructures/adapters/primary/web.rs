use crate::application::errors::DashboardError;
use crate::application::use_cases::list_workflow_runs::{
    ListWorkflowRunsInteractor, ListWorkflowRunsUseCase, ListWorkflowRunsUseCaseInput,
    ListWorkflowRunsUseCaseOutput,
};
use crate::application::use_cases::list_workflows::{
    ListWorkflowsInteractor, ListWorkflowsUseCase, ListWorkflowsUseCaseInput,
    ListWorkflowsUseCaseOutput,
};
use crate::domain::models::credential::Credential;
use crate::domain::models::timeframe::Timeframe;
use crate::infrastructures::adapters::primary::session::{
    ClientCommand, DashboardSession, OperationId, ServerMessage,
};
use crate::infrastructures::adapters::secondary::external_apis::github::GitHubApiAdapter;
use crate::infrastructures::adapters::secondary::external_apis::request_client::AuthenticatedRequestClient;
use axum::extract::ws::Utf8Bytes;
use axum::{
    Json, Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

// Structure to hold application state (AppState)
#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub github_api_url: String,
    pub default_credential: Option<Credential>,
}

impl AppState {
    /// Bearer token from the caller, else the configured default.
    fn credential(&self, headers: &HeaderMap) -> Option<Credential> {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| {
                value
                    .strip_prefix("Bearer ")
                    .or_else(|| value.strip_prefix("bearer "))
            })
            .and_then(Credential::new)
            .or_else(|| self.default_credential.clone())
    }

    fn github_api(&self, credential: Option<Credential>) -> Arc<GitHubApiAdapter> {
        Arc::new(GitHubApiAdapter::new(AuthenticatedRequestClient::new(
            self.http.clone(),
            self.github_api_url.clone(),
            credential,
        )))
    }
}

pub struct ErrorResponse(DashboardError);

impl From<DashboardError> for ErrorResponse {
    fn from(error: DashboardError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DashboardError::InvalidRepository(_) => StatusCode::BAD_REQUEST,
            DashboardError::Request(error) => {
                StatusCode::from_u16(error.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };
        (status, Json(self.0.normalized())).into_response()
    }
}

#[derive(Deserialize, Debug)]
pub struct WorkflowsQuery {
    repo: String,
}

#[derive(Deserialize, Debug)]
pub struct RunsQuery {
    repo: String,
    workflow: u64,
    timeframe: Option<Timeframe>,
}

#[tracing::instrument(name = "list_workflows", skip(state, headers))]
async fn list_workflows_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<WorkflowsQuery>,
) -> Result<Json<ListWorkflowsUseCaseOutput>, ErrorResponse> {
    let use_case = ListWorkflowsInteractor::new(state.github_api(state.credential(&headers)));
    let output = use_case
        .execute(ListWorkflowsUseCaseInput { repo: query.repo })
        .await?;
    Ok(Json(output))
}

#[tracing::instrument(name = "list_workflow_runs", skip(state, headers))]
async fn list_workflow_runs_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ListWorkflowRunsUseCaseOutput>, ErrorResponse> {
    let use_case = ListWorkflowRunsInteractor::new(state.github_api(state.credential(&headers)));
    let output = use_case
        .execute(ListWorkflowRunsUseCaseInput {
            repo: query.repo,
            workflow_id: query.workflow,
            timeframe: query.timeframe,
        })
        .await?;
    Ok(Json(output))
}

#[axum::debug_handler]
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let credential = state.credential(&headers);
    ws.on_upgrade(move |socket| handle_socket(socket, state, credential))
}

type Completion = (OperationId, Result<ServerMessage, DashboardError>);

async fn run_command(
    operation_id: OperationId,
    command: ClientCommand,
    github_api: Arc<GitHubApiAdapter>,
) -> Result<ServerMessage, DashboardError> {
    match command {
        ClientCommand::Workflows(input) => {
            let output = ListWorkflowsInteractor::new(github_api).execute(input).await?;
            Ok(ServerMessage::Workflows {
                operation_id,
                output,
            })
        }
        ClientCommand::Runs(input) => {
            let output = ListWorkflowRunsInteractor::new(github_api)
                .execute(input)
                .await?;
            Ok(ServerMessage::Runs {
                operation_id,
                output,
            })
        }
    }
}

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), ()> {
    match serde_json::to_string(message) {
        Ok(json_string) => socket
            .send(Message::Text(Utf8Bytes::from(json_string)))
            .await
            .map_err(|_| ()),
        Err(e) => {
            tracing::error!("Failed to serialize output: {:?}", e);
            Ok(())
        }
    }
}

#[tracing::instrument(name = "handle_socket", skip(socket, state, credential))]
async fn handle_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    credential: Option<Credential>,
) {
    tracing::info!("Client connected");
    let (completions_tx, mut completions_rx) = mpsc::unbounded_channel::<Completion>();
    let mut session = DashboardSession::default();

    'session: loop {
        tokio::select! {
            Some((operation_id, result)) = completions_rx.recv() => {
                let Some(messages) = session.complete(operation_id, result) else {
                    tracing::debug!("Discarding result of superseded operation {}", operation_id);
                    continue;
                };
                for message in &messages {
                    if send_message(&mut socket, message).await.is_err() {
                        tracing::info!("Client disconnected (send error)");
                        break 'session;
                    }
                }
            },
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let command = match serde_json::from_str::<ClientCommand>(text.as_str()) {
                            Ok(command) => command,
                            Err(e) => {
                                tracing::debug!("Ignoring malformed command {}: {}", text.as_str(), e);
                                let message = ServerMessage::Error {
                                    operation_id: 0,
                                    code: 400,
                                    message: format!("invalid command: {e}"),
                                };
                                if send_message(&mut socket, &message).await.is_err() {
                                    break 'session;
                                }
                                continue;
                            }
                        };

                        let operation_id = session.begin();
                        let loading = ServerMessage::Loading { operation_id, is_loading: true };
                        if send_message(&mut socket, &loading).await.is_err() {
                            break 'session;
                        }

                        let github_api = state.github_api(credential.clone());
                        let completions_tx = completions_tx.clone();
                        let task = tokio::spawn(async move {
                            let result = run_command(operation_id, command, github_api).await;
                            // The receiver is gone once the socket loop has ended.
                            let _ = completions_tx.send((operation_id, result));
                        });
                        session.attach(operation_id, task);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Client disconnected (received close message)");
                        break 'session;
                    }
                    Some(Err(e)) => {
                        tracing::info!("Client disconnected (receive error): {}", e);
                        break 'session;
                    }
                    Some(Ok(_)) => {
                        // Ignore Ping/Pong and Binary messages
                    }
                }
            },
        };
    }

    session.close();
    tracing::info!("Client disconnected");
}

#[tracing::instrument(name = "health_check")]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .route("/api/workflows", get(list_workflows_handler))
        .route("/api/runs", get(list_workflow_runs_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(github_api_url: &str, default_token: Option<&str>) -> Router {
        create_router(Arc::new(AppState {
            http: reqwest::Client::new(),
            github_api_url: github_api_url.to_string(),
            default_credential: default_token.and_then(Credential::new),
        }))
    }

    async fn json_body(response: Response) -> anyhow::Result<Value> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn test_health_check() -> anyhow::Result<()> {
        let response = app("http://127.0.0.1:1", None)
            .oneshot(Request::builder().uri("/health").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_repository_is_bad_request() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;

        let response = app(&mock_server.uri(), None)
            .oneshot(
                Request::builder()
                    .uri("/api/runs?repo=owner&workflow=1")
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await?;
        assert_eq!(body["code"], json!(400));
        assert_eq!(
            mock_server.received_requests().await.map(|requests| requests.len()),
            Some(0)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_url_syntax_in_repository_is_rejected_before_request() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        let app = app(&mock_server.uri(), None);

        for repo in ["octo%2Fhello%3Fx%3D1", "..%2F..", "octo%2Fhello%23frag"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(format!("/api/runs?repo={repo}&workflow=42"))
                        .body(Body::empty())?,
                )
                .await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{repo}");
        }

        assert_eq!(
            mock_server.received_requests().await.map(|requests| requests.len()),
            Some(0)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_status() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/missing/actions/workflows"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let response = app(&mock_server.uri(), None)
            .oneshot(
                Request::builder()
                    .uri("/api/workflows?repo=octo/missing")
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await?,
            json!({ "code": 404, "message": "Not Found" })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_caller_token_is_forwarded() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/actions/workflows/7/runs"))
            .and(header("Authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 1,
                "workflow_runs": [{
                    "id": 99,
                    "status": "completed",
                    "conclusion": "cancelled",
                    "created_at": "2024-01-02T10:00:00Z",
                    "updated_at": "2024-01-02T11:01:01Z",
                    "html_url": "https://github.com/octo/hello/actions/runs/99"
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = app(&mock_server.uri(), Some("default-token"))
            .oneshot(
                Request::builder()
                    .uri("/api/runs?repo=octo/hello&workflow=7")
                    .header("Authorization", "Bearer user-token")
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await?;
        assert_eq!(body["total"], json!(1));
        assert_eq!(body["runs"][0]["outcome"], json!("cancelled"));
        assert_eq!(body["runs"][0]["tone"], json!("cancelled"));
        assert_eq!(body["runs"][0]["duration"], json!("1h:01m:01s"));
        Ok(())
    }

    #[tokio::test]
    async fn test_default_token_is_used_without_caller_token() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/actions/workflows"))
            .and(header("Authorization", "Bearer default-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "total_count": 0, "workflows": [] })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = app(&mock_server.uri(), Some("default-token"))
            .oneshot(
                Request::builder()
                    .uri("/api/workflows?repo=octo/hello")
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await?,
            json!({ "repository": "octo/hello", "workflows": [] })
        );
        Ok(())
    }
}
