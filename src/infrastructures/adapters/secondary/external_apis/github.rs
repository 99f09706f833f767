use crate::domain::errors::ApiError;
use crate::domain::external_apis::github::GitHubApi;
use crate::domain::models::pagination::ListRequest;
use crate::domain::models::repository::RepositorySlug;
use crate::domain::models::run::{RunConclusion, RunStatus, WorkflowRun};
use crate::domain::models::workflow::Workflow;
use crate::infrastructures::adapters::secondary::external_apis::request_client::{
    AuthenticatedRequestClient, Json, RequestOptions,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderValue, USER_AGENT};
use serde::Deserialize;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_USER_AGENT: &str = "gha-monitor-rust-app";

#[derive(Deserialize, Debug, Clone)]
struct GitHubWorkflowResponse {
    id: u64,
    name: String,
    path: String,
    state: String,
    html_url: String,
    url: String,
    badge_url: String,
}

#[derive(Deserialize, Debug, Clone)]
struct GitHubWorkflowRunResponse {
    id: u64,
    status: RunStatus,
    conclusion: Option<RunConclusion>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    html_url: String,
}

// Both listing endpoints wrap their items in an envelope keyed by the
// collection name. A missing array is treated as an empty page.
#[derive(Deserialize, Debug)]
struct GitHubWorkflowsApiResponse {
    #[serde(rename = "total_count")]
    _total_count: u64,
    #[serde(default)]
    workflows: Vec<GitHubWorkflowResponse>,
}

#[derive(Deserialize, Debug)]
struct GitHubWorkflowRunsApiResponse {
    #[serde(rename = "total_count")]
    _total_count: u64,
    #[serde(default)]
    workflow_runs: Vec<GitHubWorkflowRunResponse>,
}

pub struct GitHubApiAdapter {
    client: AuthenticatedRequestClient,
}

impl GitHubApiAdapter {
    pub fn new(client: AuthenticatedRequestClient) -> Self {
        Self { client }
    }

    fn list_options(request: &ListRequest) -> RequestOptions {
        RequestOptions::default()
            .header(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT))
            .header(USER_AGENT, HeaderValue::from_static(GITHUB_USER_AGENT))
            .query(request.query_pairs())
    }
}

#[async_trait]
impl GitHubApi for GitHubApiAdapter {
    #[tracing::instrument(name = "GitHubApiAdapter::list_workflows", skip(self))]
    async fn list_workflows(
        &self,
        repo: &RepositorySlug,
        request: &ListRequest,
    ) -> Result<Vec<Workflow>, ApiError> {
        let resource = format!("/repos/{}/{}/actions/workflows", repo.owner, repo.name);

        let Json(api_response): Json<GitHubWorkflowsApiResponse> = self
            .client
            .request(&resource, Self::list_options(request))
            .await?;

        let workflows = api_response
            .workflows
            .into_iter()
            .map(|workflow_res| Workflow {
                id: workflow_res.id,
                name: workflow_res.name,
                path: workflow_res.path,
                state: workflow_res.state,
                html_url: workflow_res.html_url,
                url: workflow_res.url,
                badge_url: workflow_res.badge_url,
            })
            .collect();

        Ok(workflows)
    }

    #[tracing::instrument(name = "GitHubApiAdapter::list_workflow_runs", skip(self))]
    async fn list_workflow_runs(
        &self,
        repo: &RepositorySlug,
        workflow_id: u64,
        request: &ListRequest,
    ) -> Result<Vec<WorkflowRun>, ApiError> {
        let resource = format!(
            "/repos/{}/{}/actions/workflows/{}/runs",
            repo.owner, repo.name, workflow_id
        );

        let Json(api_response): Json<GitHubWorkflowRunsApiResponse> = self
            .client
            .request(&resource, Self::list_options(request))
            .await?;

        let workflow_runs = api_response
            .workflow_runs
            .into_iter()
            .map(|run_res| WorkflowRun {
                id: run_res.id,
                status: run_res.status,
                conclusion: run_res.conclusion,
                created_at: run_res.created_at,
                updated_at: run_res.updated_at,
                html_url: run_res.html_url,
            })
            .collect();

        Ok(workflow_runs)
    }
}
