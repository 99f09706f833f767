use crate::application::errors::DashboardError;
use crate::application::pagination::fetch_all;
use crate::domain::external_apis::github::GitHubApi;
use crate::domain::models::pagination::MAX_PAGE_SIZE;
use crate::domain::models::repository::RepositorySlug;
use crate::domain::models::run::{RunTone, WorkflowRun};
use crate::domain::models::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;

/// ワークフローラン一覧の 1 ページあたりの取得件数
const RUNS_PAGE_SIZE: NonZeroU32 = MAX_PAGE_SIZE;

#[derive(Deserialize, Debug, Clone)]
pub struct ListWorkflowRunsUseCaseInput {
    pub repo: String,
    #[serde(rename = "workflowId")]
    pub workflow_id: u64,
    pub timeframe: Option<Timeframe>,
}

/// One table row of the runs view.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RunRow {
    pub id: u64,
    pub outcome: String,
    pub tone: RunTone,
    pub duration: String,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "htmlUrl")]
    pub html_url: String,
}

impl From<&WorkflowRun> for RunRow {
    fn from(run: &WorkflowRun) -> Self {
        Self {
            id: run.id,
            outcome: run.outcome_label().to_string(),
            tone: run.tone(),
            duration: run.duration_label(),
            duration_seconds: run.duration_seconds(),
            created_at: run.created_at,
            html_url: run.html_url.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ListWorkflowRunsUseCaseOutput {
    pub repository: String,
    #[serde(rename = "workflowId")]
    pub workflow_id: u64,
    pub total: usize,
    pub runs: Vec<RunRow>,
}

pub trait ListWorkflowRunsUseCase {
    fn execute(
        &self,
        input: ListWorkflowRunsUseCaseInput,
    ) -> impl Future<Output = Result<ListWorkflowRunsUseCaseOutput, DashboardError>> + Send;
}

pub struct ListWorkflowRunsInteractor<G: GitHubApi + Send + Sync + 'static> {
    github_api: Arc<G>,
    clock: fn() -> DateTime<Utc>,
}

impl<G: GitHubApi + Send + Sync + 'static> ListWorkflowRunsInteractor<G> {
    pub fn new(github_api: Arc<G>) -> Self {
        Self {
            github_api,
            clock: Utc::now,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

impl<G: GitHubApi + Send + Sync + 'static> ListWorkflowRunsUseCase
    for ListWorkflowRunsInteractor<G>
{
    fn execute(
        &self,
        input: ListWorkflowRunsUseCaseInput,
    ) -> impl Future<Output = Result<ListWorkflowRunsUseCaseOutput, DashboardError>> + Send {
        let github_api = self.github_api.clone();
        let now = (self.clock)();

        async move {
            let repo = RepositorySlug::parse(&input.repo)?;
            let since = input.timeframe.map(|timeframe| timeframe.since(now));
            let workflow_id = input.workflow_id;

            tracing::info!("Fetching workflow runs for {} (workflow {})", repo, workflow_id);
            let api = github_api.as_ref();
            let repo_ref = &repo;
            let runs = fetch_all(RUNS_PAGE_SIZE, since, move |request| async move {
                api.list_workflow_runs(repo_ref, workflow_id, &request).await
            })
            .await?;
            tracing::info!("Fetched {} workflow runs for {}", runs.len(), repo);

            Ok(ListWorkflowRunsUseCaseOutput {
                repository: repo.to_string(),
                workflow_id,
                total: runs.len(),
                runs: runs.iter().map(RunRow::from).collect(),
            })
        }
    }
}
