use crate::application::errors::DashboardError;
use crate::application::pagination::fetch_all;
use crate::domain::external_apis::github::GitHubApi;
use crate::domain::formatting::format_relative;
use crate::domain::models::pagination::{ListRequest, MAX_PAGE_SIZE};
use crate::domain::models::repository::RepositorySlug;
use crate::domain::models::run::{RunTone, WorkflowRun};
use crate::domain::models::workflow::Workflow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;

/// タイルに表示する直近ランの取得件数
const LATEST_RUN_PAGE_SIZE: NonZeroU32 = NonZeroU32::MIN;

#[derive(Deserialize, Debug, Clone)]
pub struct ListWorkflowsUseCaseInput {
    pub repo: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LastRunSummary {
    pub id: u64,
    pub outcome: String,
    pub tone: RunTone,
    /// e.g. "3 hours ago"
    pub started: String,
    pub duration: String,
    #[serde(rename = "htmlUrl")]
    pub html_url: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WorkflowTile {
    pub id: u64,
    pub name: String,
    pub path: String,
    /// Latest run if there is one, otherwise the workflow definition.
    pub link: String,
    #[serde(rename = "lastRun")]
    pub last_run: Option<LastRunSummary>,
}

impl WorkflowTile {
    fn new(workflow: Workflow, last_run: Option<&WorkflowRun>, now: DateTime<Utc>) -> Self {
        let link = last_run.map_or_else(|| workflow.html_url.clone(), |run| run.html_url.clone());
        Self {
            id: workflow.id,
            name: workflow.name,
            path: workflow.path,
            link,
            last_run: last_run.map(|run| LastRunSummary {
                id: run.id,
                outcome: run.outcome_label().to_string(),
                tone: run.tone(),
                started: format_relative(run.created_at, now),
                duration: run.duration_label(),
                html_url: run.html_url.clone(),
            }),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ListWorkflowsUseCaseOutput {
    pub repository: String,
    pub workflows: Vec<WorkflowTile>,
}

pub trait ListWorkflowsUseCase {
    fn execute(
        &self,
        input: ListWorkflowsUseCaseInput,
    ) -> impl Future<Output = Result<ListWorkflowsUseCaseOutput, DashboardError>> + Send;
}

pub struct ListWorkflowsInteractor<G: GitHubApi + Send + Sync + 'static> {
    github_api: Arc<G>,
    clock: fn() -> DateTime<Utc>,
}

impl<G: GitHubApi + Send + Sync + 'static> ListWorkflowsInteractor<G> {
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

impl<G: GitHubApi + Send + Sync + 'static> ListWorkflowsUseCase for ListWorkflowsInteractor<G> {
    fn execute(
        &self,
        input: ListWorkflowsUseCaseInput,
    ) -> impl Future<Output = Result<ListWorkflowsUseCaseOutput, DashboardError>> + Send {
        let github_api = self.github_api.clone();
        let clock = self.clock;

        async move {
            let repo = RepositorySlug::parse(&input.repo)?;

            tracing::info!("Fetching workflows for {}", repo);
            let api = github_api.as_ref();
            let repo_ref = &repo;
            let workflows = fetch_all(MAX_PAGE_SIZE, None, move |request| async move {
                api.list_workflows(repo_ref, &request).await
            })
            .await?;
            tracing::info!("Fetched {} workflows for {}", workflows.len(), repo);

            let latest = ListRequest::first(LATEST_RUN_PAGE_SIZE, None);
            let mut tiles = Vec::with_capacity(workflows.len());
            for workflow in workflows {
                // A tile without its latest run is still shown.
                let last_run = match api.list_workflow_runs(&repo, workflow.id, &latest).await {
                    Ok(runs) => runs.into_iter().next(),
                    Err(e) => {
                        tracing::warn!(
                            "Failed to fetch the last run of workflow {} in {}: {}",
                            workflow.id,
                            repo,
                            e
                        );
                        None
                    }
                };
                tiles.push(WorkflowTile::new(workflow, last_run.as_ref(), clock()));
            }

            Ok(ListWorkflowsUseCaseOutput {
                repository: repo.to_string(),
                workflows: tiles,
            })
        }
    }
}
