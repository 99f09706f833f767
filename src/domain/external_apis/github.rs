use crate::domain::errors::ApiError;
use crate::domain::models::pagination::ListRequest;
use crate::domain::models::repository::RepositorySlug;
use crate::domain::models::run::WorkflowRun;
use crate::domain::models::workflow::Workflow;
use async_trait::async_trait;

/// One page of the GitHub Actions listing endpoints.
///
/// Implementations return the page's items in server order. An empty vector
/// means the page was empty or the envelope carried no items.
#[async_trait]
pub trait GitHubApi {
    async fn list_workflows(
        &self,
        repo: &RepositorySlug,
        request: &ListRequest,
    ) -> Result<Vec<Workflow>, ApiError>;

    async fn list_workflow_runs(
        &self,
        repo: &RepositorySlug,
        workflow_id: u64,
        request: &ListRequest,
    ) -> Result<Vec<WorkflowRun>, ApiError>;
}
