pub mod list_workflow_runs;
pub mod list_workflows;
