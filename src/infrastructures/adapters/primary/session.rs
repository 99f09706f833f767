use crate::application::errors::DashboardError;
use crate::application::use_cases::list_workflow_runs::{
    ListWorkflowRunsUseCaseInput, ListWorkflowRunsUseCaseOutput,
};
use crate::application::use_cases::list_workflows::{
    ListWorkflowsUseCaseInput, ListWorkflowsUseCaseOutput,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

pub type OperationId = u64;

/// Commands a dashboard client sends over the WebSocket.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    Workflows(ListWorkflowsUseCaseInput),
    Runs(ListWorkflowRunsUseCaseInput),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Loading {
        #[serde(rename = "operationId")]
        operation_id: OperationId,
        #[serde(rename = "isLoading")]
        is_loading: bool,
    },
    Workflows {
        #[serde(rename = "operationId")]
        operation_id: OperationId,
        #[serde(flatten)]
        output: ListWorkflowsUseCaseOutput,
    },
    Runs {
        #[serde(rename = "operationId")]
        operation_id: OperationId,
        #[serde(flatten)]
        output: ListWorkflowRunsUseCaseOutput,
    },
    Error {
        #[serde(rename = "operationId")]
        operation_id: OperationId,
        code: u16,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(operation_id: OperationId, error: &DashboardError) -> Self {
        Self::Error {
            operation_id,
            code: error.code(),
            message: error.message(),
        }
    }
}

/// Per-connection dashboard state.
///
/// Every command starts a new operation. Starting one aborts the task of the
/// previous operation, and a result that arrives for anything but the latest
/// operation is dropped.
#[derive(Debug, Default)]
pub struct DashboardSession {
    latest: OperationId,
    task: Option<JoinHandle<()>>,
    is_loading: bool,
    last_error: Option<DashboardError>,
}

impl DashboardSession {
    pub fn begin(&mut self) -> OperationId {
        if let Some(task) = self.task.take() {
            tracing::debug!("Aborting superseded operation {}", self.latest);
            task.abort();
        }
        self.latest += 1;
        self.is_loading = true;
        self.last_error = None;
        self.latest
    }

    pub fn attach(&mut self, operation_id: OperationId, task: JoinHandle<()>) {
        if self.is_current(operation_id) {
            self.task = Some(task);
        } else {
            task.abort();
        }
    }

    pub fn is_current(&self, operation_id: OperationId) -> bool {
        operation_id == self.latest
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&DashboardError> {
        self.last_error.as_ref()
    }

    /// Frames to send for a finished operation, or `None` when it is stale.
    /// The loading flag is cleared in the same batch as the result.
    pub fn complete(
        &mut self,
        operation_id: OperationId,
        result: Result<ServerMessage, DashboardError>,
    ) -> Option<Vec<ServerMessage>> {
        if !self.is_current(operation_id) {
            return None;
        }

        self.task = None;
        self.is_loading = false;
        let loading = ServerMessage::Loading {
            operation_id,
            is_loading: false,
        };

        match result {
            Ok(message) => {
                self.last_error = None;
                Some(vec![loading, message])
            }
            Err(error) => {
                let message = ServerMessage::error(operation_id, &error);
                self.last_error = Some(error);
                Some(vec![loading, message])
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.is_loading = false;
    }
}
