use crate::domain::formatting::format_whole_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Requested,
    Queued,
    Pending,
    Waiting,
    InProgress,
    ActionRequired,
    Completed,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::ActionRequired => "action_required",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    StartupFailure,
    Neutral,
    TimedOut,
    ActionRequired,
    Stale,
    #[serde(other)]
    Unknown,
}

impl RunConclusion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
            Self::StartupFailure => "startup_failure",
            Self::Neutral => "neutral",
            Self::TimedOut => "timed_out",
            Self::ActionRequired => "action_required",
            Self::Stale => "stale",
            Self::Unknown => "unknown",
        }
    }
}

/// Colour class shown next to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunTone {
    Success,
    Failure,
    Cancelled,
    Skipped,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub status: RunStatus,
    pub conclusion: Option<RunConclusion>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "htmlUrl")]
    pub html_url: String,
}

impl WorkflowRun {
    /// The conclusion once the run has one, otherwise the lifecycle status.
    pub fn outcome_label(&self) -> &'static str {
        self.conclusion
            .map_or_else(|| self.status.as_str(), RunConclusion::as_str)
    }

    pub fn tone(&self) -> RunTone {
        match self.conclusion {
            Some(RunConclusion::Success) => RunTone::Success,
            Some(RunConclusion::Failure | RunConclusion::StartupFailure) => RunTone::Failure,
            Some(RunConclusion::Cancelled) => RunTone::Cancelled,
            Some(RunConclusion::Skipped) => RunTone::Skipped,
            _ => RunTone::Pending,
        }
    }

    /// Elapsed seconds between creation and last update, rounded half up.
    pub fn duration_seconds(&self) -> Option<i64> {
        let elapsed = self.updated_at? - self.created_at;
        let seconds = elapsed.num_seconds();
        let remainder_ms = elapsed.num_milliseconds() - seconds * 1000;
        Some(match remainder_ms {
            500.. => seconds + 1,
            ..-500 => seconds - 1,
            _ => seconds,
        })
    }

    /// `-` when the run has no end time or ended before it started.
    pub fn duration_label(&self) -> String {
        self.duration_seconds()
            .and_then(|seconds| u64::try_from(seconds).ok())
            .map_or_else(|| "-".to_string(), format_whole_seconds)
    }
}
