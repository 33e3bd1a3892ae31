//! Single-shot observation of an extraction job's state. The state machine
//! (`pending → running → {completed | failed}`) is driven entirely by the
//! service; this side only queries it. Poll cadence, backoff and deadlines
//! belong to the caller — every call here is one idempotent request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::ContentItem;
use crate::error::ExtractionError;
use crate::extraction::{
    CONTROL_TIMEOUT, ExtractionClient, JobHandle, data_envelope, success_payload,
};
use crate::normalize::normalize;

pub const DEFAULT_FAILURE_MESSAGE: &str = "extraction failed without an error message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// What one status query observed. `data` is populated (and already
/// normalized) only on `completed`; `error` only on `failed`.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub state: JobState,
    pub progress: Option<u32>,
    pub data: Option<ContentItem>,
    pub error: Option<String>,
}

impl JobSnapshot {
    fn in_flight(state: JobState, progress: Option<u32>) -> Self {
        Self {
            state,
            progress,
            data: None,
            error: None,
        }
    }
}

impl ExtractionClient {
    /// Queries the service for the job's current state.
    ///
    /// A 404 right after submission means the service has not persisted job
    /// state yet, so it reports `running` rather than `failed`.
    pub async fn poll_once(&self, handle: &JobHandle) -> Result<JobSnapshot, ExtractionError> {
        let request = self
            .http
            .get(self.endpoint(&format!("/api/v1/jobs/{}", handle.job_id)));
        let response = self.send(request, CONTROL_TIMEOUT).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(job_id = %handle.job_id, "job not materialized yet; reporting running");
            return Ok(JobSnapshot::in_flight(JobState::Running, None));
        }

        let payload = success_payload(response).await?;
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ExtractionError::upstream(None, "job status response carries no status field")
            })?;
        let progress = payload
            .get("progress")
            .and_then(Value::as_u64)
            .map(|p| p.min(100) as u32);

        match status {
            "pending" => Ok(JobSnapshot::in_flight(JobState::Pending, progress)),
            "running" => Ok(JobSnapshot::in_flight(JobState::Running, progress)),
            "completed" => Ok(JobSnapshot {
                state: JobState::Completed,
                progress,
                data: Some(normalize(handle.kind, data_envelope(&payload))),
                error: None,
            }),
            "failed" => {
                let message = payload
                    .get("error_message")
                    .or_else(|| payload.get("error"))
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_FAILURE_MESSAGE);
                Ok(JobSnapshot {
                    state: JobState::Failed,
                    progress,
                    data: None,
                    error: Some(message.to_string()),
                })
            }
            other => Err(ExtractionError::upstream(
                None,
                format!("unexpected job status: {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::JobState;

    #[test]
    fn terminal_states() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
    }
}
