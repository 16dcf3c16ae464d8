//! Server-side video export
//!
//! The imagery service can render a windowed composite animation itself and
//! deliver the video to the project's cloud drive. The flow mirrors the
//! operator's local pipeline: the request describes the collection, region,
//! date range, window length, and visualization, and the server does the
//! rest asynchronously.
//!
//! Flow:
//! 1. `start_video_export` submits the request and returns a task handle
//! 2. `export_status` polls the task by id
//! 3. `wait_export_done` polls with backoff until a terminal state

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};

use super::client::EarthdataClient;
use super::error::{EarthdataError, Result};
use super::raster::Region;

/// Request body for `videos:export`.
///
/// Visualization fields are opaque pass-through configuration; the core
/// does not validate palette or value range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoExportRequest {
    /// Human-readable task description, also the output file stem.
    pub description: String,
    pub collection: String,
    pub region: Region,
    pub start_date: String,
    pub end_date: String,
    pub composite_days: u32,
    pub band: String,
    pub min: f64,
    pub max: f64,
    /// Palette colors, hex strings low to high.
    pub palette: Vec<String>,
    pub frames_per_second: u32,
    /// Longest output dimension in pixels.
    pub dimensions: u32,
}

/// State of a server-side export task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Completed | ExportState::Failed)
    }
}

/// Handle to a server-side export task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTask {
    pub id: String,
    pub state: ExportState,
    #[serde(default)]
    pub error: Option<String>,
}

/// Submit a video export request. Returns immediately with the task
/// handle; the render happens server-side.
pub async fn start_video_export(
    client: &EarthdataClient,
    request: &VideoExportRequest,
) -> Result<ExportTask> {
    client
        .post_json(&format!("projects/{}/videos:export", client.project()), request)
        .await
        .map_err(|e| EarthdataError::Export(format!("failed to start video export: {}", e)))
}

/// Fetch the current state of an export task.
pub async fn export_status(client: &EarthdataClient, task_id: &str) -> Result<ExportTask> {
    client
        .get_json(&format!(
            "projects/{}/operations/{}",
            client.project(),
            task_id
        ))
        .await
        .map_err(|e| EarthdataError::Export(format!("failed to poll export task: {}", e)))
}

/// Poll an export task until it reaches a terminal state.
///
/// Gives up with `ExportError` after `max_polls` attempts; a task that
/// reports `Failed` is also an error, carrying the server's message.
pub async fn wait_export_done(
    client: &EarthdataClient,
    task_id: &str,
    poll_interval: Duration,
    max_polls: usize,
) -> Result<ExportTask> {
    for _ in 0..max_polls {
        let task = export_status(client, task_id).await?;
        if task.state.is_terminal() {
            if task.state == ExportState::Failed {
                return Err(EarthdataError::Export(format!(
                    "export task {} failed: {}",
                    task.id,
                    task.error.as_deref().unwrap_or("no error message")
                )));
            }
            return Ok(task);
        }
        sleep(poll_interval).await;
    }
    Err(EarthdataError::Export(format!(
        "export task {} did not finish within {} polls",
        task_id, max_polls
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_state_parses_and_classifies() {
        let task: ExportTask =
            serde_json::from_str(r#"{"id": "op-1", "state": "running"}"#).unwrap();
        assert_eq!(task.state, ExportState::Running);
        assert!(!task.state.is_terminal());
        assert!(task.error.is_none());

        let task: ExportTask =
            serde_json::from_str(r#"{"id": "op-1", "state": "failed", "error": "quota"}"#).unwrap();
        assert!(task.state.is_terminal());
        assert_eq!(task.error.as_deref(), Some("quota"));
    }
}
