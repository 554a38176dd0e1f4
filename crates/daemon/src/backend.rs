// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real adapters: newline-delimited JSON over Unix sockets
//!
//! The job backend answers one request per connection. Mode signals go to a
//! separate well-known socket and are fire-and-forget: a missing or dead
//! receiver just means nobody is listening right now.

use async_trait::async_trait;
use gk_core::{
    JobBackendError, JobId, JobSchedulerAdapter, JobSnapshot, ModeSignal, ModeSignalAdapter,
    TelemetryAdapter, UserContextAdapter, UserContextError, UserId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Requests understood by the job scheduler backend
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BackendRequest {
    AllJobs,
    StartedJobs,
    StartBackgroundUsers,
    StopBackgroundUser { user: i32 },
}

#[derive(Debug, Deserialize)]
struct JobEntry {
    id: String,
    requires_idle: bool,
}

#[derive(Debug, Deserialize)]
struct AllJobsResponse {
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
struct StartedJobsResponse {
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StartUsersResponse {
    users: Vec<i32>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    ok: bool,
}

/// Transport-level backend call errors
#[derive(Debug, Error)]
pub enum BackendCallError {
    #[error("backend closed the connection")]
    ConnectionClosed,

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One-request-per-connection client for the job scheduler backend
#[derive(Clone)]
pub struct BackendClient {
    socket: Arc<PathBuf>,
}

impl BackendClient {
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: Arc::new(socket.into()),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: &BackendRequest,
    ) -> Result<T, BackendCallError> {
        let stream = UnixStream::connect(self.socket.as_path()).await?;
        let mut stream = BufReader::new(stream);

        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        stream.get_mut().write_all(&line).await?;

        let mut response = String::new();
        if stream.read_line(&mut response).await? == 0 {
            return Err(BackendCallError::ConnectionClosed);
        }
        Ok(serde_json::from_str(response.trim_end())?)
    }
}

#[async_trait]
impl JobSchedulerAdapter for BackendClient {
    async fn all_jobs(&self) -> Result<Vec<JobSnapshot>, JobBackendError> {
        let response: AllJobsResponse = self
            .call(&BackendRequest::AllJobs)
            .await
            .map_err(|e| JobBackendError::Unavailable(e.to_string()))?;
        Ok(response
            .jobs
            .into_iter()
            .map(|job| JobSnapshot::new(job.id, job.requires_idle))
            .collect())
    }

    async fn started_jobs(&self) -> Result<Vec<JobId>, JobBackendError> {
        let response: StartedJobsResponse = self
            .call(&BackendRequest::StartedJobs)
            .await
            .map_err(|e| JobBackendError::Unavailable(e.to_string()))?;
        Ok(response.ids.into_iter().map(JobId).collect())
    }
}

#[async_trait]
impl UserContextAdapter for BackendClient {
    async fn start_all_background_users(&self) -> Result<Vec<UserId>, UserContextError> {
        let response: StartUsersResponse = self
            .call(&BackendRequest::StartBackgroundUsers)
            .await
            .map_err(|e| UserContextError::Unavailable(e.to_string()))?;
        Ok(response.users.into_iter().map(UserId).collect())
    }

    async fn stop_background_user(&self, id: UserId) -> Result<(), UserContextError> {
        let response: AckResponse = self
            .call(&BackendRequest::StopBackgroundUser { user: id.0 })
            .await
            .map_err(|e| UserContextError::Unavailable(e.to_string()))?;
        if !response.ok {
            return Err(UserContextError::StopFailed(
                id,
                "backend refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SignalMessage<'a> {
    action: &'a str,
}

/// Fire-and-forget mode-signal broadcaster
#[derive(Clone)]
pub struct SignalBroadcaster {
    socket: Arc<PathBuf>,
}

impl SignalBroadcaster {
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: Arc::new(socket.into()),
        }
    }

    async fn send(&self, action: &str) -> Result<(), BackendCallError> {
        let mut stream = UnixStream::connect(self.socket.as_path()).await?;
        let mut line = serde_json::to_vec(&SignalMessage { action })?;
        line.push(b'\n');
        stream.write_all(&line).await?;
        Ok(())
    }
}

#[async_trait]
impl ModeSignalAdapter for SignalBroadcaster {
    async fn broadcast(&self, signal: ModeSignal) {
        if let Err(e) = self.send(signal.action()).await {
            // No receiver registered is a normal condition, not a failure
            tracing::debug!(action = signal.action(), error = %e, "mode signal not delivered");
        }
    }
}

/// Telemetry sink that lands session markers in the daemon log
#[derive(Clone, Copy, Default)]
pub struct TracingTelemetry;

#[async_trait]
impl TelemetryAdapter for TracingTelemetry {
    async fn log_session_start(&self) {
        tracing::info!(target: "gk::stats", "garage mode session started");
    }

    async fn log_session_stop(&self) {
        tracing::info!(target: "gk::stats", "garage mode session stopped");
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
