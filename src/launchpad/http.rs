//! Remote Workflow Engine Client
//!
//! Talks to a workflow engine over HTTP. Requests are retried with exponential
//! backoff and jitter so a short network blip does not surface as a failed
//! submission or a stuck poll.

use super::protocol::*;
use super::types::*;
use crate::backend::types::TaskSpec;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_millis(2_000);
const ATTEMPTS: usize = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(150);
const MAX_BACKOFF: Duration = Duration::from_millis(1_200);

pub struct HttpLaunchPad {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpLaunchPad {
    /// `base_url` is the engine's root, e.g. `http://10.0.0.5:7788`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    fn workflows_url(&self) -> String {
        format!("{}{}", self.base_url, ENDPOINT_WORKFLOWS)
    }

    /// Sends the request built by `build`, retrying transport errors and 5xx answers.
    ///
    /// Any other status is returned to the caller on the first attempt, so a 404 or
    /// a 400 is never retried.
    async fn send_with_retry<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 1;

        loop {
            let failure = match build(&self.http_client)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
            {
                Ok(resp) if !resp.status().is_server_error() => return Ok(resp),
                Ok(resp) => anyhow::anyhow!("engine answered {}", resp.status()),
                Err(e) => anyhow::Error::new(e),
            };

            if attempt == ATTEMPTS {
                return Err(failure.context(format!("giving up after {} attempts", ATTEMPTS)));
            }
            tracing::debug!("Engine request attempt {} failed: {}", attempt, failure);

            let jitter = Duration::from_millis(rand::random::<u64>() % 50);
            tokio::time::sleep(backoff + jitter).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
            attempt += 1;
        }
    }
}

#[async_trait]
impl LaunchPad for HttpLaunchPad {
    async fn add_workflow(&self, spec: TaskSpec) -> Result<WorkflowId> {
        let url = self.workflows_url();
        let request = AddWorkflowRequest { spec };

        let response = self
            .send_with_retry(|client| client.post(&url).json(&request))
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Adding workflow failed: {}", response.status());
        }

        let added: AddWorkflowResponse = response.json().await?;
        tracing::debug!("Remote engine accepted workflow {}", added.fw_id);
        Ok(added.fw_id)
    }

    async fn workflow_state(&self, id: WorkflowId) -> Result<Option<WorkflowState>> {
        let url = format!("{}/{}", self.workflows_url(), id.0);

        let response = self.send_with_retry(|client| client.get(&url)).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("Workflow state query failed: {}", response.status());
        }

        let body: WorkflowStateResponse = response.json().await?;
        Ok(body.state)
    }
}
