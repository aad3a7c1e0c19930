//! Render job endpoints

use lissajous_core::domain::job::JobId;
use lissajous_core::dto::job::{JobStatusView, RenderForm, SubmitResponse};

use crate::LissajousClient;
use crate::error::Result;

impl LissajousClient {
    /// Submit a new render job
    ///
    /// Fields left as `None` use the server defaults.
    pub async fn submit(&self, form: &RenderForm) -> Result<SubmitResponse> {
        let response = self
            .client
            .post(self.url("/lissajous"))
            .form(form)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Poll the status of a job
    ///
    /// Each call may advance the reported progress by one step.
    pub async fn status(&self, job_id: JobId) -> Result<JobStatusView> {
        let url = self.url(&format!("/lissajous/status/{}", job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Download the finished animation
    ///
    /// The service hands out each result once; a second call fails with a
    /// not-found error.
    pub async fn fetch_result(&self, job_id: JobId) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url("/lissajous/result"))
            .query(&[("id", job_id.to_string())])
            .send()
            .await?;

        self.handle_bytes_response(response).await
    }

    /// Request cancellation of a running job
    pub async fn cancel(&self, job_id: JobId) -> Result<()> {
        let url = self.url(&format!("/lissajous/{}", job_id));
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Check that the service is up
    pub async fn health(&self) -> Result<()> {
        let response = self.client.get(self.url("/health")).send().await?;

        self.handle_empty_response(response).await
    }
}
