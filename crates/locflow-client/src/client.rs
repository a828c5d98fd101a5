use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use locflow_domain::{
    BatchDownloadRequest, BatchDownloadResponse, EnqueueRequest, EnqueueResponse, SetupRequest,
    SetupResponse, StatusRequest, StatusResponse, UploadFilePayload, UploadResponse,
};

use crate::error::ApiError;
use crate::retry::{with_retries, RetryConfig};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Returns the standard locflow User-Agent string, e.g. `locflow/0.3.1`.
pub fn user_agent() -> String {
    format!("locflow/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_base: String,
    pub project_id: String,
    pub api_key: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl ClientOptions {
    pub fn new(
        api_base: impl Into<String>,
        project_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        ClientOptions {
            api_base: api_base.into(),
            project_id: project_id.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

/// Typed, timeout-bounded transport to the translation service. Constructed
/// once and passed by reference; there is no ambient/global client.
pub struct ApiClient {
    http: Client,
    api_base: String,
    project_id: String,
    api_key: String,
    retry: RetryConfig,
}

impl ApiClient {
    pub fn new(opts: ClientOptions) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(user_agent())
            .timeout(opts.timeout)
            .build()?;
        Ok(ApiClient {
            http,
            api_base: opts.api_base.trim_end_matches('/').to_string(),
            project_id: opts.project_id,
            api_key: opts.api_key,
            retry: opts.retry,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/projects/{}/{}",
            self.api_base, self.project_id, path
        )
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        with_retries(&self.retry, || {
            debug!(%url, "POST");
            let request = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body);
            async move {
                let resp = request.send().await?;
                let status = resp.status();
                if !status.is_success() {
                    let message = resp.text().await.unwrap_or_default();
                    return Err(ApiError::Status {
                        status: status.as_u16(),
                        message,
                    });
                }
                let bytes = resp.bytes().await?;
                serde_json::from_slice::<T>(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
            }
        })
        .await
    }

    /// Register source files with the service; the response assigns
    /// server-side file entities.
    pub async fn upload_files(
        &self,
        files: &[UploadFilePayload],
    ) -> Result<UploadResponse, ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            files: &'a [UploadFilePayload],
        }
        self.post_json("files/upload", &Body { files }).await
    }

    pub async fn setup_project(&self, req: &SetupRequest) -> Result<SetupResponse, ApiError> {
        self.post_json("setup", req).await
    }

    pub async fn enqueue(&self, req: &EnqueueRequest) -> Result<EnqueueResponse, ApiError> {
        self.post_json("jobs/enqueue", req).await
    }

    pub async fn job_status(&self, req: &StatusRequest) -> Result<StatusResponse, ApiError> {
        self.post_json("jobs/status", req).await
    }

    /// Fetch translated file contents in one batch call. The response may be
    /// a subset of the request; missing entries are the caller's problem to
    /// classify.
    pub async fn download_batch(
        &self,
        req: &BatchDownloadRequest,
    ) -> Result<BatchDownloadResponse, ApiError> {
        self.post_json("files/download", req).await
    }
}
