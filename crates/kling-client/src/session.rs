//! Authenticated session against one account.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use kling_core::{CookieJar, JobKind, JobPayload, Quality, Region, TaskHandle, TaskId};

use crate::account::{daily_bonus_request, read_points};
use crate::config::{random_user_agent, ClientConfig, Endpoints, PollPolicy};
use crate::download::{download_all, MediaKind};
use crate::error::ClientError;
use crate::extend::extension_payload;
use crate::poll::TaskPoller;
use crate::submit::submit_job;
use crate::transport::{ReqwestTransport, Transport};
use crate::upload::upload_image;

/// A conditioning image: a local file to upload, or an already hosted URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
}

impl ImageSource {
    /// Choose between a path and a URL. The path wins if both are given;
    /// empty strings count as absent.
    pub fn pick(path: Option<&str>, url: Option<&str>) -> Option<Self> {
        match (path.filter(|p| !p.is_empty()), url.filter(|u| !u.is_empty())) {
            (Some(path), _) => Some(Self::Path(PathBuf::from(path))),
            (None, Some(url)) => Some(Self::Url(url.to_string())),
            (None, None) => None,
        }
    }
}

/// Outcome of one generation.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The task that was created. Keep it to extend a video later.
    pub task: TaskHandle,

    /// Downloadable URLs. Empty when the service produced no media.
    pub resources: Vec<String>,
}

impl Generation {
    /// True when the task ended without media.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// One authenticated account on its resolved region.
///
/// Construction claims the daily login bonus, which is also the only check
/// that the cookie is valid.
pub struct Session {
    transport: Arc<dyn Transport>,
    region: Region,
    endpoints: Endpoints,
    user_agent: String,
    config: ClientConfig,
    cancel: CancellationToken,
}

impl Session {
    /// Parse the cookie, resolve the region and pass the daily-bonus gate.
    pub async fn connect(cookie: &str, config: ClientConfig) -> Result<Self, ClientError> {
        let jar = CookieJar::parse(cookie)?;
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(random_user_agent);
        let transport = ReqwestTransport::new(&jar, &user_agent)?;

        Self::establish(Arc::new(transport), jar.region(), user_agent, config).await
    }

    /// Build a session over an existing transport and pass the daily-bonus gate.
    pub async fn establish(
        transport: Arc<dyn Transport>,
        region: Region,
        user_agent: String,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let endpoints = config
            .endpoints
            .clone()
            .unwrap_or_else(|| Endpoints::for_region(region));

        let session = Self {
            transport,
            region,
            endpoints,
            user_agent,
            config,
            cancel: CancellationToken::new(),
        };
        session.daily_bonus_gate().await?;
        Ok(session)
    }

    async fn daily_bonus_gate(&self) -> Result<(), ClientError> {
        let response = self
            .transport
            .send(daily_bonus_request(&self.endpoints))
            .await
            .map_err(|e| ClientError::Authentication {
                region: self.region,
                body: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(ClientError::Authentication {
                region: self.region,
                body: response.text(),
            });
        }

        info!(region = %self.region, body = %response.text(), "Daily login bonus claimed");
        Ok(())
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token that aborts any wait of this session when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Turn an image source into a hosted URL, uploading if needed.
    pub async fn resolve_image(&self, source: &ImageSource) -> Result<String, ClientError> {
        match source {
            ImageSource::Path(path) => {
                upload_image(self.transport.as_ref(), &self.endpoints, path).await
            }
            ImageSource::Url(url) => Ok(url.clone()),
        }
    }

    /// Generate images from a prompt, optionally conditioned on an image.
    pub async fn generate_images(
        &self,
        prompt: &str,
        image: Option<&ImageSource>,
    ) -> Result<Generation, ClientError> {
        let kind = match image {
            Some(_) => JobKind::ImageToImage,
            None => JobKind::TextToImage,
        };
        self.generate(kind, prompt, image, Quality::Standard).await
    }

    /// Generate a video from a prompt, optionally starting from an image.
    pub async fn generate_video(
        &self,
        prompt: &str,
        image: Option<&ImageSource>,
        quality: Quality,
    ) -> Result<Generation, ClientError> {
        let kind = match image {
            Some(_) => JobKind::ImageToVideo,
            None => JobKind::TextToVideo,
        };
        self.generate(kind, prompt, image, quality).await
    }

    async fn generate(
        &self,
        kind: JobKind,
        prompt: &str,
        image: Option<&ImageSource>,
        quality: Quality,
    ) -> Result<Generation, ClientError> {
        let image_url = match image {
            Some(source) => Some(self.resolve_image(source).await?),
            None => None,
        };
        let payload = JobPayload::build(kind, prompt, image_url.as_deref(), quality)?;
        self.run(&payload, self.config.poll_policy(kind)).await
    }

    /// Extend the video of a completed task.
    pub async fn extend_video(&self, source: &TaskId) -> Result<Generation, ClientError> {
        let payload = extension_payload(self.transport.as_ref(), &self.endpoints, source).await?;
        self.run(&payload, self.config.poll_policy(JobKind::VideoExtend))
            .await
    }

    /// Submit a payload and wait for its resources.
    pub async fn run(
        &self,
        payload: &JobPayload,
        policy: PollPolicy,
    ) -> Result<Generation, ClientError> {
        let task = submit_job(self.transport.as_ref(), &self.endpoints, payload).await?;

        let resources = TaskPoller::new(self.transport.as_ref(), &self.endpoints, policy)
            .with_resource_grace(self.config.resource_grace)
            .with_cancellation(self.cancel.clone())
            .wait_for_resources(&task.id)
            .await?;

        if resources.is_empty() {
            warn!(task_id = %task.id, "No media produced");
        }
        Ok(Generation { task, resources })
    }

    /// Current point balance. Re-claims the daily bonus first.
    pub async fn account_points(&self) -> Result<f64, ClientError> {
        read_points(self.transport.as_ref(), &self.endpoints).await
    }

    /// Save resources under `dir` as `{index}.png` or `{index}.mp4`.
    pub async fn download(
        &self,
        resources: &[String],
        dir: &Path,
        kind: MediaKind,
    ) -> Result<Vec<PathBuf>, ClientError> {
        download_all(
            self.transport.clone(),
            resources,
            dir,
            kind,
            self.config.download_concurrency,
            self.cancel.clone(),
        )
        .await
    }
}
