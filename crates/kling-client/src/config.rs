//! Client configuration and regional endpoints.

use std::time::Duration;

use rand::seq::SliceRandom;

use kling_core::{JobKind, Region};

/// Browser identities a session may present. One is picked per session.
const EDGE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36 Edg/125.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36 Edg/125.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Pick a random browser user agent.
pub fn random_user_agent() -> String {
    EDGE_USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(EDGE_USER_AGENTS[0])
        .to_string()
}

/// Host pair for one deployment of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Main API host, with trailing slash.
    pub base_url: String,
    /// Upload host used for resume/fragment/complete, with trailing slash.
    pub upload_url: String,
}

impl Endpoints {
    /// Create endpoints from two hosts. A trailing slash is added if missing.
    pub fn new(base_url: &str, upload_url: &str) -> Self {
        Self {
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            upload_url: format!("{}/", upload_url.trim_end_matches('/')),
        }
    }

    /// Production hosts of a region.
    pub fn for_region(region: Region) -> Self {
        match region {
            Region::China => Self::new(
                "https://klingai.kuaishou.com/",
                "https://upload.kuaishouzt.com/",
            ),
            Region::International => {
                Self::new("https://klingai.com/", "https://upload.uvfuns.com/")
            }
        }
    }

    /// Daily login reward claim. Expects `activity=login_bonus_daily`.
    pub fn daily_bonus(&self) -> String {
        format!("{}api/pay/reward", self.base_url)
    }

    pub fn account_point(&self) -> String {
        format!("{}api/account/point", self.base_url)
    }

    pub fn task_submit(&self) -> String {
        format!("{}api/task/submit", self.base_url)
    }

    /// Task status. Expects `taskId`.
    pub fn task_status(&self) -> String {
        format!("{}api/task/status", self.base_url)
    }

    /// Upload token issue. Expects `filename`.
    pub fn upload_token(&self) -> String {
        format!("{}api/upload/issue/token", self.base_url)
    }

    /// Expects `upload_token`.
    pub fn upload_resume(&self) -> String {
        format!("{}api/upload/resume", self.upload_url)
    }

    /// Expects `upload_token` and `fragment_id`.
    pub fn upload_fragment(&self) -> String {
        format!("{}api/upload/fragment", self.upload_url)
    }

    /// Expects `upload_token` and `fragment_count`.
    pub fn upload_complete(&self) -> String {
        format!("{}api/upload/complete", self.upload_url)
    }

    /// Hosted URL lookup. Expects `token`.
    pub fn upload_verify(&self) -> String {
        format!("{}api/upload/verify/token", self.base_url)
    }
}

/// How long and how often to poll a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Give up after this much wall-clock time since the first poll.
    pub max_wait: Duration,
    /// Delay between polls while the task is pending.
    pub interval: Duration,
}

impl PollPolicy {
    /// Image jobs finish quickly; poll every 2s.
    pub fn images() -> Self {
        Self {
            max_wait: Duration::from_secs(1200),
            interval: Duration::from_secs(2),
        }
    }

    /// Video jobs take minutes; poll every 5s.
    pub fn videos() -> Self {
        Self {
            max_wait: Duration::from_secs(1200),
            interval: Duration::from_secs(5),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Override the region's production hosts.
    pub endpoints: Option<Endpoints>,

    /// Fixed user agent instead of a random one.
    pub user_agent: Option<String>,

    /// Polling for image jobs.
    pub image_poll: PollPolicy,

    /// Polling for video jobs, extensions included.
    pub video_poll: PollPolicy,

    /// Pause before handing out each finished resource, giving the CDN time
    /// to publish the file. Zero disables it.
    pub resource_grace: Duration,

    /// Maximum parallel downloads.
    pub download_concurrency: usize,
}

impl ClientConfig {
    /// Poll policy for a job kind.
    pub fn poll_policy(&self, kind: JobKind) -> PollPolicy {
        if kind.is_video() {
            self.video_poll
        } else {
            self.image_poll
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: None,
            user_agent: None,
            image_poll: PollPolicy::images(),
            video_poll: PollPolicy::videos(),
            resource_grace: Duration::from_secs(1),
            download_concurrency: 4,
        }
    }
}
