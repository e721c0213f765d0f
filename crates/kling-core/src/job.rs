//! Job payloads submitted to the task endpoint.
//!
//! Every job kind has a fixed, ordered argument schema. The service reads the
//! arguments by name but still expects them in this order, so payloads are
//! only ever built through the constructors below.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::WorkId;

/// Camera settings sent with every video job: no camera movement.
pub const STATIC_CAMERA_JSON: &str =
    r#"{"type":"empty","horizontal":0,"vertical":0,"zoom":0,"tilt":0,"pan":0,"roll":0}"#;

/// Business tag the web client attaches to all jobs.
pub const BIZ: &str = "klingai";

/// Argument names that carry the source job's metadata on an extension.
pub const INITIAL_TYPE_ARG: &str = "__initialType";
/// See [`INITIAL_TYPE_ARG`].
pub const INITIAL_PROMPT_ARG: &str = "__initialPrompt";

/// The five kinds of generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    TextToImage,
    ImageToImage,
    TextToVideo,
    ImageToVideo,
    VideoExtend,
}

/// Model quality tier. Only the prompt/image video kinds distinguish it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    #[default]
    Standard,
    High,
}

impl JobKind {
    /// The service's model type tag for this kind.
    pub fn type_tag(&self, quality: Quality) -> &'static str {
        match (self, quality) {
            (Self::TextToImage, _) => "mmu_txt2img_aiweb",
            (Self::ImageToImage, _) => "mmu_img2img_aiweb",
            (Self::TextToVideo, Quality::Standard) => "m2v_txt2video",
            (Self::TextToVideo, Quality::High) => "m2v_txt2video_hq",
            (Self::ImageToVideo, Quality::Standard) => "m2v_img2video",
            (Self::ImageToVideo, Quality::High) => "m2v_img2video_hq",
            (Self::VideoExtend, _) => "m2v_extend_video",
        }
    }

    /// Map a type tag reported back by the service to its kind.
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "mmu_txt2img_aiweb" => Some(Self::TextToImage),
            "mmu_img2img_aiweb" => Some(Self::ImageToImage),
            "m2v_txt2video" | "m2v_txt2video_hq" => Some(Self::TextToVideo),
            "m2v_img2video" | "m2v_img2video_hq" => Some(Self::ImageToVideo),
            "m2v_extend_video" => Some(Self::VideoExtend),
            _ => None,
        }
    }

    /// Returns true if the kind produces video.
    pub fn is_video(&self) -> bool {
        matches!(
            self,
            Self::TextToVideo | Self::ImageToVideo | Self::VideoExtend
        )
    }
}

/// One named job argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: String,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A conditioning input. The service only accepts URL inputs from this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    /// Always `"URL"`.
    pub input_type: String,
    pub url: String,
    /// Always `"input"`.
    pub name: String,
    /// Work being continued, for extension jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_work_id: Option<WorkId>,
}

impl JobInput {
    /// A plain URL input.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            input_type: "URL".to_string(),
            url: url.into(),
            name: "input".to_string(),
            from_work_id: None,
        }
    }

    /// A URL input that continues an existing work.
    pub fn from_work(url: impl Into<String>, work_id: WorkId) -> Self {
        Self {
            from_work_id: Some(work_id),
            ..Self::url(url)
        }
    }
}

/// Body of a task submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    /// Model type tag, see [`JobKind::type_tag`].
    #[serde(rename = "type")]
    pub job_type: String,
    pub arguments: Vec<Argument>,
    pub inputs: Vec<JobInput>,
}

impl JobPayload {
    /// Text to image: four square images in the default style.
    pub fn text_to_image(prompt: &str) -> Self {
        Self {
            job_type: JobKind::TextToImage.type_tag(Quality::Standard).to_string(),
            arguments: vec![
                Argument::new("prompt", prompt),
                Argument::new("style", "默认"),
                Argument::new("aspect_ratio", "1:1"),
                Argument::new("imageCount", "4"),
                Argument::new("biz", BIZ),
            ],
            inputs: Vec::new(),
        }
    }

    /// Image to image, conditioned on an already hosted image.
    pub fn image_to_image(prompt: &str, image_url: &str) -> Self {
        Self {
            job_type: JobKind::ImageToImage.type_tag(Quality::Standard).to_string(),
            arguments: vec![
                Argument::new("prompt", prompt),
                Argument::new("style", "默认"),
                Argument::new("aspect_ratio", "1:1"),
                Argument::new("imageCount", "4"),
                Argument::new("fidelity", "0.5"),
                Argument::new("biz", BIZ),
            ],
            inputs: vec![JobInput::url(image_url)],
        }
    }

    /// Text to a five second 16:9 video.
    pub fn text_to_video(prompt: &str, quality: Quality) -> Self {
        Self {
            job_type: JobKind::TextToVideo.type_tag(quality).to_string(),
            arguments: vec![
                Argument::new("prompt", prompt),
                Argument::new("negative_prompt", ""),
                Argument::new("cfg", "0.5"),
                Argument::new("duration", "5"),
                Argument::new("aspect_ratio", "16:9"),
                Argument::new("camera_json", STATIC_CAMERA_JSON),
                Argument::new("biz", BIZ),
            ],
            inputs: Vec::new(),
        }
    }

    /// Image to video. The aspect ratio follows the image.
    pub fn image_to_video(prompt: &str, image_url: &str, quality: Quality) -> Self {
        Self {
            job_type: JobKind::ImageToVideo.type_tag(quality).to_string(),
            arguments: vec![
                Argument::new("prompt", prompt),
                Argument::new("negative_prompt", ""),
                Argument::new("cfg", "0.5"),
                Argument::new("duration", "5"),
                Argument::new("tail_image_enabled", "false"),
                Argument::new("camera_json", STATIC_CAMERA_JSON),
                Argument::new("biz", BIZ),
            ],
            inputs: vec![JobInput::url(image_url)],
        }
    }

    /// Continue a finished video work.
    ///
    /// `initial_type` and `initial_prompt` are the type tag and prompt the
    /// source work was created with.
    pub fn video_extend(
        source_url: &str,
        source_work: WorkId,
        initial_type: &str,
        initial_prompt: &str,
    ) -> Self {
        Self {
            job_type: JobKind::VideoExtend.type_tag(Quality::Standard).to_string(),
            arguments: vec![
                Argument::new("prompt", ""),
                Argument::new("negative_prompt", ""),
                Argument::new("cfg", "0.5"),
                Argument::new("biz", BIZ),
                Argument::new(INITIAL_TYPE_ARG, initial_type),
                Argument::new(INITIAL_PROMPT_ARG, initial_prompt),
            ],
            inputs: vec![JobInput::from_work(source_url, source_work)],
        }
    }

    /// Build the payload for `kind`. Image-conditioned kinds require
    /// `image_url`; prompt-only kinds refuse one.
    pub fn build(
        kind: JobKind,
        prompt: &str,
        image_url: Option<&str>,
        quality: Quality,
    ) -> Result<Self, CoreError> {
        match (kind, image_url) {
            (JobKind::TextToImage, None) => Ok(Self::text_to_image(prompt)),
            (JobKind::ImageToImage, Some(url)) => Ok(Self::image_to_image(prompt, url)),
            (JobKind::TextToVideo, None) => Ok(Self::text_to_video(prompt, quality)),
            (JobKind::ImageToVideo, Some(url)) => Ok(Self::image_to_video(prompt, url, quality)),
            (JobKind::VideoExtend, _) => Err(CoreError::InvalidInput(
                "extension jobs are built from a source work".to_string(),
            )),
            (kind, Some(_)) => Err(CoreError::InvalidInput(format!(
                "{kind:?} does not take an image"
            ))),
            (kind, None) => Err(CoreError::InvalidInput(format!(
                "{kind:?} requires an image"
            ))),
        }
    }

    /// Look up an argument value by name.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Kind of this payload, if the type tag is known.
    pub fn kind(&self) -> Option<JobKind> {
        JobKind::from_type_tag(&self.job_type)
    }
}
