//! Chunked image upload.
//!
//! Turns a local image into a hosted URL usable as a job input:
//! issue token, resume, upload one fragment, complete, verify. Steps are
//! strictly sequential and the first failure aborts the upload. The whole
//! file goes up as fragment 0.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::Endpoints;
use crate::error::{ClientError, UploadStep};
use crate::transport::{HttpRequest, Transport};
use crate::wire::{Envelope, TokenData, UploadResult, VerifyData};

/// Upload a local image and return its hosted URL.
pub async fn upload_image(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    path: &Path,
) -> Result<String, ClientError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            ClientError::upload(
                UploadStep::IssueToken,
                format!("{} has no file name", path.display()),
            )
        })?;
    let data = tokio::fs::read(path).await?;

    info!(file = %file_name, bytes = data.len(), "Uploading image");

    let issued: Envelope<TokenData> = call(
        transport,
        UploadStep::IssueToken,
        HttpRequest::get(endpoints.upload_token()).query("filename", file_name),
    )
    .await?;
    let token = match issued {
        Envelope {
            status: Some(200),
            data: Some(TokenData { token }),
            ..
        } => token,
        other => {
            return Err(ClientError::upload(
                UploadStep::IssueToken,
                format!("status {:?}: {}", other.status, other.message.unwrap_or_default()),
            ))
        }
    };

    expect_result_one(
        transport,
        UploadStep::Resume,
        HttpRequest::get(endpoints.upload_resume()).query("upload_token", &token),
    )
    .await?;

    expect_result_one(
        transport,
        UploadStep::Fragment,
        HttpRequest::post(endpoints.upload_fragment())
            .query("upload_token", &token)
            .query("fragment_id", 0)
            .bytes(data, "application/octet-stream"),
    )
    .await?;

    expect_result_one(
        transport,
        UploadStep::Complete,
        HttpRequest::post(endpoints.upload_complete())
            .query("upload_token", &token)
            .query("fragment_count", 1),
    )
    .await?;

    let verified: Envelope<VerifyData> = call(
        transport,
        UploadStep::Verify,
        HttpRequest::get(endpoints.upload_verify()).query("token", &token),
    )
    .await?;
    match verified {
        Envelope {
            status: Some(200),
            data: Some(VerifyData { url }),
            ..
        } => {
            info!(url = %url, "Image uploaded");
            Ok(url)
        }
        other => Err(ClientError::upload(
            UploadStep::Verify,
            format!("status {:?}: {}", other.status, other.message.unwrap_or_default()),
        )),
    }
}

/// Send one step's request and decode its body.
/// Any failure is reported as a failure of `step`.
async fn call<T: DeserializeOwned>(
    transport: &dyn Transport,
    step: UploadStep,
    request: HttpRequest,
) -> Result<T, ClientError> {
    debug!(step = ?step, url = %request.url, "Upload step");

    let response = transport
        .send(request)
        .await
        .map_err(|e| ClientError::upload(step, e.to_string()))?;
    let response = response
        .error_for_status()
        .map_err(|e| ClientError::upload(step, e.to_string()))?;
    response
        .json()
        .map_err(|e| ClientError::upload(step, e.to_string()))
}

async fn expect_result_one(
    transport: &dyn Transport,
    step: UploadStep,
    request: HttpRequest,
) -> Result<(), ClientError> {
    let reply: UploadResult = call(transport, step, request).await?;
    match reply.result {
        Some(1) => Ok(()),
        other => Err(ClientError::upload(step, format!("result {other:?}"))),
    }
}
