//! Concurrent download of finished resources.
//!
//! Output names are reserved serially by probing the directory before any
//! worker starts, so workers never contend for a file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::transport::{HttpRequest, Transport};

/// What a resource is, which decides its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Image => "png",
            Self::Video => "mp4",
        }
    }
}

/// Reserve `count` free `{index}.{ext}` paths in `dir`, skipping indices
/// that already exist.
pub async fn reserve_paths(
    dir: &Path,
    kind: MediaKind,
    count: usize,
) -> Result<Vec<PathBuf>, ClientError> {
    let mut paths = Vec::with_capacity(count);
    let mut index: u64 = 0;

    while paths.len() < count {
        let candidate = dir.join(format!("{index}.{}", kind.extension()));
        if !tokio::fs::try_exists(&candidate).await? {
            paths.push(candidate);
        }
        index += 1;
    }
    Ok(paths)
}

/// Download every URL into `dir`, at most `concurrency` at a time.
///
/// All workers are joined before returning. Paths come back in URL order;
/// if any download failed the first failure is returned instead.
pub async fn download_all(
    transport: Arc<dyn Transport>,
    urls: &[String],
    dir: &Path,
    kind: MediaKind,
    concurrency: usize,
    cancel: CancellationToken,
) -> Result<Vec<PathBuf>, ClientError> {
    tokio::fs::create_dir_all(dir).await?;
    let paths = reserve_paths(dir, kind, urls.len()).await?;

    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut workers = JoinSet::new();

    for (url, path) in urls.iter().cloned().zip(paths.iter().cloned()) {
        let transport = transport.clone();
        let permits = permits.clone();
        let cancel = cancel.clone();

        workers.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ClientError::Download(e.to_string()))?;

            let response = tokio::select! {
                response = transport.send(HttpRequest::get(&url)) => response?,
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            };
            if !response.is_success() {
                return Err(ClientError::Download(format!(
                    "{url}: HTTP {}",
                    response.status
                )));
            }

            tokio::fs::write(&path, &response.body).await?;
            debug!(url = %url, path = %path.display(), bytes = response.body.len(), "Saved");
            Ok(())
        });
    }

    let mut first_error = None;
    while let Some(joined) = workers.join_next().await {
        let outcome = joined.map_err(|e| ClientError::Download(e.to_string()));
        if let Err(err) = outcome.and_then(|r| r) {
            warn!(error = %err, "Download failed");
            first_error.get_or_insert(err);
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    info!(count = paths.len(), dir = %dir.display(), "Downloads complete");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{temp_path, MockTransport};

    #[tokio::test]
    async fn test_reserve_skips_existing() {
        let dir = temp_path("reserve");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("0.png"), b"x").await.unwrap();
        tokio::fs::write(dir.join("2.png"), b"x").await.unwrap();
        tokio::fs::write(dir.join("1.mp4"), b"x").await.unwrap();

        let images = reserve_paths(&dir, MediaKind::Image, 3).await.unwrap();
        assert_eq!(
            images,
            vec![dir.join("1.png"), dir.join("3.png"), dir.join("4.png")]
        );

        let videos = reserve_paths(&dir, MediaKind::Video, 2).await.unwrap();
        assert_eq!(videos, vec![dir.join("0.mp4"), dir.join("2.mp4")]);
    }

    #[tokio::test]
    async fn test_download_all_writes_files() {
        let dir = temp_path("out");
        let mock = Arc::new(MockTransport::new());
        for _ in 0..3 {
            mock.push_bytes(200, b"media".to_vec());
        }
        let urls: Vec<String> = (0..3).map(|i| format!("https://cdn/{i}.png")).collect();

        let paths = download_all(
            mock.clone(),
            &urls,
            &dir,
            MediaKind::Image,
            2,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(paths, vec![dir.join("0.png"), dir.join("1.png"), dir.join("2.png")]);
        for path in &paths {
            assert_eq!(tokio::fs::read(path).await.unwrap(), b"media");
        }
        let mut requested = mock.urls();
        requested.sort();
        assert_eq!(requested, urls);
    }

    #[tokio::test]
    async fn test_download_failure_after_join() {
        let dir = temp_path("fail");
        let mock = Arc::new(MockTransport::new());
        mock.push_bytes(404, Vec::new()).push_bytes(404, Vec::new());
        let urls = vec!["https://cdn/a.mp4".to_string(), "https://cdn/b.mp4".to_string()];

        let err = download_all(
            mock.clone(),
            &urls,
            &dir,
            MediaKind::Video,
            1,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Download(ref m) if m.contains("HTTP 404")));
        assert_eq!(mock.requests().len(), 2);
    }
}
