//! Model artifact provisioning.
//!
//! The artifact is fetched at most once: if `MODEL_PATH` already holds a
//! non-empty file it is used as-is, otherwise it is downloaded from
//! `MODEL_URL` into a `.part` sibling and renamed into place, so a crash
//! mid-download never leaves a truncated model behind.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use tracing::{debug, info};

// ---

/// Make sure the artifact exists at `path`, downloading it from `url` if needed.
pub async fn ensure_artifact(path: &Path, url: Option<&str>) -> Result<()> {
    ensure_artifact_with(&reqwest::Client::new(), path, url).await
}

async fn ensure_artifact_with(
    client: &reqwest::Client,
    path: &Path,
    url: Option<&str>,
) -> Result<()> {
    // ---
    if is_present(path).await {
        debug!("Model artifact present at {:?}, skipping download", path);
        return Ok(());
    }

    let Some(url) = url else {
        bail!(
            "Model artifact {:?} not found and MODEL_URL is not set",
            path
        );
    };

    info!("Downloading model artifact to {:?}", path);
    let bytes = download(client, url).await?;
    if bytes.is_empty() {
        bail!("Model download returned an empty body");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow!("Failed to create model directory {:?}: {}", parent, e))?;
    }

    let partial = partial_path(path);
    tokio::fs::write(&partial, &bytes)
        .await
        .map_err(|e| anyhow!("Failed to write {:?}: {}", partial, e))?;
    tokio::fs::rename(&partial, path)
        .await
        .map_err(|e| anyhow!("Failed to move {:?} into place: {}", partial, e))?;

    info!("Model artifact saved ({} bytes)", bytes.len());
    Ok(())
}

async fn is_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    // ---
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to fetch model artifact: {}", e))?
        .error_for_status()
        .map_err(|e| anyhow!("Model artifact request rejected: {}", e))?;

    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
