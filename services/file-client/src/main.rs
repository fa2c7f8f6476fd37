mod client;
mod config;
mod error;

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::client::FileTransferClient;
use crate::config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: file-client <path>...");
    }

    let cfg = ClientConfig::from_env()?;
    if cfg.mirror_only() {
        warn!(
            "SERVER_PUBLIC_KEY not set: verifying against uploads from this run only; \
             downloads fail if the server holds any other files"
        );
    }
    let mut client = FileTransferClient::connect(&cfg).await?;

    let mut uploaded = Vec::with_capacity(paths.len());
    for path in &paths {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {path}"))?;
        let name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("No usable file name in {path}"))?
            .to_string();

        let receipt = client
            .upload(&name, &content)
            .await
            .with_context(|| format!("Upload failed: {name}"))?;
        info!(name = %name, position = receipt.position, "uploaded");
        uploaded.push((name, content));
    }

    if cfg.server_key.is_some() {
        client.refresh_trusted_root().await.context("Checkpoint refresh failed")?;
    }
    if let Some(root) = client.trusted_root() {
        info!(root = %hex::encode(root), "trusted root");
    }

    for (name, original) in &uploaded {
        let content = client
            .download(name)
            .await
            .with_context(|| format!("Download failed: {name}"))?;
        if &content != original {
            // verified against our root but not what we sent: a later upload reused the name
            info!(name = %name, "downloaded content differs from the local copy");
        }
        info!(name = %name, bytes = content.len(), "downloaded and verified");
    }

    Ok(())
}
