use merkle::wire::{CheckpointBody, DownloadResponse, ErrorBody, UploadRequest, UploadResponse};
use merkle::{verify_proof, Checkpoint, Hash32, MerkleTree, VerifyingKey};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// HTTP client that checks every download against a root it trusts.
///
/// Without a pinned server key the trusted root comes from a local mirror of
/// this client's own uploads. With one, it comes from signed checkpoints.
pub struct FileTransferClient {
    http: reqwest::Client,
    base: Url,
    mirror: MerkleTree,
    trusted_root: Option<Hash32>,
    server_key: Option<VerifyingKey>,
}

impl FileTransferClient {
    pub async fn connect(cfg: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(cfg.request_timeout).build()?;
        let base = Url::parse(&cfg.server_addr).map_err(|e| ClientError::Address(e.to_string()))?;
        let client = Self {
            http,
            base,
            mirror: MerkleTree::new(),
            trusted_root: None,
            server_key: cfg.server_key,
        };

        let attempts = cfg.connect_retries;
        for attempt in 1..=attempts {
            let probe = client
                .http
                .get(client.url(&["health"])?)
                .send()
                .await
                .and_then(Response::error_for_status);
            match probe {
                Ok(_) => {
                    info!(server = %client.base, "Successfully connected to server");
                    return Ok(client);
                }
                Err(e) => {
                    warn!(attempt, attempts, "Failed to connect, retrying: {e}");
                    if attempt < attempts {
                        sleep(cfg.retry_interval).await;
                    }
                }
            }
        }
        Err(ClientError::Connect { attempts })
    }

    pub fn trusted_root(&self) -> Option<Hash32> {
        self.trusted_root
    }

    pub async fn upload(&mut self, name: &str, content: &[u8]) -> Result<UploadResponse> {
        info!(file = name, bytes = content.len(), "Uploading file");
        let request = UploadRequest {
            name: name.to_string(),
            content: content.to_vec(),
        };
        let resp = self.http.post(self.url(&["files"])?).json(&request).send().await?;
        let body: UploadResponse = read_json(resp).await?;
        if !body.success {
            return Err(ClientError::Server {
                status: 200,
                code: "upload_rejected".into(),
                message: format!("server did not accept {name}"),
            });
        }

        self.mirror.append(content)?;
        let root = match &self.server_key {
            Some(key) => verify_checkpoint(&body.checkpoint, key)?.root,
            None => self.mirror.root()?,
        };
        self.trusted_root = Some(root);
        Ok(body)
    }

    /// Adopt the server's current root after checking its signature against the pinned key.
    pub async fn refresh_trusted_root(&mut self) -> Result<Checkpoint> {
        let key = self
            .server_key
            .ok_or_else(|| ClientError::UntrustedCheckpoint("no pinned server key".into()))?;
        let resp = self.http.get(self.url(&["checkpoint"])?).send().await?;
        let body: CheckpointBody = read_json(resp).await?;

        let checkpoint = verify_checkpoint(&body, &key)?;
        self.trusted_root = Some(checkpoint.root);
        info!(
            leaf_count = checkpoint.leaf_count,
            root = %hex::encode(checkpoint.root),
            "trusted root refreshed"
        );
        Ok(checkpoint)
    }

    /// Fetch a file and return its bytes only if the proof reproduces the trusted root.
    pub async fn download(&self, name: &str) -> Result<Vec<u8>> {
        let trusted = self.trusted_root.ok_or(ClientError::NoTrustedRoot)?;
        let resp = self.http.get(self.url(&["files", name])?).send().await?;
        let body: DownloadResponse = read_json(resp).await?;

        check_download(&body, &trusted)?;
        Ok(body.content)
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Address(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

pub fn check_download(body: &DownloadResponse, trusted_root: &Hash32) -> Result<()> {
    let proof = body.proof()?;
    if !verify_proof(&body.content, &proof, trusted_root) {
        error!(
            file = %body.name,
            trusted_root = %hex::encode(trusted_root),
            "File integrity check failed"
        );
        return Err(ClientError::IntegrityViolation {
            name: body.name.clone(),
        });
    }
    Ok(())
}

pub fn verify_checkpoint(body: &CheckpointBody, key: &VerifyingKey) -> Result<Checkpoint> {
    let signed = body.to_signed()?;
    if !signed.verify(key) {
        return Err(ClientError::UntrustedCheckpoint(
            "signature does not match the pinned server key".into(),
        ));
    }
    Ok(signed.checkpoint)
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }
    let text = resp.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(e) => (e.code, e.error),
        Err(_) => ("unknown".to_string(), text),
    };
    Err(ClientError::Server {
        status: status.as_u16(),
        code,
        message,
    })
}
