//! Upload and download against the shared tree.
//!
//! Writers hold the tree's write lock from recording the leaf digest until the
//! rebuild finishes; readers hold the read lock while locating the leaf and
//! walking its proof. A reader therefore never sees a half-rebuilt tree.
//!
//! The write side of an upload runs as its own task, so dropping the caller's
//! future cannot leave a ledger entry without its leaf.

use std::sync::Arc;

use merkle::crypto::{self, Sha256Hasher};
use merkle::{
    CheckpointSigner, MerkleError, MerkleProof, MerkleTree, SignedCheckpoint, VerifyingKey,
};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::error::ServiceError;
use crate::persistence::Persistence;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Clone, Debug)]
pub struct UploadReceipt {
    pub position: usize,
    pub checkpoint: SignedCheckpoint,
}

#[derive(Clone, Debug)]
pub struct Download {
    pub content: Vec<u8>,
    pub proof: MerkleProof,
}

pub struct IntegrityService<P> {
    persistence: Arc<P>,
    tree: Arc<RwLock<MerkleTree>>,
    signer: Arc<CheckpointSigner>,
}

impl<P: Persistence + 'static> IntegrityService<P> {
    /// Rebuild the tree from the persisted digest ledger.
    pub async fn restore(persistence: P, signer: CheckpointSigner) -> Result<Self> {
        let digests = persistence.list_leaf_digests().await?;
        let tree = MerkleTree::from_digests(digests);

        match tree.root() {
            Ok(root) => info!(
                leaf_count = tree.leaf_count(),
                root = %hex::encode(root),
                "tree restored"
            ),
            Err(_) => info!("tree restored: empty"),
        }

        Ok(Self {
            persistence: Arc::new(persistence),
            tree: Arc::new(RwLock::new(tree)),
            signer: Arc::new(signer),
        })
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signer.verifying_key()
    }

    pub async fn upload(&self, name: &str, content: Vec<u8>) -> Result<UploadReceipt> {
        let commit = commit_upload(
            self.persistence.clone(),
            self.tree.clone(),
            self.signer.clone(),
            name.to_string(),
            content,
        );
        // a dropped JoinHandle leaves the task running to completion
        match tokio::spawn(commit).await {
            Ok(result) => result,
            Err(e) => Err(unauthenticated(name, format!("upload task failed: {e}"))),
        }
    }

    pub async fn download(&self, name: &str) -> Result<Download> {
        let content = self
            .persistence
            .fetch(name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(name.to_string()))?;

        let tree = self.tree.read().await;
        let position = match tree.position_of(&content) {
            Ok(p) => p,
            Err(MerkleError::NotFound) => {
                return Err(ServiceError::NotFoundInTree(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let proof = tree.generate_proof(position)?;
        drop(tree);

        info!(file = name, position, proof_len = proof.len(), "download served");
        Ok(Download { content, proof })
    }

    /// Signed snapshot of the current root
    pub async fn checkpoint(&self) -> Result<SignedCheckpoint> {
        let checkpoint = self.tree.read().await.checkpoint()?;
        Ok(self.signer.sign(checkpoint)?)
    }
}

async fn commit_upload<P: Persistence>(
    persistence: Arc<P>,
    tree: Arc<RwLock<MerkleTree>>,
    signer: Arc<CheckpointSigner>,
    name: String,
    content: Vec<u8>,
) -> Result<UploadReceipt> {
    let digest = crypto::hash_content::<Sha256Hasher>(&content);

    persistence.store(&name, &content).await?;

    let guard = tree.write_owned().await;

    // ledger first, so persisted order always matches tree order
    if let Err(e) = persistence.record_leaf_digest(&digest).await {
        error!(file = %name, digest = %hex::encode(digest), "leaf digest not recorded: {e}");
        return Err(ServiceError::Unauthenticated {
            name,
            reason: e.to_string(),
        });
    }

    let file = name.clone();
    let committed = tokio::task::spawn_blocking(move || {
        let mut tree = guard;
        let position = tree
            .append_digest(digest)
            .map_err(|e| unauthenticated(&file, e.to_string()))?;
        let checkpoint = tree
            .checkpoint()
            .map_err(|e| unauthenticated(&file, e.to_string()))?;
        // signed under the lock so the receipt names exactly this root
        let signed = signer.sign(checkpoint).map_err(|e| {
            error!(file = %file, position, "checkpoint not signed: {e}");
            ServiceError::Unsigned {
                name: file.clone(),
                position,
                reason: e.to_string(),
            }
        })?;
        Ok::<_, ServiceError>((position, signed))
    })
    .await;

    let (position, checkpoint) = match committed {
        Ok(result) => result?,
        Err(e) => return Err(unauthenticated(&name, format!("rebuild task failed: {e}"))),
    };

    info!(
        file = %name,
        position,
        leaf_count = checkpoint.checkpoint.leaf_count,
        root = %hex::encode(checkpoint.checkpoint.root),
        "upload committed"
    );

    Ok(UploadReceipt {
        position,
        checkpoint,
    })
}

fn unauthenticated(name: &str, reason: String) -> ServiceError {
    error!(file = name, "tree update failed after persisting content: {reason}");
    ServiceError::Unauthenticated {
        name: name.to_string(),
        reason,
    }
}
