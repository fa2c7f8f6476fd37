use merkle::wire::WireError;
use merkle::MerkleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach server after {attempts} attempts")]
    Connect { attempts: u32 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status} ({code}): {message}")]
    Server {
        status: u16,
        code: String,
        message: String,
    },

    #[error("malformed response: {0}")]
    Wire(#[from] WireError),

    #[error("no trusted root yet; upload a file or refresh from a signed checkpoint first")]
    NoTrustedRoot,

    /// Proof did not reproduce the trusted root. Never retried.
    #[error("integrity check failed for {name}")]
    IntegrityViolation { name: String },

    #[error("checkpoint not trusted: {0}")]
    UntrustedCheckpoint(String),

    #[error(transparent)]
    Tree(#[from] MerkleError),

    #[error("invalid server address: {0}")]
    Address(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
