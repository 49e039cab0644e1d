use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    /// Secure entropy source unreachable or exhausted. Fatal.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// Scalar is zero or >= the secp256k1 curve order.
    #[error("invalid private key: scalar out of range")]
    InvalidKey,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hit log write failed after all retries. Fatal: a lost positive
    /// match is the one unacceptable outcome.
    #[error("hit log write failed after {attempts} attempts: {source}")]
    LogWrite {
        attempts: u32,
        source: std::io::Error,
    },

    /// Client asked for more keys than the service ceiling allows.
    #[error("batch size too large: requested {requested}, maximum is {max}")]
    BatchTooLarge { requested: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, SweepError>;
