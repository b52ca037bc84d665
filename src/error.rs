//! Typed errors for the cross-chain bridge boundary

use thiserror::Error;

/// Errors surfaced by codecs, adapters, and the orchestrator.
///
/// Token absence on a given ledger is never an error: queries report it as
/// `Ok(None)`. Mutating adapter operations fold remote failures into
/// `TransferResult::status` instead of returning `Err`, so only the
/// categories below cross the API boundary.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// RPC endpoint unreachable or timed out. Retryable by the caller.
    #[error("transport error: {0}")]
    Transport(String),

    /// Chain id is not present in the injected chain registry. Raised before
    /// any network call; user-correctable.
    #[error("unsupported destination chain: {0}")]
    UnsupportedDestination(u64),

    /// Codec decode hit a byte-length or tuple-shape mismatch. Fatal: this
    /// signals a protocol-version mismatch and is never silently coerced.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Instruction discriminant outside the known set.
    #[error("unknown instruction type: {0}")]
    UnknownInstructionType(u8),

    /// Remote ledger rejected or reverted the submission. No partial local
    /// mutation is implied.
    #[error("submission failed: {0}")]
    Submission(String),

    /// Invalid or incomplete startup configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BridgeError {
    /// Whether a retry of the same call can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::Transport(_))
    }
}
