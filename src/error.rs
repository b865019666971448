use thiserror::Error;

/// Why a single link failed verification.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationReason {
    /// The link's stored address does not match the address recomputed
    /// from its `(parent_address, payload, nonce)`.
    #[error("stored address does not match recomputed address")]
    AddressMismatch,

    /// The link's address does not satisfy the chain's difficulty threshold.
    #[error("address does not satisfy the difficulty threshold")]
    DifficultyNotMet,

    /// The link's parent reference does not point at the preceding link
    /// (or the genesis link carries a parent it must not have).
    #[error("parent address does not match the preceding link")]
    ParentLinkBroken,
}

/// A failed whole-chain verification: the first offending link and why.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("link {index} failed verification: {reason}")]
pub struct VerificationFailure {
    pub index: usize,
    pub reason: VerificationReason,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("payload must not be empty under the configured policy")]
    EmptyPayload,

    #[error("chain has no genesis link")]
    EmptyChainAccess,

    #[error("mining aborted by budget after {attempts} attempts")]
    MiningAborted { attempts: u64 },

    #[error(transparent)]
    Verification(#[from] VerificationFailure),
}

pub type Result<T> = std::result::Result<T, ChainError>;
