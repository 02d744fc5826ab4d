//! Error types for the splitpay ledger.
//!
//! All errors use the `SP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Registry / lookup errors
//! - 2xx: Funding errors
//! - 3xx: Settlement errors
//! - 4xx: Asset transfer errors
//! - 9xx: General / internal errors
//!
//! Every validation failure is raised before the ledger is touched. The one
//! exception is [`SplitpayError::TransferFailed`] out of `claim`: by then the
//! bill is already marked settled.

use thiserror::Error;

use crate::{AccountId, Amount, AssetKind, BillId};

/// Failure reported by an asset transfer port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The source account does not hold enough of the asset.
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// The payer has not authorised the custody account to pull this much.
    #[error("insufficient allowance: need {needed}, approved {approved}")]
    InsufficientAllowance { needed: Amount, approved: Amount },

    /// The token is not registered with the port.
    #[error("unknown token: {0}")]
    UnknownToken(String),

    /// The underlying rail refused the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Central error enum for all splitpay operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitpayError {
    // =================================================================
    // Registry Errors (1xx)
    // =================================================================
    /// Unknown id: 0, beyond the counter, or nothing created yet.
    #[error("SP_ERR_100: Bill not found: {0}")]
    NotFound(BillId),

    /// The bill definition is malformed (bad payer list, etc.).
    #[error("SP_ERR_101: Invalid bill: {reason}")]
    InvalidBill { reason: String },

    /// The transfer port cannot move the bill's asset.
    #[error("SP_ERR_102: Unsupported asset: {asset}")]
    UnsupportedAsset { asset: String },

    // =================================================================
    // Funding Errors (2xx)
    // =================================================================
    /// The call's asset kind does not match the bill's declared asset.
    #[error("SP_ERR_200: Asset mismatch: bill takes {expected}, call carried {actual}")]
    AssetMismatch {
        expected: AssetKind,
        actual: AssetKind,
    },

    /// The contribution would push `pledged` past `total`.
    #[error("SP_ERR_201: Overfund on {id}: {amount} exceeds remaining {remaining}")]
    Overfund {
        id: BillId,
        amount: Amount,
        remaining: Amount,
    },

    /// An effective contribution of zero.
    #[error("SP_ERR_202: Contribution amount is zero")]
    ZeroAmount,

    /// An open-mode token contribution without an explicit amount.
    #[error("SP_ERR_203: Contribution amount missing")]
    MissingAmount,

    /// The caller is not on the bill's payer list.
    #[error("SP_ERR_204: {0} is not a payer of this bill")]
    NotAPayer(AccountId),

    /// The caller's share has already landed.
    #[error("SP_ERR_205: {0} already paid their share")]
    ShareAlreadyPaid(AccountId),

    /// Fixed-split contribution with an amount other than the share.
    #[error("SP_ERR_206: Share mismatch: share is {expected}, got {actual}")]
    ShareMismatch { expected: Amount, actual: Amount },

    /// The contribution only collides with transfers that have not landed
    /// yet. Retryable: once they resolve the call may succeed.
    #[error("SP_ERR_207: Contribution to {id} blocked by {in_flight} in flight")]
    ContributionInFlight { id: BillId, in_flight: Amount },

    // =================================================================
    // Settlement Errors (3xx)
    // =================================================================
    /// Only the beneficiary may claim.
    #[error("SP_ERR_300: {caller} is not the beneficiary of {id}")]
    Unauthorized { id: BillId, caller: AccountId },

    /// Claim attempted before `pledged == total`.
    #[error("SP_ERR_301: {id} underfunded: pledged {pledged} of {total}")]
    Underfunded {
        id: BillId,
        pledged: Amount,
        total: Amount,
    },

    /// Any mutating call against a settled bill.
    #[error("SP_ERR_302: {0} already settled")]
    AlreadySettled(BillId),

    // =================================================================
    // Transfer Errors (4xx)
    // =================================================================
    /// The external asset movement did not complete.
    #[error("SP_ERR_400: Transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("SP_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl SplitpayError {
    /// Whether the same call may succeed if simply retried later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ContributionInFlight { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SplitpayError>;

impl From<serde_json::Error> for SplitpayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
