//! Audit trail types.
//!
//! Every committed transition (creation, contribution, settlement) produces
//! one [`AuditRecord`]. Records are hash-chained so a tampered or reordered
//! trail can be detected by an observer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, Asset, BillId};

/// The transition a record describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    /// A bill was registered.
    BillCreated {
        id: BillId,
        beneficiary: AccountId,
        asset: Asset,
        total: Amount,
        /// Declared payer list for fixed-split bills.
        payers: Option<Vec<AccountId>>,
    },
    /// Funds landed and `pledged` grew.
    Contributed {
        id: BillId,
        payer: AccountId,
        amount: Amount,
    },
    /// Payout to the beneficiary completed.
    Settled { id: BillId },
    /// The bill was marked settled but the payout transfer failed.
    PayoutFailed { id: BillId, reason: String },
}

impl AuditEvent {
    #[must_use]
    pub fn bill_id(&self) -> BillId {
        match self {
            Self::BillCreated { id, .. }
            | Self::Contributed { id, .. }
            | Self::Settled { id }
            | Self::PayoutFailed { id, .. } => *id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> AuditKind {
        match self {
            Self::BillCreated { .. } => AuditKind::BillCreated,
            Self::Contributed { .. } => AuditKind::Contributed,
            Self::Settled { .. } => AuditKind::Settled,
            Self::PayoutFailed { .. } => AuditKind::PayoutFailed,
        }
    }
}

/// Discriminant of [`AuditEvent`], handy for filtering and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditKind {
    BillCreated,
    Contributed,
    Settled,
    PayoutFailed,
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BillCreated => write!(f, "BILL_CREATED"),
            Self::Contributed => write!(f, "CONTRIBUTED"),
            Self::Settled => write!(f, "SETTLED"),
            Self::PayoutFailed => write!(f, "PAYOUT_FAILED"),
        }
    }
}

/// One immutable entry of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Position in the trail, starting at 0.
    pub seq: u64,
    pub event: AuditEvent,
    pub recorded_at: DateTime<Utc>,
    /// Hex SHA-256 of the previous record (all zeroes for the first).
    pub prev_hash: String,
    /// Hex SHA-256 over `prev_hash || seq || event`.
    pub hash: String,
}

impl AuditRecord {
    #[must_use]
    pub fn bill_id(&self) -> BillId {
        self.event.bill_id()
    }

    #[must_use]
    pub fn kind(&self) -> AuditKind {
        self.event.kind()
    }
}
