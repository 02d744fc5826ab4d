//! # Bill: the escrow obligation
//!
//! A bill names a beneficiary, an asset and a total. Counterparties fund it
//! incrementally; once `pledged == total` the beneficiary may settle it once.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐ contribute ┌─────────┐ pledged == total ┌──────────────┐ claim ┌─────────┐
//!   │ CREATED ├───────────▶│ FUNDING ├─────────────────▶│ FULLY_FUNDED ├──────▶│ SETTLED │
//!   └─────────┘            └─────────┘                  └──────────────┘       └─────────┘
//! ```
//!
//! Only `settled` is stored. The other states are derived from `pledged`
//! versus `total` (see [`Bill::status`]).
//!
//! ## Invariants
//!
//! - `pledged <= total` at every observable point
//! - `settled` implies `pledged == total`
//! - once settled, neither `pledged` nor `settled` changes again
//! - `total` is fixed at creation

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, BillId, TokenId};

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// What a bill is denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// The host chain's native currency. Value is attached to the funding call.
    Native,
    /// A registered fungible token. Funds are pulled from the payer's allowance.
    Token(TokenId),
}

impl Asset {
    #[must_use]
    pub fn token(symbol: impl Into<String>) -> Self {
        Self::Token(TokenId::new(symbol))
    }

    #[must_use]
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Native => AssetKind::Native,
            Self::Token(_) => AssetKind::Token,
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "NATIVE"),
            Self::Token(token) => write!(f, "token:{token}"),
        }
    }
}

/// Native vs token, without the token identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Native,
    Token,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "NATIVE"),
            Self::Token => write!(f, "TOKEN"),
        }
    }
}

// ---------------------------------------------------------------------------
// FundingMode
// ---------------------------------------------------------------------------

/// Who may contribute to a bill, and how much per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundingMode {
    /// Anyone may contribute any amount up to the remaining balance.
    Open,
    /// Each listed payer owes exactly `total / payers.len()` (truncated) and
    /// pays it in a single call.
    FixedSplit { payers: Vec<AccountId> },
}

impl FundingMode {
    #[must_use]
    pub fn fixed_split(payers: impl IntoIterator<Item = AccountId>) -> Self {
        Self::FixedSplit {
            payers: payers.into_iter().collect(),
        }
    }

    /// Per-payer share under `FixedSplit`. `None` for `Open` or an empty list.
    #[must_use]
    pub fn share(&self, total: Amount) -> Option<Amount> {
        match self {
            Self::Open => None,
            Self::FixedSplit { payers } => total.split(payers.len()),
        }
    }

    /// The declared payer list, if any.
    #[must_use]
    pub fn payers(&self) -> Option<&[AccountId]> {
        match self {
            Self::Open => None,
            Self::FixedSplit { payers } => Some(payers),
        }
    }

    #[must_use]
    pub fn is_payer(&self, account: &AccountId) -> bool {
        self.payers().is_some_and(|p| p.contains(account))
    }
}

// ---------------------------------------------------------------------------
// Payment
// ---------------------------------------------------------------------------

/// The value side of a funding call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payment {
    /// Native value attached to the call.
    Native(Amount),
    /// Pull from the caller's token allowance. `None` lets a fixed-split bill
    /// supply the share itself.
    Token(Option<Amount>),
}

impl Payment {
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Native(_) => AssetKind::Native,
            Self::Token(_) => AssetKind::Token,
        }
    }
}

// ---------------------------------------------------------------------------
// Bill
// ---------------------------------------------------------------------------

/// Derived lifecycle state of a bill. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillStatus {
    /// Nothing pledged yet.
    Created,
    /// Partially funded.
    Funding,
    /// `pledged == total`, awaiting the beneficiary's claim.
    FullyFunded,
    /// Terminal.
    Settled,
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Funding => write!(f, "FUNDING"),
            Self::FullyFunded => write!(f, "FULLY_FUNDED"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// A single escrow obligation.
///
/// Values of this type handed out by the registry are snapshots; mutating
/// one has no effect on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    /// The only identity allowed to settle this bill.
    pub beneficiary: AccountId,
    pub asset: Asset,
    pub funding_mode: FundingMode,
    /// Target amount, fixed at creation.
    pub total: Amount,
    /// Cumulative amount that has actually landed in custody.
    pub pledged: Amount,
    /// Set once, by a successful eligibility check in `claim`.
    pub settled: bool,
}

impl Bill {
    /// A fresh, unfunded bill.
    #[must_use]
    pub fn new(
        id: BillId,
        beneficiary: AccountId,
        total: Amount,
        asset: Asset,
        funding_mode: FundingMode,
    ) -> Self {
        Self {
            id,
            beneficiary,
            asset,
            funding_mode,
            total,
            pledged: Amount::ZERO,
            settled: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> BillStatus {
        if self.settled {
            BillStatus::Settled
        } else if self.pledged == self.total {
            BillStatus::FullyFunded
        } else if self.pledged.is_zero() {
            BillStatus::Created
        } else {
            BillStatus::Funding
        }
    }

    /// Amount still needed to reach `total`.
    #[must_use]
    pub fn remaining(&self) -> Amount {
        self.total.saturating_sub(self.pledged)
    }

    /// Per-payer share, for fixed-split bills.
    #[must_use]
    pub fn share(&self) -> Option<Amount> {
        self.funding_mode.share(self.total)
    }

    #[must_use]
    pub fn is_fully_funded(&self) -> bool {
        self.pledged == self.total
    }
}
