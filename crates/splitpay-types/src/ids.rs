//! Identifiers used throughout splitpay.
//!
//! Bills are numbered sequentially by the registry. Accounts use UUIDv7,
//! except the custody account which is derived deterministically so every
//! process agrees on the ledger's own identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BillId
// ---------------------------------------------------------------------------

/// Sequential bill identifier. The registry issues 1, 2, 3, ...; 0 is reserved
/// and never refers to a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BillId(pub u64);

impl BillId {
    /// The reserved, never-issued identifier.
    pub const NONE: Self = Self(0);

    #[must_use]
    pub fn is_reserved(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bill:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// An identity that can create, fund, or claim bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The ledger's own custody account.
    ///
    /// Derived from a fixed domain tag, so it is identical across processes
    /// and can never collide with a UUIDv7 handed out by [`AccountId::new`]
    /// in practice.
    #[must_use]
    pub fn custody() -> Self {
        Self::deterministic(crate::constants::CUSTODY_ACCOUNT_DOMAIN)
    }

    /// Derive an account from an arbitrary label (SHA-256, first 16 bytes).
    #[must_use]
    pub fn deterministic(label: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(label);
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    /// Short hex form for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TokenId
// ---------------------------------------------------------------------------

/// Symbol of a registered fungible token (e.g. "USDC").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bill_zero_is_reserved() {
        assert!(BillId::NONE.is_reserved());
        assert!(!BillId(1).is_reserved());
        assert!(!BillId(u64::MAX).is_reserved());
    }

    #[test]
    fn account_ids_unique() {
        assert_ne!(AccountId::new(), AccountId::new());
    }

    #[test]
    fn custody_account_is_stable() {
        assert_eq!(AccountId::custody(), AccountId::custody());
        assert_ne!(AccountId::custody(), AccountId::deterministic(b"someone-else"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(BillId(7).to_string(), "bill:7");
        assert_eq!(TokenId::new("USDC").to_string(), "USDC");
        assert_eq!(AccountId::custody().short().len(), 8);
    }

    #[test]
    fn serde_roundtrip() {
        let id = AccountId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
