//! System-wide constants for the splitpay ledger.

/// Domain tag hashed into [`crate::AccountId::custody`].
pub const CUSTODY_ACCOUNT_DOMAIN: &[u8] = b"splitpay:custody:v1";

/// Default cap on the payer list of a fixed-split bill.
pub const DEFAULT_MAX_PAYERS: usize = 256;

/// `prev_hash` of the first audit record.
pub const AUDIT_GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Domain tag mixed into every audit record hash.
pub const AUDIT_HASH_DOMAIN: &[u8] = b"splitpay:audit:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
