//! # splitpay-types
//!
//! Shared types, errors, and configuration for the **splitpay** settlement
//! ledger.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`BillId`], [`AccountId`], [`TokenId`]
//! - **Amounts**: [`Amount`] (integer base units, checked arithmetic)
//! - **Bill model**: [`Bill`], [`BillStatus`], [`Asset`], [`AssetKind`], [`FundingMode`], [`Payment`]
//! - **Audit model**: [`AuditEvent`], [`AuditRecord`], [`AuditKind`]
//! - **Configuration**: [`LedgerConfig`]
//! - **Errors**: [`SplitpayError`] with `SP_ERR_` prefix codes, [`TransferError`]
//! - **Constants**: system-wide defaults

pub mod amount;
pub mod audit;
pub mod bill;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use amount::*;
pub use audit::*;
pub use bill::*;
pub use config::*;
pub use error::*;
pub use ids::*;

// Constants are accessed via `splitpay_types::constants::FOO`
// (not re-exported to avoid name collisions).
