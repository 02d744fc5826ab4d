//! # splitpay-settlement
//!
//! **Settlement**: the one-shot claim and the [`BillEngine`] facade that ties
//! registry, funding, settlement, audit and the transfer port together.
//!
//! ## Architecture
//!
//! ```text
//! BillEngine ─┬─ create_bill ─▶ BillRegistry ─▶ AuditLog
//!             ├─ get_bill    ─▶ BillRegistry
//!             ├─ contribute  ─▶ FundingProcessor ─▶ AssetTransferPort.transfer_in
//!             └─ claim       ─▶ SettlementProcessor ─▶ AssetTransferPort.transfer
//! ```
//!
//! ## Guarantees
//!
//! - No bill is ever funded past its total
//! - Only the beneficiary can settle, and only a fully funded bill
//! - A bill settles at most once, even when the port re-enters the engine
//! - Every rejection reflects landed funds. A contribution blocked only by a
//!   transfer still in flight fails with the retryable `ContributionInFlight`
//!   rather than `Overfund` or `ShareAlreadyPaid`
//! - Different bills never contend on the same lock

pub mod claim;
pub mod engine;

pub use claim::SettlementProcessor;
pub use engine::BillEngine;
