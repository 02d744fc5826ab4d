//! # splitpay-ledger
//!
//! Ledger state and funding: the bill registry, the funding processor, the
//! audit log and the asset transfer port.
//!
//! ## Architecture
//!
//! 1. **BillRegistry**: owns every bill, issues sequential ids
//! 2. **FundingProcessor**: validates contributions and applies them
//! 3. **AuditLog**: hash-chained record of every committed transition
//! 4. **AssetTransferPort**: external value movement; [`InMemoryCustody`] is
//!    the bundled adapter
//!
//! ## Contribution Flow
//!
//! ```text
//! caller → BillRegistry.handle() → FundingProcessor.contribute()
//!        → AssetTransferPort.transfer_in() → commit → AuditLog.emit()
//! ```

pub mod audit;
pub mod custody;
pub mod funding;
pub mod registry;

pub use audit::AuditLog;
pub use custody::{AssetTransferPort, InMemoryCustody};
pub use funding::FundingProcessor;
pub use registry::{BillHandle, BillRecord, BillRegistry};
