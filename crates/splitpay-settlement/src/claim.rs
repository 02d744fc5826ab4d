//! Settlement processor: the one-shot claim.
//!
//! 1. Resolve the bill
//! 2. Reject a bill that is already settled, whoever asks
//! 3. Check the caller is the beneficiary
//! 4. Check `pledged == total`
//! 5. Write `settled = true` (still under the bill lock)
//! 6. Release the lock and pay the beneficiary through the port
//!
//! Steps 2-5 are [`splitpay_ledger::BillRecord::try_settle`], run as one
//! critical section, so a concurrent or re-entrant claim
//! sees `AlreadySettled` before the payout even starts. If the payout fails
//! the flag stays set: the bill is terminal and the error is surfaced to the
//! caller and to the audit log. There is no retry.

use splitpay_types::{AccountId, AuditEvent, BillId, Result, SplitpayError};
use splitpay_ledger::{AssetTransferPort, AuditLog, BillRegistry};

/// Claims fully funded bills for their beneficiaries.
pub struct SettlementProcessor<'a> {
    registry: &'a BillRegistry,
    port: &'a dyn AssetTransferPort,
    audit: &'a AuditLog,
    /// Source account of every payout.
    custody_account: AccountId,
}

impl<'a> SettlementProcessor<'a> {
    #[must_use]
    pub fn new(
        registry: &'a BillRegistry,
        port: &'a dyn AssetTransferPort,
        audit: &'a AuditLog,
        custody_account: AccountId,
    ) -> Self {
        Self {
            registry,
            port,
            audit,
            custody_account,
        }
    }

    /// Settle bill `id`, paying its total to the beneficiary.
    ///
    /// # Errors
    /// - `NotFound` for an unknown id
    /// - `AlreadySettled` if the bill was settled before (any caller)
    /// - `Unauthorized` if `caller` is not the beneficiary
    /// - `Underfunded` if `pledged != total`
    /// - `TransferFailed` if the payout failed; the bill stays settled
    pub fn claim(&self, id: BillId, caller: AccountId) -> Result<()> {
        let handle = self.registry.handle(id)?;

        let (asset, beneficiary, total) = {
            let mut record = handle.lock();
            record.try_settle(caller).inspect_err(|err| {
                tracing::debug!(bill_id = %id, caller = %caller.short(), %err, "claim rejected");
            })?;
            let bill = record.bill();
            (bill.asset.clone(), bill.beneficiary, bill.total)
        };

        if let Err(err) = self
            .port
            .transfer(&asset, self.custody_account, beneficiary, total)
        {
            tracing::warn!(bill_id = %id, %asset, %total, %err, "payout failed, bill remains settled");
            self.audit.emit(AuditEvent::PayoutFailed {
                id,
                reason: err.to_string(),
            });
            return Err(SplitpayError::TransferFailed(err));
        }

        self.audit.emit(AuditEvent::Settled { id });
        tracing::info!(bill_id = %id, %asset, %total, beneficiary = %beneficiary.short(), "bill settled");
        Ok(())
    }
}
