//! `BillEngine`: the public face of the ledger.
//!
//! Owns the registry, the audit log and the transfer port, and routes each
//! public operation to the right processor. Every method takes `&self`; share
//! the engine between threads with an `Arc`.

use std::sync::Arc;

use splitpay_ledger::{AssetTransferPort, AuditLog, BillRegistry, FundingProcessor};
use splitpay_types::{
    constants, AccountId, Amount, Asset, Bill, BillId, FundingMode, LedgerConfig, Payment,
    Result, SplitpayError,
};

use crate::claim::SettlementProcessor;

/// Escrow-style settlement ledger.
pub struct BillEngine {
    config: LedgerConfig,
    registry: BillRegistry,
    audit: AuditLog,
    port: Arc<dyn AssetTransferPort>,
}

impl BillEngine {
    /// Build an engine on top of `port`.
    ///
    /// # Errors
    /// `Configuration` if `config` does not validate.
    pub fn new(config: LedgerConfig, port: Arc<dyn AssetTransferPort>) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            version = constants::VERSION,
            custody = %config.custody_account.short(),
            max_payers = config.max_payers,
            reject_indivisible_split = config.reject_indivisible_split,
            "bill engine started"
        );
        Ok(Self {
            registry: BillRegistry::new(&config),
            audit: AuditLog::new(),
            config,
            port,
        })
    }

    /// Declare a new obligation.
    ///
    /// # Errors
    /// - `UnsupportedAsset` if the port cannot move `asset`
    /// - `InvalidBill` for a malformed fixed-split payer list
    pub fn create_bill(
        &self,
        beneficiary: AccountId,
        total: Amount,
        asset: Asset,
        funding_mode: FundingMode,
    ) -> Result<BillId> {
        if !self.port.supports(&asset) {
            return Err(SplitpayError::UnsupportedAsset {
                asset: asset.to_string(),
            });
        }
        self.registry
            .create(beneficiary, total, asset, funding_mode, &self.audit)
    }

    /// Snapshot of bill `id`.
    ///
    /// # Errors
    /// `NotFound` for 0, ids beyond the counter, or before any bill exists.
    pub fn get_bill(&self, id: BillId) -> Result<Bill> {
        self.registry.get(id)
    }

    /// Fund bill `id` on behalf of `caller`.
    ///
    /// # Errors
    /// See [`FundingProcessor::contribute`]. `ContributionInFlight` is the one
    /// retryable error: another transfer on the bill has not landed yet.
    pub fn contribute(&self, id: BillId, caller: AccountId, payment: Payment) -> Result<()> {
        FundingProcessor::new(&self.registry, self.port.as_ref(), &self.audit)
            .contribute(id, caller, payment)
    }

    /// Settle bill `id`; only its beneficiary may do so, and only once.
    pub fn claim(&self, id: BillId, caller: AccountId) -> Result<()> {
        SettlementProcessor::new(
            &self.registry,
            self.port.as_ref(),
            &self.audit,
            self.config.custody_account,
        )
        .claim(id, caller)
    }

    /// Number of bills created so far.
    #[must_use]
    pub fn bill_count(&self) -> u64 {
        self.registry.count()
    }

    /// The audit trail. Observers only; the engine never reads it.
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}
