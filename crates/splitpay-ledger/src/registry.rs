//! Bill registry: the sole source of truth for ledger state.
//!
//! Bills are stored densely by id: bill `n` lives at index `n - 1`, so the
//! counter is simply the table length. Each bill sits behind its own mutex;
//! the table lock is only taken to create a bill or to look up a handle, never
//! while a bill is being mutated.

use std::{collections::HashSet, sync::Arc};

use parking_lot::{Mutex, RwLock};
use splitpay_types::{
    AccountId, Amount, Asset, AuditEvent, Bill, BillId, FundingMode, LedgerConfig, Result,
    SplitpayError,
};

use crate::audit::AuditLog;

/// Shared handle to one bill's record. Lock it to read or mutate the bill.
pub type BillHandle = Arc<Mutex<BillRecord>>;

/// A bill plus the bookkeeping needed to fund it safely while transfers are
/// in flight.
///
/// State only changes through the funding processor (reserve, commit,
/// release) and through [`BillRecord::try_settle`], which checks claim
/// eligibility itself.
#[derive(Debug)]
pub struct BillRecord {
    bill: Bill,
    /// Amount reserved by contributions whose transfer has not returned yet.
    in_flight: Amount,
    /// Fixed-split payers whose share has landed.
    paid: HashSet<AccountId>,
    /// Fixed-split payers whose share is being pulled right now.
    paying: HashSet<AccountId>,
}

impl BillRecord {
    fn new(bill: Bill) -> Self {
        Self {
            bill,
            in_flight: Amount::ZERO,
            paid: HashSet::new(),
            paying: HashSet::new(),
        }
    }

    #[must_use]
    pub fn bill(&self) -> &Bill {
        &self.bill
    }

    #[must_use]
    pub fn in_flight(&self) -> Amount {
        self.in_flight
    }

    /// `pledged + in_flight`, or `None` on overflow.
    #[must_use]
    pub fn committed(&self) -> Option<Amount> {
        self.bill.pledged.checked_add(self.in_flight)
    }

    #[must_use]
    pub fn has_paid(&self, payer: &AccountId) -> bool {
        self.paid.contains(payer)
    }

    #[must_use]
    pub fn is_paying(&self, payer: &AccountId) -> bool {
        self.paying.contains(payer)
    }

    /// Hold `amount` against the bill while its transfer runs.
    ///
    /// The caller has already checked `committed() + amount <= total`.
    pub(crate) fn reserve(&mut self, payer: AccountId, amount: Amount) {
        debug_assert!(!self.bill.settled);
        self.in_flight = Amount(self.in_flight.0 + amount.0);
        if matches!(self.bill.funding_mode, FundingMode::FixedSplit { .. }) {
            self.paying.insert(payer);
        }
    }

    /// The transfer landed: move the reservation into `pledged`.
    pub(crate) fn commit(&mut self, payer: AccountId, amount: Amount) {
        debug_assert!(self.in_flight >= amount);
        debug_assert!(!self.bill.settled);
        self.in_flight = self.in_flight.saturating_sub(amount);
        self.bill.pledged = Amount(self.bill.pledged.0 + amount.0);
        if self.paying.remove(&payer) {
            self.paid.insert(payer);
        }
        debug_assert!(self.bill.pledged <= self.bill.total);
    }

    /// The transfer failed: drop the reservation as if it never happened.
    pub(crate) fn release(&mut self, payer: &AccountId, amount: Amount) {
        debug_assert!(self.in_flight >= amount);
        self.in_flight = self.in_flight.saturating_sub(amount);
        self.paying.remove(payer);
    }

    /// Terminal transition on behalf of `caller`.
    ///
    /// # Errors
    /// - `AlreadySettled` if the bill was settled before, whoever asks
    /// - `Unauthorized` if `caller` is not the beneficiary
    /// - `Underfunded` if `pledged != total`
    ///
    /// Nothing changes on error.
    pub fn try_settle(&mut self, caller: AccountId) -> Result<()> {
        let bill = &self.bill;
        if bill.settled {
            return Err(SplitpayError::AlreadySettled(bill.id));
        }
        if caller != bill.beneficiary {
            return Err(SplitpayError::Unauthorized {
                id: bill.id,
                caller,
            });
        }
        if !bill.is_fully_funded() {
            return Err(SplitpayError::Underfunded {
                id: bill.id,
                pledged: bill.pledged,
                total: bill.total,
            });
        }
        // A reservation keeps `pledged < total`, so none can be pending here.
        debug_assert!(self.in_flight.is_zero());
        self.bill.settled = true;
        Ok(())
    }
}

/// Owns every bill and hands out sequential ids.
pub struct BillRegistry {
    bills: RwLock<Vec<BillHandle>>,
    max_payers: usize,
    reject_indivisible_split: bool,
}

impl BillRegistry {
    #[must_use]
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            bills: RwLock::new(Vec::new()),
            max_payers: config.max_payers,
            reject_indivisible_split: config.reject_indivisible_split,
        }
    }

    /// Register a new bill and emit its creation record.
    ///
    /// The id is allocated, the bill stored and the record appended under a
    /// single write lock, so creation records appear in id order.
    ///
    /// # Errors
    /// `InvalidBill` for a malformed payer list. No id is consumed.
    pub fn create(
        &self,
        beneficiary: AccountId,
        total: Amount,
        asset: Asset,
        funding_mode: FundingMode,
        audit: &AuditLog,
    ) -> Result<BillId> {
        self.validate(total, &funding_mode)?;

        let mut bills = self.bills.write();
        let id = BillId(bills.len() as u64 + 1);
        let payers = funding_mode.payers().map(<[AccountId]>::to_vec);
        let bill = Bill::new(id, beneficiary, total, asset.clone(), funding_mode);
        bills.push(Arc::new(Mutex::new(BillRecord::new(bill))));

        audit.emit(AuditEvent::BillCreated {
            id,
            beneficiary,
            asset: asset.clone(),
            total,
            payers,
        });
        tracing::info!(bill_id = %id, %asset, %total, beneficiary = %beneficiary.short(), "bill created");
        Ok(id)
    }

    fn validate(&self, total: Amount, funding_mode: &FundingMode) -> Result<()> {
        let FundingMode::FixedSplit { payers } = funding_mode else {
            return Ok(());
        };

        if payers.is_empty() {
            return Err(SplitpayError::InvalidBill {
                reason: "fixed-split payer list is empty".to_string(),
            });
        }
        if payers.len() > self.max_payers {
            return Err(SplitpayError::InvalidBill {
                reason: format!(
                    "{} payers exceeds the limit of {}",
                    payers.len(),
                    self.max_payers
                ),
            });
        }
        let unique: HashSet<_> = payers.iter().collect();
        if unique.len() != payers.len() {
            return Err(SplitpayError::InvalidBill {
                reason: "fixed-split payer list contains duplicates".to_string(),
            });
        }
        if self.reject_indivisible_split && total.0 % payers.len() as u128 != 0 {
            return Err(SplitpayError::InvalidBill {
                reason: format!("total {total} does not split evenly among {} payers", payers.len()),
            });
        }
        Ok(())
    }

    /// Resolve an id to its shared handle.
    ///
    /// # Errors
    /// `NotFound` for id 0, an id beyond the counter, or any id before the
    /// first bill exists.
    pub fn handle(&self, id: BillId) -> Result<BillHandle> {
        if id.is_reserved() {
            return Err(SplitpayError::NotFound(id));
        }
        let index = usize::try_from(id.0 - 1).map_err(|_| SplitpayError::NotFound(id))?;
        self.bills
            .read()
            .get(index)
            .cloned()
            .ok_or(SplitpayError::NotFound(id))
    }

    /// Read-only snapshot of a bill.
    pub fn get(&self, id: BillId) -> Result<Bill> {
        Ok(self.handle(id)?.lock().bill().clone())
    }

    /// Number of bills created so far (the id counter).
    #[must_use]
    pub fn count(&self) -> u64 {
        self.bills.read().len() as u64
    }
}
