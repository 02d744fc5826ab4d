//! Funding processor: validates and applies contributions.
//!
//! A contribution runs in three steps:
//!
//! ```text
//!  lock ─ validate ─ reserve ─ unlock ──▶ transfer_in ──▶ lock ─ commit ─ audit ─ unlock
//!                                              │
//!                                              └─ error ──▶ lock ─ release ─ unlock
//! ```
//!
//! `Overfund` and `ShareAlreadyPaid` are judged against landed funds only.
//! A contribution that would fit `pledged` but not `pledged + in_flight`, or
//! a payer whose own share is still being pulled, gets the retryable
//! `ContributionInFlight` instead: the reservation may yet be released. Every
//! accepted reservation still fits `total`, so concurrent contributions can
//! never jointly overfund. `pledged` only grows once the funds have landed,
//! and the bill lock is never held across the port.

use splitpay_types::{
    AccountId, Amount, AuditEvent, Bill, BillId, FundingMode, Payment, Result, SplitpayError,
};

use crate::{
    audit::AuditLog,
    custody::AssetTransferPort,
    registry::{BillRecord, BillRegistry},
};

/// Applies contributions against bills held in a [`BillRegistry`].
pub struct FundingProcessor<'a> {
    registry: &'a BillRegistry,
    port: &'a dyn AssetTransferPort,
    audit: &'a AuditLog,
}

impl<'a> FundingProcessor<'a> {
    #[must_use]
    pub fn new(
        registry: &'a BillRegistry,
        port: &'a dyn AssetTransferPort,
        audit: &'a AuditLog,
    ) -> Self {
        Self {
            registry,
            port,
            audit,
        }
    }

    /// Contribute to bill `id` on behalf of `caller`.
    ///
    /// # Errors
    /// - `NotFound`, `AlreadySettled`, `AssetMismatch`, `Overfund`
    /// - `ZeroAmount`, `MissingAmount`, `NotAPayer`, `ShareAlreadyPaid`, `ShareMismatch`
    /// - `ContributionInFlight` if only unlanded transfers are in the way
    /// - `TransferFailed` if the port could not pull the funds
    ///
    /// On any error the bill is left exactly as it was.
    pub fn contribute(&self, id: BillId, caller: AccountId, payment: Payment) -> Result<()> {
        let handle = self.registry.handle(id)?;

        let (asset, amount) = {
            let mut record = handle.lock();
            let amount = admit(&mut record, caller, payment).inspect_err(|err| {
                tracing::debug!(bill_id = %id, caller = %caller.short(), %err, "contribution rejected");
            })?;
            (record.bill().asset.clone(), amount)
        };
        tracing::debug!(bill_id = %id, %amount, "contribution reserved");

        if let Err(err) = self.port.transfer_in(&asset, caller, amount) {
            handle.lock().release(&caller, amount);
            tracing::warn!(bill_id = %id, caller = %caller.short(), %amount, %err, "transfer in failed, reservation released");
            return Err(SplitpayError::TransferFailed(err));
        }

        let mut record = handle.lock();
        record.commit(caller, amount);
        self.audit.emit(AuditEvent::Contributed {
            id,
            payer: caller,
            amount,
        });
        tracing::info!(
            bill_id = %id,
            payer = %caller.short(),
            %amount,
            pledged = %record.bill().pledged,
            total = %record.bill().total,
            "contribution applied"
        );
        Ok(())
    }
}

/// Validate a contribution and reserve its amount. Runs under the bill lock.
fn admit(record: &mut BillRecord, caller: AccountId, payment: Payment) -> Result<Amount> {
    let bill = record.bill();
    if bill.settled {
        return Err(SplitpayError::AlreadySettled(bill.id));
    }
    let expected = bill.asset.kind();
    if payment.kind() != expected {
        return Err(SplitpayError::AssetMismatch {
            expected,
            actual: payment.kind(),
        });
    }

    let amount = effective_amount(bill, caller, payment)?;
    if record.has_paid(&caller) {
        return Err(SplitpayError::ShareAlreadyPaid(caller));
    }
    if amount.is_zero() {
        return Err(SplitpayError::ZeroAmount);
    }

    let fits_pledged = bill
        .pledged
        .checked_add(amount)
        .is_some_and(|after| after <= bill.total);
    if !fits_pledged {
        return Err(SplitpayError::Overfund {
            id: bill.id,
            amount,
            remaining: bill.remaining(),
        });
    }

    let committed = record
        .committed()
        .ok_or_else(|| SplitpayError::Internal("committed amount overflow".to_string()))?;
    let fits_committed = committed
        .checked_add(amount)
        .is_some_and(|after| after <= bill.total);
    if record.is_paying(&caller) || !fits_committed {
        return Err(SplitpayError::ContributionInFlight {
            id: bill.id,
            in_flight: record.in_flight(),
        });
    }

    record.reserve(caller, amount);
    Ok(amount)
}

/// The amount this call contributes, per the bill's funding mode.
fn effective_amount(bill: &Bill, caller: AccountId, payment: Payment) -> Result<Amount> {
    match &bill.funding_mode {
        FundingMode::Open => match payment {
            Payment::Native(attached) => Ok(attached),
            Payment::Token(amount) => amount.ok_or(SplitpayError::MissingAmount),
        },
        FundingMode::FixedSplit { payers } => {
            if !payers.contains(&caller) {
                return Err(SplitpayError::NotAPayer(caller));
            }
            let share = bill
                .share()
                .ok_or_else(|| SplitpayError::Internal(format!("{} has no payers", bill.id)))?;
            let offered = match payment {
                Payment::Native(attached) => Some(attached),
                Payment::Token(amount) => amount,
            };
            match offered {
                Some(actual) if actual != share => Err(SplitpayError::ShareMismatch {
                    expected: share,
                    actual,
                }),
                _ => Ok(share),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::InMemoryCustody;
    use splitpay_types::{Asset, AuditKind, LedgerConfig, TokenId, TransferError};

    struct Fixture {
        registry: BillRegistry,
        custody: InMemoryCustody,
        audit: AuditLog,
    }

    impl Fixture {
        fn new() -> Self {
            let custody = InMemoryCustody::new(AccountId::custody());
            custody.register_token(TokenId::new("USDC"));
            Self {
                registry: BillRegistry::new(&LedgerConfig::default()),
                custody,
                audit: AuditLog::new(),
            }
        }

        fn funding(&self) -> FundingProcessor<'_> {
            FundingProcessor::new(&self.registry, &self.custody, &self.audit)
        }

        fn bill(&self, total: u128, asset: Asset, mode: FundingMode) -> BillId {
            self.registry
                .create(AccountId::new(), Amount(total), asset, mode, &self.audit)
                .unwrap()
        }

        fn funded_account(&self, asset: &Asset, amount: u128) -> AccountId {
            let account = AccountId::new();
            self.custody.deposit(account, asset, Amount(amount));
            if let Asset::Token(token) = asset {
                self.custody.approve(account, token, Amount(amount));
            }
            account
        }
    }

    #[test]
    fn open_native_contribution() {
        let fx = Fixture::new();
        let id = fx.bill(1000, Asset::Native, FundingMode::Open);
        let alice = fx.funded_account(&Asset::Native, 1000);

        fx.funding()
            .contribute(id, alice, Payment::Native(Amount(600)))
            .unwrap();

        let bill = fx.registry.get(id).unwrap();
        assert_eq!(bill.pledged, Amount(600));
        assert_eq!(fx.custody.escrowed(&Asset::Native), Amount(600));
        assert_eq!(fx.audit.for_bill(id).last().unwrap().kind(), AuditKind::Contributed);
    }

    #[test]
    fn open_mode_overfund_rejected() {
        let fx = Fixture::new();
        let id = fx.bill(1000, Asset::Native, FundingMode::Open);
        let alice = fx.funded_account(&Asset::Native, 2000);

        fx.funding()
            .contribute(id, alice, Payment::Native(Amount(600)))
            .unwrap();
        let err = fx
            .funding()
            .contribute(id, alice, Payment::Native(Amount(500)))
            .unwrap_err();

        assert_eq!(
            err,
            SplitpayError::Overfund {
                id,
                amount: Amount(500),
                remaining: Amount(400),
            }
        );
        assert_eq!(fx.registry.get(id).unwrap().pledged, Amount(600));
        assert_eq!(fx.custody.balance(alice, &Asset::Native), Amount(1400));
    }

    #[test]
    fn open_token_requires_amount() {
        let fx = Fixture::new();
        let usdc = Asset::token("USDC");
        let id = fx.bill(1000, usdc.clone(), FundingMode::Open);
        let alice = fx.funded_account(&usdc, 1000);

        let err = fx
            .funding()
            .contribute(id, alice, Payment::Token(None))
            .unwrap_err();
        assert_eq!(err, SplitpayError::MissingAmount);

        fx.funding()
            .contribute(id, alice, Payment::Token(Some(Amount(250))))
            .unwrap();
        assert_eq!(fx.registry.get(id).unwrap().pledged, Amount(250));
        assert_eq!(fx.custody.allowance(alice, &TokenId::new("USDC")), Amount(750));
    }

    #[test]
    fn asset_kind_must_match() {
        let fx = Fixture::new();
        let native = fx.bill(100, Asset::Native, FundingMode::Open);
        let token = fx.bill(100, Asset::token("USDC"), FundingMode::Open);
        let alice = AccountId::new();

        let err = fx
            .funding()
            .contribute(native, alice, Payment::Token(Some(Amount(10))))
            .unwrap_err();
        assert!(matches!(err, SplitpayError::AssetMismatch { .. }));

        let err = fx
            .funding()
            .contribute(token, alice, Payment::Native(Amount(10)))
            .unwrap_err();
        assert!(matches!(err, SplitpayError::AssetMismatch { .. }));
    }

    #[test]
    fn zero_contribution_rejected() {
        let fx = Fixture::new();
        let id = fx.bill(100, Asset::Native, FundingMode::Open);
        let err = fx
            .funding()
            .contribute(id, AccountId::new(), Payment::Native(Amount::ZERO))
            .unwrap_err();
        assert_eq!(err, SplitpayError::ZeroAmount);
        assert!(fx.audit.for_bill(id).iter().all(|r| r.kind() == AuditKind::BillCreated));
    }

    #[test]
    fn fixed_split_uses_share() {
        let fx = Fixture::new();
        let usdc = Asset::token("USDC");
        let payers: Vec<_> = (0..4).map(|_| fx.funded_account(&usdc, 500)).collect();
        let id = fx.bill(400, usdc.clone(), FundingMode::fixed_split(payers.clone()));

        for payer in &payers {
            fx.funding().contribute(id, *payer, Payment::Token(None)).unwrap();
            assert_eq!(fx.custody.balance(*payer, &usdc), Amount(400));
        }
        let bill = fx.registry.get(id).unwrap();
        assert_eq!(bill.pledged, Amount(400));
        assert!(bill.is_fully_funded());
    }

    #[test]
    fn fixed_split_rejects_outsiders_repeats_and_wrong_amounts() {
        let fx = Fixture::new();
        let payers: Vec<_> = (0..2)
            .map(|_| fx.funded_account(&Asset::Native, 1000))
            .collect();
        let id = fx.bill(200, Asset::Native, FundingMode::fixed_split(payers.clone()));

        let outsider = fx.funded_account(&Asset::Native, 1000);
        let err = fx
            .funding()
            .contribute(id, outsider, Payment::Native(Amount(100)))
            .unwrap_err();
        assert_eq!(err, SplitpayError::NotAPayer(outsider));

        let err = fx
            .funding()
            .contribute(id, payers[0], Payment::Native(Amount(99)))
            .unwrap_err();
        assert_eq!(
            err,
            SplitpayError::ShareMismatch {
                expected: Amount(100),
                actual: Amount(99),
            }
        );

        fx.funding()
            .contribute(id, payers[0], Payment::Native(Amount(100)))
            .unwrap();
        let err = fx
            .funding()
            .contribute(id, payers[0], Payment::Native(Amount(100)))
            .unwrap_err();
        assert_eq!(err, SplitpayError::ShareAlreadyPaid(payers[0]));
        assert_eq!(fx.registry.get(id).unwrap().pledged, Amount(100));
    }

    #[test]
    fn failed_transfer_leaves_bill_untouched() {
        let fx = Fixture::new();
        let usdc = Asset::token("USDC");
        let payers: Vec<_> = (0..2).map(|_| AccountId::new()).collect();
        let id = fx.bill(200, usdc.clone(), FundingMode::fixed_split(payers.clone()));
        let records_before = fx.audit.len();

        // No allowance granted.
        let err = fx
            .funding()
            .contribute(id, payers[0], Payment::Token(None))
            .unwrap_err();
        assert!(matches!(
            err,
            SplitpayError::TransferFailed(TransferError::InsufficientAllowance { .. })
        ));

        let handle = fx.registry.handle(id).unwrap();
        let record = handle.lock();
        assert_eq!(record.bill().pledged, Amount::ZERO);
        assert_eq!(record.in_flight(), Amount::ZERO);
        assert!(!record.is_paying(&payers[0]));
        assert!(!record.has_paid(&payers[0]));
        drop(record);
        assert_eq!(fx.audit.len(), records_before);

        // The payer can retry once funded.
        fx.custody.deposit(payers[0], &usdc, Amount(100));
        fx.custody.approve(payers[0], &TokenId::new("USDC"), Amount(100));
        fx.funding().contribute(id, payers[0], Payment::Token(None)).unwrap();
        assert_eq!(fx.registry.get(id).unwrap().pledged, Amount(100));
    }

    #[test]
    fn settled_bill_rejects_contributions() {
        let fx = Fixture::new();
        let beneficiary = AccountId::new();
        let id = fx
            .registry
            .create(beneficiary, Amount::ZERO, Asset::Native, FundingMode::Open, &fx.audit)
            .unwrap();
        fx.registry.handle(id).unwrap().lock().try_settle(beneficiary).unwrap();

        let err = fx
            .funding()
            .contribute(id, AccountId::new(), Payment::Native(Amount(1)))
            .unwrap_err();
        assert_eq!(err, SplitpayError::AlreadySettled(id));
    }

    #[test]
    fn overflowing_contribution_is_overfund() {
        let fx = Fixture::new();
        let id = fx.bill(1000, Asset::Native, FundingMode::Open);
        let alice = fx.funded_account(&Asset::Native, 300);
        fx.funding()
            .contribute(id, alice, Payment::Native(Amount(300)))
            .unwrap();
        let records_before = fx.audit.len();

        let err = fx
            .funding()
            .contribute(id, alice, Payment::Native(Amount(u128::MAX)))
            .unwrap_err();
        assert_eq!(
            err,
            SplitpayError::Overfund {
                id,
                amount: Amount(u128::MAX),
                remaining: Amount(700),
            }
        );

        let handle = fx.registry.handle(id).unwrap();
        let record = handle.lock();
        assert_eq!(record.bill().pledged, Amount(300));
        assert_eq!(record.in_flight(), Amount::ZERO);
        drop(record);
        assert_eq!(fx.custody.balance(alice, &Asset::Native), Amount::ZERO);
        assert_eq!(fx.custody.escrowed(&Asset::Native), Amount(300));
        assert_eq!(fx.audit.len(), records_before);
    }

    #[test]
    fn pending_reservation_blocks_with_retryable_error() {
        let fx = Fixture::new();
        let id = fx.bill(1000, Asset::Native, FundingMode::Open);
        let alice = AccountId::new();
        let bob = fx.funded_account(&Asset::Native, 1000);
        fx.registry.handle(id).unwrap().lock().reserve(alice, Amount(600));

        // Fits what has landed, not what is in flight.
        let err = fx
            .funding()
            .contribute(id, bob, Payment::Native(Amount(500)))
            .unwrap_err();
        assert_eq!(
            err,
            SplitpayError::ContributionInFlight {
                id,
                in_flight: Amount(600),
            }
        );
        assert!(err.is_retryable());

        // Past `total` even with nothing in flight: a real overfund.
        let err = fx
            .funding()
            .contribute(id, bob, Payment::Native(Amount(1001)))
            .unwrap_err();
        assert!(matches!(err, SplitpayError::Overfund { .. }));

        fx.registry.handle(id).unwrap().lock().release(&alice, Amount(600));
        fx.funding()
            .contribute(id, bob, Payment::Native(Amount(500)))
            .unwrap();
        assert_eq!(fx.registry.get(id).unwrap().pledged, Amount(500));
    }

    #[test]
    fn share_being_pulled_is_not_reported_as_paid() {
        let fx = Fixture::new();
        let payers: Vec<_> = (0..2)
            .map(|_| fx.funded_account(&Asset::Native, 1000))
            .collect();
        let id = fx.bill(200, Asset::Native, FundingMode::fixed_split(payers.clone()));
        fx.registry.handle(id).unwrap().lock().reserve(payers[0], Amount(100));

        let err = fx
            .funding()
            .contribute(id, payers[0], Payment::Native(Amount(100)))
            .unwrap_err();
        assert!(matches!(err, SplitpayError::ContributionInFlight { .. }));

        fx.registry.handle(id).unwrap().lock().release(&payers[0], Amount(100));
        fx.funding()
            .contribute(id, payers[0], Payment::Native(Amount(100)))
            .unwrap();
        assert_eq!(
            fx.funding()
                .contribute(id, payers[0], Payment::Native(Amount(100)))
                .unwrap_err(),
            SplitpayError::ShareAlreadyPaid(payers[0])
        );
    }

    #[test]
    fn unknown_bill() {
        let fx = Fixture::new();
        let err = fx
            .funding()
            .contribute(BillId(1), AccountId::new(), Payment::Native(Amount(1)))
            .unwrap_err();
        assert_eq!(err, SplitpayError::NotFound(BillId(1)));
    }
}
