//! Shared fixtures for the settlement integration tests.

#![allow(dead_code)]

use std::sync::{
    Arc, OnceLock, Weak,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use splitpay_ledger::{AssetTransferPort, InMemoryCustody};
use splitpay_settlement::BillEngine;
use splitpay_types::{
    AccountId, Amount, Asset, BillId, LedgerConfig, Payment, SplitpayError, TokenId,
    TransferError,
};

pub const USDC: &str = "USDC";

pub fn usdc() -> Asset {
    Asset::token(USDC)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn custody() -> Arc<InMemoryCustody> {
    let custody = Arc::new(InMemoryCustody::new(AccountId::custody()));
    custody.register_token(TokenId::new(USDC));
    custody
}

/// Fresh engine over a fresh in-memory custody.
pub fn engine() -> (Arc<BillEngine>, Arc<InMemoryCustody>) {
    init_tracing();
    let custody = custody();
    let engine = BillEngine::new(LedgerConfig::default(), custody.clone()).unwrap();
    (Arc::new(engine), custody)
}

/// An account holding `amount` of `asset`, with the full amount approved for
/// pulls when `asset` is a token.
pub fn funded(custody: &InMemoryCustody, asset: &Asset, amount: u128) -> AccountId {
    let account = AccountId::new();
    custody.deposit(account, asset, Amount(amount));
    if let Asset::Token(token) = asset {
        custody.approve(account, token, Amount(amount));
    }
    account
}

// ---------------------------------------------------------------------------
// FlakyPort
// ---------------------------------------------------------------------------

/// Wraps the in-memory custody and fails on demand.
pub struct FlakyPort {
    pub inner: Arc<InMemoryCustody>,
    pub fail_pulls: AtomicBool,
    pub fail_payouts: AtomicBool,
}

impl FlakyPort {
    pub fn new(inner: Arc<InMemoryCustody>) -> Self {
        Self {
            inner,
            fail_pulls: AtomicBool::new(false),
            fail_payouts: AtomicBool::new(false),
        }
    }
}

impl AssetTransferPort for FlakyPort {
    fn transfer_in(&self, asset: &Asset, from: AccountId, amount: Amount) -> Result<(), TransferError> {
        if self.fail_pulls.load(Ordering::SeqCst) {
            return Err(TransferError::Rejected("pull rail offline".into()));
        }
        self.inner.transfer_in(asset, from, amount)
    }

    fn transfer(
        &self,
        asset: &Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        if self.fail_payouts.load(Ordering::SeqCst) {
            return Err(TransferError::Rejected("payout rail offline".into()));
        }
        self.inner.transfer(asset, from, to, amount)
    }

    fn supports(&self, asset: &Asset) -> bool {
        self.inner.supports(asset)
    }
}

// ---------------------------------------------------------------------------
// ReentrantPort
// ---------------------------------------------------------------------------

/// What the hostile port does when the engine calls into it.
pub enum Reentry {
    /// During a payout, claim the same bill again as `caller`.
    ClaimOnPayout { bill: BillId, caller: AccountId },
    /// During a pull, contribute to the same bill as `caller`.
    ContributeOnPull {
        bill: BillId,
        caller: AccountId,
        payment: Payment,
    },
}

/// A port that calls back into the engine before completing, the way a
/// malicious token contract or beneficiary hook would.
pub struct ReentrantPort {
    pub inner: Arc<InMemoryCustody>,
    engine: OnceLock<Weak<BillEngine>>,
    plan: Mutex<Option<Reentry>>,
    /// Fail the outer pull after the nested call returns.
    pub fail_after_reentry: AtomicBool,
    /// Results of the nested calls, in order.
    pub observed: Mutex<Vec<Result<(), SplitpayError>>>,
}

impl ReentrantPort {
    pub fn new(inner: Arc<InMemoryCustody>) -> Self {
        Self {
            inner,
            engine: OnceLock::new(),
            plan: Mutex::new(None),
            fail_after_reentry: AtomicBool::new(false),
            observed: Mutex::new(Vec::new()),
        }
    }

    pub fn attach(&self, engine: &Arc<BillEngine>) {
        let _ = self.engine.set(Arc::downgrade(engine));
    }

    /// Arm a single re-entry; it fires on the next matching call.
    pub fn arm(&self, plan: Reentry) {
        *self.plan.lock() = Some(plan);
    }

    fn engine(&self) -> Arc<BillEngine> {
        self.engine
            .get()
            .and_then(Weak::upgrade)
            .expect("port not attached to a live engine")
    }

    fn take_plan(&self, on_payout: bool) -> Option<Reentry> {
        let mut plan = self.plan.lock();
        let fires = matches!(
            (&*plan, on_payout),
            (Some(Reentry::ClaimOnPayout { .. }), true)
                | (Some(Reentry::ContributeOnPull { .. }), false)
        );
        if fires { plan.take() } else { None }
    }

    fn reenter(&self, plan: Reentry) {
        let engine = self.engine();
        let result = match plan {
            Reentry::ClaimOnPayout { bill, caller } => engine.claim(bill, caller),
            Reentry::ContributeOnPull {
                bill,
                caller,
                payment,
            } => engine.contribute(bill, caller, payment),
        };
        self.observed.lock().push(result);
    }
}

impl AssetTransferPort for ReentrantPort {
    fn transfer_in(&self, asset: &Asset, from: AccountId, amount: Amount) -> Result<(), TransferError> {
        if let Some(plan) = self.take_plan(false) {
            self.reenter(plan);
            if self.fail_after_reentry.load(Ordering::SeqCst) {
                return Err(TransferError::Rejected("pull reverted".into()));
            }
        }
        self.inner.transfer_in(asset, from, amount)
    }

    fn transfer(
        &self,
        asset: &Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        if let Some(plan) = self.take_plan(true) {
            self.reenter(plan);
        }
        self.inner.transfer(asset, from, to, amount)
    }

    fn supports(&self, asset: &Asset) -> bool {
        self.inner.supports(asset)
    }
}
