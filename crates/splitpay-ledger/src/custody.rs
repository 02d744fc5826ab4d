//! Asset transfer port and the in-memory custody adapter.
//!
//! The ledger never moves value itself. Funding pulls value into custody
//! through [`AssetTransferPort::transfer_in`]; settlement pays the
//! beneficiary through [`AssetTransferPort::transfer`]. Either call may fail,
//! and either may re-enter the engine before returning, so callers must not
//! hold ledger locks across them.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use splitpay_types::{AccountId, Amount, Asset, TokenId, TransferError};

/// Moves value into and out of the ledger's custody.
pub trait AssetTransferPort: Send + Sync {
    /// Move `amount` of `asset` from `from` into the custody account.
    ///
    /// For tokens this pulls from the payer's pre-authorised allowance. For
    /// the native asset it accounts for the value attached to the call.
    fn transfer_in(
        &self,
        asset: &Asset,
        from: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError>;

    /// Move `amount` of `asset` from `from` to `to`.
    fn transfer(
        &self,
        asset: &Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError>;

    /// Whether this port can move `asset` at all.
    fn supports(&self, _asset: &Asset) -> bool {
        true
    }
}

#[derive(Default)]
struct CustodyState {
    balances: HashMap<(AccountId, Asset), Amount>,
    /// (owner, token) -> amount the custody account may pull.
    allowances: HashMap<(AccountId, TokenId), Amount>,
    tokens: HashSet<TokenId>,
    /// Total ever minted per asset through `deposit`.
    minted: HashMap<Asset, Amount>,
}

impl CustodyState {
    fn check_asset(&self, asset: &Asset) -> Result<(), TransferError> {
        match asset {
            Asset::Native => Ok(()),
            Asset::Token(token) if self.tokens.contains(token) => Ok(()),
            Asset::Token(token) => Err(TransferError::UnknownToken(token.to_string())),
        }
    }

    fn balance(&self, account: AccountId, asset: &Asset) -> Amount {
        self.balances
            .get(&(account, asset.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Debit `from` and credit `to` in one step. Nothing changes on error.
    fn move_funds(
        &mut self,
        asset: &Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let available = self.balance(from, asset);
        let debited = available
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientBalance {
                needed: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(to, asset)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("balance overflow".to_string()))?;

        self.balances.insert((from, asset.clone()), debited);
        self.balances.insert((to, asset.clone()), credited);
        Ok(())
    }
}

/// In-memory custody: balances, token allowances and a token registry.
///
/// Thread-safe. Used as the port for off-chain deployments and throughout
/// the test suites.
pub struct InMemoryCustody {
    custody_account: AccountId,
    state: Mutex<CustodyState>,
}

impl InMemoryCustody {
    /// Create an empty custody whose escrow account is `custody_account`.
    #[must_use]
    pub fn new(custody_account: AccountId) -> Self {
        Self {
            custody_account,
            state: Mutex::new(CustodyState::default()),
        }
    }

    #[must_use]
    pub fn custody_account(&self) -> AccountId {
        self.custody_account
    }

    /// Register a fungible token so bills may be denominated in it.
    pub fn register_token(&self, token: TokenId) {
        self.state.lock().tokens.insert(token);
    }

    /// Mint `amount` of `asset` into `account` (faucet / external deposit).
    pub fn deposit(&self, account: AccountId, asset: &Asset, amount: Amount) {
        let mut state = self.state.lock();
        let entry = state
            .balances
            .entry((account, asset.clone()))
            .or_default();
        *entry = Amount(entry.0.saturating_add(amount.0));
        let minted = state.minted.entry(asset.clone()).or_default();
        *minted = Amount(minted.0.saturating_add(amount.0));
    }

    /// Authorise the custody account to pull up to `amount` of `token` from
    /// `owner`. Replaces any previous approval.
    pub fn approve(&self, owner: AccountId, token: &TokenId, amount: Amount) {
        self.state
            .lock()
            .allowances
            .insert((owner, token.clone()), amount);
    }

    #[must_use]
    pub fn balance(&self, account: AccountId, asset: &Asset) -> Amount {
        self.state.lock().balance(account, asset)
    }

    #[must_use]
    pub fn allowance(&self, owner: AccountId, token: &TokenId) -> Amount {
        self.state
            .lock()
            .allowances
            .get(&(owner, token.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Amount currently held by the custody account.
    #[must_use]
    pub fn escrowed(&self, asset: &Asset) -> Amount {
        self.balance(self.custody_account, asset)
    }

    /// Sum of all balances of `asset`.
    #[must_use]
    pub fn total_supply(&self, asset: &Asset) -> Amount {
        let state = self.state.lock();
        Amount(
            state
                .balances
                .iter()
                .filter(|((_, a), _)| a == asset)
                .map(|(_, amount)| amount.0)
                .sum(),
        )
    }

    /// Transfers only move value, so the sum of balances must equal what was
    /// ever deposited.
    #[must_use]
    pub fn is_supply_conserved(&self, asset: &Asset) -> bool {
        let minted = self
            .state
            .lock()
            .minted
            .get(asset)
            .copied()
            .unwrap_or_default();
        self.total_supply(asset) == minted
    }
}

impl AssetTransferPort for InMemoryCustody {
    fn transfer_in(
        &self,
        asset: &Asset,
        from: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let mut state = self.state.lock();
        state.check_asset(asset)?;

        match asset {
            Asset::Native => state.move_funds(asset, from, self.custody_account, amount),
            Asset::Token(token) => {
                let key = (from, token.clone());
                let approved = state.allowances.get(&key).copied().unwrap_or_default();
                let left = approved
                    .checked_sub(amount)
                    .ok_or(TransferError::InsufficientAllowance {
                        needed: amount,
                        approved,
                    })?;
                state.move_funds(asset, from, self.custody_account, amount)?;
                state.allowances.insert(key, left);
                Ok(())
            }
        }
    }

    fn transfer(
        &self,
        asset: &Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let mut state = self.state.lock();
        state.check_asset(asset)?;
        state.move_funds(asset, from, to, amount)
    }

    fn supports(&self, asset: &Asset) -> bool {
        self.state.lock().check_asset(asset).is_ok()
    }
}
