use crate::application::lookup;
use crate::config::LedgerConfig;
use crate::domain::account::{Account, AccountId, Role};
use crate::domain::authz;
use crate::domain::ports::{AccountStoreRef, LedgerStoreRef};
use crate::domain::transaction::{Transaction, TransactionId};
use crate::domain::wallet::{Wallet, WalletId, WalletStatus, percent_of};
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Outcome of a successful ledger operation: the appended transaction row
/// plus the committed wallet snapshots (actor first).
#[derive(Debug, Clone)]
pub struct Receipt {
    pub transaction: Transaction,
    pub wallets: Vec<Wallet>,
}

/// Per-wallet lock table.
///
/// Locks are always acquired in ascending `WalletId` order, so two
/// operations touching the same pair of wallets from opposite ends cannot
/// deadlock. Operations on disjoint wallets proceed independently.
#[derive(Default)]
struct WalletLocks {
    table: Mutex<HashMap<WalletId, Arc<Mutex<()>>>>,
}

impl WalletLocks {
    async fn acquire(&self, wallets: &[WalletId]) -> Vec<OwnedMutexGuard<()>> {
        let mut ids = wallets.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let handles: Vec<Arc<Mutex<()>>> = {
            let mut table = self.table.lock().await;
            ids.iter()
                .map(|id| Arc::clone(table.entry(*id).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }
        guards
    }
}

/// The wallet ledger engine.
///
/// Every money movement runs as one atomic unit: validate preconditions,
/// mutate balances under the wallet locks, then persist all wallet snapshots
/// plus exactly one transaction row through a single `LedgerStore::commit`.
/// A rejected precondition aborts with no state change and no trail row; the
/// engine never retries on its own.
pub struct LedgerEngine {
    accounts: AccountStoreRef,
    ledger: LedgerStoreRef,
    config: LedgerConfig,
    locks: WalletLocks,
}

impl LedgerEngine {
    pub fn new(accounts: AccountStoreRef, ledger: LedgerStoreRef, config: LedgerConfig) -> Self {
        Self {
            accounts,
            ledger,
            config,
            locks: WalletLocks::default(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    async fn account(&self, id: AccountId) -> Result<Account> {
        self.accounts
            .get(id)
            .await?
            .ok_or_else(|| WalletError::NotFound("account".to_string()))
    }

    /// Reads a wallet snapshot; idempotent absent mutation.
    pub async fn wallet(&self, id: WalletId) -> Result<Wallet> {
        self.ledger
            .wallet(id)
            .await?
            .ok_or_else(|| WalletError::NotFound("wallet".to_string()))
    }

    /// The caller's own wallet.
    pub async fn wallet_of(&self, account: AccountId) -> Result<Wallet> {
        self.ledger
            .wallet_of(account)
            .await?
            .ok_or_else(|| WalletError::NotFound("wallet".to_string()))
    }

    /// Reads a transaction row; idempotent absent mutation.
    pub async fn transaction(&self, id: TransactionId) -> Result<Transaction> {
        self.ledger
            .transaction(id)
            .await?
            .ok_or_else(|| WalletError::NotFound("transaction".to_string()))
    }

    /// All wallets; ADMIN only.
    pub async fn list_wallets(&self, actor: AccountId) -> Result<Vec<Wallet>> {
        let actor = self.account(actor).await?;
        authz::ensure_admin(&actor)?;
        self.ledger.all_wallets().await
    }

    /// Forces a wallet's status; ADMIN only. A redundant transition is a
    /// conflict rather than a silent no-op.
    pub async fn set_wallet_status(
        &self,
        actor: AccountId,
        wallet: WalletId,
        status: WalletStatus,
    ) -> Result<Wallet> {
        let actor = self.account(actor).await?;
        authz::ensure_admin(&actor)?;

        let _guards = self.locks.acquire(&[wallet]).await;
        let mut wallet = self.wallet(wallet).await?;
        if wallet.status == status {
            return Err(WalletError::Conflict(format!(
                "wallet is already {}",
                wallet.status
            )));
        }
        wallet.status = status;
        self.ledger.put_wallet(wallet.clone()).await?;
        tracing::info!(wallet = %wallet.id, %status, "wallet status forced");
        Ok(wallet)
    }

    /// Credits the caller's own wallet. USER only; amount must clear the
    /// configured minimum.
    pub async fn deposit(&self, actor: AccountId, amount: Decimal) -> Result<Receipt> {
        let amount = validate_amount(amount)?;
        if amount < self.config.min_deposit {
            return Err(WalletError::InvalidAmount(format!(
                "minimum deposit amount is {}",
                self.config.min_deposit
            )));
        }

        let account = self.account(actor).await?;
        authz::ensure_operational(&account)?;
        authz::ensure_role(&account, &[Role::User])?;

        let _guards = self.locks.acquire(&[account.wallet]).await;
        let mut wallet = self.wallet(account.wallet).await?;
        ensure_unblocked(&wallet, "wallet")?;
        wallet.credit(amount);

        let tx = Transaction::deposit(wallet.id, amount, account.id);
        self.ledger
            .commit(std::slice::from_ref(&wallet), &tx)
            .await?;
        tracing::info!(tx = %tx.id, wallet = %wallet.id, %amount, "deposit committed");
        Ok(Receipt {
            transaction: tx,
            wallets: vec![wallet],
        })
    }

    /// Debits the caller's own wallet. USER only; amount must clear the
    /// configured minimum and the current balance.
    pub async fn withdraw(&self, actor: AccountId, amount: Decimal) -> Result<Receipt> {
        let amount = validate_amount(amount)?;
        if amount < self.config.min_withdraw {
            return Err(WalletError::InvalidAmount(format!(
                "minimum withdraw amount is {}",
                self.config.min_withdraw
            )));
        }

        let account = self.account(actor).await?;
        authz::ensure_operational(&account)?;
        authz::ensure_role(&account, &[Role::User])?;

        let _guards = self.locks.acquire(&[account.wallet]).await;
        let mut wallet = self.wallet(account.wallet).await?;
        ensure_unblocked(&wallet, "wallet")?;
        wallet.debit(amount)?;

        let tx = Transaction::withdraw(wallet.id, amount, account.id);
        self.ledger
            .commit(std::slice::from_ref(&wallet), &tx)
            .await?;
        tracing::info!(tx = %tx.id, wallet = %wallet.id, %amount, "withdraw committed");
        Ok(Receipt {
            transaction: tx,
            wallets: vec![wallet],
        })
    }

    /// Peer-to-peer transfer. The sender pays `amount + fee`; the recipient
    /// receives `amount`; the fee is retained by the system and shows up on
    /// the transaction row only.
    pub async fn send(&self, actor: AccountId, recipient: &str, amount: Decimal) -> Result<Receipt> {
        let amount = validate_amount(amount)?;

        let sender = self.account(actor).await?;
        authz::ensure_operational(&sender)?;
        authz::ensure_role(&sender, &[Role::User])?;

        let recipient = lookup::resolve(
            self.accounts.as_ref(),
            self.config.transfer_lookup,
            self.config.phone_prefix.as_deref(),
            recipient,
        )
        .await?
        .ok_or_else(|| WalletError::NotFound("recipient".to_string()))?;

        if recipient.role == Role::Admin {
            return Err(WalletError::Forbidden(
                "counterparty account is not a user or agent".to_string(),
            ));
        }
        if recipient.id == sender.id {
            return Err(WalletError::Forbidden(
                "cannot send money to yourself".to_string(),
            ));
        }
        authz::ensure_operational(&recipient)?;

        let fee = percent_of(amount, self.config.transfer_fee_rate);

        let _guards = self.locks.acquire(&[sender.wallet, recipient.wallet]).await;
        let mut from = self.wallet(sender.wallet).await?;
        let mut to = self.wallet(recipient.wallet).await?;
        ensure_unblocked(&from, "sender wallet")?;
        ensure_unblocked(&to, "recipient wallet")?;
        from.debit(amount + fee)?;
        to.credit(amount);

        let tx = Transaction::send(from.id, to.id, amount, fee, sender.id);
        self.ledger.commit(&[from.clone(), to.clone()], &tx).await?;
        tracing::info!(tx = %tx.id, from = %from.id, to = %to.id, %amount, %fee, "send committed");
        Ok(Receipt {
            transaction: tx,
            wallets: vec![from, to],
        })
    }

    /// Agent-mediated deposit on behalf of a USER: the agent's float is
    /// debited, the user's wallet credited, no fee or commission.
    pub async fn cash_in(&self, actor: AccountId, user: &str, amount: Decimal) -> Result<Receipt> {
        let amount = validate_amount(amount)?;

        let agent = self.account(actor).await?;
        authz::ensure_operational(&agent)?;
        authz::ensure_role(&agent, &[Role::Agent])?;
        authz::ensure_approved_agent(&agent)?;

        let user = self.resolve_cash_counterparty(&agent, user).await?;

        let _guards = self.locks.acquire(&[agent.wallet, user.wallet]).await;
        let mut from = self.wallet(agent.wallet).await?;
        let mut to = self.wallet(user.wallet).await?;
        ensure_unblocked(&from, "agent wallet")?;
        ensure_unblocked(&to, "user wallet")?;
        from.debit(amount)?;
        to.credit(amount);

        let tx = Transaction::cash_in(from.id, to.id, amount, agent.id);
        self.ledger.commit(&[from.clone(), to.clone()], &tx).await?;
        tracing::info!(tx = %tx.id, agent = %from.id, user = %to.id, %amount, "cash-in committed");
        Ok(Receipt {
            transaction: tx,
            wallets: vec![from, to],
        })
    }

    /// Agent-mediated withdrawal on behalf of a USER: the user pays
    /// `amount + commission`, the agent's wallet is credited `amount`, and
    /// the commission is retained by the system. The agent's own commission
    /// rate wins over the configured default.
    pub async fn cash_out(&self, actor: AccountId, user: &str, amount: Decimal) -> Result<Receipt> {
        let amount = validate_amount(amount)?;

        let agent = self.account(actor).await?;
        authz::ensure_operational(&agent)?;
        authz::ensure_role(&agent, &[Role::Agent])?;
        authz::ensure_approved_agent(&agent)?;

        let user = self.resolve_cash_counterparty(&agent, user).await?;

        let rate = agent
            .commission_rate
            .unwrap_or(self.config.cash_out_commission_rate);
        let commission = percent_of(amount, rate);

        let _guards = self.locks.acquire(&[agent.wallet, user.wallet]).await;
        let mut from = self.wallet(user.wallet).await?;
        let mut to = self.wallet(agent.wallet).await?;
        ensure_unblocked(&from, "user wallet")?;
        ensure_unblocked(&to, "agent wallet")?;
        from.debit(amount + commission)?;
        to.credit(amount);

        let tx = Transaction::cash_out(from.id, to.id, amount, commission, agent.id);
        self.ledger.commit(&[from.clone(), to.clone()], &tx).await?;
        tracing::info!(tx = %tx.id, user = %from.id, agent = %to.id, %amount, %commission, "cash-out committed");
        Ok(Receipt {
            transaction: tx,
            wallets: vec![from, to],
        })
    }

    async fn resolve_cash_counterparty(&self, agent: &Account, needle: &str) -> Result<Account> {
        let user = lookup::resolve(
            self.accounts.as_ref(),
            self.config.cash_lookup,
            self.config.phone_prefix.as_deref(),
            needle,
        )
        .await?
        .ok_or_else(|| WalletError::NotFound("user".to_string()))?;

        authz::ensure_counterparty(&user, Role::User)?;
        if user.id == agent.id {
            return Err(WalletError::Forbidden(
                "cannot cash to yourself".to_string(),
            ));
        }
        Ok(user)
    }
}

fn ensure_unblocked(wallet: &Wallet, who: &str) -> Result<()> {
    if wallet.is_blocked() {
        return Err(WalletError::InvalidState(format!("{who} is blocked")));
    }
    Ok(())
}

fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(
            "amount must be greater than 0".to_string(),
        ));
    }
    if amount.round_dp(2) != amount {
        return Err(WalletError::InvalidAmount(
            "amount has sub-cent precision".to_string(),
        ));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::AccountStore;
    use crate::infrastructure::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;

    async fn engine_with_user(balance: Decimal) -> (LedgerEngine, AccountId) {
        let store = InMemoryStore::new();
        let wallet_id = WalletId::new();
        let account = Account::register(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "01711111111".to_string(),
            "1234567890".to_string(),
            "hash".to_string(),
            Role::User,
            wallet_id,
            dec!(2),
        )
        .unwrap();
        let id = account.id;
        store
            .insert(account, Wallet::new(wallet_id, id, balance))
            .await
            .unwrap();
        let accounts: AccountStoreRef = Arc::new(store.clone());
        let ledger: LedgerStoreRef = Arc::new(store);
        (
            LedgerEngine::new(accounts, ledger, LedgerConfig::default()),
            id,
        )
    }

    #[tokio::test]
    async fn test_deposit_credits_own_wallet() {
        let (engine, user) = engine_with_user(dec!(0)).await;
        let receipt = engine.deposit(user, dec!(500)).await.unwrap();
        assert_eq!(receipt.wallets[0].balance, dec!(500));
        assert_eq!(receipt.transaction.from_wallet, receipt.transaction.to_wallet);
    }

    #[tokio::test]
    async fn test_deposit_below_minimum_is_rejected() {
        let (engine, user) = engine_with_user(dec!(0)).await;
        let result = engine.deposit(user, dec!(50)).await;
        assert!(matches!(result, Err(WalletError::InvalidAmount(_))));
        assert_eq!(engine.wallet_of(user).await.unwrap().balance, dec!(0));
    }

    #[tokio::test]
    async fn test_withdraw_rejects_insufficient_balance() {
        let (engine, user) = engine_with_user(dec!(150)).await;
        let result = engine.withdraw(user, dec!(200)).await;
        assert!(matches!(result, Err(WalletError::InvalidAmount(_))));
        assert_eq!(engine.wallet_of(user).await.unwrap().balance, dec!(150));
    }

    #[tokio::test]
    async fn test_nonpositive_and_subcent_amounts_are_rejected() {
        let (engine, user) = engine_with_user(dec!(1000)).await;
        assert!(engine.deposit(user, dec!(0)).await.is_err());
        assert!(engine.deposit(user, dec!(-5)).await.is_err());
        assert!(engine.deposit(user, dec!(200.001)).await.is_err());
    }

    #[tokio::test]
    async fn test_blocked_wallet_rejected_without_trail_row() {
        let (engine, user) = engine_with_user(dec!(1000)).await;
        let wallet = engine.wallet_of(user).await.unwrap();
        let mut blocked = wallet.clone();
        blocked.status = WalletStatus::Blocked;
        engine.ledger.put_wallet(blocked).await.unwrap();

        let result = engine.withdraw(user, dec!(100)).await;
        assert!(matches!(result, Err(WalletError::InvalidState(_))));
        assert!(engine.ledger.transactions().await.unwrap().is_empty());
    }
}
