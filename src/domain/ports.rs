use crate::domain::account::{Account, AccountId};
use crate::domain::transaction::{Transaction, TransactionId};
use crate::domain::wallet::{Wallet, WalletId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence seam for accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persists the account together with its wallet, or neither.
    ///
    /// Implementations enforce uniqueness of email, phone and nid and reject
    /// violations with `Conflict`.
    async fn insert(&self, account: Account, wallet: Wallet) -> Result<()>;
    async fn get(&self, id: AccountId) -> Result<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<Account>>;
    async fn find_by_nid(&self, nid: &str) -> Result<Option<Account>>;
    async fn update(&self, account: Account) -> Result<()>;
    async fn all(&self) -> Result<Vec<Account>>;
}

/// Persistence seam for wallets and the transaction trail.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn wallet(&self, id: WalletId) -> Result<Option<Wallet>>;
    async fn wallet_of(&self, account: AccountId) -> Result<Option<Wallet>>;
    async fn all_wallets(&self) -> Result<Vec<Wallet>>;
    /// Wallet status changes outside a money movement (admin force, account
    /// state cascades).
    async fn put_wallet(&self, wallet: Wallet) -> Result<()>;
    /// The atomic unit: persists every wallet snapshot and appends the
    /// transaction row together, all-or-nothing.
    async fn commit(&self, wallets: &[Wallet], tx: &Transaction) -> Result<()>;
    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>>;
    /// The committed trail, oldest first.
    async fn transactions(&self) -> Result<Vec<Transaction>>;
}

pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type LedgerStoreRef = Arc<dyn LedgerStore>;
