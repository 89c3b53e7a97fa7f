use crate::domain::account::{Account, AccountId};
use crate::domain::ports::{AccountStore, LedgerStore};
use crate::domain::transaction::{Transaction, TransactionId};
use crate::domain::wallet::{Wallet, WalletId};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    wallets: HashMap<WalletId, Wallet>,
    transactions: Vec<Transaction>,
}

/// A thread-safe in-memory store backing both persistence ports.
///
/// All records live behind one `Arc<RwLock>`: a single write lock spans every
/// multi-record mutation, which is what makes `insert` and `commit` atomic.
/// `Clone` shares the underlying state. Ideal for tests and the default CLI
/// run where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn insert(&self, account: Account, wallet: Wallet) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.accounts.values().any(|a| a.email == account.email) {
            return Err(WalletError::Conflict("email is already used".to_string()));
        }
        if inner.accounts.values().any(|a| a.phone == account.phone) {
            return Err(WalletError::Conflict(
                "phone number is already used".to_string(),
            ));
        }
        if inner.accounts.values().any(|a| a.nid == account.nid) {
            return Err(WalletError::Conflict(
                "nid number is already used".to_string(),
            ));
        }
        inner.accounts.insert(account.id, account);
        inner.wallets.insert(wallet.id, wallet);
        Ok(())
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().find(|a| a.phone == phone).cloned())
    }

    async fn find_by_nid(&self, nid: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().find(|a| a.nid == nid).cloned())
    }

    async fn update(&self, account: Account) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.accounts.contains_key(&account.id) {
            return Err(WalletError::NotFound("account".to_string()));
        }
        inner.accounts.insert(account.id, account);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().cloned().collect())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        let inner = self.inner.read().await;
        Ok(inner.wallets.get(&id).cloned())
    }

    async fn wallet_of(&self, account: AccountId) -> Result<Option<Wallet>> {
        let inner = self.inner.read().await;
        Ok(inner
            .wallets
            .values()
            .find(|w| w.account == account)
            .cloned())
    }

    async fn all_wallets(&self) -> Result<Vec<Wallet>> {
        let inner = self.inner.read().await;
        Ok(inner.wallets.values().cloned().collect())
    }

    async fn put_wallet(&self, wallet: Wallet) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.wallets.contains_key(&wallet.id) {
            return Err(WalletError::NotFound("wallet".to_string()));
        }
        inner.wallets.insert(wallet.id, wallet);
        Ok(())
    }

    async fn commit(&self, wallets: &[Wallet], tx: &Transaction) -> Result<()> {
        let mut inner = self.inner.write().await;
        for wallet in wallets {
            inner.wallets.insert(wallet.id, wallet.clone());
        }
        inner.transactions.push(tx.clone());
        Ok(())
    }

    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn transactions(&self) -> Result<Vec<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner.transactions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fixture(email: &str, phone: &str, nid: &str) -> (Account, Wallet) {
        let wallet_id = WalletId::new();
        let account = Account::register(
            "Test".to_string(),
            email.to_string(),
            phone.to_string(),
            nid.to_string(),
            "hash".to_string(),
            crate::domain::account::Role::User,
            wallet_id,
            dec!(2),
        )
        .unwrap();
        let wallet = Wallet::new(wallet_id, account.id, dec!(50));
        (account, wallet)
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryStore::new();
        let (account, wallet) = fixture("a@example.com", "01711111111", "111");
        store.insert(account.clone(), wallet.clone()).await.unwrap();

        let by_email = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, account.id);
        let by_phone = store.find_by_phone("01711111111").await.unwrap().unwrap();
        assert_eq!(by_phone.id, account.id);
        assert!(store.find_by_email("b@example.com").await.unwrap().is_none());

        let stored = store.wallet_of(account.id).await.unwrap().unwrap();
        assert_eq!(stored, wallet);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_identity() {
        let store = InMemoryStore::new();
        let (account, wallet) = fixture("a@example.com", "01711111111", "111");
        store.insert(account, wallet).await.unwrap();

        let (dup_email, w) = fixture("a@example.com", "01722222222", "222");
        assert!(matches!(
            store.insert(dup_email, w).await,
            Err(WalletError::Conflict(_))
        ));
        let (dup_phone, w) = fixture("b@example.com", "01711111111", "222");
        assert!(matches!(
            store.insert(dup_phone, w).await,
            Err(WalletError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_commit_writes_wallets_and_appends_trail() {
        let store = InMemoryStore::new();
        let (account, mut wallet) = fixture("a@example.com", "01711111111", "111");
        store.insert(account.clone(), wallet.clone()).await.unwrap();

        wallet.credit(dec!(200));
        let tx = Transaction::deposit(wallet.id, dec!(200), account.id);
        store
            .commit(std::slice::from_ref(&wallet), &tx)
            .await
            .unwrap();

        let stored = store.wallet(wallet.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(250));
        let trail = store.transactions().await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(store.transaction(tx.id).await.unwrap().unwrap(), tx);
    }

    #[tokio::test]
    async fn test_put_wallet_requires_existing() {
        let store = InMemoryStore::new();
        let (account, wallet) = fixture("a@example.com", "01711111111", "111");
        assert!(matches!(
            store.put_wallet(wallet.clone()).await,
            Err(WalletError::NotFound(_))
        ));
        store.insert(account, wallet.clone()).await.unwrap();
        assert!(store.put_wallet(wallet).await.is_ok());
    }
}
