use crate::domain::account::{Account, AccountId};
use crate::domain::ports::{AccountStore, LedgerStore};
use crate::domain::transaction::{Transaction, TransactionId};
use crate::domain::wallet::{Wallet, WalletId};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column family for account records.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family for wallet records.
pub const CF_WALLETS: &str = "wallets";
/// Column family for the transaction trail.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent store implementation using RocksDB.
///
/// Accounts, wallets and transactions live in separate column families, all
/// encoded as JSON. Multi-record mutations (`insert`, `commit`) go through a
/// single `WriteBatch`, which RocksDB applies atomically.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_WALLETS, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            WalletError::internal(std::io::Error::other(format!(
                "{name} column family not found"
            )))
        })
    }

    fn get_record<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T, F>(&self, cf: &str, mut visit: F) -> Result<()>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> bool,
    {
        let cf = self.cf(cf)?;
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let record: T = serde_json::from_slice(&value)?;
            if !visit(record) {
                break;
            }
        }
        Ok(())
    }

    fn put_batch<T: Serialize>(batch: &mut WriteBatch, cf: &rocksdb::ColumnFamily, key: &[u8], value: &T) -> Result<()> {
        batch.put_cf(cf, key, serde_json::to_vec(value)?);
        Ok(())
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn insert(&self, account: Account, wallet: Wallet) -> Result<()> {
        // Uniqueness scan before the batch write; the write itself is atomic.
        let mut conflict = None;
        self.scan::<Account, _>(CF_ACCOUNTS, |existing| {
            if existing.email == account.email {
                conflict = Some("email is already used");
            } else if existing.phone == account.phone {
                conflict = Some("phone number is already used");
            } else if existing.nid == account.nid {
                conflict = Some("nid number is already used");
            }
            conflict.is_none()
        })?;
        if let Some(message) = conflict {
            return Err(WalletError::Conflict(message.to_string()));
        }

        let mut batch = WriteBatch::default();
        Self::put_batch(
            &mut batch,
            self.cf(CF_ACCOUNTS)?,
            account.id.as_uuid().as_bytes(),
            &account,
        )?;
        Self::put_batch(
            &mut batch,
            self.cf(CF_WALLETS)?,
            wallet.id.as_uuid().as_bytes(),
            &wallet,
        )?;
        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.get_record(CF_ACCOUNTS, id.as_uuid().as_bytes())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let mut found = None;
        self.scan::<Account, _>(CF_ACCOUNTS, |account| {
            if account.email == email {
                found = Some(account);
                false
            } else {
                true
            }
        })?;
        Ok(found)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Account>> {
        let mut found = None;
        self.scan::<Account, _>(CF_ACCOUNTS, |account| {
            if account.phone == phone {
                found = Some(account);
                false
            } else {
                true
            }
        })?;
        Ok(found)
    }

    async fn find_by_nid(&self, nid: &str) -> Result<Option<Account>> {
        let mut found = None;
        self.scan::<Account, _>(CF_ACCOUNTS, |account| {
            if account.nid == nid {
                found = Some(account);
                false
            } else {
                true
            }
        })?;
        Ok(found)
    }

    async fn update(&self, account: Account) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let key = account.id.as_uuid().as_bytes().to_vec();
        if self.db.get_pinned_cf(cf, &key)?.is_none() {
            return Err(WalletError::NotFound("account".to_string()));
        }
        self.db.put_cf(cf, key, serde_json::to_vec(&account)?)?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let mut accounts = Vec::new();
        self.scan::<Account, _>(CF_ACCOUNTS, |account| {
            accounts.push(account);
            true
        })?;
        Ok(accounts)
    }
}

#[async_trait]
impl LedgerStore for RocksDbStore {
    async fn wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        self.get_record(CF_WALLETS, id.as_uuid().as_bytes())
    }

    async fn wallet_of(&self, account: AccountId) -> Result<Option<Wallet>> {
        let mut found = None;
        self.scan::<Wallet, _>(CF_WALLETS, |wallet| {
            if wallet.account == account {
                found = Some(wallet);
                false
            } else {
                true
            }
        })?;
        Ok(found)
    }

    async fn all_wallets(&self) -> Result<Vec<Wallet>> {
        let mut wallets = Vec::new();
        self.scan::<Wallet, _>(CF_WALLETS, |wallet| {
            wallets.push(wallet);
            true
        })?;
        Ok(wallets)
    }

    async fn put_wallet(&self, wallet: Wallet) -> Result<()> {
        let cf = self.cf(CF_WALLETS)?;
        let key = wallet.id.as_uuid().as_bytes().to_vec();
        if self.db.get_pinned_cf(cf, &key)?.is_none() {
            return Err(WalletError::NotFound("wallet".to_string()));
        }
        self.db.put_cf(cf, key, serde_json::to_vec(&wallet)?)?;
        Ok(())
    }

    async fn commit(&self, wallets: &[Wallet], tx: &Transaction) -> Result<()> {
        let mut batch = WriteBatch::default();
        for wallet in wallets {
            Self::put_batch(
                &mut batch,
                self.cf(CF_WALLETS)?,
                wallet.id.as_uuid().as_bytes(),
                wallet,
            )?;
        }
        Self::put_batch(
            &mut batch,
            self.cf(CF_TRANSACTIONS)?,
            tx.id.as_uuid().as_bytes(),
            tx,
        )?;
        self.db.write(batch)?;
        Ok(())
    }

    async fn transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        self.get_record(CF_TRANSACTIONS, id.as_uuid().as_bytes())
    }

    async fn transactions(&self) -> Result<Vec<Transaction>> {
        let mut transactions = Vec::new();
        self.scan::<Transaction, _>(CF_TRANSACTIONS, |tx| {
            transactions.push(tx);
            true
        })?;
        // Keys are UUIDs, so iteration order is arbitrary; restore trail order.
        transactions.sort_by_key(|tx| tx.created_at);
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Role;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn fixture(email: &str, phone: &str, nid: &str) -> (Account, Wallet) {
        let wallet_id = WalletId::new();
        let account = Account::register(
            "Test".to_string(),
            email.to_string(),
            phone.to_string(),
            nid.to_string(),
            "hash".to_string(),
            Role::User,
            wallet_id,
            dec!(2),
        )
        .unwrap();
        let wallet = Wallet::new(wallet_id, account.id, dec!(50));
        (account, wallet)
    }

    #[tokio::test]
    async fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(store.db.cf_handle(CF_WALLETS).is_some());
        assert!(store.db.cf_handle(CF_TRANSACTIONS).is_some());
    }

    #[tokio::test]
    async fn test_account_roundtrip_and_uniqueness() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let (account, wallet) = fixture("a@example.com", "01711111111", "111");
        store.insert(account.clone(), wallet.clone()).await.unwrap();

        let by_email = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, account.id);
        assert_eq!(
            LedgerStore::wallet(&store, wallet.id).await.unwrap(),
            Some(wallet)
        );

        let (dup, w) = fixture("a@example.com", "01722222222", "222");
        assert!(matches!(
            store.insert(dup, w).await,
            Err(WalletError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_commit_is_atomic_batch() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let (account, mut wallet) = fixture("a@example.com", "01711111111", "111");
        store.insert(account.clone(), wallet.clone()).await.unwrap();

        wallet.credit(dec!(200));
        let tx = Transaction::deposit(wallet.id, dec!(200), account.id);
        store
            .commit(std::slice::from_ref(&wallet), &tx)
            .await
            .unwrap();

        let stored = LedgerStore::wallet(&store, wallet.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(250));
        assert_eq!(store.transactions().await.unwrap().len(), 1);
    }
}
