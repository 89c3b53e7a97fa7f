#![allow(dead_code)]

use paywallet::application::accounts::{AccountPatch, AccountService, RegisterAccount};
use paywallet::application::auth::AuthService;
use paywallet::application::engine::LedgerEngine;
use paywallet::application::reporting::ReportingService;
use paywallet::config::{AuthConfig, LedgerConfig};
use paywallet::domain::account::{Account, ApprovalState, Role};
use paywallet::domain::ports::{AccountStoreRef, LedgerStoreRef};
use paywallet::infrastructure::in_memory::InMemoryStore;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Fully wired service stack over a shared in-memory store, with a seeded
/// admin account.
pub struct TestApp {
    pub accounts: AccountService,
    pub engine: Arc<LedgerEngine>,
    pub reporting: ReportingService,
    pub auth: AuthService,
    pub ledger: LedgerStoreRef,
    pub admin: Account,
}

pub async fn setup() -> TestApp {
    setup_with(LedgerConfig::default()).await
}

pub async fn setup_with(config: LedgerConfig) -> TestApp {
    let store = InMemoryStore::new();
    let accounts_ref: AccountStoreRef = Arc::new(store.clone());
    let ledger_ref: LedgerStoreRef = Arc::new(store);

    let accounts = AccountService::new(accounts_ref.clone(), ledger_ref.clone(), config.clone());
    let engine = Arc::new(LedgerEngine::new(
        accounts_ref.clone(),
        ledger_ref.clone(),
        config,
    ));
    let reporting = ReportingService::new(accounts_ref.clone(), ledger_ref.clone());
    let auth = AuthService::new(
        accounts_ref,
        AuthConfig::new("test-access-secret", "test-refresh-secret"),
    );

    let admin = accounts
        .seed_admin(
            "Admin",
            "admin@example.com",
            "+8801000000000",
            "0000000000",
            "admin-pass",
        )
        .await
        .unwrap();

    TestApp {
        accounts,
        engine,
        reporting,
        auth,
        ledger: ledger_ref,
        admin,
    }
}

impl TestApp {
    pub async fn register_user(&self, email: &str, phone: &str, nid: &str) -> Account {
        self.accounts
            .register(RegisterAccount {
                name: email.split('@').next().unwrap_or_default().to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                nid: nid.to_string(),
                password: "secret123".to_string(),
                role: Role::User,
            })
            .await
            .unwrap()
    }

    /// Registers an agent and approves it so cash operations are permitted.
    pub async fn register_agent(&self, email: &str, phone: &str, nid: &str) -> Account {
        let agent = self
            .accounts
            .register(RegisterAccount {
                name: email.split('@').next().unwrap_or_default().to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                nid: nid.to_string(),
                password: "secret123".to_string(),
                role: Role::Agent,
            })
            .await
            .unwrap();
        self.accounts
            .update(
                self.admin.id,
                agent.id,
                AccountPatch {
                    approval: Some(ApprovalState::Approved),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    /// Sets a wallet balance directly, bypassing operation minimums; fixture
    /// plumbing only.
    pub async fn fund(&self, account: &Account, balance: Decimal) {
        let mut wallet = self.ledger.wallet(account.wallet).await.unwrap().unwrap();
        wallet.balance = balance;
        self.ledger.put_wallet(wallet).await.unwrap();
    }

    pub async fn balance_of(&self, account: &Account) -> Decimal {
        self.ledger
            .wallet(account.wallet)
            .await
            .unwrap()
            .unwrap()
            .balance
    }
}
