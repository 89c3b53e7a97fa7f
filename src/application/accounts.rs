use crate::application::{auth, lookup};
use crate::config::LedgerConfig;
use crate::domain::account::{Account, AccountId, ActiveState, ApprovalState, Role};
use crate::domain::authz;
use crate::domain::ports::{AccountStoreRef, LedgerStoreRef};
use crate::domain::wallet::{Wallet, WalletId, WalletStatus};
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;

/// Registration payload for the self-service path.
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub nid: String,
    pub password: String,
    pub role: Role,
}

/// Partial update applied by [`AccountService::update`].
///
/// State fields (`active`, `approval`, `commission_rate`, `deleted`) are
/// admin-only; identity fields belong to the account owner.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nid: Option<String>,
    pub password: Option<String>,
    pub active: Option<ActiveState>,
    pub approval: Option<ApprovalState>,
    pub commission_rate: Option<Decimal>,
    pub verified: Option<bool>,
    pub deleted: Option<bool>,
}

impl AccountPatch {
    fn touches_state(&self) -> bool {
        self.active.is_some()
            || self.approval.is_some()
            || self.commission_rate.is_some()
            || self.verified.is_some()
            || self.deleted.is_some()
    }

    fn touches_identity(&self) -> bool {
        self.name.is_some()
            || self.email.is_some()
            || self.phone.is_some()
            || self.nid.is_some()
            || self.password.is_some()
    }
}

/// Account lifecycle: registration with atomic wallet creation, identity
/// lookup, and field-level-authorized updates with wallet status cascades.
pub struct AccountService {
    accounts: AccountStoreRef,
    ledger: LedgerStoreRef,
    config: LedgerConfig,
}

impl AccountService {
    pub fn new(accounts: AccountStoreRef, ledger: LedgerStoreRef, config: LedgerConfig) -> Self {
        Self {
            accounts,
            ledger,
            config,
        }
    }

    /// Registers a USER or AGENT together with its wallet, or neither.
    pub async fn register(&self, payload: RegisterAccount) -> Result<Account> {
        // Distinct conflict messages per identity field; the store re-checks
        // under its write lock when inserting.
        if self.accounts.find_by_email(&payload.email).await?.is_some() {
            return Err(WalletError::Conflict("email is already used".to_string()));
        }
        if self.accounts.find_by_phone(&payload.phone).await?.is_some() {
            return Err(WalletError::Conflict(
                "phone number is already used".to_string(),
            ));
        }
        if self.accounts.find_by_nid(&payload.nid).await?.is_some() {
            return Err(WalletError::Conflict(
                "nid number is already used".to_string(),
            ));
        }

        let password_hash = auth::hash_password(&payload.password)?;
        let wallet_id = WalletId::new();
        let account = Account::register(
            payload.name,
            payload.email,
            payload.phone,
            payload.nid,
            password_hash,
            payload.role,
            wallet_id,
            self.config.cash_out_commission_rate,
        )?;
        let wallet = Wallet::new(wallet_id, account.id, self.config.initial_balance);

        self.accounts.insert(account.clone(), wallet).await?;
        tracing::info!(account = %account.id, role = %account.role, "account registered");
        Ok(account)
    }

    /// Seeds the ADMIN account; idempotent by email.
    pub async fn seed_admin(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        nid: &str,
        password: &str,
    ) -> Result<Account> {
        if let Some(existing) = self.accounts.find_by_email(email).await? {
            return Ok(existing);
        }

        let password_hash = auth::hash_password(password)?;
        let wallet_id = WalletId::new();
        let account = Account::admin(
            name.to_string(),
            email.to_string(),
            phone.to_string(),
            nid.to_string(),
            password_hash,
            wallet_id,
        );
        let wallet = Wallet::new(wallet_id, account.id, self.config.initial_balance);

        self.accounts.insert(account.clone(), wallet).await?;
        tracing::info!(account = %account.id, "admin seeded");
        Ok(account)
    }

    pub async fn get(&self, id: AccountId) -> Result<Account> {
        self.accounts
            .get(id)
            .await?
            .ok_or_else(|| WalletError::NotFound("account".to_string()))
    }

    /// Resolves an identity string against email, phone (with configured
    /// prefix variants), then nid.
    pub async fn find_by_identity(&self, needle: &str) -> Result<Option<Account>> {
        if let Some(account) = self.accounts.find_by_email(needle).await? {
            return Ok(Some(account));
        }
        for variant in lookup::phone_variants(needle, self.config.phone_prefix.as_deref()) {
            if let Some(account) = self.accounts.find_by_phone(&variant).await? {
                return Ok(Some(account));
            }
        }
        self.accounts.find_by_nid(needle).await
    }

    /// All accounts; ADMIN only.
    pub async fn list(&self, actor: AccountId) -> Result<Vec<Account>> {
        let actor = self.get(actor).await?;
        authz::ensure_admin(&actor)?;
        self.accounts.all().await
    }

    /// Applies a partial update with field-level authorization.
    ///
    /// Setting `approval = Suspended` or `active = Blocked` cascades the
    /// owned wallet to `Blocked`; `Approved`/`Unblocked` cascade back.
    pub async fn update(
        &self,
        actor: AccountId,
        target: AccountId,
        patch: AccountPatch,
    ) -> Result<Account> {
        let actor = self.get(actor).await?;
        let mut target = self.get(target).await?;

        if patch.touches_state() {
            authz::ensure_admin(&actor)?;
        }
        if patch.touches_identity() && actor.id != target.id {
            return Err(WalletError::Forbidden(
                "identity fields can only be changed by the account owner".to_string(),
            ));
        }
        if patch.active.is_some() && target.role != Role::User {
            return Err(WalletError::InvalidState(
                "active state only applies to user accounts".to_string(),
            ));
        }
        if (patch.approval.is_some() || patch.commission_rate.is_some())
            && target.role != Role::Agent
        {
            return Err(WalletError::InvalidState(
                "approval state and commission rate only apply to agent accounts".to_string(),
            ));
        }

        if let Some(email) = patch.email
            && email != target.email
        {
            if self.accounts.find_by_email(&email).await?.is_some() {
                return Err(WalletError::Conflict("email is already used".to_string()));
            }
            target.email = email;
        }
        if let Some(phone) = patch.phone
            && phone != target.phone
        {
            if self.accounts.find_by_phone(&phone).await?.is_some() {
                return Err(WalletError::Conflict(
                    "phone number is already used".to_string(),
                ));
            }
            target.phone = phone;
        }
        if let Some(nid) = patch.nid
            && nid != target.nid
        {
            if self.accounts.find_by_nid(&nid).await?.is_some() {
                return Err(WalletError::Conflict(
                    "nid number is already used".to_string(),
                ));
            }
            target.nid = nid;
        }
        if let Some(name) = patch.name {
            target.name = name;
        }
        if let Some(password) = patch.password {
            target.password_hash = auth::hash_password(&password)?;
        }
        if let Some(active) = patch.active {
            target.active = Some(active);
        }
        if let Some(approval) = patch.approval {
            target.approval = Some(approval);
        }
        if let Some(rate) = patch.commission_rate {
            target.commission_rate = Some(rate);
        }
        if let Some(verified) = patch.verified {
            target.verified = verified;
        }
        if let Some(deleted) = patch.deleted {
            target.deleted = deleted;
        }

        let cascade = if patch.approval == Some(ApprovalState::Suspended)
            || patch.active == Some(ActiveState::Blocked)
        {
            Some(WalletStatus::Blocked)
        } else if patch.approval == Some(ApprovalState::Approved)
            || patch.active == Some(ActiveState::Unblocked)
        {
            Some(WalletStatus::Unblocked)
        } else {
            None
        };

        self.accounts.update(target.clone()).await?;

        if let Some(status) = cascade {
            let mut wallet = self
                .ledger
                .wallet(target.wallet)
                .await?
                .ok_or_else(|| WalletError::NotFound("wallet".to_string()))?;
            if wallet.status != status {
                wallet.status = status;
                self.ledger.put_wallet(wallet).await?;
                tracing::info!(account = %target.id, %status, "wallet status cascaded");
            }
        }

        Ok(target)
    }
}
