use crate::domain::wallet::WalletId;
use crate::error::{Result, WalletError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Agent,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Agent => write!(f, "AGENT"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "AGENT" => Ok(Role::Agent),
            "ADMIN" => Ok(Role::Admin),
            other => Err(WalletError::InvalidState(format!("unknown role: {other}"))),
        }
    }
}

/// Lifecycle flag for USER accounts, set by admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActiveState {
    Blocked,
    Unblocked,
}

/// Lifecycle flag for AGENT accounts, set by admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalState {
    Pending,
    Approved,
    Suspended,
}

/// An identity that owns exactly one wallet.
///
/// Role-specific fields are mutually exclusive: `active` is populated for
/// USER accounts only, `approval` and `commission_rate` for AGENT accounts
/// only. The constructors are the single place that wires this up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub nid: String,
    pub password_hash: String,
    pub role: Role,
    pub active: Option<ActiveState>,
    pub approval: Option<ApprovalState>,
    pub commission_rate: Option<Decimal>,
    pub verified: bool,
    pub deleted: bool,
    pub wallet: WalletId,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Self-registration path: USER and AGENT only. Agents start out
    /// `Pending` with the supplied default commission rate; users start out
    /// `Unblocked`.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        name: String,
        email: String,
        phone: String,
        nid: String,
        password_hash: String,
        role: Role,
        wallet: WalletId,
        default_commission_rate: Decimal,
    ) -> Result<Self> {
        if role == Role::Admin {
            return Err(WalletError::Forbidden(
                "only user and agent accounts can self-register".to_string(),
            ));
        }
        Ok(Self {
            id: AccountId::new(),
            name,
            email,
            phone,
            nid,
            password_hash,
            role,
            active: (role == Role::User).then_some(ActiveState::Unblocked),
            approval: (role == Role::Agent).then_some(ApprovalState::Pending),
            commission_rate: (role == Role::Agent).then_some(default_commission_rate),
            verified: false,
            deleted: false,
            wallet,
            created_at: Utc::now(),
        })
    }

    /// Admin accounts are never self-created; this is the seeding path.
    pub fn admin(
        name: String,
        email: String,
        phone: String,
        nid: String,
        password_hash: String,
        wallet: WalletId,
    ) -> Self {
        Self {
            id: AccountId::new(),
            name,
            email,
            phone,
            nid,
            password_hash,
            role: Role::Admin,
            active: None,
            approval: None,
            commission_rate: None,
            verified: true,
            deleted: false,
            wallet,
            created_at: Utc::now(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.active == Some(ActiveState::Blocked)
    }

    pub fn is_suspended(&self) -> bool {
        self.approval == Some(ApprovalState::Suspended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn register(role: Role) -> Result<Account> {
        Account::register(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "01711111111".to_string(),
            "1234567890".to_string(),
            "$argon2id$stub".to_string(),
            role,
            WalletId::new(),
            dec!(2),
        )
    }

    #[test]
    fn test_user_registration_defaults() {
        let account = register(Role::User).unwrap();
        assert_eq!(account.active, Some(ActiveState::Unblocked));
        assert_eq!(account.approval, None);
        assert_eq!(account.commission_rate, None);
        assert!(!account.verified);
    }

    #[test]
    fn test_agent_registration_defaults() {
        let account = register(Role::Agent).unwrap();
        assert_eq!(account.active, None);
        assert_eq!(account.approval, Some(ApprovalState::Pending));
        assert_eq!(account.commission_rate, Some(dec!(2)));
    }

    #[test]
    fn test_admin_cannot_self_register() {
        assert!(matches!(
            register(Role::Admin),
            Err(WalletError::Forbidden(_))
        ));
    }

    #[test]
    fn test_role_round_trips_through_serde_and_str() {
        let json = serde_json::to_string(&Role::Agent).unwrap();
        assert_eq!(json, "\"AGENT\"");
        assert_eq!("agent".parse::<Role>().unwrap(), Role::Agent);
        assert!("superuser".parse::<Role>().is_err());
    }
}
