use crate::domain::account::AccountId;
use crate::error::{Result, WalletError};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a wallet.
///
/// `Ord` matters here: the engine acquires wallet locks in ascending id order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WalletId(Uuid);

impl WalletId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WalletStatus {
    Blocked,
    Unblocked,
}

impl std::fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletStatus::Blocked => write!(f, "BLOCKED"),
            WalletStatus::Unblocked => write!(f, "UNBLOCKED"),
        }
    }
}

/// The mutable balance record owned by exactly one account.
///
/// `balance >= 0` always holds: the only way down is [`Wallet::debit`], which
/// refuses to overdraw. A blocked wallet is rejected by the engine before any
/// mutation is attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub account: AccountId,
    pub balance: Decimal,
    pub status: WalletStatus,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(id: WalletId, account: AccountId, opening_balance: Decimal) -> Self {
        Self {
            id,
            account,
            balance: opening_balance,
            status: WalletStatus::Unblocked,
            created_at: Utc::now(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.status == WalletStatus::Blocked
    }

    pub fn credit(&mut self, amount: Decimal) {
        self.balance += amount;
    }

    /// Debits `amount`, failing without mutation when the balance is short.
    pub fn debit(&mut self, amount: Decimal) -> Result<()> {
        if self.balance < amount {
            return Err(WalletError::InvalidAmount(
                "insufficient balance".to_string(),
            ));
        }
        self.balance -= amount;
        Ok(())
    }
}

/// Percentage cut used for fees and commissions: `amount * rate / 100`,
/// rounded half-up to the cent. Applied identically across all operations.
pub fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    (amount * rate / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
