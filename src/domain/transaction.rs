use crate::domain::account::AccountId;
use crate::domain::wallet::WalletId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a ledger transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Send,
    CashIn,
    CashOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Success,
    Failed,
}

/// One immutable row of the ledger trail.
///
/// `from_wallet == to_wallet` for the self-referential deposit/withdraw rows.
/// Once committed a row is never mutated or deleted; corrections are new rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub from_wallet: WalletId,
    pub to_wallet: WalletId,
    pub amount: Decimal,
    pub fee: Decimal,
    pub commission: Decimal,
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub initiated_by: AccountId,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    fn record(
        from_wallet: WalletId,
        to_wallet: WalletId,
        amount: Decimal,
        fee: Decimal,
        commission: Decimal,
        kind: TransactionType,
        initiated_by: AccountId,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            from_wallet,
            to_wallet,
            amount,
            fee,
            commission,
            kind,
            status: TransactionStatus::Success,
            initiated_by,
            created_at: Utc::now(),
        }
    }

    pub fn deposit(wallet: WalletId, amount: Decimal, initiated_by: AccountId) -> Self {
        Self::record(
            wallet,
            wallet,
            amount,
            Decimal::ZERO,
            Decimal::ZERO,
            TransactionType::Deposit,
            initiated_by,
        )
    }

    pub fn withdraw(wallet: WalletId, amount: Decimal, initiated_by: AccountId) -> Self {
        Self::record(
            wallet,
            wallet,
            amount,
            Decimal::ZERO,
            Decimal::ZERO,
            TransactionType::Withdraw,
            initiated_by,
        )
    }

    pub fn send(
        from_wallet: WalletId,
        to_wallet: WalletId,
        amount: Decimal,
        fee: Decimal,
        initiated_by: AccountId,
    ) -> Self {
        Self::record(
            from_wallet,
            to_wallet,
            amount,
            fee,
            Decimal::ZERO,
            TransactionType::Send,
            initiated_by,
        )
    }

    pub fn cash_in(
        from_wallet: WalletId,
        to_wallet: WalletId,
        amount: Decimal,
        initiated_by: AccountId,
    ) -> Self {
        Self::record(
            from_wallet,
            to_wallet,
            amount,
            Decimal::ZERO,
            Decimal::ZERO,
            TransactionType::CashIn,
            initiated_by,
        )
    }

    pub fn cash_out(
        from_wallet: WalletId,
        to_wallet: WalletId,
        amount: Decimal,
        commission: Decimal,
        initiated_by: AccountId,
    ) -> Self {
        Self::record(
            from_wallet,
            to_wallet,
            amount,
            Decimal::ZERO,
            commission,
            TransactionType::CashOut,
            initiated_by,
        )
    }

    /// Whether the given wallet is either party to this row.
    pub fn involves(&self, wallet: WalletId) -> bool {
        self.from_wallet == wallet || self.to_wallet == wallet
    }
}
