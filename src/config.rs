use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// How counterparty lookups resolve an identity string to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPolicy {
    Phone,
    Email,
    PhoneOrEmail,
}

/// Ledger tunables, injected into the engine and services at construction.
///
/// Rates are percentages: a `transfer_fee_rate` of 1 charges 1% of the sent
/// amount. Percentage cuts are rounded half-up to the cent.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub min_deposit: Decimal,
    pub min_withdraw: Decimal,
    pub transfer_fee_rate: Decimal,
    /// Default cash-out commission; an agent's own rate takes precedence.
    pub cash_out_commission_rate: Decimal,
    /// Opening balance granted to every freshly registered wallet.
    pub initial_balance: Decimal,
    pub transfer_lookup: LookupPolicy,
    pub cash_lookup: LookupPolicy,
    /// Country prefix for phone normalization: with `Some("+88")`, the
    /// identities "01711111111" and "+8801711111111" resolve to the same
    /// account. `None` disables variant matching.
    pub phone_prefix: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_deposit: dec!(200),
            min_withdraw: dec!(100),
            transfer_fee_rate: dec!(1),
            cash_out_commission_rate: dec!(2),
            initial_balance: dec!(50),
            transfer_lookup: LookupPolicy::PhoneOrEmail,
            cash_lookup: LookupPolicy::Phone,
            phone_prefix: Some("+88".to_string()),
        }
    }
}

/// Token-signing configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Lifetime of password-reset tokens.
    pub reset_ttl: Duration,
}

impl AuthConfig {
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(30),
            reset_ttl: Duration::minutes(10),
        }
    }
}
