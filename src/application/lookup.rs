//! Counterparty identity resolution.
//!
//! Which identifiers match (phone, email, or either) and whether a country
//! prefix makes "01..." and "+8801..." equivalent is configuration, not a
//! hardcoded regional rule.

use crate::config::LookupPolicy;
use crate::domain::account::Account;
use crate::domain::ports::AccountStore;
use crate::error::Result;

/// Phone spellings considered equivalent under the configured prefix.
pub fn phone_variants(phone: &str, prefix: Option<&str>) -> Vec<String> {
    let mut variants = vec![phone.to_string()];
    if let Some(prefix) = prefix {
        match phone.strip_prefix(prefix) {
            Some(stripped) => variants.push(stripped.to_string()),
            None => variants.push(format!("{prefix}{phone}")),
        }
    }
    variants
}

pub async fn resolve(
    store: &dyn AccountStore,
    policy: LookupPolicy,
    prefix: Option<&str>,
    needle: &str,
) -> Result<Option<Account>> {
    if matches!(policy, LookupPolicy::Phone | LookupPolicy::PhoneOrEmail) {
        for variant in phone_variants(needle, prefix) {
            if let Some(account) = store.find_by_phone(&variant).await? {
                return Ok(Some(account));
            }
        }
    }
    if matches!(policy, LookupPolicy::Email | LookupPolicy::PhoneOrEmail)
        && let Some(account) = store.find_by_email(needle).await?
    {
        return Ok(Some(account));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Role;
    use crate::domain::wallet::{Wallet, WalletId};
    use crate::infrastructure::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_phone_variants_strip_and_add_prefix() {
        assert_eq!(
            phone_variants("01711111111", Some("+88")),
            vec!["01711111111".to_string(), "+8801711111111".to_string()]
        );
        assert_eq!(
            phone_variants("+8801711111111", Some("+88")),
            vec!["+8801711111111".to_string(), "01711111111".to_string()]
        );
        assert_eq!(
            phone_variants("01711111111", None),
            vec!["01711111111".to_string()]
        );
    }

    #[tokio::test]
    async fn test_resolve_honors_policy() {
        let store = InMemoryStore::new();
        let wallet_id = WalletId::new();
        let account = Account::register(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "+8801711111111".to_string(),
            "1234567890".to_string(),
            "hash".to_string(),
            Role::User,
            wallet_id,
            dec!(2),
        )
        .unwrap();
        let id = account.id;
        store
            .insert(account, Wallet::new(wallet_id, id, dec!(0)))
            .await
            .unwrap();

        // The local spelling matches the internationally stored number.
        let found = resolve(&store, LookupPolicy::Phone, Some("+88"), "01711111111")
            .await
            .unwrap();
        assert_eq!(found.map(|a| a.id), Some(id));

        // Email is ignored under a phone-only policy.
        let found = resolve(&store, LookupPolicy::Phone, Some("+88"), "alice@example.com")
            .await
            .unwrap();
        assert!(found.is_none());

        let found = resolve(
            &store,
            LookupPolicy::PhoneOrEmail,
            Some("+88"),
            "alice@example.com",
        )
        .await
        .unwrap();
        assert_eq!(found.map(|a| a.id), Some(id));
    }
}
