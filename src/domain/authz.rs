//! The authorization gate: pure allow/deny decisions consulted before every
//! ledger mutation. No store access, no side effects.

use crate::domain::account::{Account, ApprovalState, Role};
use crate::error::{Result, WalletError};

/// Callers and counterparties must not be soft-deleted, blocked (USER) or
/// suspended (AGENT).
pub fn ensure_operational(account: &Account) -> Result<()> {
    if account.deleted {
        return Err(WalletError::InvalidState("account is deleted".to_string()));
    }
    if account.is_blocked() {
        return Err(WalletError::InvalidState("account is blocked".to_string()));
    }
    if account.is_suspended() {
        return Err(WalletError::InvalidState("agent is suspended".to_string()));
    }
    Ok(())
}

/// Role-set membership check for the initiating side of an operation.
pub fn ensure_role(account: &Account, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&account.role) {
        Ok(())
    } else {
        Err(WalletError::Forbidden(format!(
            "{} is not permitted to perform this operation",
            account.role
        )))
    }
}

pub fn ensure_admin(account: &Account) -> Result<()> {
    ensure_role(account, &[Role::Admin])
}

/// Cash-in/cash-out additionally require the agent to be approved; a pending
/// agent can log in but not move money.
pub fn ensure_approved_agent(account: &Account) -> Result<()> {
    if account.approval == Some(ApprovalState::Approved) {
        Ok(())
    } else {
        Err(WalletError::InvalidState(
            "agent is not approved".to_string(),
        ))
    }
}

/// The resolved counterparty must carry the expected role and be operational.
pub fn ensure_counterparty(account: &Account, expected: Role) -> Result<()> {
    if account.role != expected {
        return Err(WalletError::Forbidden(format!(
            "counterparty account is not a {expected}"
        )));
    }
    ensure_operational(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::ActiveState;
    use crate::domain::wallet::WalletId;
    use rust_decimal_macros::dec;

    fn account(role: Role) -> Account {
        match role {
            Role::Admin => Account::admin(
                "Admin".to_string(),
                "admin@example.com".to_string(),
                "+8801000000000".to_string(),
                "0000000000".to_string(),
                "hash".to_string(),
                WalletId::new(),
            ),
            _ => Account::register(
                "Bob".to_string(),
                "bob@example.com".to_string(),
                "01722222222".to_string(),
                "2234567890".to_string(),
                "hash".to_string(),
                role,
                WalletId::new(),
                dec!(2),
            )
            .unwrap(),
        }
    }

    #[test]
    fn test_blocked_user_is_not_operational() {
        let mut user = account(Role::User);
        user.active = Some(ActiveState::Blocked);
        assert!(matches!(
            ensure_operational(&user),
            Err(WalletError::InvalidState(_))
        ));
    }

    #[test]
    fn test_suspended_agent_is_not_operational() {
        let mut agent = account(Role::Agent);
        agent.approval = Some(ApprovalState::Suspended);
        assert!(matches!(
            ensure_operational(&agent),
            Err(WalletError::InvalidState(_))
        ));
    }

    #[test]
    fn test_deleted_account_is_not_operational() {
        let mut user = account(Role::User);
        user.deleted = true;
        assert!(ensure_operational(&user).is_err());
    }

    #[test]
    fn test_role_membership() {
        let agent = account(Role::Agent);
        assert!(ensure_role(&agent, &[Role::Agent]).is_ok());
        assert!(matches!(
            ensure_role(&agent, &[Role::User]),
            Err(WalletError::Forbidden(_))
        ));
        assert!(ensure_admin(&account(Role::Admin)).is_ok());
    }

    #[test]
    fn test_pending_agent_is_not_approved() {
        let agent = account(Role::Agent);
        assert!(matches!(
            ensure_approved_agent(&agent),
            Err(WalletError::InvalidState(_))
        ));
        let mut approved = account(Role::Agent);
        approved.approval = Some(ApprovalState::Approved);
        assert!(ensure_approved_agent(&approved).is_ok());
    }

    #[test]
    fn test_counterparty_role_mismatch() {
        let agent = account(Role::Agent);
        assert!(matches!(
            ensure_counterparty(&agent, Role::User),
            Err(WalletError::Forbidden(_))
        ));
        assert!(ensure_counterparty(&agent, Role::Agent).is_ok());
    }
}
