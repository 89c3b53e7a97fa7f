use crate::config::AuthConfig;
use crate::domain::account::{Account, AccountId, Role};
use crate::domain::authz;
use crate::domain::ports::AccountStoreRef;
use crate::error::{Result, WalletError};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Hashes a password with Argon2id and a fresh random salt, returning the
/// PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| WalletError::Internal(e.to_string().into()))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| WalletError::Internal(e.to_string().into()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// JWT claims carried by access, refresh and reset tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: AccountId,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Credential login, token issuance/verification and password flows.
///
/// Tokens never outlive account state: every verification path re-loads the
/// account and re-checks that it is still operational.
pub struct AuthService {
    accounts: AccountStoreRef,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(accounts: AccountStoreRef, config: AuthConfig) -> Self {
        Self { accounts, config }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(TokenPair, Account)> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or_else(|| WalletError::NotFound("account".to_string()))?;
        authz::ensure_operational(&account)?;

        if !verify_password(password, &account.password_hash)? {
            return Err(WalletError::Forbidden("incorrect password".to_string()));
        }

        let pair = TokenPair {
            access_token: self.issue(&account, self.config.access_ttl, &self.config.access_secret)?,
            refresh_token: self.issue(
                &account,
                self.config.refresh_ttl,
                &self.config.refresh_secret,
            )?,
        };
        tracing::info!(account = %account.id, "login succeeded");
        Ok((pair, account))
    }

    /// Exchanges a refresh token for a fresh access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = decode_token(refresh_token, &self.config.refresh_secret)?;
        let account = self.operational_account(claims.sub).await?;
        self.issue(&account, self.config.access_ttl, &self.config.access_secret)
    }

    /// Maps an access token back to its (still operational) account. This is
    /// the check a transport front end runs on every request.
    pub async fn authenticate(&self, access_token: &str) -> Result<Account> {
        let claims = decode_token(access_token, &self.config.access_secret)?;
        self.operational_account(claims.sub).await
    }

    pub async fn change_password(&self, actor: AccountId, old: &str, new: &str) -> Result<()> {
        let mut account = self.operational_account(actor).await?;
        if !verify_password(old, &account.password_hash)? {
            return Err(WalletError::Forbidden(
                "old password does not match".to_string(),
            ));
        }
        account.password_hash = hash_password(new)?;
        self.accounts.update(account).await
    }

    /// Issues a short-lived reset token. Delivering it (email) is the
    /// caller's collaborator.
    pub async fn issue_reset_token(&self, email: &str) -> Result<String> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or_else(|| WalletError::NotFound("account".to_string()))?;
        if !account.verified {
            return Err(WalletError::InvalidState(
                "account is not verified".to_string(),
            ));
        }
        authz::ensure_operational(&account)?;
        self.issue(&account, self.config.reset_ttl, &self.config.access_secret)
    }

    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<()> {
        let claims = decode_token(reset_token, &self.config.access_secret)?;
        let mut account = self.operational_account(claims.sub).await?;
        account.password_hash = hash_password(new_password)?;
        self.accounts.update(account).await
    }

    async fn operational_account(&self, id: AccountId) -> Result<Account> {
        let account = self
            .accounts
            .get(id)
            .await?
            .ok_or_else(|| WalletError::NotFound("account".to_string()))?;
        authz::ensure_operational(&account)?;
        Ok(account)
    }

    fn issue(&self, account: &Account, ttl: Duration, secret: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id,
            email: account.email.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?)
    }
}

fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let claims = Claims {
            sub: AccountId::new(),
            email: "a@example.com".to_string(),
            role: Role::User,
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"right"),
        )
        .unwrap();

        assert!(decode_token(&token, "right").is_ok());
        assert!(matches!(
            decode_token(&token, "wrong"),
            Err(WalletError::Forbidden(_))
        ));
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let claims = Claims {
            sub: AccountId::new(),
            email: "a@example.com".to_string(),
            role: Role::User,
            iat: (Utc::now() - Duration::hours(2)).timestamp(),
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }
}
