//! Single-use, time-limited email verification tokens.
//!
//! A token is bound to the account state it was issued against: the claims
//! carry a fingerprint of `(is_active, password_hash)`, so flipping
//! `is_active` (or resetting the password) invalidates every outstanding
//! token for that account. Replaying a verification link after activation
//! therefore fails without any consumed-token bookkeeping.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use gatehouse_core::AccountId;

use crate::account::Account;

#[derive(Debug, Error)]
pub enum TokenIssueError {
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Issues and checks per-account verification tokens.
///
/// Validity is this service's contract alone: callers must not re-derive it.
pub trait VerificationTokenService: Send + Sync {
    fn issue(&self, account: &Account) -> Result<String, TokenIssueError>;
    fn validate(&self, account: &Account, token: &str) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VerifyClaims {
    sub: AccountId,
    /// Fingerprint of the account state the token was issued against.
    state: String,
    iat: i64,
    exp: i64,
}

/// HS256-signed verification tokens over a shared secret.
pub struct Hs256VerificationTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256VerificationTokens {
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
            ttl,
        }
    }

    pub fn with_default_ttl(secret: impl AsRef<[u8]>) -> Self {
        Self::new(secret, Duration::hours(Self::DEFAULT_TTL_HOURS))
    }

    fn fingerprint(account: &Account) -> String {
        let mut hasher = Sha256::new();
        hasher.update([account.is_active as u8]);
        hasher.update(account.password_hash.as_bytes());
        let digest = hasher.finalize();
        digest[..16].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl VerificationTokenService for Hs256VerificationTokens {
    fn issue(&self, account: &Account) -> Result<String, TokenIssueError> {
        let now = Utc::now();
        let claims = VerifyClaims {
            sub: account.id,
            state: Self::fingerprint(account),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    fn validate(&self, account: &Account, token: &str) -> bool {
        let validation = Validation::new(Algorithm::HS256);
        let Ok(data) = jsonwebtoken::decode::<VerifyClaims>(token, &self.decoding, &validation)
        else {
            return false;
        };
        data.claims.sub == account.id && data.claims.state == Self::fingerprint(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_auth::Role;

    fn account(username: &str) -> Account {
        Account::new(
            username,
            format!("{username}@example.com"),
            format!("$argon2id$hash-for-{username}"),
            Role::Customer,
            false,
        )
    }

    fn service() -> Hs256VerificationTokens {
        Hs256VerificationTokens::with_default_ttl("verify-secret")
    }

    #[test]
    fn issued_token_validates_for_its_account() {
        let svc = service();
        let acct = account("alice");
        let token = svc.issue(&acct).unwrap();
        assert!(svc.validate(&acct, &token));
    }

    #[test]
    fn token_does_not_validate_for_another_account() {
        let svc = service();
        let alice = account("alice");
        let bob = account("bob");
        let token = svc.issue(&alice).unwrap();
        assert!(!svc.validate(&bob, &token));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let svc = service();
        let acct = account("alice");
        let mut token = svc.issue(&acct).unwrap();
        token.pop();
        token.push('A');
        assert!(!svc.validate(&acct, &token));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let acct = account("alice");
        let other = Hs256VerificationTokens::with_default_ttl("other-secret");
        let token = other.issue(&acct).unwrap();
        assert!(!service().validate(&acct, &token));
    }

    #[test]
    fn activation_invalidates_outstanding_tokens() {
        let svc = service();
        let mut acct = account("alice");
        let token = svc.issue(&acct).unwrap();

        acct.is_active = true;
        assert!(!svc.validate(&acct, &token));
    }

    #[test]
    fn password_reset_invalidates_outstanding_tokens() {
        let svc = service();
        let mut acct = account("alice");
        let token = svc.issue(&acct).unwrap();

        acct.password_hash = "$argon2id$another-hash".to_string();
        assert!(!svc.validate(&acct, &token));
    }

    #[test]
    fn expired_token_is_rejected() {
        // TTL far enough in the past to clear the decoder's default leeway.
        let svc = Hs256VerificationTokens::new("verify-secret", Duration::seconds(-300));
        let acct = account("alice");
        let token = svc.issue(&acct).unwrap();
        assert!(!svc.validate(&acct, &token));
    }
}
