//! Signed session tokens
//!
//! A session token is `base64url(json(claims)) "." base64url(mac)` where
//! `mac = HMAC-SHA256(secret, first part)`. Tokens carry their own expiry;
//! the only server-side session state is the revocation table written at
//! logout.

use chrono::{DateTime, Duration, Utc};
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::models::{SessionClaims, UserRole};

type HmacSha256 = Hmac<Sha256>;

/// Token verification errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Malformed session token")]
    Malformed,

    #[error("Invalid session signature")]
    BadSignature,

    #[error("Session expired")]
    Expired,
}

/// A freshly issued token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// Issues and verifies session tokens with a fixed secret and lifetime.
#[derive(Clone)]
pub struct SessionSigner {
    /// Keyed MAC state, cloned per signature
    mac: HmacSha256,
    ttl: Duration,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("mac", &"HMAC-SHA256")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| anyhow::anyhow!("Invalid session signing key: {}", e))?;
        Ok(Self { mac, ttl })
    }

    /// Session lifetime, also used as the cookie `Max-Age`
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` with `role`, valid from now for the TTL.
    pub fn issue(&self, user_id: &str, role: UserRole) -> anyhow::Result<IssuedSession> {
        self.issue_at(user_id, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> anyhow::Result<IssuedSession> {
        let claims = SessionClaims {
            sid: uuid::Uuid::new_v4().to_string(),
            uid: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let payload = BASE64URL_NOPAD.encode(&serde_json::to_vec(&claims)?);
        let signature = BASE64URL_NOPAD.encode(&self.sign(payload.as_bytes()));

        Ok(IssuedSession {
            token: format!("{}.{}", payload, signature),
            claims,
        })
    }

    /// Verify a token's signature and expiry, returning its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let (payload, signature) = token.split_once('.').ok_or(SessionError::Malformed)?;

        let signature = BASE64URL_NOPAD
            .decode(signature.as_bytes())
            .map_err(|_| SessionError::Malformed)?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;

        let json = BASE64URL_NOPAD
            .decode(payload.as_bytes())
            .map_err(|_| SessionError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| SessionError::Malformed)?;

        if claims.is_expired_at(now) {
            return Err(SessionError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn signer() -> SessionSigner {
        SessionSigner::new(b"0123456789abcdef0123456789abcdef", Duration::hours(24)).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let issued = signer.issue("user-1", UserRole::Admin).unwrap();

        let claims = signer.verify(&issued.token).unwrap();
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.uid, "user-1");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_each_issue_has_fresh_session_id() {
        let signer = signer();
        let a = signer.issue("u", UserRole::User).unwrap();
        let b = signer.issue("u", UserRole::User).unwrap();
        assert_ne!(a.claims.sid, b.claims.sid);
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let issued_at = Utc::now() - Duration::hours(25);
        let issued = signer.issue_at("u", UserRole::User, issued_at).unwrap();

        assert_eq!(signer.verify(&issued.token), Err(SessionError::Expired));
        assert!(signer
            .verify_at(&issued.token, issued_at + Duration::hours(23))
            .is_ok());
        assert_eq!(
            signer.verify_at(&issued.token, issued_at + Duration::hours(24)),
            Err(SessionError::Expired)
        );
    }

    #[test]
    fn test_other_secret_rejected() {
        let issued = signer().issue("u", UserRole::User).unwrap();
        let other = SessionSigner::new(b"another-secret-another-secret-xx", Duration::hours(24)).unwrap();
        assert_eq!(other.verify(&issued.token), Err(SessionError::BadSignature));
    }

    #[test]
    fn test_forged_role_rejected() {
        let signer = signer();
        let issued = signer.issue("u", UserRole::User).unwrap();
        let (_, signature) = issued.token.split_once('.').unwrap();

        let mut forged = issued.claims.clone();
        forged.role = UserRole::Admin;
        let payload = BASE64URL_NOPAD.encode(&serde_json::to_vec(&forged).unwrap());

        assert_eq!(
            signer.verify(&format!("{}.{}", payload, signature)),
            Err(SessionError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let signer = signer();
        assert_eq!(signer.verify(""), Err(SessionError::Malformed));
        assert_eq!(signer.verify("no-dot-here"), Err(SessionError::Malformed));
        assert_eq!(signer.verify("abc.!!!"), Err(SessionError::Malformed));

        // Correctly signed but not JSON claims
        let payload = BASE64URL_NOPAD.encode(b"not json");
        let signature = BASE64URL_NOPAD.encode(&signer.sign(payload.as_bytes()));
        assert_eq!(
            signer.verify(&format!("{}.{}", payload, signature)),
            Err(SessionError::Malformed)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn prop_roundtrip_binds_user_and_role(uid in "[a-z0-9-]{1,36}", admin in any::<bool>()) {
            let role = if admin { UserRole::Admin } else { UserRole::User };
            let signer = signer();
            let issued = signer.issue(&uid, role).unwrap();
            let claims = signer.verify(&issued.token).unwrap();
            prop_assert_eq!(claims.uid, uid);
            prop_assert_eq!(claims.role, role);
        }

        #[test]
        fn prop_any_tamper_fails(index in 0usize..200, replacement in "[A-Za-z0-9_-]") {
            let signer = signer();
            let token = signer.issue("user-1", UserRole::User).unwrap().token;
            let index = index % token.len();
            let original = &token[index..index + 1];
            prop_assume!(original != replacement && original != ".");

            let mut tampered = token.clone();
            tampered.replace_range(index..index + 1, &replacement);
            prop_assert!(signer.verify(&tampered).is_err());
        }
    }
}
