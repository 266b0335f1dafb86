//! Session model

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::UserRole;

/// Claims carried inside a signed session token.
///
/// Not persisted: the token itself is the session. Only revoked session ids
/// are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session id (uuid v4)
    pub sid: String,
    /// User id
    pub uid: String,
    /// Role at issue time
    pub role: UserRole,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

impl SessionClaims {
    /// Check whether the claims have expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: i64) -> SessionClaims {
        SessionClaims {
            sid: "s".into(),
            uid: "u".into(),
            role: UserRole::User,
            iat: 0,
            exp,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc.timestamp_opt(1_000, 0).unwrap();
        assert!(claims(1_000).is_expired_at(now));
        assert!(claims(999).is_expired_at(now));
        assert!(!claims(1_001).is_expired_at(now));
    }

    #[test]
    fn test_expires_at() {
        assert_eq!(claims(1_700_000_000).expires_at().timestamp(), 1_700_000_000);
    }
}
