//! Local inspection of JWT access tokens.
//!
//! The client never verifies signatures; it only reads the `exp` claim to
//! decide whether a stored token is worth presenting to the server.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Access token is not a three-part JWT")]
    Format,

    #[error("Failed to decode access token payload: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Failed to parse access token claims: {0}")]
    Claims(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// Expiry as seconds since the Unix epoch
    pub exp: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
}

impl AccessClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the token is expired at `now`, or will be within `skew`.
    /// An `exp` outside chrono's range counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        match self.expires_at() {
            Some(expiry) => now + skew >= expiry,
            None => true,
        }
    }

    pub fn is_expired(&self, skew: Duration) -> bool {
        self.is_expired_at(Utc::now(), skew)
    }
}

/// Decode the claims of an access token without validating its signature.
pub fn decode_access_claims(token: &str) -> Result<AccessClaims, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Format);
    };

    let payload = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.signature",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_access_claims() {
        let token = token_with_payload(
            r#"{"token_type":"access","exp":1700000000,"jti":"abc","user_id":7}"#,
        );
        let claims = decode_access_claims(&token).unwrap();
        assert_eq!(claims.exp, 1_700_000_000);
        assert_eq!(claims.user_id, Some(7));
        assert_eq!(claims.jti.as_deref(), Some("abc"));
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        assert!(matches!(decode_access_claims("garbage"), Err(TokenError::Format)));
        assert!(matches!(decode_access_claims("a.b.c.d"), Err(TokenError::Format)));
        assert!(matches!(decode_access_claims("a.!!!.c"), Err(TokenError::Encoding(_))));

        let token = token_with_payload(r#"{"sub":"no expiry"}"#);
        assert!(matches!(decode_access_claims(&token), Err(TokenError::Claims(_))));
    }

    #[test]
    fn test_expiry_with_skew() {
        let now = Utc::now();
        let claims = AccessClaims {
            exp: (now + Duration::seconds(60)).timestamp(),
            user_id: None,
            jti: None,
        };
        assert!(!claims.is_expired_at(now, Duration::zero()));
        assert!(claims.is_expired_at(now, Duration::seconds(120)));
        assert!(claims.is_expired_at(now + Duration::minutes(2), Duration::zero()));
    }

    #[test]
    fn test_out_of_range_expiry_counts_as_expired() {
        let claims = AccessClaims {
            exp: i64::MAX,
            user_id: None,
            jti: None,
        };
        assert!(claims.is_expired(Duration::zero()));
    }
}
