//! Signed access tokens.
//!
//! Tokens are HS256 JWTs carrying the caller's [`Identity`] under a `user`
//! claim, valid for five days from issue. Verification checks the signature
//! and `exp` with no leeway.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use threadline_core::Identity;

use super::AuthError;

/// Token lifetime in seconds (5 days).
pub const TOKEN_TTL_SECS: i64 = 432_000;

/// Name of the cookie carrying the token.
pub const TOKEN_COOKIE: &str = "token";

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user: Identity,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// A freshly signed token.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Issues and verifies tokens with one process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Build a service from the signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Sign a token for `identity`, valid from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssue` if signing fails.
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, AuthError> {
        self.issue_at(identity, Utc::now())
    }

    /// Sign a token for `identity` as if issued at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssue` if signing fails.
    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let expires_at = issued_at + Duration::seconds(TOKEN_TTL_SECS);
        let claims = Claims {
            user: identity.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::TokenIssue)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check a token's signature and expiry and return the identity it carries.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a bad signature, an expired token
    /// or anything that is not a well-formed token.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.user)
            .map_err(AuthError::InvalidToken)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;
    use threadline_core::{Role, UserId};

    use super::*;

    const SECRET: &str = "kR3v9Qx7LmB2wZp8TnY4cJh6FdA1sGe5";
    const BASE64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    fn service() -> TokenService {
        TokenService::new(&SecretString::from(SECRET.to_owned()))
    }

    fn identity() -> Identity {
        Identity::new(UserId::new(7), Role::Customer).with_name("ana")
    }

    #[test]
    fn test_round_trip() {
        let tokens = service();
        let issued = tokens.issue(&identity()).unwrap();
        assert_eq!(tokens.verify(&issued.token).unwrap(), identity());
    }

    #[test]
    fn test_accepted_until_expiry() {
        let tokens = service();
        let almost_expired = Utc::now() - Duration::seconds(TOKEN_TTL_SECS - 60);
        let issued = tokens.issue_at(&identity(), almost_expired).unwrap();
        assert!(tokens.verify(&issued.token).is_ok());
    }

    #[test]
    fn test_rejected_after_expiry() {
        let tokens = service();
        let stale = Utc::now() - Duration::seconds(TOKEN_TTL_SECS + 60);
        let issued = tokens.issue_at(&identity(), stale).unwrap();
        assert!(matches!(
            tokens.verify(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_other_secret_rejected() {
        let issued = service().issue(&identity()).unwrap();
        let other = TokenService::new(&SecretString::from("Zq8Lm3Rt6Yw1Px9Nc4Vb7Hs2Kd5Gf0Ja".to_owned()));
        assert!(other.verify(&issued.token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(service().verify("not.a.token").is_err());
        assert!(service().verify("").is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let issued = service().issue(&identity()).unwrap();
        let debug = format!("{issued:?}");
        assert!(!debug.contains(&issued.token));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_expiry_is_five_days_after_issue() {
        let now = Utc::now();
        let issued = service().issue_at(&identity(), now).unwrap();
        assert_eq!((issued.expires_at - now).num_seconds(), TOKEN_TTL_SECS);
    }

    proptest! {
        #[test]
        fn prop_tampered_signature_rejected(pos in any::<prop::sample::Index>(), pick in 0..BASE64URL.len()) {
            let tokens = service();
            let issued = tokens.issue(&identity()).unwrap();
            let sig_start = issued.token.rfind('.').unwrap() + 1;
            let mut bytes = issued.token.into_bytes();
            let index = sig_start + pos.index(bytes.len() - sig_start);

            let mut replacement = BASE64URL[pick];
            if replacement == bytes[index] {
                replacement = BASE64URL[(pick + 1) % BASE64URL.len()];
            }
            bytes[index] = replacement;

            let tampered = String::from_utf8(bytes).unwrap();
            prop_assert!(tokens.verify(&tampered).is_err());
        }
    }
}
