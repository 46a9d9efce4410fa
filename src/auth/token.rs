use chrono::{DateTime, Duration, SecondsFormat, Utc};
use jsonwebtoken::{decode, encode, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::errors::AuthError;
use super::keys::SigningKey;
use crate::clock::Clock;
use crate::models::User;

/// Represents the claims encoded within an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject of the token, the user's unique identifier.
    pub sub: Uuid,
    pub username: String,
    pub lastname: String,
    pub firstname: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Not before, always equal to `iat`.
    pub nbf: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
}

/// A signed access token and its absolute expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Expiry as ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T10:00:00.000Z`.
    pub fn expires_at_string(&self) -> String {
        self.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Builds, signs and verifies access tokens.
///
/// One issuer is built at startup from the resolved [`SigningKey`]; the
/// header algorithm is always taken from the key so the two cannot diverge.
pub struct TokenIssuer {
    key: SigningKey,
    lifetime_hours: i64,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(key: SigningKey, lifetime_hours: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            key,
            lifetime_hours,
            clock,
        }
    }

    /// Issues an access token for `user`, valid from now until now + lifetime.
    ///
    /// # Errors
    /// * `Config` - the lifetime does not fit in a timestamp
    /// * `Signing` - the cryptographic primitive rejected the key
    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let issued_at = self.clock.now();
        let expires_at = Duration::try_hours(self.lifetime_hours)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::Config(format!(
                    "access token lifetime of {} hours is out of range",
                    self.lifetime_hours
                ))
            })?;

        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            lastname: user.lastname.clone(),
            firstname: user.firstname.clone(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(self.key.algorithm()),
            &claims,
            self.key.encoding_key(),
        )
        .map_err(|e| {
            log::error!("Failed to sign access token for user {}: {}", user.id, e);
            AuthError::Signing(e.to_string())
        })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies the signature, `exp` and `nbf` of a token and returns its claims.
    ///
    /// No leeway: a token stops verifying at its `exp` second.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut validation = Validation::new(self.key.algorithm());
        validation.validate_nbf = true;
        validation.leeway = 0;

        decode::<AccessClaims>(token, self.key.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::keys::{KeyMaterialProvider, SigningConfig};
    use crate::clock::SystemClock;
    use chrono::TimeZone;
    use jsonwebtoken::{decode_header, Algorithm};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "jane@example.com".into(),
            password: String::new(),
            lastname: "Doe".into(),
            firstname: "Jane".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn hs512_key(secret: &str) -> SigningKey {
        KeyMaterialProvider::new()
            .resolve(&SigningConfig::Symmetric {
                secret: secret.into(),
            })
            .unwrap()
    }

    fn es384_key() -> SigningKey {
        let config = SigningConfig::from_parts(
            "ES384",
            None,
            Some(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/es384_private.pem").into()),
            Some(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/es384_public.pem").into()),
        )
        .unwrap();
        KeyMaterialProvider::new().resolve(&config).unwrap()
    }

    #[test]
    fn test_issue_and_verify_hs512() {
        let issuer = TokenIssuer::new(hs512_key("test_secret_for_hs512"), 24, Arc::new(SystemClock));
        let user = user();

        let issued = issuer.issue(&user).unwrap();
        assert!(!issued.token.is_empty());
        assert_eq!(decode_header(&issued.token).unwrap().alg, Algorithm::HS512);

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "jane@example.com");
        assert_eq!(claims.lastname, "Doe");
        assert_eq!(claims.firstname, "Jane");
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_expiry_lies_within_lifetime_window() {
        let issuer = TokenIssuer::new(hs512_key("test_secret_for_window"), 2, Arc::new(SystemClock));
        let issued = issuer.issue(&user()).unwrap();

        let expected = Utc::now() + Duration::hours(2);
        let skew = (issued.expires_at - expected).num_seconds().abs();
        assert!(skew <= 60, "expiry off by {} seconds", skew);
    }

    #[test]
    fn test_issue_and_verify_es384() {
        let issuer = TokenIssuer::new(es384_key(), 1, Arc::new(SystemClock));
        let user = user();

        let issued = issuer.issue(&user).unwrap();
        assert_eq!(decode_header(&issued.token).unwrap().alg, Algorithm::ES384);

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[test]
    fn test_expires_at_string_has_millisecond_precision() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap());
        let issuer = TokenIssuer::new(hs512_key("test_secret_for_format"), 2, Arc::new(clock));

        let issued = issuer.issue(&user()).unwrap();
        assert_eq!(issued.expires_at_string(), "2024-05-01T10:30:00.000Z");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let clock = FixedClock(Utc::now() - Duration::hours(3));
        let key = hs512_key("test_secret_for_expiration");
        let stale = TokenIssuer::new(key.clone(), 1, Arc::new(clock));
        let issued = stale.issue(&user()).unwrap();

        let current = TokenIssuer::new(key, 1, Arc::new(SystemClock));
        match current.verify(&issued.token) {
            Err(AuthError::InvalidToken(msg)) => assert!(msg.contains("ExpiredSignature")),
            other => panic!("expected InvalidToken, got {:?}", other),
        }
    }

    #[test]
    fn test_token_just_past_expiry_is_rejected() {
        // exp lands 30 seconds before the real current time.
        let clock = FixedClock(Utc::now() - Duration::hours(1) - Duration::seconds(30));
        let key = hs512_key("test_secret_for_leeway");
        let issued = TokenIssuer::new(key.clone(), 1, Arc::new(clock))
            .issue(&user())
            .unwrap();

        let current = TokenIssuer::new(key, 1, Arc::new(SystemClock));
        match current.verify(&issued.token) {
            Err(AuthError::InvalidToken(msg)) => assert!(msg.contains("ExpiredSignature")),
            other => panic!("expected InvalidToken, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_lifetime_is_config_error() {
        let key = hs512_key("test_secret_for_overflow");

        for hours in [10_000_000_000, i64::MAX] {
            let issuer = TokenIssuer::new(key.clone(), hours, Arc::new(SystemClock));
            assert!(matches!(issuer.issue(&user()), Err(AuthError::Config(_))));
        }
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let signer = TokenIssuer::new(hs512_key("first_secret_value"), 1, Arc::new(SystemClock));
        let verifier = TokenIssuer::new(hs512_key("second_secret_value"), 1, Arc::new(SystemClock));

        let issued = signer.issue(&user()).unwrap();
        assert!(matches!(
            verifier.verify(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_algorithm_mismatch_is_rejected() {
        let hs = TokenIssuer::new(hs512_key("some_shared_secret"), 1, Arc::new(SystemClock));
        let es = TokenIssuer::new(es384_key(), 1, Arc::new(SystemClock));

        let issued = hs.issue(&user()).unwrap();
        assert!(matches!(es.verify(&issued.token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let issuer = TokenIssuer::new(hs512_key("test_secret_garbage"), 1, Arc::new(SystemClock));
        assert!(matches!(
            issuer.verify("not.a.token"),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
