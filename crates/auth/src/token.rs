//! HS256 access/refresh token issuance and verification.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use workdesk_core::UserId;

use crate::claims::{AccessClaims, RefreshClaims, RoleClaim, TokenKind};
use crate::config::AuthConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies both token kinds.
///
/// Stateless: refresh-token currency is checked by the session flow against
/// the refresh token store, not here.
pub struct TokenService {
    access_keys: KeyPair,
    refresh_keys: KeyPair,
    issuer: String,
    audience: String,
    access_ttl: ChronoDuration,
    refresh_ttl: ChronoDuration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_keys: KeyPair::from_secret(&config.access_secret),
            refresh_keys: KeyPair::from_secret(&config.refresh_secret),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl: to_chrono(config.access_ttl),
            refresh_ttl: to_chrono(config.refresh_ttl),
        }
    }

    pub fn access_ttl(&self) -> ChronoDuration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> ChronoDuration {
        self.refresh_ttl
    }

    pub fn issue_access_token(&self, user: UserId, role: RoleClaim) -> Result<String, TokenError> {
        self.issue_access_token_at(user, role, Utc::now())
    }

    /// [`TokenService::issue_access_token`] with an explicit issuance time.
    pub fn issue_access_token_at(
        &self,
        user: UserId,
        role: RoleClaim,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = AccessClaims {
            sub: user,
            role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.access_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ: TokenKind::Access,
        };
        sign(&claims, &self.access_keys.encoding)
    }

    pub fn issue_refresh_token(&self, user: UserId) -> Result<String, TokenError> {
        self.issue_refresh_token_at(user, Utc::now())
    }

    pub fn issue_refresh_token_at(
        &self,
        user: UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = RefreshClaims {
            sub: user,
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.refresh_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ: TokenKind::Refresh,
        };
        sign(&claims, &self.refresh_keys.encoding)
    }

    /// Check signature, issuer, audience, expiry and the access type marker.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = base_validation(&self.issuer);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let claims: AccessClaims = decode(token, &self.access_keys.decoding, &validation)?;
        ensure_kind(claims.typ, TokenKind::Access)?;
        Ok(claims)
    }

    /// Check signature, issuer, expiry and the refresh type marker.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let mut validation = base_validation(&self.issuer);
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let claims: RefreshClaims = decode(token, &self.refresh_keys.decoding, &validation)?;
        ensure_kind(claims.typ, TokenKind::Refresh)?;
        Ok(claims)
    }
}

/// Lifetimes beyond a century are clamped.
fn to_chrono(d: std::time::Duration) -> ChronoDuration {
    let cap = ChronoDuration::days(36_500);
    ChronoDuration::from_std(d).map_or(cap, |d| d.min(cap))
}

fn base_validation(issuer: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[issuer]);
    validation
}

fn sign<T: serde::Serialize>(claims: &T, key: &EncodingKey) -> Result<String, TokenError> {
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| TokenError::Signing(e.to_string()))
}

fn decode<T: DeserializeOwned>(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
) -> Result<T, TokenError> {
    jsonwebtoken::decode::<T>(token, key, validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}

fn ensure_kind(actual: TokenKind, expected: TokenKind) -> Result<(), TokenError> {
    if actual == expected {
        Ok(())
    } else {
        Err(TokenError::Invalid(format!(
            "expected {expected:?} token, got {actual:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionMatrix;
    use workdesk_core::RoleId;

    fn test_config() -> AuthConfig {
        let mut config = AuthConfig::new("access-secret");
        config.refresh_secret = "refresh-secret".to_string();
        config.issuer = "workdesk-test".to_string();
        config.audience = "workdesk-test-api".to_string();
        config
    }

    fn editor_claim() -> RoleClaim {
        RoleClaim {
            id: RoleId::new(),
            name: "Editor".to_string(),
            permission: PermissionMatrix::new().with("documents", "write", true),
        }
    }

    #[test]
    fn access_token_roundtrips_identity_and_role() {
        let tokens = TokenService::new(&test_config());
        let user = UserId::new();
        let role = editor_claim();

        let token = tokens.issue_access_token(user, role.clone()).unwrap();
        let claims = tokens.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, role);
        assert_eq!(claims.iss, "workdesk-test");
        assert_eq!(claims.aud, "workdesk-test-api");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn expired_access_token_is_reported_as_expired() {
        let tokens = TokenService::new(&test_config());
        let issued_at = Utc::now() - ChronoDuration::seconds(901);

        let token = tokens
            .issue_access_token_at(UserId::new(), editor_claim(), issued_at)
            .unwrap();

        assert_eq!(tokens.verify_access_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let tokens = TokenService::new(&test_config());
        let token = tokens.issue_access_token(UserId::new(), editor_claim()).unwrap();

        let other = TokenService::new(&AuthConfig::new("another-secret"));
        let forged = other.issue_access_token(UserId::new(), editor_claim()).unwrap();

        assert!(matches!(tokens.verify_access_token(&forged), Err(TokenError::Invalid(_))));
        let mut mangled = token.clone();
        mangled.push('x');
        assert!(matches!(tokens.verify_access_token(&mangled), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn wrong_audience_or_issuer_is_invalid() {
        let tokens = TokenService::new(&test_config());

        let mut foreign = test_config();
        foreign.audience = "someone-else".to_string();
        let token = TokenService::new(&foreign)
            .issue_access_token(UserId::new(), editor_claim())
            .unwrap();
        assert!(matches!(tokens.verify_access_token(&token), Err(TokenError::Invalid(_))));

        let mut foreign = test_config();
        foreign.issuer = "rogue".to_string();
        let token = TokenService::new(&foreign)
            .issue_refresh_token(UserId::new())
            .unwrap();
        assert!(matches!(tokens.verify_refresh_token(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn token_kinds_do_not_cross_even_with_shared_secret() {
        let tokens = TokenService::new(&AuthConfig::new("shared"));
        let user = UserId::new();

        let access = tokens.issue_access_token(user, editor_claim()).unwrap();
        let refresh = tokens.issue_refresh_token(user).unwrap();

        assert!(matches!(tokens.verify_refresh_token(&access), Err(TokenError::Invalid(_))));
        assert!(matches!(tokens.verify_access_token(&refresh), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn refresh_tokens_are_unique_per_issuance() {
        let tokens = TokenService::new(&test_config());
        let user = UserId::new();
        let now = Utc::now();

        let a = tokens.issue_refresh_token_at(user, now).unwrap();
        let b = tokens.issue_refresh_token_at(user, now).unwrap();

        assert_ne!(a, b);
        assert_eq!(tokens.verify_refresh_token(&a).unwrap().sub, user);
    }

    #[test]
    fn expired_refresh_token_is_reported_as_expired() {
        let tokens = TokenService::new(&test_config());
        let issued_at = Utc::now() - tokens.refresh_ttl() - ChronoDuration::seconds(1);
        let token = tokens.issue_refresh_token_at(UserId::new(), issued_at).unwrap();
        assert_eq!(tokens.verify_refresh_token(&token), Err(TokenError::Expired));
    }
}
