//! Bearer credentials for gallery callers
//!
//! Provides functions for issuing and verifying the JWT a caller presents on
//! every request after signup or login.
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - Expiry is fixed at issuance to 30 days
//! - There is no revocation list; rotating AUTH_SECRET invalidates every
//!   outstanding token at once
//! - A token outlives its identity: removal from the store does not
//!   invalidate tokens already issued

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::Role;
use crate::identity::Identity;
use crate::types::GalleryError;

/// Lifetime of an issued credential
pub const CREDENTIAL_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Payload stored in the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Display name exactly as stored at signup
    pub name: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Verified caller extracted from a credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub name: String,
    pub role: Role,
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Self {
            name: claims.name,
            role: claims.role,
        }
    }
}

/// Result of token validation
#[derive(Debug)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

impl TokenValidationResult {
    pub fn valid(claims: Claims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            claims: None,
            error: Some(error.into()),
        }
    }
}

/// Issues and verifies bearer credentials
#[derive(Clone)]
pub struct CredentialService {
    secret: String,
    ttl_seconds: u64,
}

impl CredentialService {
    /// Create a new credential service
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, ttl_seconds: u64) -> Result<Self, GalleryError> {
        if secret.is_empty() {
            return Err(GalleryError::Config(
                "AUTH_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < 32 {
            return Err(GalleryError::Config(
                "AUTH_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            ttl_seconds,
        })
    }

    /// Create a service for dev mode (fixed, publicly known secret)
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            ttl_seconds: CREDENTIAL_TTL_SECONDS,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Issue a credential for a resolved identity
    pub fn issue(&self, identity: &Identity) -> Result<String, GalleryError> {
        self.issue_at(&identity.name, identity.role, unix_now()?)
    }

    /// Issue a credential as of `now` (Unix seconds)
    pub fn issue_at(&self, name: &str, role: Role, now: u64) -> Result<String, GalleryError> {
        let exp = now.checked_add(self.ttl_seconds).ok_or_else(|| {
            GalleryError::Config("Credential lifetime overflows the clock".into())
        })?;
        let claims = Claims {
            name: name.to_string(),
            role,
            iat: now,
            exp,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| GalleryError::Internal(format!("Failed to issue token: {}", e)))
    }

    /// Verify a token as of `now`, keeping the failure reason for logging
    pub fn validate_token_at(&self, token: &str, now: u64) -> TokenValidationResult {
        // Expiry is checked below against `now` so a fixed clock can be used
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(token_data) if token_data.claims.exp <= now => {
                TokenValidationResult::invalid("Token expired")
            }
            Ok(token_data) => TokenValidationResult::valid(token_data.claims),
            Err(err) => {
                use jsonwebtoken::errors::ErrorKind;
                let error_msg = match err.kind() {
                    ErrorKind::InvalidToken => "Invalid token",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    ErrorKind::InvalidAlgorithm => "Invalid algorithm",
                    ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => "Malformed claims",
                    _ => "Token validation failed",
                };
                TokenValidationResult::invalid(error_msg)
            }
        }
    }

    /// Verify a token, failing closed: any problem means "unauthenticated"
    pub fn verify(&self, token: &str) -> Option<Caller> {
        let now = unix_now().ok()?;
        self.verify_at(token, now)
    }

    /// [`verify`](Self::verify) as of `now` (Unix seconds)
    pub fn verify_at(&self, token: &str, now: u64) -> Option<Caller> {
        let result = self.validate_token_at(token, now);
        if let Some(reason) = &result.error {
            tracing::debug!("Rejected bearer credential: {}", reason);
        }
        result.claims.map(Caller::from)
    }
}

fn unix_now() -> Result<u64, GalleryError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| GalleryError::Internal(format!("System time error: {}", e)))
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" with any casing of the scheme.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?.trim();
    let (scheme, token) = header.split_once(char::is_whitespace)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_760_000_000;

    fn test_service() -> CredentialService {
        CredentialService::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            CREDENTIAL_TTL_SECONDS,
        )
        .unwrap()
    }

    fn identity(name: &str, role: Role) -> Identity {
        Identity {
            name: name.to_string(),
            role,
            pin_hash: "$argon2id$unused".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = test_service();
        let token = service.issue(&identity("Ada Lovelace", Role::Student)).unwrap();
        assert!(!token.is_empty());

        let caller = service.verify(&token).unwrap();
        assert_eq!(caller.name, "Ada Lovelace");
        assert_eq!(caller.role, Role::Student);
    }

    #[test]
    fn test_claims_carry_thirty_day_window() {
        let service = test_service();
        let token = service.issue_at("Grace Hopper", Role::Teacher, NOW).unwrap();

        let result = service.validate_token_at(&token, NOW);
        assert!(result.valid);
        let claims = result.claims.unwrap();
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + 30 * 24 * 60 * 60);
        assert_eq!(claims.role, Role::Teacher);
    }

    #[test]
    fn test_expired_token() {
        let service = test_service();
        let token = service.issue_at("Ada Lovelace", Role::Student, NOW).unwrap();

        let last_second = NOW + CREDENTIAL_TTL_SECONDS - 1;
        assert!(service.verify_at(&token, last_second).is_some());

        assert!(service.verify_at(&token, NOW + CREDENTIAL_TTL_SECONDS).is_none());
        let result = service.validate_token_at(&token, NOW + CREDENTIAL_TTL_SECONDS + 1);
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Token expired"));
    }

    #[test]
    fn test_invalid_token() {
        let service = test_service();

        let result = service.validate_token_at("invalid-token", NOW);
        assert!(!result.valid);
        assert!(result.error.is_some());
        assert!(service.verify("").is_none());
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = test_service();
        let service2 = CredentialService::new(
            "different-secret-that-is-at-least-32-characters".into(),
            CREDENTIAL_TTL_SECONDS,
        )
        .unwrap();

        let token = service1.issue_at("Ada Lovelace", Role::Student, NOW).unwrap();

        // Verify with wrong secret should fail
        assert!(service2.verify_at(&token, NOW).is_none());
    }

    #[test]
    fn test_tampered_payload() {
        let service = test_service();
        let token = service.issue_at("Ada Lovelace", Role::Student, NOW).unwrap();
        let forged = service.issue_at("Ada Lovelace", Role::Teacher, NOW).unwrap();

        // Graft the teacher payload onto the student signature
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(service.verify_at(&spliced, NOW).is_none());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(
            extract_token_from_header(Some("bearer   abc123 ")),
            Some("abc123")
        );

        // Empty cases
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);

        // Invalid format
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
        assert_eq!(extract_token_from_header(Some("abc123")), None);
    }

    #[test]
    fn test_secret_validation() {
        assert!(CredentialService::new("short".into(), CREDENTIAL_TTL_SECONDS).is_err());
        assert!(CredentialService::new("".into(), CREDENTIAL_TTL_SECONDS).is_err());
        assert!(CredentialService::new(
            "this-secret-is-at-least-32-chars-long".into(),
            CREDENTIAL_TTL_SECONDS
        )
        .is_ok());
    }

    #[test]
    fn test_oversized_lifetime_is_an_error() {
        let service = CredentialService::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            u64::MAX,
        )
        .unwrap();
        let err = service.issue_at("Ada Lovelace", Role::Student, NOW).unwrap_err();
        assert!(matches!(err, GalleryError::Config(_)));
    }

    #[test]
    fn test_dev_mode_service() {
        let service = CredentialService::new_dev();
        let token = service.issue_at("Ada Lovelace", Role::Teacher, NOW).unwrap();
        assert!(service.verify_at(&token, NOW + 1).is_some());
    }
}
