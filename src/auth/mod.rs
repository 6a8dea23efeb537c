//! Authentication and authorization for Showcase
//!
//! Provides:
//! - Bearer credential issuance and verification
//! - Roles and the per-route access table
//! - PIN hashing with Argon2

pub mod jwt;
pub mod password;
pub mod permissions;

pub use jwt::{
    extract_token_from_header, Caller, Claims, CredentialService, TokenValidationResult,
    CREDENTIAL_TTL_SECONDS,
};
pub use password::{hash_pin, hash_pin_blocking, verify_pin, verify_pin_blocking};
pub use permissions::{access_denied_message, get_required_access, is_route_allowed, Access, Role};
