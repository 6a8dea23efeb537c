//! Signup and login
//!
//! Both flows validate the name shape and PIN presence before any store
//! access, then hand the resolved identity to the [`CredentialService`].

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{CredentialService, Role};
use crate::identity::{is_valid_full_name, Identity, IdentityResolver, INVALID_NAME_MESSAGE};
use crate::types::{GalleryError, Result};

pub const PIN_REQUIRED_MESSAGE: &str = "PIN is required.";
pub const INVALID_TEACHER_CODE_MESSAGE: &str = "Invalid Teacher Access Code.";
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid name or PIN";

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub name: String,
    pub role: Role,
    pub pin: String,
    pub teacher_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub name: String,
    pub role: Role,
    pub pin: String,
}

/// A freshly issued credential and who it speaks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub name: String,
}

#[derive(Clone)]
pub struct AccountService {
    identities: IdentityResolver,
    credentials: Arc<CredentialService>,
    teacher_code: String,
}

impl AccountService {
    pub fn new(
        identities: IdentityResolver,
        credentials: Arc<CredentialService>,
        teacher_code: impl Into<String>,
    ) -> Self {
        Self {
            identities,
            credentials,
            teacher_code: teacher_code.into(),
        }
    }

    /// Register a new identity and sign it in
    pub async fn signup(&self, input: SignupInput) -> Result<Session> {
        let pin = validate(&input.name, &input.pin)?;

        if input.role == Role::Teacher {
            let code = input.teacher_code.as_deref().map(str::trim).unwrap_or("");
            if self.teacher_code.is_empty() || code != self.teacher_code {
                warn!("Teacher signup with wrong access code");
                return Err(GalleryError::InvalidCredential(
                    INVALID_TEACHER_CODE_MESSAGE.into(),
                ));
            }
        }

        let identity = self.identities.create(&input.name, input.role, pin).await?;
        info!(name = %identity.name, role = %identity.role, "Signed up");
        self.session_for(identity)
    }

    /// Sign in an existing identity
    pub async fn login(&self, input: LoginInput) -> Result<Session> {
        let pin = validate(&input.name, &input.pin)?;

        match self.identities.verify(&input.name, input.role, pin).await? {
            Some(identity) => {
                info!(name = %identity.name, role = %identity.role, "Logged in");
                self.session_for(identity)
            }
            None => {
                warn!(role = %input.role, "Failed login");
                Err(GalleryError::InvalidCredential(INVALID_LOGIN_MESSAGE.into()))
            }
        }
    }

    fn session_for(&self, identity: Identity) -> Result<Session> {
        let token = self.credentials.issue(&identity)?;
        Ok(Session {
            token,
            role: identity.role,
            name: identity.name,
        })
    }
}

/// Check the name shape and return the trimmed PIN
fn validate<'a>(name: &str, pin: &'a str) -> Result<&'a str> {
    if !is_valid_full_name(name) {
        return Err(GalleryError::InvalidName(INVALID_NAME_MESSAGE.into()));
    }

    let pin = pin.trim();
    if pin.is_empty() {
        return Err(GalleryError::MissingSecret(PIN_REQUIRED_MESSAGE.into()));
    }
    Ok(pin)
}
