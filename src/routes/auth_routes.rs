//! HTTP Routes for signup and login
//!
//! - POST /signup - Register a name under a role and get a credential
//! - POST /login  - Check name and PIN and get a credential

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::Role;
use crate::routes::{json_response, lenient_string, parse_json_body, BodyError, BoxBody};
use crate::server::AppState;
use crate::services::{LoginInput, Session, SignupInput};
use crate::types::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pin: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub teacher_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub role: Role,
    pub name: String,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            success: true,
            token: session.token,
            role: session.role,
            name: session.name,
        }
    }
}

/// POST /signup
pub async fn handle_signup<B>(req: Request<B>, state: Arc<AppState>) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BodyError>,
{
    let body: SignupRequest = parse_json_body(req).await?;

    let session = state
        .accounts
        .signup(SignupInput {
            name: body.name.unwrap_or_default(),
            role: Role::from_request(body.role.as_deref()),
            pin: body.pin.unwrap_or_default(),
            teacher_code: body.teacher_code,
        })
        .await?;

    Ok(json_response(StatusCode::OK, &AuthResponse::from(session)))
}

/// POST /login
pub async fn handle_login<B>(req: Request<B>, state: Arc<AppState>) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BodyError>,
{
    let body: LoginRequest = parse_json_body(req).await?;

    let session = state
        .accounts
        .login(LoginInput {
            name: body.name.unwrap_or_default(),
            role: Role::from_request(body.role.as_deref()),
            pin: body.pin.unwrap_or_default(),
        })
        .await?;

    Ok(json_response(StatusCode::OK, &AuthResponse::from(session)))
}
