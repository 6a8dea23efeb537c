//! Showcase - gallery gateway for student projects
//!
//! Students sign up with their full name and a PIN, upload project files,
//! and name classmates as co-creators. Teachers see every project; students
//! see what they made or helped make.
//!
//! ## Modules
//!
//! - **Assets**: asset repository seam, context-string codec, visibility rules
//! - **Identity**: full-name rules and the identity resolver
//! - **Auth**: bearer credentials, PIN hashing, per-route access
//! - **Services**: signup/login and gallery operations
//! - **Routes/Server**: the HTTP surface

pub mod assets;
pub mod auth;
pub mod config;
pub mod db;
pub mod identity;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GalleryError, Result};
