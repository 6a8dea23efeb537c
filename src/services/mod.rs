//! Services layer for Showcase
//!
//! Business logic that sits between the HTTP routes and the stores.
//!
//! ## Services
//!
//! - **Accounts**: signup and login, turning a name and PIN into a credential
//! - **Gallery**: listing, upload, retitle and delete of projects

pub mod accounts;
pub mod gallery;

pub use accounts::{AccountService, LoginInput, Session, SignupInput};
pub use gallery::{GalleryService, RetitleOutcome, UploadFile, UploadInput, UploadedProject};
