//! Shared types for Showcase

pub mod error;

pub use error::{GalleryError, Result, GENERIC_FAILURE};
