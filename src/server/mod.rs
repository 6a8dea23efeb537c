//! HTTP server for Showcase

pub mod http;

pub use http::{build_state, route, run, AppState, StoreKinds};

#[cfg(test)]
pub(crate) use http::test_state;
