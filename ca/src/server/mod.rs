//! HTTP layer - exposes the agent over a small JSON API

mod http;

pub use http::{router, serve, AppState};
