//! Public entry points.

pub mod http;

pub use http::{router, serve, HttpState};
