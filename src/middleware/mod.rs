//! Cross-cutting request concerns.
//!
//! - [`trace`] — one access line per request: peer, method, path, status, latency.

pub mod trace;
