//! Per-request access logging.
//!
//! Enabled through [`Router::access_log_when`](crate::Router::access_log_when);
//! tsubin turns it on while the live config has `Debug: true`.

use std::net::SocketAddr;
use std::time::Instant;

use tracing::info;

use crate::method::Method;
use crate::request::Request;

pub(crate) struct AccessLog {
    peer: Option<SocketAddr>,
    method: Method,
    path: String,
    started: Instant,
}

impl AccessLog {
    pub(crate) fn begin(req: &Request) -> Self {
        Self {
            peer: req.peer(),
            method: req.method(),
            path: req.path().to_owned(),
            started: Instant::now(),
        }
    }

    pub(crate) fn finish(self, status: u16) {
        let peer = self.peer.map_or_else(|| "-".to_owned(), |p| p.to_string());
        info!(
            target: "tsubin::access",
            peer = %peer,
            method = %self.method,
            path = %self.path,
            status,
            elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "request"
        );
    }
}
