//! Unified error type.

use std::io;

use thiserror::Error;

/// The error type returned by tsubin's fallible operations.
///
/// Lookup failures are deliberately coarse: an identifier that fails the
/// character-set check and a paste that never existed (or just expired)
/// both surface to HTTP clients as the same 404. See [`Error::is_not_found`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid paste identifier")]
    InvalidIdentifier,

    #[error("paste not found")]
    NotFound,

    #[error("content too big: {len} bytes exceeds the {max} byte limit")]
    ContentTooLarge { len: usize, max: usize },

    /// Writing or deleting a paste record failed.
    #[error("persistence: {0}")]
    Persistence(#[source] io::Error),

    #[error("config: {0}")]
    Config(String),

    /// Binding a port or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// `true` for every error that must be rendered as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::InvalidIdentifier | Self::NotFound)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
