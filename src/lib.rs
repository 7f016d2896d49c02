//! # tsubin
//!
//! A minimal self-hosted pastebin. Pastes are stored one file per paste,
//! named after a hash of their content, and expire after a day, a month,
//! "never" (a hundred years), or right after they are read.
//!
//! ## Lifecycle
//!
//! - [`id`] derives the identifier: URL-safe base64 of the content's SHA-1.
//! - [`expiration`] turns a policy into a stored [`Marker`] and evaluates
//!   it against the clock.
//! - [`store`] persists pastes and deletes them lazily, on the read that
//!   finds them expired or consumes a burn-after-reading paste.
//!
//! Everything else (routing, pages, config reload) is glue around
//! [`PasteStore`].
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use tsubin::{AppState, Config, PasteStore, Server, SharedConfig, api};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tsubin::Error> {
//!     let config = Config::default();
//!     let state = AppState {
//!         store: PasteStore::open(&config.pastes_dir)?,
//!         config: SharedConfig::new(config.clone()),
//!     };
//!     Server::bind(config.addr()).serve(api::router(state)).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod api;
pub mod config;
pub mod expiration;
pub mod health;
pub mod id;
pub mod middleware;
pub mod page;
pub mod store;

pub use api::AppState;
pub use config::{Config, SharedConfig};
pub use error::{Error, Result};
pub use expiration::{Marker, Outcome, Policy};
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
pub use store::{Paste, PasteStore};
