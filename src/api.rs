//! Routes and handlers.
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/` | redirect to `/new/` |
//! | GET | `/new/` | creation form |
//! | POST | `/paste/create` | form body `content`, `expiration` → JSON reply |
//! | GET | `/paste/{id}` | HTML paste page |
//! | GET | `/api/paste/{id}` | JSON paste view |
//! | GET | `/healthz`, `/readyz` | probes |
//!
//! Store calls are blocking file I/O and run on tokio's blocking pool, one
//! task per request.
//!
//! Request bodies are capped at [`body_limit`] bytes, derived from the live
//! `MaxSize`, so an upload far over the limit is never buffered whole.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::SharedConfig;
use crate::error::{Error, Result};
use crate::expiration::Policy;
use crate::store::{Paste, PasteStore};
use crate::{Method, Request, Response, Router, Status, health, page};

/// Percent-encoding can triple each content byte; the rest covers the
/// `expiration` field and the form's keys.
const FORM_OVERHEAD: usize = 4 * 1024;

/// Largest form body worth reading for the current `MaxSize`.
pub fn body_limit(state: &AppState) -> usize {
    state.config.snapshot().max_size.saturating_mul(3).saturating_add(FORM_OVERHEAD)
}

/// State shared by every handler.
pub struct AppState {
    pub store: PasteStore,
    pub config: SharedConfig,
}

/// The full tsubin route table over `state`.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new(state)
        .on(Method::Get,  "/",               index)
        .on(Method::Get,  "/new/",           new_paste)
        .on(Method::Get,  "/paste/create",   index)
        .on(Method::Post, "/paste/create",   create)
        .on(Method::Get,  "/paste/{id}",     show)
        .on(Method::Get,  "/api/paste/{id}", show_json)
        .on(Method::Get,  "/healthz",        health::liveness)
        .on(Method::Get,  "/readyz",         health::readiness)
        .fallback(not_found)
        .access_log_when(|state| state.config.snapshot().debug)
        .body_limit(body_limit)
}

async fn index(_state: Arc<AppState>, _req: Request) -> Response {
    Response::redirect("/new/")
}

async fn new_paste(state: Arc<AppState>, _req: Request) -> Response {
    Response::html(page::new_paste(&state.config.snapshot()))
}

async fn not_found(state: Arc<AppState>, _req: Request) -> Response {
    Response::builder()
        .status(Status::NotFound)
        .html(page::not_found(&state.config.snapshot()))
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Reply {
    Ok { paste: String },
    Error { message: &'static str },
}

/// Always `200`; clients read `status` from the JSON body.
async fn create(state: Arc<AppState>, req: Request) -> Response {
    let max = state.config.snapshot().max_size;
    if req.body_over_limit() {
        info!(max, "rejected paste: request body over limit");
        return json(Status::Ok, &Reply::Error { message: "Content too big" });
    }

    let mut form = req.form();
    let content = form.remove("content").unwrap_or_default();
    let expiration = form.remove("expiration").unwrap_or_default();

    let result = if content.len() > max {
        Err(Error::ContentTooLarge { len: content.len(), max })
    } else {
        let policy = Policy::from_name(&expiration);
        if policy.is_none() {
            warn!(expiration = %expiration, "unrecognized expiration policy, paste will expire at once");
        }
        blocking(state, move |store| store.create(content.as_bytes(), policy)).await
    };

    let reply = match result {
        Ok(paste) => Reply::Ok { paste },
        Err(e @ Error::ContentTooLarge { .. }) => {
            info!("rejected paste: {e}");
            Reply::Error { message: "Content too big" }
        }
        Err(e) => {
            error!("could not save paste: {e}");
            Reply::Error { message: "Could not save" }
        }
    };
    json(Status::Ok, &reply)
}

async fn show(state: Arc<AppState>, req: Request) -> Response {
    let id = req.param("id").unwrap_or_default().to_owned();
    let config = state.config.snapshot();

    match blocking(state, move |store| store.get(&id)).await {
        Ok(paste) => Response::html(page::paste(&config, &paste)),
        Err(e) if e.is_not_found() => {
            Response::builder().status(Status::NotFound).html(page::not_found(&config))
        }
        Err(e) => {
            error!("could not load paste: {e}");
            Response::status(Status::InternalServerError)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasteView {
    id: String,
    content: String,
    keep_alive: bool,
    burn_after_reading: bool,
    expiration: Option<String>,
}

impl From<Paste> for PasteView {
    fn from(p: Paste) -> Self {
        Self {
            content: p.content_lossy().into_owned(),
            id: p.id,
            keep_alive: p.keep_alive,
            burn_after_reading: p.burn_after_reading,
            expiration: p.expiration,
        }
    }
}

async fn show_json(state: Arc<AppState>, req: Request) -> Response {
    let id = req.param("id").unwrap_or_default().to_owned();

    match blocking(state, move |store| store.get(&id)).await {
        Ok(paste) => json(Status::Ok, &PasteView::from(paste)),
        Err(e) if e.is_not_found() => {
            json(Status::NotFound, &Reply::Error { message: "Not found" })
        }
        Err(e) => {
            error!("could not load paste: {e}");
            json(Status::InternalServerError, &Reply::Error { message: "Could not load" })
        }
    }
}

async fn blocking<T, F>(state: Arc<AppState>, f: F) -> Result<T>
where
    F: FnOnce(&PasteStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state.store))
        .await
        .map_err(|e| Error::Persistence(io::Error::other(e)))?
}

/// Runs [`PasteStore::sweep`] every `every` until the process exits.
pub async fn sweep_every(state: Arc<AppState>, every: Duration) {
    let mut ticks = tokio::time::interval(every);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        match blocking(Arc::clone(&state), |store| store.sweep(Utc::now())).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "sweep removed expired pastes"),
            Err(e) => warn!("sweep failed: {e}"),
        }
    }
}

fn json<T: Serialize>(status: Status, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder().status(status).json(body),
        Err(e) => {
            error!("could not encode reply: {e}");
            Response::status(Status::InternalServerError)
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::Config;

    fn app(max_size: usize) -> (TempDir, Router<AppState>) {
        let dir = TempDir::new().unwrap();
        let state = AppState {
            store: PasteStore::open(dir.path().join("pastes")).unwrap(),
            config: SharedConfig::new(Config { max_size, ..Config::default() }),
        };
        (dir, router(state))
    }

    #[test]
    fn body_limit_tracks_max_size() {
        let (_dir, app) = app(100);
        assert_eq!(app.max_body(), 300 + FORM_OVERHEAD);

        app.state().config.replace(Config { max_size: 1000, ..Config::default() });
        assert_eq!(app.max_body(), 3000 + FORM_OVERHEAD);
    }

    #[tokio::test]
    async fn body_over_limit_is_content_too_big() {
        let (dir, app) = app(8);
        let mut req = Request::new(Method::Post, "/paste/create");
        req.over_limit = true;

        let res = app.dispatch(req).await;
        assert_eq!(res.status_code(), 200);
        let reply: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["message"], "Content too big");
        assert_eq!(std::fs::read_dir(dir.path().join("pastes")).unwrap().count(), 0);
    }
}
