//! HTTP front-end for the leaderboard.
//!
//! - `POST /score` with a body of `{"name": <string>, "score": <number>}`
//!   records a score.
//! - `GET /scores?limit=N` returns the top `N` scores (default 10, at most
//!   50).
//!
//! Every request performs a full read (and, for submissions, a full rewrite)
//! of the scores file on the blocking thread pool.  Requests are serialized
//! through a single mutex so that concurrent submissions within this process
//! can't overwrite each other.
use crate::consts;
use crate::leaderboard::{InvalidPayload, LeaderboardStore, Submission};
use actix_web::{http::StatusCode, web, App, HttpResponse, HttpServer, ResponseError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

type SharedStore = web::Data<Mutex<LeaderboardStore>>;

/// Serve the leaderboard kept in `store` on `host`:`port` until the process is
/// interrupted
pub(crate) async fn serve(store: LeaderboardStore, host: String, port: u16) -> anyhow::Result<()> {
    store.ensure_exists()?;
    log::info!("Leaderboard stored at {}", store.path().display());
    let data = web::Data::new(Mutex::new(store));
    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
        .bind((host.as_str(), port))?;
    log::info!("Server running at http://{host}:{port}");
    server.run().await?;
    Ok(())
}

/// Configure the leaderboard routes
pub(crate) fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/score", web::post().to(post_score))
        .route("/scores", web::get().to(get_scores));
}

async fn post_score(store: SharedStore, body: web::Bytes) -> Result<HttpResponse, ServerError> {
    let value = serde_json::from_slice::<Value>(&body).map_err(|_| InvalidPayload)?;
    let submission = Submission::from_json(&value)?;
    let record = match web::block(move || lock(&store).submit(submission)).await {
        Ok(Ok(record)) => record,
        Ok(Err(e)) => {
            log::error!("{:#}", anyhow::Error::new(e));
            return Err(ServerError::Save);
        }
        Err(e) => {
            log::error!("Score submission task failed: {e}");
            return Err(ServerError::Save);
        }
    };
    log::info!("Recorded score {} for {:?}", record.score, record.name);
    Ok(HttpResponse::Ok().json(json!({"ok": true})))
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct ScoresQuery {
    limit: Option<String>,
}

async fn get_scores(
    store: SharedStore,
    query: web::Query<ScoresQuery>,
) -> Result<HttpResponse, ServerError> {
    let limit = query
        .limit
        .as_deref()
        .and_then(parse_limit)
        .unwrap_or(consts::DEFAULT_TOP_LIMIT);
    let records = web::block(move || lock(&store).top_n(limit))
        .await
        .map_err(|e| {
            log::error!("Leaderboard query task failed: {e}");
            ServerError::Read
        })?;
    Ok(HttpResponse::Ok().json(records))
}

/// Store operations do blocking file I/O, so callers run them on actix's
/// blocking thread pool via [`web::block`] rather than on a worker thread.
///
/// The store holds no in-memory state that a panicking request could leave
/// half-updated, so a poisoned lock is still usable.
fn lock(store: &Mutex<LeaderboardStore>) -> MutexGuard<'_, LeaderboardStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parse the leading integer of a `limit` query parameter, ignoring any
/// trailing junk.  Negative values come out as zero, and values too large for
/// a `usize` as `usize::MAX`; both are clamped later.  Returns `None` if there
/// is no leading integer.
fn parse_limit(s: &str) -> Option<usize> {
    let s = s.trim_start();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let digits = &s[..end];
    if digits.is_empty() {
        None
    } else if negative {
        Some(0)
    } else {
        Some(digits.parse::<usize>().unwrap_or(usize::MAX))
    }
}

#[derive(Debug, Error)]
enum ServerError {
    #[error(transparent)]
    InvalidPayload(#[from] InvalidPayload),
    #[error("Failed to save score")]
    Save,
    #[error("Failed to read scores")]
    Read,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ServerError::Save | ServerError::Read => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({"error": self.to_string()}))
    }
}
