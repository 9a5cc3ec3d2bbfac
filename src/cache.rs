use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use moka::future::Cache;
use tracing::{debug, warn};

use crate::{auth::extractors::MaybeUser, state::AppState};

pub const INDEX_KEY_PREFIX: &str = "index_page";

const MAX_PAGE_BYTES: usize = 4 * 1024 * 1024;

/// Rendered pages keyed by string, each entry expiring a fixed time after it was written.
/// Entries are never invalidated by writes elsewhere; only [`PageCache::clear`] drops them early.
#[derive(Clone)]
pub struct PageCache {
    inner: Cache<String, Bytes>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, page: Bytes) {
        self.inner.insert(key, page).await;
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

/// Builds the index cache key. The viewer is part of it because the page header
/// differs between anonymous visitors and each signed-in user.
pub fn index_key(viewer: &MaybeUser, path_and_query: &str) -> String {
    let who = match &viewer.0 {
        Some(user) => user.id.to_string(),
        None => "anon".to_string(),
    };
    format!("{INDEX_KEY_PREFIX}:{who}:{path_and_query}")
}

/// Full-page cache around the index route: GETs are answered from the cache when
/// possible, otherwise the rendered 200 response is stored before being returned.
pub async fn cache_index_page(
    State(state): State<AppState>,
    viewer: MaybeUser,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let key = index_key(&viewer, &path_and_query);

    if let Some(page) = state.page_cache.get(&key).await {
        debug!(%key, "page cache hit");
        return html_response(page);
    }

    let res = next.run(req).await;
    if res.status() != StatusCode::OK {
        return res;
    }
    let (parts, body) = res.into_parts();
    let bytes = match to_bytes(body, MAX_PAGE_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, %key, "could not buffer page for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    state.page_cache.insert(key.clone(), bytes.clone()).await;
    debug!(%key, "page cache filled");
    Response::from_parts(parts, Body::from(bytes))
}

fn html_response(page: Bytes) -> Response {
    let mut res = Response::new(Body::from(page));
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    res
}
