//! Notes view API routes
//!
//! Pages are addressed by their URL in the `url` query parameter; the
//! server normalizes it before lookup.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::highlights::{HighlightRecord, HighlightStore, PageRecord, PageSummary};
use crate::state::AppState;

/// Extended state with the highlight store
#[derive(Clone)]
pub struct PagesState {
    pub store: HighlightStore,
}

/// Page selector
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub url: String,
}

/// Note update request
#[derive(Debug, Deserialize)]
pub struct NoteUpdate {
    pub note: String,
}

/// Create the pages router
pub fn router(store: HighlightStore) -> Router<AppState> {
    let state = PagesState { store };

    Router::new()
        .route("/", get(list_pages))
        .route("/page", get(get_page))
        .route(
            "/page/highlights/:index",
            delete(delete_highlight_at).patch(update_note),
        )
        .route("/page/highlight/:id", delete(delete_highlight))
        .layer(axum::Extension(state))
}

/// List pages with highlights
async fn list_pages(
    axum::Extension(state): axum::Extension<PagesState>,
) -> Result<Json<Vec<PageSummary>>> {
    let pages = state.store.pages().await?;
    Ok(Json(pages))
}

/// Get all highlights of a page
async fn get_page(
    axum::Extension(state): axum::Extension<PagesState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageRecord>> {
    let page = state
        .store
        .page(&query.url)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No highlights for page: {}", query.url)))?;
    Ok(Json(page))
}

/// Replace the note of the highlight at a list position
async fn update_note(
    axum::Extension(state): axum::Extension<PagesState>,
    Path(index): Path<usize>,
    Query(query): Query<PageQuery>,
    Json(data): Json<NoteUpdate>,
) -> Result<Json<HighlightRecord>> {
    let record = state
        .store
        .update_note_at(&query.url, index, &data.note)
        .await?;
    Ok(Json(record))
}

/// Delete the highlight at a list position
async fn delete_highlight_at(
    axum::Extension(state): axum::Extension<PagesState>,
    Path(index): Path<usize>,
    Query(query): Query<PageQuery>,
) -> Result<StatusCode> {
    state.store.delete_at(&query.url, index).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a highlight by identifier
async fn delete_highlight(
    axum::Extension(state): axum::Extension<PagesState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<StatusCode> {
    state.store.delete(&query.url, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
