//! Render and apply API routes
//!
//! Both endpoints take the page markup, restore the page's stored
//! highlights onto it and return the decorated markup.

use axum::{http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::anchor::{resolve_anchor, SelectionAnchor};
use crate::dom::{parse_markup, to_markup, Document};
use crate::error::Result;
use crate::highlights::{HighlightRecord, HighlightService, StyleDelta, UpsertOutcome};
use crate::html::sanitize_html;
use crate::overlay::{OverlayError, RestoreReport};
use crate::state::AppState;

/// Extended state with the highlight service
#[derive(Clone)]
pub struct RenderState {
    pub service: HighlightService,
}

/// Render request
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub url: String,
    pub html: String,
}

/// Render response
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub html: String,
    pub report: RestoreReport,
}

/// Toolbar action submitted for a page
#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub html: String,
    /// Anchor of the selection in the page with its highlights restored
    pub anchor: SelectionAnchor,
    #[serde(default)]
    pub delta: StyleDelta,
    /// Highlight to edit, when the caller already knows it
    #[serde(default)]
    pub target: Option<Uuid>,
}

/// Apply response
#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub record: HighlightRecord,
    pub created: bool,
    pub html: String,
}

/// Create the render router
pub fn router(service: HighlightService) -> Router<AppState> {
    let state = RenderState { service };

    Router::new()
        .route("/render", post(render_page))
        .route("/highlights", post(apply_highlight))
        .layer(axum::Extension(state))
}

fn load_document(html: &str) -> Result<Document> {
    let clean = sanitize_html(html)?;
    Ok(parse_markup(&clean)?)
}

/// Restore a page's highlights onto submitted markup
async fn render_page(
    axum::Extension(state): axum::Extension<RenderState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>> {
    let mut doc = load_document(&request.html)?;
    let report = state.service.restore(&mut doc, &request.url).await?;

    Ok(Json(RenderResponse {
        html: to_markup(&doc),
        report,
    }))
}

/// Apply a style to an anchored selection and save the highlight
async fn apply_highlight(
    axum::Extension(state): axum::Extension<RenderState>,
    Json(request): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplyResponse>)> {
    let service = &state.service;
    let mut doc = load_document(&request.html)?;
    let report = service.restore(&mut doc, &request.url).await?;
    if !report.failed.is_empty() {
        tracing::warn!(
            "{} stored highlights failed to restore on {}",
            report.failed.len(),
            request.url
        );
    }

    let resolved = resolve_anchor(&doc, &request.anchor).map_err(OverlayError::from)?;
    let mut session = service.engine().begin_session(&doc, resolved.range)?;
    if let Some(id) = request.target {
        session = session.with_target(id);
    }

    let outcome = service
        .apply_and_persist(&mut doc, &request.url, &request.title, session, &request.delta)
        .await?;

    let (status, created) = match outcome {
        UpsertOutcome::Added(_) => (StatusCode::CREATED, true),
        UpsertOutcome::Updated(_) => (StatusCode::OK, false),
    };
    Ok((
        status,
        Json(ApplyResponse {
            record: outcome.into_record(),
            created,
            html: to_markup(&doc),
        }),
    ))
}
