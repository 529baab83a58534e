//! Highlight service
//!
//! Async glue between the synchronous overlay engine and the store: restore
//! a page from stored records, and apply a toolbar style then persist it.

use thiserror::Error;
use uuid::Uuid;

use super::facade::{HighlightStore, UpsertOutcome};
use super::store::StoreError;
use super::types::{HighlightRecord, StyleDelta};
use crate::dom::Document;
use crate::overlay::{OverlayEngine, OverlayError, RestoreReport, SelectionSession};

/// Errors from the highlight service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Overlay(#[from] OverlayError),

    /// The document was decorated but the record could not be saved
    #[error("Highlight {} was applied but not saved: {source}", .record.id)]
    NotPersisted {
        record: Box<HighlightRecord>,
        source: StoreError,
    },
}

/// Restores and persists highlights for documents
#[derive(Clone)]
pub struct HighlightService {
    store: HighlightStore,
    engine: OverlayEngine,
}

impl HighlightService {
    pub fn new(store: HighlightStore, engine: OverlayEngine) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &HighlightStore {
        &self.store
    }

    pub fn engine(&self) -> &OverlayEngine {
        &self.engine
    }

    /// Decorate `doc` with the highlights stored for `url`
    pub async fn restore(&self, doc: &mut Document, url: &str) -> Result<RestoreReport, ServiceError> {
        let report = match self.store.page(url).await? {
            Some(page) => self.engine.restore(doc, &page),
            None => RestoreReport::default(),
        };
        Ok(report)
    }

    /// Apply the session's style to `doc`, then save the record
    ///
    /// A failed save leaves the decoration in place and is reported as
    /// [`ServiceError::NotPersisted`].
    pub async fn apply_and_persist(
        &self,
        doc: &mut Document,
        url: &str,
        title: &str,
        session: SelectionSession,
        delta: &StyleDelta,
    ) -> Result<UpsertOutcome, ServiceError> {
        let existing = match session.target() {
            Some(id) => self
                .store
                .page(url)
                .await?
                .and_then(|page| page.get(id).cloned()),
            None => None,
        };

        let record = self
            .engine
            .apply_style(doc, session, delta, existing.as_ref())?;

        match self.store.upsert(url, title, &record).await {
            Ok(outcome) => Ok(outcome),
            Err(source) => {
                tracing::error!("Failed to save highlight {}: {}", record.id, source);
                Err(ServiceError::NotPersisted {
                    record: Box::new(record),
                    source,
                })
            }
        }
    }

    /// Remove a highlight from `doc` and from the store
    pub async fn remove(
        &self,
        doc: &mut Document,
        url: &str,
        id: Uuid,
    ) -> Result<HighlightRecord, ServiceError> {
        let unwrapped = self.engine.remove(doc, id);
        tracing::debug!("Unwrapped {} decorations for {}", unwrapped, id);
        Ok(self.store.delete(url, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_markup, to_markup, NodeId, Range};
    use crate::highlights::{MemoryPageStore, PageRecord, PageStore};
    use async_trait::async_trait;
    use std::sync::Arc;

    const URL: &str = "https://example.com/post";
    const PAGE: &str = "<html><body><p>Alpha beta gamma</p><p>Delta</p></body></html>";

    fn find_text(doc: &Document, text: &str) -> NodeId {
        doc.descendants(doc.root())
            .find(|&n| doc.text(n) == Some(text))
            .unwrap()
    }

    fn service_with(backend: Arc<dyn PageStore>) -> HighlightService {
        HighlightService::new(HighlightStore::new(backend), OverlayEngine::default())
    }

    /// Backend whose writes always fail
    struct ReadOnlyStore;

    #[async_trait]
    impl PageStore for ReadOnlyStore {
        async fn get(&self, _url: &str) -> Result<Option<PageRecord>, StoreError> {
            Ok(None)
        }

        async fn set(&self, _url: &str, _page: &PageRecord) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn list(&self) -> Result<Vec<(String, PageRecord)>, StoreError> {
            Ok(vec![])
        }

        async fn remove(&self, _url: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_apply_persist_and_restore() {
        let service = service_with(Arc::new(MemoryPageStore::new()));
        let mut doc = parse_markup(PAGE).unwrap();
        let t = find_text(&doc, "Alpha beta gamma");
        let session = service
            .engine()
            .begin_session(&doc, Range::within(t, 6, 10))
            .unwrap();

        let outcome = service
            .apply_and_persist(&mut doc, URL, "Post", session, &StyleDelta::default())
            .await
            .unwrap();
        assert!(matches!(outcome, UpsertOutcome::Added(_)));
        assert_eq!(outcome.record().text, "beta");

        let mut reloaded = parse_markup(PAGE).unwrap();
        let report = service.restore(&mut reloaded, URL).await.unwrap();
        assert_eq!(report.applied, vec![outcome.record().id]);
        assert_eq!(to_markup(&reloaded), to_markup(&doc));
    }

    #[tokio::test]
    async fn test_edit_goes_through_store_record() {
        let service = service_with(Arc::new(MemoryPageStore::new()));
        let mut doc = parse_markup(PAGE).unwrap();
        let t = find_text(&doc, "Delta");
        let session = service
            .engine()
            .begin_session(&doc, Range::within(t, 0, 5))
            .unwrap();
        let added = service
            .apply_and_persist(&mut doc, URL, "Post", session, &StyleDelta::default())
            .await
            .unwrap()
            .into_record();

        let session = service
            .engine()
            .begin_session(&doc, Range::within(find_text(&doc, "Delta"), 1, 3))
            .unwrap();
        let delta = StyleDelta {
            italic: Some(true),
            ..Default::default()
        };
        let outcome = service
            .apply_and_persist(&mut doc, URL, "", session, &delta)
            .await
            .unwrap();

        assert!(matches!(outcome, UpsertOutcome::Updated(_)));
        let page = service.store().page(URL).await.unwrap().unwrap();
        assert_eq!(page.highlights.len(), 1);
        assert_eq!(page.highlights[0].id, added.id);
        assert!(page.highlights[0].italic);
        assert_eq!(page.title, "Post");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_decoration() {
        let service = service_with(Arc::new(ReadOnlyStore));
        let mut doc = parse_markup(PAGE).unwrap();
        let t = find_text(&doc, "Delta");
        let session = service
            .engine()
            .begin_session(&doc, Range::within(t, 0, 5))
            .unwrap();

        let err = service
            .apply_and_persist(&mut doc, URL, "Post", session, &StyleDelta::default())
            .await
            .unwrap_err();

        match err {
            ServiceError::NotPersisted { record, .. } => {
                let elements = service.engine().decorator().decorations(&doc, record.id);
                assert_eq!(elements.len(), 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_remove_unwraps_and_deletes() {
        let service = service_with(Arc::new(MemoryPageStore::new()));
        let mut doc = parse_markup(PAGE).unwrap();
        let t = find_text(&doc, "Delta");
        let session = service
            .engine()
            .begin_session(&doc, Range::within(t, 0, 2))
            .unwrap();
        let record = service
            .apply_and_persist(&mut doc, URL, "Post", session, &StyleDelta::default())
            .await
            .unwrap()
            .into_record();

        service.remove(&mut doc, URL, record.id).await.unwrap();
        assert_eq!(to_markup(&doc), to_markup(&parse_markup(PAGE).unwrap()));
        assert!(service.store().page(URL).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_unknown_page() {
        let service = service_with(Arc::new(MemoryPageStore::new()));
        let mut doc = parse_markup(PAGE).unwrap();
        let report = service.restore(&mut doc, URL).await.unwrap();
        assert_eq!(report, RestoreReport::default());
    }
}
