//! Highlight record store facade
//!
//! Merge policy over a [`PageStore`]: records are upserted by identifier,
//! keeping their creation time and position in the page's list.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::page_url::normalize_page_url;
use super::store::{PageStore, Result, StoreError};
use super::types::{reduce, HighlightDelta, HighlightRecord, PageRecord, PageSummary};

/// Whether an upsert inserted or edited a record
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Added(HighlightRecord),
    Updated(HighlightRecord),
}

impl UpsertOutcome {
    /// The record as stored
    pub fn record(&self) -> &HighlightRecord {
        match self {
            UpsertOutcome::Added(record) | UpsertOutcome::Updated(record) => record,
        }
    }

    pub fn into_record(self) -> HighlightRecord {
        match self {
            UpsertOutcome::Added(record) | UpsertOutcome::Updated(record) => record,
        }
    }
}

/// Highlight store facade
///
/// Writes read the whole page and store it back, so they are serialized
/// through one lock shared by all clones.
#[derive(Clone)]
pub struct HighlightStore {
    backend: Arc<dyn PageStore>,
    writes: Arc<Mutex<()>>,
}

impl HighlightStore {
    pub fn new(backend: Arc<dyn PageStore>) -> Self {
        Self {
            backend,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Insert `record`, or edit the stored record with the same identifier
    ///
    /// An edit replaces color, bold, italic and note; `createdAt`, the text
    /// snapshot, the anchor and the list position are kept.
    pub async fn upsert(
        &self,
        url: &str,
        title: &str,
        record: &HighlightRecord,
    ) -> Result<UpsertOutcome> {
        let key = normalize_page_url(url)?;
        let _guard = self.writes.lock().await;
        let mut page = self.backend.get(&key).await?.unwrap_or_default();
        if !title.is_empty() {
            page.title = title.to_string();
        }

        let outcome = match page.position(record.id) {
            Some(index) => {
                let stored = &mut page.highlights[index];
                stored.color = record.color.clone();
                stored.bold = record.bold;
                stored.italic = record.italic;
                stored.note = record.note.clone();
                stored.updated_at = stored.updated_at.max(record.updated_at);
                UpsertOutcome::Updated(stored.clone())
            }
            None => {
                page.highlights.push(record.clone());
                UpsertOutcome::Added(record.clone())
            }
        };

        self.backend.set(&key, &page).await?;
        tracing::debug!(
            "Upserted highlight {} on {} ({})",
            record.id,
            key,
            match outcome {
                UpsertOutcome::Added(_) => "added",
                UpsertOutcome::Updated(_) => "updated",
            }
        );
        Ok(outcome)
    }

    /// Delete the highlight with identifier `id`
    pub async fn delete(&self, url: &str, id: Uuid) -> Result<HighlightRecord> {
        let _guard = self.writes.lock().await;
        let (key, page) = self.load(url).await?;
        let index = page.position(id).ok_or(StoreError::HighlightNotFound(id))?;
        self.remove_index(key, page, index).await
    }

    /// Delete the highlight at `index` in the page's list
    pub async fn delete_at(&self, url: &str, index: usize) -> Result<HighlightRecord> {
        let _guard = self.writes.lock().await;
        let (key, page) = self.load(url).await?;
        check_index(&page, index)?;
        self.remove_index(key, page, index).await
    }

    /// Replace the note of the highlight at `index`
    pub async fn update_note_at(
        &self,
        url: &str,
        index: usize,
        note: &str,
    ) -> Result<HighlightRecord> {
        let _guard = self.writes.lock().await;
        let (key, mut page) = self.load(url).await?;
        check_index(&page, index)?;

        let edited = reduce(
            &page.highlights[index],
            &HighlightDelta::NoteChange(note.to_string()),
            Utc::now(),
        );
        page.highlights[index] = edited.clone();
        self.backend.set(&key, &page).await?;
        Ok(edited)
    }

    /// Stored record for a page
    pub async fn page(&self, url: &str) -> Result<Option<PageRecord>> {
        let key = normalize_page_url(url)?;
        self.backend.get(&key).await
    }

    /// Pages with at least one highlight, ordered by URL
    pub async fn pages(&self) -> Result<Vec<PageSummary>> {
        Ok(self
            .backend
            .list()
            .await?
            .into_iter()
            .filter(|(_, page)| !page.highlights.is_empty())
            .map(|(url, page)| PageSummary {
                url,
                title: page.title,
                count: page.highlights.len(),
            })
            .collect())
    }

    async fn load(&self, url: &str) -> Result<(String, PageRecord)> {
        let key = normalize_page_url(url)?;
        let page = self
            .backend
            .get(&key)
            .await?
            .ok_or_else(|| StoreError::PageNotFound(key.clone()))?;
        Ok((key, page))
    }

    async fn remove_index(
        &self,
        key: String,
        mut page: PageRecord,
        index: usize,
    ) -> Result<HighlightRecord> {
        let removed = page.highlights.remove(index);
        if page.highlights.is_empty() {
            self.backend.remove(&key).await?;
        } else {
            self.backend.set(&key, &page).await?;
        }
        tracing::debug!("Deleted highlight {} from {}", removed.id, key);
        Ok(removed)
    }
}

fn check_index(page: &PageRecord, index: usize) -> Result<()> {
    if index < page.highlights.len() {
        Ok(())
    } else {
        Err(StoreError::IndexOutOfRange {
            index,
            len: page.highlights.len(),
        })
    }
}
