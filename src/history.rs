//! Recently-read history store.
//!
//! A capacity-bounded, most-recent-first list of titles the user has
//! been reading, persisted to a JSON file. Persistence failures are
//! logged and swallowed so a bad disk never breaks reading.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub manga_id: String,
    pub manga_title: String,
    pub manga_image: String,
    pub chapter_id: String,
    pub chapter_title: String,
    pub page: u32,
    pub total_pages: u32,
    /// Unix epoch milliseconds of the last interaction.
    #[serde(default)]
    pub timestamp: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub chapter_id: String,
    pub chapter_title: String,
    pub page: u32,
    pub total_pages: u32,
}

pub struct HistoryStore {
    path: PathBuf,
    capacity: usize,
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryStore {
    /// Load the store from `path`. A missing or unreadable file starts
    /// the list empty.
    pub fn load(path: PathBuf, capacity: usize) -> Self {
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<HistoryEntry>>(&bytes) {
                Ok(mut entries) => {
                    entries.truncate(capacity);
                    entries
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed history file {:?}: {}", path, e);
                    vec![]
                }
            },
            Err(_) => vec![],
        };

        Self {
            path,
            capacity,
            entries: RwLock::new(entries),
        }
    }

    pub async fn list(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }

    /// Insert or refresh an entry: any existing entry for the same manga
    /// is dropped, the new one goes to the front with a fresh timestamp,
    /// and the list is trimmed to capacity.
    pub async fn upsert(&self, mut entry: HistoryEntry) {
        entry.timestamp = now_millis();
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.retain(|e| e.manga_id != entry.manga_id);
            entries.insert(0, entry);
            entries.truncate(self.capacity);
            entries.clone()
        };
        self.persist(snapshot).await;
    }

    /// Update reading progress for an existing manga entry in place.
    /// Returns false when the manga is not in the history.
    pub async fn update_progress(&self, manga_id: &str, update: ProgressUpdate) -> bool {
        let snapshot = {
            let mut entries = self.entries.write().await;
            let Some(entry) = entries.iter_mut().find(|e| e.manga_id == manga_id) else {
                return false;
            };
            entry.chapter_id = update.chapter_id;
            entry.chapter_title = update.chapter_title;
            entry.page = update.page;
            entry.total_pages = update.total_pages;
            entry.timestamp = now_millis();
            entries.clone()
        };
        self.persist(snapshot).await;
        true
    }

    pub async fn remove(&self, manga_id: &str) {
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.retain(|e| e.manga_id != manga_id);
            entries.clone()
        };
        self.persist(snapshot).await;
    }

    async fn persist(&self, entries: Vec<HistoryEntry>) {
        let json = match serde_json::to_vec_pretty(&entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize history: {}", e);
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::warn!("Failed to create history directory {:?}: {}", parent, e);
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            tracing::warn!("Failed to write history file {:?}: {}", self.path, e);
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
