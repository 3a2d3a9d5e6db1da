//! Playback and search-index side-effect sinks
//!
//! The dispatcher talks to the queue player and the search index through
//! traits so the execution phase can be exercised against recording stubs.
//! The concrete implementations here are the demo's system player (queue
//! state plus fire-and-forget start) and an in-memory search index that
//! upserts records keyed by playback identifier.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::model::{LibraryItem, MediaReference, ReferenceKind};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("player failed to prepare: {0}")]
    Prepare(String),
}

/// Search-index domain distinguishing what kind of record an identifier
/// points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchDomain {
    Playlist,
    Album,
    Song,
}

impl SearchDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchDomain::Playlist => "grouping.playlist",
            SearchDomain::Album => "grouping.album",
            SearchDomain::Song => "grouping.song",
        }
    }
}

impl From<ReferenceKind> for SearchDomain {
    fn from(kind: ReferenceKind) -> Self {
        match kind {
            ReferenceKind::Playlist => SearchDomain::Playlist,
            ReferenceKind::Album => SearchDomain::Album,
            ReferenceKind::Song => SearchDomain::Song,
        }
    }
}

/// A record handed to the search index, keyed by the same identifier the
/// player queue uses.
#[derive(Clone, Debug)]
pub struct SearchableItem {
    pub identifier: String,
    pub domain: SearchDomain,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub play_count: Option<u32>,
    pub last_played: Option<DateTime<Utc>>,
}

impl SearchableItem {
    /// Index record for a single resolved reference.
    pub fn from_reference(reference: &MediaReference) -> Self {
        Self {
            identifier: reference.identifier.clone(),
            domain: reference.kind.into(),
            title: reference.title.clone(),
            artist: reference.artist.clone(),
            album: None,
            genre: None,
            play_count: None,
            last_played: None,
        }
    }

    /// Index record for one item of an enumerated local playlist, carrying
    /// the richer attributes the library store tracks.
    pub fn from_library_item(item: &LibraryItem) -> Self {
        Self {
            identifier: item.product_id.clone(),
            domain: SearchDomain::Song,
            title: item.title.clone(),
            artist: item.artist.clone(),
            album: item.album.clone(),
            genre: item.genre.clone(),
            play_count: Some(item.play_count),
            last_played: item.last_played,
        }
    }
}

/// Playback queue operations.
#[allow(async_fn_in_trait)]
pub trait QueuePlayer {
    /// Replace the queue with the given playback identifiers.
    async fn set_queue(&self, identifiers: Vec<String>);
    /// Make the queue ready to play. Failure here is terminal for a play
    /// flow and is never retried.
    async fn prepare(&self) -> Result<(), PlaybackError>;
    /// Begin playback. Fire-and-forget: the dispatcher does not wait on it.
    fn play(&self);
}

/// Best-effort search indexing; implementations must not surface failures.
#[allow(async_fn_in_trait)]
pub trait SearchIndexer {
    async fn index(&self, items: Vec<SearchableItem>);
}

/// Demo queue player: holds queue state and logs transport actions.
#[derive(Clone, Default)]
pub struct SystemPlayer {
    queue: Arc<RwLock<Vec<String>>>,
    playing: Arc<RwLock<bool>>,
}

impl SystemPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn queue(&self) -> Vec<String> {
        self.queue.read().await.clone()
    }

    pub async fn is_playing(&self) -> bool {
        *self.playing.read().await
    }
}

impl QueuePlayer for SystemPlayer {
    async fn set_queue(&self, identifiers: Vec<String>) {
        tracing::info!(count = identifiers.len(), "Setting player queue");
        let mut queue = self.queue.write().await;
        *queue = identifiers;
        let mut playing = self.playing.write().await;
        *playing = false;
    }

    async fn prepare(&self) -> Result<(), PlaybackError> {
        let queue = self.queue.read().await;
        if queue.is_empty() {
            return Err(PlaybackError::Prepare("queue is empty".to_string()));
        }
        tracing::debug!(count = queue.len(), "Player prepared");
        Ok(())
    }

    fn play(&self) {
        let playing = self.playing.clone();
        let queue = self.queue.clone();
        tokio::spawn(async move {
            *playing.write().await = true;
            let queue = queue.read().await;
            tracing::info!(first = queue.first().map(String::as_str), "Playback started");
        });
    }
}

/// In-memory search index: batch upsert keyed by identifier.
#[derive(Clone, Default)]
pub struct LocalSearchIndex {
    records: Arc<RwLock<HashMap<String, SearchableItem>>>,
}

impl LocalSearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, identifier: &str) -> Option<SearchableItem> {
        self.records.read().await.get(identifier).cloned()
    }
}

impl SearchIndexer for LocalSearchIndex {
    async fn index(&self, items: Vec<SearchableItem>) {
        let mut records = self.records.write().await;
        for item in items {
            tracing::debug!(
                identifier = %item.identifier,
                domain = item.domain.as_str(),
                "Indexed item for search"
            );
            records.insert(item.identifier.clone(), item);
        }
    }
}
