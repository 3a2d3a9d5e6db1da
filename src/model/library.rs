//! Local media library store
//!
//! A JSON-file-backed stand-in for the device's synchronized media store.
//! Reads are name- or persistent-id-keyed playlist lookups; writes add a
//! resolved catalog item to the library or to a playlist by product id.
//! The store loads once at startup and is rewritten after each mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use super::media::MediaReference;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("playlist not found: {0}")]
    PlaylistNotFound(String),
    #[error("failed to persist library: {0}")]
    Persist(#[from] std::io::Error),
    #[error("library store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A single entry in the library or a playlist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryItem {
    pub product_id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,
}

impl LibraryItem {
    fn from_reference(reference: &MediaReference) -> Self {
        Self {
            product_id: reference.identifier.clone(),
            title: reference.title.clone(),
            artist: reference.artist.clone(),
            album: None,
            genre: None,
            play_count: 0,
            last_played: None,
        }
    }
}

/// A named, persistently identified playlist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Playlist {
    pub persistent_id: u64,
    pub name: String,
    #[serde(default)]
    pub items: Vec<LibraryItem>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct LibraryStore {
    #[serde(default)]
    items: Vec<LibraryItem>,
    #[serde(default)]
    playlists: Vec<Playlist>,
}

/// Handle to the local library, cheap to clone and share across tasks.
#[derive(Clone)]
pub struct LocalLibrary {
    store: Arc<RwLock<LibraryStore>>,
    path: Option<PathBuf>,
}

impl LocalLibrary {
    /// An empty library with no disk backing, for tests and stubs.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(RwLock::new(LibraryStore::default())),
            path: None,
        }
    }

    /// Open the library store at `path`, creating an empty one if the file
    /// does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref().to_path_buf();
        let store = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            LibraryStore::default()
        };
        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            path: Some(path),
        })
    }

    /// First playlist whose name matches, ignoring case.
    pub async fn find_playlist_by_name(&self, name: &str) -> Option<Playlist> {
        let store = self.store.read().await;
        store
            .playlists
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub async fn find_playlist_by_persistent_id(&self, persistent_id: u64) -> Option<Playlist> {
        let store = self.store.read().await;
        store
            .playlists
            .iter()
            .find(|p| p.persistent_id == persistent_id)
            .cloned()
    }

    pub async fn playlist_names(&self) -> Vec<String> {
        let store = self.store.read().await;
        store.playlists.iter().map(|p| p.name.clone()).collect()
    }

    /// Number of songs in the library, reported to the assistant's media
    /// user context at startup.
    pub async fn song_count(&self) -> usize {
        let store = self.store.read().await;
        store.items.len()
    }

    /// Add a resolved catalog item to the library by product id.
    pub async fn add_to_library(&self, reference: &MediaReference) -> Result<(), LibraryError> {
        {
            let mut store = self.store.write().await;
            if store
                .items
                .iter()
                .any(|i| i.product_id == reference.identifier)
            {
                tracing::debug!(product_id = %reference.identifier, "Item already in library");
                return Ok(());
            }
            store.items.push(LibraryItem::from_reference(reference));
        }
        self.save_to_disk().await
    }

    /// Add a resolved catalog item to a playlist by product id.
    pub async fn add_to_playlist(
        &self,
        playlist_name: &str,
        reference: &MediaReference,
    ) -> Result<(), LibraryError> {
        {
            let mut store = self.store.write().await;
            let playlist = store
                .playlists
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(playlist_name))
                .ok_or_else(|| LibraryError::PlaylistNotFound(playlist_name.to_string()))?;
            playlist.items.push(LibraryItem::from_reference(reference));
        }
        self.save_to_disk().await
    }

    /// Insert a playlist wholesale. Used by the first-run seed and by tests.
    pub async fn insert_playlist(&self, playlist: Playlist) -> Result<(), LibraryError> {
        {
            let mut store = self.store.write().await;
            store.playlists.push(playlist);
        }
        self.save_to_disk().await
    }

    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.items.is_empty() && store.playlists.is_empty()
    }

    async fn save_to_disk(&self) -> Result<(), LibraryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let store = self.store.read().await;
        let content = serde_json::to_string_pretty(&*store)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
