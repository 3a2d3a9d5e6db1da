//! Core media types shared by resolution and dispatch
//!
//! Everything that crosses the resolve/execute process boundary is serde
//! serializable, so a resolved intent can be handed to a different process
//! with no dependency on the resolver's in-memory state.

use serde::{Deserialize, Serialize};

/// Identifier namespace prefix for items that live in the local library
/// rather than the remote catalog.
pub const LOCAL_LIBRARY_PREFIX: &str = "local:";

/// Media category as classified by the assistant.
///
/// `Music` and `Unknown` mean the assistant could not pin down a category;
/// those fall back to the least-specific catalog search. The remaining
/// variants exist in the inbound contract but have no playable counterpart
/// here and always resolve to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Song,
    Album,
    Artist,
    Playlist,
    Music,
    Unknown,
    Podcast,
    RadioStation,
    Audiobook,
}

/// Reference context attached to a query by the assistant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryReference {
    #[default]
    Unknown,
    CurrentlyPlaying,
}

/// A typed search query built once per inbound request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaQuery {
    pub kind: MediaKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub reference: QueryReference,
}

impl MediaQuery {
    pub fn by_name(kind: MediaKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            artist_name: None,
            album_name: None,
            identifier: None,
            reference: QueryReference::Unknown,
        }
    }
}

/// Kind of a resolved, playable reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Song,
    Album,
    Playlist,
}

/// A resolved, addressable pointer to a playable unit.
///
/// The identifier alone determines how playback and additions execute:
/// `local:<persistentID>` addresses the local library, anything else is an
/// opaque catalog id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaReference {
    pub identifier: String,
    pub kind: ReferenceKind,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
}

impl MediaReference {
    /// Reference to a playlist in the local library.
    pub fn local_playlist(persistent_id: u64, title: impl Into<String>) -> Self {
        Self {
            identifier: format!("{LOCAL_LIBRARY_PREFIX}{persistent_id}"),
            kind: ReferenceKind::Playlist,
            title: title.into(),
            artist: None,
        }
    }

    pub fn is_local(&self) -> bool {
        self.identifier.starts_with(LOCAL_LIBRARY_PREFIX)
    }

    /// Persistent id of a local-library reference, if the identifier carries
    /// the local namespace prefix and a well-formed id.
    pub fn local_persistent_id(&self) -> Option<u64> {
        self.identifier
            .strip_prefix(LOCAL_LIBRARY_PREFIX)?
            .parse()
            .ok()
    }
}

/// Target of an "add" action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Library,
    Playlist(String),
}

/// Reason code attached to an unsupported resolution, used by the assistant
/// to phrase its failure speech.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedReason {
    PlaylistNameNotFound,
}

/// Outcome of dispatching a resolved intent to its side effect.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The side effect executed; the payload describes what was done.
    Success(String),
    Unsupported(Option<UnsupportedReason>),
    Failed(anyhow::Error),
}
