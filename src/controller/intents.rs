//! Inbound intent contract
//!
//! The shapes the host assistant sends and the response codes it expects
//! back. Intents are fully serializable because a play intent resolved in
//! the short-lived extension process is re-delivered, with its resolved
//! items attached, to the long-lived app process for execution.

use serde::{Deserialize, Serialize};

use crate::model::{Destination, MediaQuery, MediaReference, UnsupportedReason};

/// "Play X" request from the assistant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayMediaIntent {
    #[serde(default)]
    pub media_search: Option<MediaQuery>,
    /// Resolved items, attached between the resolve and handle phases.
    #[serde(default)]
    pub media_items: Vec<MediaReference>,
}

/// "Add X to Y" request from the assistant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddMediaIntent {
    #[serde(default)]
    pub media_search: Option<MediaQuery>,
    #[serde(default)]
    pub media_items: Vec<MediaReference>,
    #[serde(default)]
    pub destination: Option<Destination>,
}

/// Envelope the demo binary accepts on stdin or from a file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum IntentEnvelope {
    PlayMedia(PlayMediaIntent),
    AddMedia(AddMediaIntent),
}

/// Per-item resolution result reported back to the assistant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaItemResolution {
    Success(MediaReference),
    /// The assistant phrases this as "couldn't find <item>".
    Unsupported,
}

impl MediaItemResolution {
    pub fn reference(&self) -> Option<&MediaReference> {
        match self {
            MediaItemResolution::Success(reference) => Some(reference),
            MediaItemResolution::Unsupported => None,
        }
    }
}

/// Destination resolution result for an add intent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationResolution {
    Success(Destination),
    Unsupported(Option<UnsupportedReason>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMediaResponseCode {
    Success,
    Failure,
    /// Defer queue-set-and-play to the long-lived host application; the
    /// extension replying this way performs no side effects.
    HandleInApp,
    Unsupported,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayMediaResponse {
    pub code: PlayMediaResponseCode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_items: Vec<MediaReference>,
}

impl PlayMediaResponse {
    pub fn code(code: PlayMediaResponseCode) -> Self {
        Self {
            code,
            media_items: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddMediaResponseCode {
    Success,
    Failure,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddMediaResponse {
    pub code: AddMediaResponseCode,
}
