//! Controller module - Intent handling and dispatch
//!
//! This module turns inbound assistant intents into resolved references and
//! side effects. It is organized into submodules by responsibility:
//!
//! - `intents`: Inbound intent shapes and response codes
//! - `resolver`: Media reference resolution against catalog and library
//! - `dispatch`: Play/add flows (extension-side handling, app-side execution)

pub mod dispatch;
pub mod intents;
pub mod resolver;

pub use dispatch::PlaybackExecutor;
pub use intents::{
    AddMediaIntent, AddMediaResponse, AddMediaResponseCode, DestinationResolution, IntentEnvelope,
    MediaItemResolution, PlayMediaIntent, PlayMediaResponse, PlayMediaResponseCode,
};
pub use resolver::MediaResolver;

use crate::model::{Catalog, LocalLibrary};

/// Extension-side intent handler: resolves media items and destinations,
/// executes add intents, and defers play intents to the host application.
pub struct IntentHandler<C> {
    pub(crate) resolver: MediaResolver<C>,
    pub(crate) library: LocalLibrary,
}

impl<C: Catalog> IntentHandler<C> {
    pub fn new(catalog: C, library: LocalLibrary) -> Self {
        Self {
            resolver: MediaResolver::new(catalog, library.clone()),
            library,
        }
    }
}

/// Register the user's playlist names with the assistant's vocabulary, so
/// spoken playlist titles are classified as playlist queries for this app.
pub async fn register_playlist_vocabulary(library: &LocalLibrary) {
    let names = library.playlist_names().await;
    tracing::info!(
        count = names.len(),
        names = ?names,
        "Registered playlist vocabulary with the assistant"
    );
}

/// Donate the media user context (library size, subscription state) to the
/// assistant, raising the odds that app-less utterances are routed here.
pub async fn donate_media_user_context(library: &LocalLibrary, subscribed: bool) {
    let library_items = library.song_count().await;
    tracing::info!(library_items, subscribed, "Donated media user context");
}
