//! Play and add intent flows
//!
//! The play flow is split across two process lifetimes: the extension-side
//! `IntentHandler` resolves the media item and replies `HandleInApp` without
//! touching the player, because the extension may be terminated as soon as
//! it answers. The app-side `PlaybackExecutor` accepts the re-delivered
//! intent — now carrying its resolved items — and performs the actual
//! queue-set, indexing and playback. The add flow completes within the
//! extension's lifetime.

use anyhow::anyhow;

use super::IntentHandler;
use super::intents::{
    AddMediaIntent, AddMediaResponse, AddMediaResponseCode, DestinationResolution,
    MediaItemResolution, PlayMediaIntent, PlayMediaResponse, PlayMediaResponseCode,
};
use crate::model::{
    Catalog, Destination, DispatchOutcome, LocalLibrary, MediaQuery, ReferenceKind,
    UnsupportedReason,
};
use crate::player::{QueuePlayer, SearchIndexer, SearchableItem};

impl<C: Catalog> IntentHandler<C> {
    async fn resolve_media_item(&self, search: Option<&MediaQuery>) -> MediaItemResolution {
        let Some(query) = search else {
            return MediaItemResolution::Unsupported;
        };
        match self.resolver.resolve(query).await {
            Some(reference) => {
                tracing::info!(identifier = %reference.identifier, title = %reference.title, "Resolved media item");
                MediaItemResolution::Success(reference)
            }
            None => {
                tracing::info!(kind = ?query.kind, name = ?query.name, "No media item matched the search");
                MediaItemResolution::Unsupported
            }
        }
    }

    /// Resolve the media items of a play intent. Side-effect-free.
    pub async fn resolve_play_media_items(
        &self,
        intent: &PlayMediaIntent,
    ) -> Vec<MediaItemResolution> {
        vec![self.resolve_media_item(intent.media_search.as_ref()).await]
    }

    /// Handle a play intent on the extension side.
    ///
    /// Always defers to the host application: the extension process can be
    /// terminated the moment it replies, and playback begun here would end
    /// with it. No side effects happen before the deferral.
    pub fn handle_play_media(&self, _intent: &PlayMediaIntent) -> PlayMediaResponse {
        PlayMediaResponse::code(PlayMediaResponseCode::HandleInApp)
    }

    /// Resolve the media items of an add intent. Side-effect-free.
    pub async fn resolve_add_media_items(
        &self,
        intent: &AddMediaIntent,
    ) -> Vec<MediaItemResolution> {
        vec![self.resolve_media_item(intent.media_search.as_ref()).await]
    }

    /// Resolve the destination of an add intent.
    ///
    /// The library always resolves; a playlist destination resolves only if
    /// the local library has a playlist of that name, otherwise the
    /// assistant is told the playlist name was not found.
    pub async fn resolve_add_destination(&self, intent: &AddMediaIntent) -> DestinationResolution {
        match &intent.destination {
            None => DestinationResolution::Unsupported(None),
            Some(Destination::Library) => DestinationResolution::Success(Destination::Library),
            Some(Destination::Playlist(name)) => {
                if self.library.find_playlist_by_name(name).await.is_some() {
                    DestinationResolution::Success(Destination::Playlist(name.clone()))
                } else {
                    DestinationResolution::Unsupported(Some(
                        UnsupportedReason::PlaylistNameNotFound,
                    ))
                }
            }
        }
    }

    /// Handle an add intent end to end. Adding is fast enough to finish
    /// within the extension's lifetime, so there is no deferral.
    pub async fn handle_add_media(&self, intent: &AddMediaIntent) -> AddMediaResponse {
        match self.execute_add(intent).await {
            DispatchOutcome::Success(description) => {
                tracing::info!(%description, "Add intent completed");
                AddMediaResponse {
                    code: AddMediaResponseCode::Success,
                }
            }
            DispatchOutcome::Unsupported(reason) => {
                tracing::warn!(?reason, "Add intent had nothing to execute");
                AddMediaResponse {
                    code: AddMediaResponseCode::Failure,
                }
            }
            DispatchOutcome::Failed(cause) => {
                tracing::error!(error = %cause, "Add intent failed");
                AddMediaResponse {
                    code: AddMediaResponseCode::Failure,
                }
            }
        }
    }

    async fn execute_add(&self, intent: &AddMediaIntent) -> DispatchOutcome {
        let Some(item) = intent.media_items.first() else {
            return DispatchOutcome::Failed(anyhow!("no resolved media item on the intent"));
        };

        match &intent.destination {
            Some(Destination::Library) => match self.library.add_to_library(item).await {
                Ok(()) => DispatchOutcome::Success(format!("added '{}' to the library", item.title)),
                Err(e) => DispatchOutcome::Failed(e.into()),
            },
            Some(Destination::Playlist(name)) => {
                match self.library.add_to_playlist(name, item).await {
                    Ok(()) => DispatchOutcome::Success(format!(
                        "added '{}' to the '{}' playlist",
                        item.title, name
                    )),
                    Err(e) => DispatchOutcome::Failed(e.into()),
                }
            }
            None => DispatchOutcome::Failed(anyhow!("no media destination on the intent")),
        }
    }
}

/// App-side executor for the deferred half of the play flow.
///
/// Accepts a serialized intent with resolved items attached and replays it
/// with no dependency on the resolving process's state.
pub struct PlaybackExecutor<P, S> {
    player: P,
    indexer: S,
    library: LocalLibrary,
}

impl<P: QueuePlayer, S: SearchIndexer> PlaybackExecutor<P, S> {
    pub fn new(player: P, indexer: S, library: LocalLibrary) -> Self {
        Self {
            player,
            indexer,
            library,
        }
    }

    /// Execute a play intent whose media items were resolved elsewhere.
    pub async fn handle_play_media(&self, intent: &PlayMediaIntent) -> PlayMediaResponse {
        match self.execute_play(intent).await {
            DispatchOutcome::Success(description) => {
                tracing::info!(%description, "Play intent completed");
                self.donate_interaction(intent);
                PlayMediaResponse {
                    code: PlayMediaResponseCode::Success,
                    media_items: intent.media_items.clone(),
                }
            }
            DispatchOutcome::Unsupported(reason) => {
                tracing::warn!(?reason, "Play intent carried nothing playable");
                PlayMediaResponse::code(PlayMediaResponseCode::Unsupported)
            }
            DispatchOutcome::Failed(cause) => {
                tracing::error!(error = %cause, "Play intent failed");
                PlayMediaResponse::code(PlayMediaResponseCode::Failure)
            }
        }
    }

    async fn execute_play(&self, intent: &PlayMediaIntent) -> DispatchOutcome {
        let Some(item) = intent.media_items.first() else {
            return DispatchOutcome::Unsupported(None);
        };

        let description = match (item.kind, item.local_persistent_id()) {
            // A local playlist is enumerated: the whole thing goes on the
            // queue and every item becomes searchable.
            (ReferenceKind::Playlist, Some(persistent_id)) => {
                let Some(playlist) = self
                    .library
                    .find_playlist_by_persistent_id(persistent_id)
                    .await
                else {
                    return DispatchOutcome::Failed(anyhow!(
                        "local playlist {persistent_id} is no longer in the library"
                    ));
                };

                let identifiers: Vec<String> = playlist
                    .items
                    .iter()
                    .map(|i| i.product_id.clone())
                    .collect();
                self.player.set_queue(identifiers).await;

                let records: Vec<SearchableItem> = playlist
                    .items
                    .iter()
                    .map(SearchableItem::from_library_item)
                    .collect();
                self.indexer.index(records).await;

                format!(
                    "queued {} items from playlist '{}'",
                    playlist.items.len(),
                    playlist.name
                )
            }
            // Anything else plays by its single identifier; the catalog
            // player accepts song, album and playlist ids alike.
            _ => {
                self.player.set_queue(vec![item.identifier.clone()]).await;
                self.indexer
                    .index(vec![SearchableItem::from_reference(item)])
                    .await;
                format!("queued '{}'", item.title)
            }
        };

        if let Err(e) = self.player.prepare().await {
            tracing::error!(error = %e, "Failed to prepare playback");
            return DispatchOutcome::Failed(e.into());
        }

        // Fire and forget; the response does not wait on playback itself.
        self.player.play();

        DispatchOutcome::Success(description)
    }

    /// Donate the handled intent back to the assistant so it can improve
    /// future routing. Best effort.
    fn donate_interaction(&self, intent: &PlayMediaIntent) {
        let identifiers: Vec<&str> = intent
            .media_items
            .iter()
            .map(|i| i.identifier.as_str())
            .collect();
        tracing::debug!(?identifiers, "Donated play interaction to the assistant");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::resolver::tests::{StubCatalog, hey_jude, punk_library};
    use crate::model::{LocalLibrary, MediaKind, MediaQuery, MediaReference};
    use crate::player::{PlaybackError, SearchDomain};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::RwLock;

    #[derive(Clone, Default)]
    struct RecordingPlayer {
        queue: Arc<RwLock<Vec<String>>>,
        fail_prepare: bool,
        played: Arc<AtomicBool>,
    }

    impl QueuePlayer for RecordingPlayer {
        async fn set_queue(&self, identifiers: Vec<String>) {
            *self.queue.write().await = identifiers;
        }

        async fn prepare(&self) -> Result<(), PlaybackError> {
            if self.fail_prepare {
                Err(PlaybackError::Prepare("stub refused".to_string()))
            } else {
                Ok(())
            }
        }

        fn play(&self) {
            self.played.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Clone, Default)]
    struct RecordingIndexer {
        items: Arc<RwLock<Vec<SearchableItem>>>,
    }

    impl SearchIndexer for RecordingIndexer {
        async fn index(&self, items: Vec<SearchableItem>) {
            self.items.write().await.extend(items);
        }
    }

    fn play_intent(query: MediaQuery) -> PlayMediaIntent {
        PlayMediaIntent {
            media_search: Some(query),
            media_items: Vec::new(),
        }
    }

    async fn attach_resolved<C: Catalog>(
        handler: &IntentHandler<C>,
        mut intent: PlayMediaIntent,
    ) -> PlayMediaIntent {
        let resolutions = handler.resolve_play_media_items(&intent).await;
        intent.media_items = resolutions
            .into_iter()
            .filter_map(|r| r.reference().cloned())
            .collect();
        intent
    }

    #[tokio::test]
    async fn song_play_flow_queues_and_indexes_the_single_item() {
        let library = LocalLibrary::in_memory();
        let handler = IntentHandler::new(
            StubCatalog {
                song: Some(hey_jude()),
                ..Default::default()
            },
            library.clone(),
        );

        let mut query = MediaQuery::by_name(MediaKind::Song, "Hey Jude");
        query.artist_name = Some("The Beatles".to_string());
        let intent = attach_resolved(&handler, play_intent(query)).await;

        // Extension side only defers.
        let deferred = handler.handle_play_media(&intent);
        assert_eq!(deferred.code, PlayMediaResponseCode::HandleInApp);

        let player = RecordingPlayer::default();
        let indexer = RecordingIndexer::default();
        let executor = PlaybackExecutor::new(player.clone(), indexer.clone(), library);

        let response = executor.handle_play_media(&intent).await;
        assert_eq!(response.code, PlayMediaResponseCode::Success);
        assert_eq!(*player.queue.read().await, vec!["123".to_string()]);
        assert!(player.played.load(Ordering::SeqCst));

        let indexed = indexer.items.read().await;
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].identifier, "123");
        assert_eq!(indexed[0].domain, SearchDomain::Song);
    }

    #[tokio::test]
    async fn local_playlist_play_flow_enumerates_every_item() {
        let library = punk_library().await;
        let handler = IntentHandler::new(StubCatalog::default(), library.clone());

        let intent = attach_resolved(
            &handler,
            play_intent(MediaQuery::by_name(MediaKind::Playlist, "70s punk classics")),
        )
        .await;
        assert_eq!(intent.media_items[0].identifier, "local:42");

        let player = RecordingPlayer::default();
        let indexer = RecordingIndexer::default();
        let executor = PlaybackExecutor::new(player.clone(), indexer.clone(), library);

        let response = executor.handle_play_media(&intent).await;
        assert_eq!(response.code, PlayMediaResponseCode::Success);
        assert_eq!(
            *player.queue.read().await,
            vec!["900".to_string(), "901".to_string()]
        );

        let indexed = indexer.items.read().await;
        assert_eq!(indexed.len(), 2);
        assert!(indexed.iter().all(|i| i.domain == SearchDomain::Song));
        assert_eq!(indexed[0].genre.as_deref(), Some("Punk"));
    }

    #[tokio::test]
    async fn unresolved_play_intent_is_unsupported_with_no_side_effects() {
        let library = LocalLibrary::in_memory();
        let handler = IntentHandler::new(StubCatalog::default(), library.clone());

        let intent = attach_resolved(
            &handler,
            play_intent(MediaQuery::by_name(MediaKind::Song, "does not exist")),
        )
        .await;
        assert!(intent.media_items.is_empty());

        let player = RecordingPlayer::default();
        let indexer = RecordingIndexer::default();
        let executor = PlaybackExecutor::new(player.clone(), indexer.clone(), library);

        let response = executor.handle_play_media(&intent).await;
        assert_eq!(response.code, PlayMediaResponseCode::Unsupported);
        assert!(player.queue.read().await.is_empty());
        assert!(indexer.items.read().await.is_empty());
        assert!(!player.played.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn prepare_failure_is_terminal() {
        let library = LocalLibrary::in_memory();
        let handler = IntentHandler::new(
            StubCatalog {
                song: Some(hey_jude()),
                ..Default::default()
            },
            library.clone(),
        );
        let intent = attach_resolved(
            &handler,
            play_intent(MediaQuery::by_name(MediaKind::Song, "Hey Jude")),
        )
        .await;

        let player = RecordingPlayer {
            fail_prepare: true,
            ..Default::default()
        };
        let executor =
            PlaybackExecutor::new(player.clone(), RecordingIndexer::default(), library);

        let response = executor.handle_play_media(&intent).await;
        assert_eq!(response.code, PlayMediaResponseCode::Failure);
        assert!(!player.played.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn add_destination_with_unknown_playlist_is_unsupported_not_failed() {
        let handler = IntentHandler::new(StubCatalog::default(), LocalLibrary::in_memory());
        let intent = AddMediaIntent {
            media_search: None,
            media_items: Vec::new(),
            destination: Some(Destination::Playlist("no such playlist".to_string())),
        };

        match handler.resolve_add_destination(&intent).await {
            DestinationResolution::Unsupported(Some(UnsupportedReason::PlaylistNameNotFound)) => {}
            other => panic!("expected playlist-name-not-found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn add_to_library_flow_completes_in_one_phase() {
        let library = LocalLibrary::in_memory();
        let handler = IntentHandler::new(
            StubCatalog {
                song: Some(hey_jude()),
                ..Default::default()
            },
            library.clone(),
        );

        let mut intent = AddMediaIntent {
            media_search: Some(MediaQuery::by_name(MediaKind::Song, "Hey Jude")),
            media_items: Vec::new(),
            destination: Some(Destination::Library),
        };

        let resolutions = handler.resolve_add_media_items(&intent).await;
        intent.media_items = resolutions
            .into_iter()
            .filter_map(|r| r.reference().cloned())
            .collect();

        assert!(matches!(
            handler.resolve_add_destination(&intent).await,
            DestinationResolution::Success(Destination::Library)
        ));

        let response = handler.handle_add_media(&intent).await;
        assert_eq!(response.code, AddMediaResponseCode::Success);
        assert_eq!(library.song_count().await, 1);
    }

    #[tokio::test]
    async fn add_to_playlist_flow_appends_the_resolved_item() {
        let library = punk_library().await;
        let handler = IntentHandler::new(
            StubCatalog {
                song: Some(hey_jude()),
                ..Default::default()
            },
            library.clone(),
        );

        let reference = MediaReference {
            identifier: "123".to_string(),
            kind: crate::model::ReferenceKind::Song,
            title: "Hey Jude".to_string(),
            artist: Some("The Beatles".to_string()),
        };
        let intent = AddMediaIntent {
            media_search: None,
            media_items: vec![reference],
            destination: Some(Destination::Playlist("70s punk classics".to_string())),
        };

        let response = handler.handle_add_media(&intent).await;
        assert_eq!(response.code, AddMediaResponseCode::Success);

        let playlist = library.find_playlist_by_name("70s punk classics").await.unwrap();
        assert_eq!(playlist.items.len(), 3);
        assert_eq!(playlist.items[2].product_id, "123");
    }

    #[tokio::test]
    async fn add_without_resolved_items_fails() {
        let handler = IntentHandler::new(StubCatalog::default(), LocalLibrary::in_memory());
        let intent = AddMediaIntent {
            media_search: None,
            media_items: Vec::new(),
            destination: Some(Destination::Library),
        };
        let response = handler.handle_add_media(&intent).await;
        assert_eq!(response.code, AddMediaResponseCode::Failure);
    }
}
