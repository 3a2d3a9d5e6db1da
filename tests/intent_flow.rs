//! End-to-end intent flows through the public crate surface.
//!
//! These tests drive the same path the binary does: an intent arrives as
//! JSON, the handler resolves it, and for play intents the resolved intent
//! is re-serialized and executed by a fresh `PlaybackExecutor`, proving the
//! two phases share nothing but the payload.

use voxplay::controller::{
    AddMediaResponseCode, DestinationResolution, IntentEnvelope, IntentHandler,
    PlayMediaIntent, PlayMediaResponseCode, PlaybackExecutor,
};
use voxplay::model::catalog::{Album, Artist, CatalogHit, Song, SongAttributes};
use voxplay::model::{Catalog, Destination, LibraryItem, LocalLibrary, Playlist, UnsupportedReason};
use voxplay::player::{LocalSearchIndex, SystemPlayer};

#[derive(Clone, Default)]
struct StubCatalog {
    song: Option<Song>,
}

impl Catalog for StubCatalog {
    async fn search_song(
        &self,
        _name: &str,
        _album: Option<&str>,
        _artist: Option<&str>,
    ) -> Option<Song> {
        self.song.clone()
    }

    async fn search_album(&self, _name: &str, _artist: Option<&str>) -> Option<Album> {
        None
    }

    async fn search_artist(&self, _name: &str) -> Option<Artist> {
        None
    }

    async fn search_any(&self, _name: &str) -> Option<CatalogHit> {
        self.song.clone().map(CatalogHit::Song)
    }

    async fn fetch_song_by_identifier(&self, _identifier: &str) -> Option<Song> {
        self.song.clone()
    }
}

fn hey_jude() -> Song {
    Song {
        id: "123".to_string(),
        attributes: SongAttributes {
            name: "Hey Jude".to_string(),
            artist_name: Some("The Beatles".to_string()),
            album_name: Some("Hey Jude".to_string()),
            artwork: None,
        },
    }
}

async fn punk_library() -> LocalLibrary {
    let library = LocalLibrary::in_memory();
    library
        .insert_playlist(Playlist {
            persistent_id: 42,
            name: "70s punk classics".to_string(),
            items: vec![
                LibraryItem {
                    product_id: "900".to_string(),
                    title: "Blitzkrieg Bop".to_string(),
                    artist: Some("Ramones".to_string()),
                    album: Some("Ramones".to_string()),
                    genre: Some("Punk".to_string()),
                    play_count: 3,
                    last_played: None,
                },
                LibraryItem {
                    product_id: "901".to_string(),
                    title: "God Save the Queen".to_string(),
                    artist: Some("Sex Pistols".to_string()),
                    album: Some("Never Mind the Bollocks".to_string()),
                    genre: Some("Punk".to_string()),
                    play_count: 1,
                    last_played: None,
                },
            ],
        })
        .await
        .unwrap();
    library
}

/// Resolve the intent's media items the way the extension side does.
async fn resolve<C: Catalog>(
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
async fn play_song_intent_crosses_the_process_boundary() {
    let library = LocalLibrary::in_memory();
    let handler = IntentHandler::new(StubCatalog { song: Some(hey_jude()) }, library.clone());

    let json = r#"{
        "intent": "play_media",
        "media_search": {
            "kind": "song",
            "name": "Hey Jude",
            "artist_name": "The Beatles"
        }
    }"#;
    let IntentEnvelope::PlayMedia(intent) = serde_json::from_str(json).unwrap() else {
        panic!("expected a play intent");
    };

    let intent = resolve(&handler, intent).await;
    assert_eq!(intent.media_items.len(), 1);
    assert_eq!(intent.media_items[0].identifier, "123");

    // Extension answers without side effects.
    let deferred = handler.handle_play_media(&intent);
    assert_eq!(deferred.code, PlayMediaResponseCode::HandleInApp);

    // The intent travels to the app process as plain JSON.
    let payload = serde_json::to_string(&intent).unwrap();
    let replayed: PlayMediaIntent = serde_json::from_str(&payload).unwrap();

    let player = SystemPlayer::new();
    let index = LocalSearchIndex::new();
    let executor = PlaybackExecutor::new(player.clone(), index.clone(), library);

    let response = executor.handle_play_media(&replayed).await;
    assert_eq!(response.code, PlayMediaResponseCode::Success);
    assert_eq!(response.media_items[0].identifier, "123");

    assert_eq!(player.queue().await, vec!["123".to_string()]);
    let record = index.get("123").await.unwrap();
    assert_eq!(record.title, "Hey Jude");
    assert_eq!(record.artist.as_deref(), Some("The Beatles"));
}

#[tokio::test]
async fn play_local_playlist_enumerates_items_into_queue_and_index() {
    let library = punk_library().await;
    let handler = IntentHandler::new(StubCatalog::default(), library.clone());

    let json = r#"{
        "intent": "play_media",
        "media_search": { "kind": "playlist", "name": "70s punk classics" }
    }"#;
    let IntentEnvelope::PlayMedia(intent) = serde_json::from_str(json).unwrap() else {
        panic!("expected a play intent");
    };

    let intent = resolve(&handler, intent).await;
    assert_eq!(intent.media_items[0].identifier, "local:42");

    let payload = serde_json::to_string(&intent).unwrap();
    let replayed: PlayMediaIntent = serde_json::from_str(&payload).unwrap();

    let player = SystemPlayer::new();
    let index = LocalSearchIndex::new();
    let executor = PlaybackExecutor::new(player.clone(), index.clone(), library);

    let response = executor.handle_play_media(&replayed).await;
    assert_eq!(response.code, PlayMediaResponseCode::Success);
    assert_eq!(
        player.queue().await,
        vec!["900".to_string(), "901".to_string()]
    );
    assert_eq!(index.len().await, 2);
    assert_eq!(index.get("901").await.unwrap().genre.as_deref(), Some("Punk"));
}

#[tokio::test]
async fn unresolvable_play_intent_never_reaches_the_player() {
    let library = LocalLibrary::in_memory();
    let handler = IntentHandler::new(StubCatalog::default(), library.clone());

    let json = r#"{
        "intent": "play_media",
        "media_search": { "kind": "song", "name": "does not exist" }
    }"#;
    let IntentEnvelope::PlayMedia(intent) = serde_json::from_str(json).unwrap() else {
        panic!("expected a play intent");
    };

    let intent = resolve(&handler, intent).await;
    assert!(intent.media_items.is_empty());

    let player = SystemPlayer::new();
    let index = LocalSearchIndex::new();
    let executor = PlaybackExecutor::new(player.clone(), index.clone(), library);

    let response = executor.handle_play_media(&intent).await;
    assert_eq!(response.code, PlayMediaResponseCode::Unsupported);
    assert!(player.queue().await.is_empty());
    assert!(index.is_empty().await);
}

#[tokio::test]
async fn add_to_playlist_intent_completes_in_one_phase() {
    let library = punk_library().await;
    let handler = IntentHandler::new(StubCatalog { song: Some(hey_jude()) }, library.clone());

    let json = r#"{
        "intent": "add_media",
        "media_search": { "kind": "song", "name": "Hey Jude" },
        "destination": { "playlist": "70s punk classics" }
    }"#;
    let IntentEnvelope::AddMedia(mut intent) = serde_json::from_str(json).unwrap() else {
        panic!("expected an add intent");
    };

    let resolutions = handler.resolve_add_media_items(&intent).await;
    intent.media_items = resolutions
        .into_iter()
        .filter_map(|r| r.reference().cloned())
        .collect();

    assert!(matches!(
        handler.resolve_add_destination(&intent).await,
        DestinationResolution::Success(Destination::Playlist(_))
    ));

    let response = handler.handle_add_media(&intent).await;
    assert_eq!(response.code, AddMediaResponseCode::Success);

    let playlist = library
        .find_playlist_by_name("70s punk classics")
        .await
        .unwrap();
    assert_eq!(playlist.items.len(), 3);
    assert_eq!(playlist.items[2].product_id, "123");
}

#[tokio::test]
async fn add_to_unknown_playlist_resolves_as_name_not_found() {
    let library = LocalLibrary::in_memory();
    let handler = IntentHandler::new(StubCatalog { song: Some(hey_jude()) }, library);

    let json = r#"{
        "intent": "add_media",
        "media_search": { "kind": "song", "name": "Hey Jude" },
        "destination": { "playlist": "workout jams" }
    }"#;
    let IntentEnvelope::AddMedia(intent) = serde_json::from_str(json).unwrap() else {
        panic!("expected an add intent");
    };

    match handler.resolve_add_destination(&intent).await {
        DestinationResolution::Unsupported(Some(UnsupportedReason::PlaylistNameNotFound)) => {}
        other => panic!("expected playlist-name-not-found, got {other:?}"),
    }
}
