use std::io::Read;

use anyhow::{Context, Result};

use voxplay::auth::AuthError;
use voxplay::config::Config;
use voxplay::controller::{
    self, AddMediaIntent, DestinationResolution, IntentEnvelope, IntentHandler, PlayMediaIntent,
    PlayMediaResponse, PlayMediaResponseCode, PlaybackExecutor,
};
use voxplay::model::{CatalogClient, LibraryItem, LocalLibrary, Playlist};
use voxplay::player::{LocalSearchIndex, SystemPlayer};
use voxplay::{auth, logging};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== voxplay starting ===");

    let config = Config::from_env();

    let library = LocalLibrary::open(config.library_path())
        .context("failed to open the local library store")?;
    if library.is_empty().await {
        tracing::info!("Empty library store, seeding demo content");
        seed_demo_library(&library).await?;
    }

    // Startup donations: playlist vocabulary and the media user context.
    controller::register_playlist_vocabulary(&library).await;
    let subscribed = probe_subscription(&config).await;
    controller::donate_media_user_context(&library, subscribed).await;

    let catalog = CatalogClient::new(&config).context("failed to build the catalog client")?;
    let handler = IntentHandler::new(catalog, library.clone());

    let envelope = read_intent().context("failed to read an intent from stdin or file")?;

    match envelope {
        IntentEnvelope::PlayMedia(intent) => {
            run_play_flow(&handler, &library, intent).await?;
        }
        IntentEnvelope::AddMedia(intent) => {
            run_add_flow(&handler, intent).await?;
        }
    }

    tracing::info!("voxplay shutting down");
    Ok(())
}

/// Read an intent envelope as JSON, from the file named by the first
/// argument or from stdin when no argument is given.
fn read_intent() -> Result<IntentEnvelope> {
    let input = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(serde_json::from_str(&input)?)
}

/// Play flow across both process roles.
///
/// The extension role resolves the media item and answers `HandleInApp`;
/// the intent then travels to the app role as plain JSON, proving the
/// executing side needs nothing from the resolver's memory.
async fn run_play_flow<C: voxplay::model::Catalog>(
    handler: &IntentHandler<C>,
    library: &LocalLibrary,
    mut intent: PlayMediaIntent,
) -> Result<()> {
    let resolutions = handler.resolve_play_media_items(&intent).await;
    intent.media_items = resolutions
        .iter()
        .filter_map(|r| r.reference().cloned())
        .collect();

    if intent.media_items.is_empty() {
        let response = PlayMediaResponse::code(PlayMediaResponseCode::Unsupported);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let deferred = handler.handle_play_media(&intent);
    tracing::info!(code = ?deferred.code, "Extension response");

    // Hand the resolved intent across the process boundary.
    let payload = serde_json::to_string(&intent)?;
    let replayed: PlayMediaIntent = serde_json::from_str(&payload)?;

    let executor = PlaybackExecutor::new(
        SystemPlayer::new(),
        LocalSearchIndex::new(),
        library.clone(),
    );
    let response = executor.handle_play_media(&replayed).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run_add_flow<C: voxplay::model::Catalog>(
    handler: &IntentHandler<C>,
    mut intent: AddMediaIntent,
) -> Result<()> {
    let resolutions = handler.resolve_add_media_items(&intent).await;
    intent.media_items = resolutions
        .iter()
        .filter_map(|r| r.reference().cloned())
        .collect();

    let destination = handler.resolve_add_destination(&intent).await;
    if let DestinationResolution::Unsupported(reason) = &destination {
        tracing::warn!(?reason, "Add destination did not resolve");
        println!("{}", serde_json::to_string_pretty(&destination)?);
        return Ok(());
    }

    let response = handler.handle_add_media(&intent).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// One authentication probe so the media user context reports whether the
/// user can reach the catalog. Failure only means "not subscribed".
async fn probe_subscription(config: &Config) -> bool {
    let http = match reqwest::Client::builder().build() {
        Ok(http) => http,
        Err(_) => return false,
    };
    match auth::CatalogAuth::new(config, http).session().await {
        Ok(_) => true,
        Err(AuthError::MissingDeveloperToken) => {
            tracing::info!("No developer token configured, catalog lookups will miss");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "Catalog authentication probe failed");
            false
        }
    }
}

/// First-run library content: the playlist the demo registers as assistant
/// vocabulary, mirroring the spoken phrases the intents are tested with.
async fn seed_demo_library(library: &LocalLibrary) -> Result<()> {
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
                LibraryItem {
                    product_id: "902".to_string(),
                    title: "London Calling".to_string(),
                    artist: Some("The Clash".to_string()),
                    album: Some("London Calling".to_string()),
                    genre: Some("Punk".to_string()),
                    play_count: 5,
                    last_played: None,
                },
            ],
        })
        .await?;
    Ok(())
}
