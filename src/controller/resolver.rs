//! Media reference resolution
//!
//! Turns a typed search query into at most one concrete, playable reference.
//! The dispatch is total over the query kind: playlists resolve against the
//! local library only, songs may shortcut through an identifier fetch, and
//! everything the assistant could not classify falls back to the catalog's
//! least-specific search. There is no ranking and no disambiguation; a
//! remote tie resolves to whatever the catalog returns first.

use crate::model::catalog::{Album, Artist, Song};
use crate::model::{
    Catalog, CatalogHit, LocalLibrary, MediaKind, MediaQuery, MediaReference, QueryReference,
    ReferenceKind,
};

pub struct MediaResolver<C> {
    catalog: C,
    library: LocalLibrary,
}

impl<C: Catalog> MediaResolver<C> {
    pub fn new(catalog: C, library: LocalLibrary) -> Self {
        Self { catalog, library }
    }

    /// Resolve a query to at most one media reference.
    ///
    /// Side-effect-free and idempotent against an unchanged backing store,
    /// so a resolution can be replayed by a different process lifetime.
    ///
    /// Note: the search strings arrive exactly as the assistant transcribed
    /// them. Catalog titles can differ significantly (punctuation,
    /// "[feat. X]" notations, soundtrack suffixes, homonyms); a robust
    /// product would normalize before searching.
    pub async fn resolve(&self, query: &MediaQuery) -> Option<MediaReference> {
        match query.kind {
            MediaKind::Playlist => self.resolve_local_playlist(query).await,
            MediaKind::Song => self.resolve_song(query).await,
            MediaKind::Album => {
                let name = query.name.as_deref()?;
                self.catalog
                    .search_album(name, query.artist_name.as_deref())
                    .await
                    .map(album_reference)
            }
            MediaKind::Artist => {
                let name = query.name.as_deref()?;
                self.catalog.search_artist(name).await.map(artist_reference)
            }
            MediaKind::Music | MediaKind::Unknown => {
                let name = query.name.as_deref()?;
                self.catalog.search_any(name).await.map(hit_reference)
            }
            // No playable counterpart; resolved without any lookup.
            MediaKind::Podcast | MediaKind::RadioStation | MediaKind::Audiobook => {
                tracing::debug!(kind = ?query.kind, "Unsupported media kind");
                None
            }
        }
    }

    /// Playlists are never resolved remotely; the local library is the only
    /// source consulted.
    async fn resolve_local_playlist(&self, query: &MediaQuery) -> Option<MediaReference> {
        let name = query.name.as_deref()?;
        let playlist = self.library.find_playlist_by_name(name).await?;
        Some(MediaReference::local_playlist(
            playlist.persistent_id,
            playlist.name,
        ))
    }

    async fn resolve_song(&self, query: &MediaQuery) -> Option<MediaReference> {
        // When the assistant refers to the currently playing item and
        // already knows its identifier, look it up directly instead of
        // running an ambiguous name search.
        if query.reference == QueryReference::CurrentlyPlaying {
            if let Some(identifier) = query.identifier.as_deref() {
                return self
                    .catalog
                    .fetch_song_by_identifier(identifier)
                    .await
                    .map(song_reference);
            }
        }

        let name = query.name.as_deref()?;
        self.catalog
            .search_song(
                name,
                query.album_name.as_deref(),
                query.artist_name.as_deref(),
            )
            .await
            .map(song_reference)
    }
}

fn song_reference(song: Song) -> MediaReference {
    MediaReference {
        identifier: song.id,
        kind: ReferenceKind::Song,
        title: song.attributes.name,
        artist: song.attributes.artist_name,
    }
}

fn album_reference(album: Album) -> MediaReference {
    MediaReference {
        identifier: album.id,
        kind: ReferenceKind::Album,
        title: album.attributes.name,
        artist: album.attributes.artist_name,
    }
}

/// An artist hit becomes a reference to the artist's catalog id. Queueing
/// that id plays from the artist; it is indexed under the song domain.
fn artist_reference(artist: Artist) -> MediaReference {
    MediaReference {
        identifier: artist.id,
        kind: ReferenceKind::Song,
        title: artist.attributes.name,
        artist: None,
    }
}

fn hit_reference(hit: CatalogHit) -> MediaReference {
    match hit {
        CatalogHit::Song(song) => song_reference(song),
        CatalogHit::Album(album) => album_reference(album),
        CatalogHit::Artist(artist) => artist_reference(artist),
    }
}
