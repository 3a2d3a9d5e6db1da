//! Remote music catalog client
//!
//! Authenticated search/lookup against the catalog's REST API. Every
//! operation surfaces at most one item: the first match the catalog returns.
//! Network errors, non-200 statuses and malformed payloads all collapse to
//! "no match" (logged); only authentication carries a distinct error type,
//! and even that degrades to a miss at the lookup boundary.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::auth::CatalogAuth;
use crate::config::Config;
use crate::{log_api_request, log_api_result};

const USER_AGENT: &str = concat!("voxplay/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT_SECS: u64 = 30;
const USER_TOKEN_HEADER: &str = "Music-User-Token";

/// A song as described by the catalog.
#[derive(Clone, Debug, Deserialize)]
pub struct Song {
    pub id: String,
    pub attributes: SongAttributes,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongAttributes {
    pub name: String,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub artwork: Option<Artwork>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Album {
    pub id: String,
    pub attributes: AlbumAttributes,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumAttributes {
    pub name: String,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub artwork: Option<Artwork>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Artist {
    pub id: String,
    pub attributes: ArtistAttributes,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistAttributes {
    pub name: String,
}

/// Artwork descriptor whose `url` is a template containing literal `{w}` and
/// `{h}` placeholder tokens.
#[derive(Clone, Debug, Deserialize)]
pub struct Artwork {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// First match of an untyped search, in the catalog's preference order.
#[derive(Clone, Debug)]
pub enum CatalogHit {
    Song(Song),
    Album(Album),
    Artist(Artist),
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: SearchResults,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResults {
    songs: Option<Page<Song>>,
    albums: Option<Page<Album>>,
    artists: Option<Page<Artist>>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Search/lookup operations the resolver needs from the catalog.
///
/// `CatalogClient` is the production implementation; tests substitute stubs.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    async fn search_song(
        &self,
        name: &str,
        album: Option<&str>,
        artist: Option<&str>,
    ) -> Option<Song>;
    async fn search_album(&self, name: &str, artist: Option<&str>) -> Option<Album>;
    async fn search_artist(&self, name: &str) -> Option<Artist>;
    async fn search_any(&self, name: &str) -> Option<CatalogHit>;
    async fn fetch_song_by_identifier(&self, identifier: &str) -> Option<Song>;
}

/// Catalog API client with lazy shared authentication.
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    auth: Arc<CatalogAuth>,
    base_url: String,
    storefront: String,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            auth: Arc::new(CatalogAuth::new(config, http.clone())),
            base_url: config.catalog_base_url.clone(),
            storefront: config.storefront.clone(),
            http,
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/v1/catalog/{}/search",
            self.base_url, self.storefront
        )
    }

    fn song_url(&self, identifier: &str) -> String {
        format!(
            "{}/v1/catalog/{}/songs/{}",
            self.base_url, self.storefront, identifier
        )
    }

    /// Authenticated GET decoding a JSON body. Any failure is a miss.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Option<T> {
        let session = match self.auth.session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Catalog authentication unavailable, treating lookup as a miss");
                return None;
            }
        };

        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&session.developer_token)
            .header(USER_TOKEN_HEADER, &session.user_token)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url, error = %e, "Catalog request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Catalog returned an error status");
            return None;
        }

        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(url, error = %e, "Catalog payload was malformed");
                None
            }
        }
    }

    async fn search(&self, term: &str, types: &str) -> Option<SearchResponse> {
        self.get_json(
            &self.search_url(),
            &[("term", term), ("types", types), ("limit", "1")],
        )
        .await
    }

    /// Fetch the artwork for an item at a concrete pixel size.
    ///
    /// Returns the raw image bytes, or `None` for any transport or status
    /// failure — callers only ever need a missing-image fallback.
    pub async fn fetch_artwork(&self, template: &str, width: u32, height: u32) -> Option<Vec<u8>> {
        let url = sized_artwork_url(template, width, height);
        log_api_request!("fetch_artwork", url = %url);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url, error = %e, "Artwork fetch failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Artwork fetch returned an error status");
            return None;
        }

        match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                tracing::warn!(url, error = %e, "Artwork body could not be read");
                None
            }
        }
    }
}

impl Catalog for CatalogClient {
    async fn search_song(
        &self,
        name: &str,
        album: Option<&str>,
        artist: Option<&str>,
    ) -> Option<Song> {
        let term = search_term(name, album, artist);
        log_api_request!("search_song", term = %term);
        let result = self
            .search(&term, "songs")
            .await
            .and_then(|r| r.results.songs)
            .and_then(|page| page.data.into_iter().next());
        log_api_result!("search_song", result);
        result
    }

    async fn search_album(&self, name: &str, artist: Option<&str>) -> Option<Album> {
        let term = search_term(name, None, artist);
        log_api_request!("search_album", term = %term);
        let result = self
            .search(&term, "albums")
            .await
            .and_then(|r| r.results.albums)
            .and_then(|page| page.data.into_iter().next());
        log_api_result!("search_album", result);
        result
    }

    async fn search_artist(&self, name: &str) -> Option<Artist> {
        log_api_request!("search_artist", term = %name);
        let result = self
            .search(name, "artists")
            .await
            .and_then(|r| r.results.artists)
            .and_then(|page| page.data.into_iter().next());
        log_api_result!("search_artist", result);
        result
    }

    async fn search_any(&self, name: &str) -> Option<CatalogHit> {
        log_api_request!("search_any", term = %name);
        let results = self.search(name, "songs,albums,artists").await?.results;

        let hit = results
            .songs
            .and_then(|page| page.data.into_iter().next())
            .map(CatalogHit::Song)
            .or_else(|| {
                results
                    .albums
                    .and_then(|page| page.data.into_iter().next())
                    .map(CatalogHit::Album)
            })
            .or_else(|| {
                results
                    .artists
                    .and_then(|page| page.data.into_iter().next())
                    .map(CatalogHit::Artist)
            });
        log_api_result!("search_any", hit);
        hit
    }

    async fn fetch_song_by_identifier(&self, identifier: &str) -> Option<Song> {
        log_api_request!("fetch_song_by_identifier", identifier = %identifier);
        let result = self
            .get_json::<LookupResponse<Song>>(&self.song_url(identifier), &[])
            .await
            .and_then(|r| r.data.into_iter().next());
        log_api_result!("fetch_song_by_identifier", result);
        result
    }
}

/// Build a search term from the name plus whatever qualifiers the assistant
/// extracted. The strings arrive exactly as transcribed; catalogs often
/// title items differently (punctuation, "[feat. X]" notations, homonyms),
/// so a production search would normalize these before querying.
pub(crate) fn search_term(name: &str, album: Option<&str>, artist: Option<&str>) -> String {
    let mut term = name.to_string();
    if let Some(album) = album {
        term.push(' ');
        term.push_str(album);
    }
    if let Some(artist) = artist {
        term.push(' ');
        term.push_str(artist);
    }
    term
}

/// Substitute the `{w}` and `{h}` placeholder tokens in an artwork URL
/// template with concrete pixel dimensions.
pub fn sized_artwork_url(template: &str, width: u32, height: u32) -> String {
    template
        .replace("{w}", &width.to_string())
        .replace("{h}", &height.to_string())
}
