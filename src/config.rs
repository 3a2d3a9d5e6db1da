//! Runtime configuration resolved from environment variables
//!
//! Each setting follows the same priority order: environment variable first,
//! compiled default otherwise. The developer token has no default; catalog
//! lookups degrade to misses until one is provided.

use std::path::PathBuf;

const DEFAULT_CATALOG_URL: &str = "https://api.music.example.com";
const DEFAULT_STOREFRONT: &str = "us";
const DEFAULT_CACHE_DIR: &str = ".cache";

#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the remote catalog service.
    pub catalog_base_url: String,
    /// Regional storefront used in catalog paths.
    pub storefront: String,
    /// Developer token presented as the bearer credential to the catalog.
    pub developer_token: Option<String>,
    /// Directory for the local library store and cached user token.
    pub cache_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            catalog_base_url: std::env::var("VOXPLAY_CATALOG_URL")
                .unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string()),
            storefront: std::env::var("VOXPLAY_STOREFRONT")
                .unwrap_or_else(|_| DEFAULT_STOREFRONT.to_string()),
            developer_token: std::env::var("VOXPLAY_DEVELOPER_TOKEN").ok(),
            cache_dir: std::env::var("VOXPLAY_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR)),
        }
    }

    pub fn library_path(&self) -> PathBuf {
        self.cache_dir.join("library.json")
    }

    pub fn user_token_path(&self) -> PathBuf {
        self.cache_dir.join("user_token")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_URL.to_string(),
            storefront: DEFAULT_STOREFRONT.to_string(),
            developer_token: None,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}
