//! Model module - Media data types and the stores they come from
//!
//! This module contains the data structures shared by resolution and
//! dispatch, plus the two places a media reference can come from.
//! It is organized into submodules by responsibility:
//!
//! - `media`: Core type definitions (queries, references, destinations, outcomes)
//! - `catalog`: Remote catalog API client and wire types
//! - `library`: Local media library store

mod media;

pub mod catalog;
pub mod library;

// Re-export all public types for convenient access
pub use media::{
    Destination, DispatchOutcome, LOCAL_LIBRARY_PREFIX, MediaKind, MediaQuery, MediaReference,
    QueryReference, ReferenceKind, UnsupportedReason,
};

pub use catalog::{Catalog, CatalogClient, CatalogHit, sized_artwork_url};

pub use library::{LibraryItem, LocalLibrary, Playlist};
