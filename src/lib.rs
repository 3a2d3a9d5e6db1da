//! voxplay - voice-intent media resolution and playback dispatch
//!
//! A host assistant hands this crate structured play/add intents. The
//! controller resolves the spoken media reference against the remote
//! catalog or the local library, then dispatches the side effect (set the
//! queue and play, or add to library/playlist) and reports a structured
//! response code back to the assistant.

pub mod auth;
pub mod config;
pub mod controller;
pub mod logging;
pub mod model;
pub mod player;
