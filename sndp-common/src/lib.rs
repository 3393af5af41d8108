//! # SNDP Common Library
//!
//! Shared code for the SNDP sound profile scheduler including:
//! - Database models and queries
//! - Event types (SndpEvent enum) and EventBus
//! - Next-occurrence calculation for repeating schedules
//! - Stream volume model and level conversion
//! - Configuration loading
//! - SSE utilities

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod occurrence;
pub mod params;
pub mod sse;
pub mod volume;

pub use db::models::{Day, SoundProfile};
pub use error::{Error, Result};
pub use volume::{Stream, StreamRange, VolumeLevels};
