pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;

#[cfg(test)]
mod integration_tests;

pub use audio::PlaybackEngine;
pub use cli::CommandSurface;
pub use error::*;
pub use models::*;
