//! Video Browser Service
//!
//! Web front-end that lists the videos in a Cloud Storage bucket and plays
//! them through time-limited signed URLs.

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod humanize;
pub mod models;
pub mod signing;
pub mod state;
pub mod storage;
pub mod templates;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
