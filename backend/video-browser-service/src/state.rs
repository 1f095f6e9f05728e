//! Application state shared across handlers

use std::sync::Arc;

use crate::catalog::VideoSuffixes;
use crate::signing::UrlSigner;
use crate::storage::ObjectStore;
use crate::templates::Templates;

/// Built once at startup and only read afterwards
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub signer: Arc<UrlSigner>,
    pub templates: Arc<Templates>,
    pub bucket: String,
    pub video_suffixes: VideoSuffixes,
}
