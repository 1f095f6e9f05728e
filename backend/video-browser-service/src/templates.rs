/// HTML page rendering
///
/// `index.html` and `play.html` are loaded from a directory once at startup.
/// Pages receive fully precomputed view models; the registered filters are
/// only for presentation tweaks inside templates.
use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera, Value};
use thiserror::Error;

use crate::catalog::{cleanup_name, VideoSuffixes};
use crate::humanize::{human_bytes, human_time};
use crate::models::{CatalogEntry, PlayView};

pub const INDEX_TEMPLATE: &str = "index.html";
pub const PLAY_TEMPLATE: &str = "play.html";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to load templates from {dir}: {source}")]
    Load {
        dir: String,
        #[source]
        source: tera::Error,
    },

    #[error("template {0} not found in template directory")]
    Missing(&'static str),

    #[error("failed to render {name}: {source}")]
    Render {
        name: &'static str,
        #[source]
        source: tera::Error,
    },
}

/// Listing page data
#[derive(Debug, Serialize)]
pub struct IndexPage<'a> {
    pub bucket: &'a str,
    pub videos: &'a [CatalogEntry],
    /// All objects in the bucket, videos or not
    pub object_count: usize,
}

/// Playback page data; `video` is absent when the fetch failed
#[derive(Debug, Serialize)]
pub struct PlayPage<'a> {
    pub bucket: &'a str,
    pub object_name: &'a str,
    pub video: Option<&'a PlayView>,
}

/// Loaded page templates
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Load every `*.html` file in `dir`; both page templates must be present
    pub fn load(dir: &Path, suffixes: &VideoSuffixes) -> Result<Self, TemplateError> {
        let pattern = dir.join("*.html");
        let tera = Tera::new(&pattern.to_string_lossy()).map_err(|source| TemplateError::Load {
            dir: dir.display().to_string(),
            source,
        })?;

        Self::from_tera(tera, suffixes)
    }

    /// Build from in-memory `(name, source)` pairs
    pub fn from_sources(sources: &[(&str, &str)], suffixes: &VideoSuffixes) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(sources.iter().copied())
            .map_err(|source| TemplateError::Load {
                dir: "<memory>".to_string(),
                source,
            })?;

        Self::from_tera(tera, suffixes)
    }

    fn from_tera(mut tera: Tera, suffixes: &VideoSuffixes) -> Result<Self, TemplateError> {
        for required in [INDEX_TEMPLATE, PLAY_TEMPLATE] {
            if !tera.get_template_names().any(|name| name == required) {
                return Err(TemplateError::Missing(required));
            }
        }

        tera.autoescape_on(vec![".html"]);
        register_filters(&mut tera, suffixes.clone());

        Ok(Self { tera })
    }

    pub fn render_index(&self, page: &IndexPage<'_>) -> Result<String, TemplateError> {
        self.render(INDEX_TEMPLATE, page)
    }

    pub fn render_play(&self, page: &PlayPage<'_>) -> Result<String, TemplateError> {
        self.render(PLAY_TEMPLATE, page)
    }

    fn render<T: Serialize>(&self, name: &'static str, page: &T) -> Result<String, TemplateError> {
        let context = Context::from_serialize(page).map_err(|source| TemplateError::Render { name, source })?;
        self.tera
            .render(name, &context)
            .map_err(|source| TemplateError::Render { name, source })
    }
}

fn register_filters(tera: &mut Tera, suffixes: VideoSuffixes) {
    tera.register_filter(
        "human_size",
        |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
            let size = value
                .as_u64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
                .ok_or_else(|| tera::Error::msg("human_size expects a byte count"))?;
            Ok(Value::String(human_bytes(size)))
        },
    );

    tera.register_filter(
        "human_time",
        |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
            let input = value
                .as_str()
                .ok_or_else(|| tera::Error::msg("human_time expects an RFC 3339 string"))?;
            Ok(Value::String(human_time(input, chrono::Utc::now())))
        },
    );

    tera.register_filter(
        "cleanup_name",
        move |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
            let name = value
                .as_str()
                .ok_or_else(|| tera::Error::msg("cleanup_name expects a string"))?;
            Ok(Value::String(cleanup_name(name, &suffixes).to_string()))
        },
    );
}
