/// Video catalog: filtering, naming and ordering of bucket objects
///
/// Everything here is a pure function of the fetched snapshot (plus the
/// clock for signing and relative times). Source objects are never
/// modified; views are built from borrowed data.
use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::humanize::{human_bytes, human_time};
use crate::models::{BucketObject, CatalogEntry, PlayView};
use crate::signing::UrlSigner;

/// Characters that must be percent-encoded in the play path
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const DEFAULT_VIDEO_SUFFIX: &str = ".mp4";

/// File suffixes that mark an object as a video (exact, case-sensitive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSuffixes(Vec<String>);

impl Default for VideoSuffixes {
    fn default() -> Self {
        Self(vec![DEFAULT_VIDEO_SUFFIX.to_string()])
    }
}

impl VideoSuffixes {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let suffixes: Vec<String> = suffixes
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();

        if suffixes.is_empty() {
            Self::default()
        } else {
            Self(suffixes)
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// The first configured suffix that `name` ends with
    pub fn matching(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .find(|suffix| name.ends_with(suffix))
    }

    pub fn is_video(&self, name: &str) -> bool {
        self.matching(name).is_some()
    }
}

/// Objects whose name ends with a video suffix, in input order
pub fn filter_videos<'a>(objects: &'a [BucketObject], suffixes: &VideoSuffixes) -> Vec<&'a BucketObject> {
    objects
        .iter()
        .filter(|object| suffixes.is_video(&object.name))
        .collect()
}

/// Strip one trailing video suffix; names without one come back unchanged
pub fn cleanup_name<'a>(name: &'a str, suffixes: &VideoSuffixes) -> &'a str {
    match suffixes.matching(name) {
        Some(suffix) => &name[..name.len() - suffix.len()],
        None => name,
    }
}

/// Most recently updated first; equal timestamps keep input order.
///
/// Unparseable timestamps sort after every parseable one.
pub fn sort_by_updated(objects: &mut [BucketObject]) {
    objects.sort_by_cached_key(|object| Reverse(object.updated_at()));
}

/// Relative link to the playback page for `name`
pub fn play_path(name: &str) -> String {
    format!("/play/{}", utf8_percent_encode(name, PATH_SET))
}

/// Listing view model: video rows of an already sorted snapshot
pub fn build_catalog(
    objects: &[BucketObject],
    suffixes: &VideoSuffixes,
    signer: &UrlSigner,
    now: DateTime<Utc>,
) -> Vec<CatalogEntry> {
    filter_videos(objects, suffixes)
        .into_iter()
        .map(|object| CatalogEntry {
            name: object.name.clone(),
            display_name: cleanup_name(&object.name, suffixes).to_string(),
            size: object.size,
            human_size: human_bytes(object.size),
            updated: object.updated.clone(),
            human_time: human_time(&object.updated, now),
            play_path: play_path(&object.name),
            signed_url: signer.sign_or_empty_at(&object.name, now),
        })
        .collect()
}

/// Playback view model for one object
pub fn build_play_view(
    object: &BucketObject,
    suffixes: &VideoSuffixes,
    signer: &UrlSigner,
    now: DateTime<Utc>,
) -> PlayView {
    PlayView {
        name: object.name.clone(),
        display_name: cleanup_name(&object.name, suffixes).to_string(),
        size: object.size,
        human_size: human_bytes(object.size),
        updated: object.updated.clone(),
        human_time: human_time(&object.updated, now),
        content_type: object.content_type.clone(),
        signed_url: signer.sign_or_empty_at(&object.name, now),
    }
}
