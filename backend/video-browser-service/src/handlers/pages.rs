/// Page handlers - listing and playback
///
/// Storage failures never fail the request: they are logged and the page
/// renders with whatever could be fetched.
use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::instrument;

use crate::catalog::{build_catalog, build_play_view, sort_by_updated};
use crate::error::Result;
use crate::state::AppState;
use crate::templates::{IndexPage, PlayPage};

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// List the bucket's videos, newest first
#[instrument(skip(state))]
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut objects = match state.store.list_objects(&state.bucket).await {
        Ok(objects) => objects,
        Err(e) => {
            tracing::warn!(bucket = %state.bucket, error = %e, "Failed getting video list");
            Vec::new()
        }
    };

    sort_by_updated(&mut objects);
    let videos = build_catalog(&objects, &state.video_suffixes, &state.signer, Utc::now());

    let body = state.templates.render_index(&IndexPage {
        bucket: &state.bucket,
        videos: &videos,
        object_count: objects.len(),
    })?;

    Ok(HttpResponse::Ok().content_type(HTML_CONTENT_TYPE).body(body))
}

/// Playback page for one object
#[instrument(skip(state))]
pub async fn play(state: web::Data<AppState>, object_name: web::Path<String>) -> Result<HttpResponse> {
    let object_name = object_name.into_inner();

    let video = match state.store.get_object(&state.bucket, &object_name).await {
        Ok(object) => Some(build_play_view(
            &object,
            &state.video_suffixes,
            &state.signer,
            Utc::now(),
        )),
        Err(e) => {
            tracing::warn!(object_name = %object_name, error = %e, "Failed getting info for video");
            None
        }
    };

    let body = state.templates.render_play(&PlayPage {
        bucket: &state.bucket,
        object_name: &object_name,
        video: video.as_ref(),
    })?;

    Ok(HttpResponse::Ok().content_type(HTML_CONTENT_TYPE).body(body))
}
