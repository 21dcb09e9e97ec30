//! services/api/src/web/sounds.rs
//!
//! The ambient sound catalog and server-side previews rendered by the
//! synthesizer.

use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use nightfall_core::sound::mixer::{clamp_volume, DEFAULT_VOLUME};
use nightfall_core::sound::render::MAX_RENDER_SECONDS;
use nightfall_core::sound::{catalog, render_track, SoundCategory, TrackId};
use serde::Deserialize;
use tracing::error;
use utoipa::IntoParams;

use crate::adapters::wav::{encode_wav, PREVIEW_SAMPLE_RATE};

pub const DEFAULT_PREVIEW_SECONDS: u32 = 10;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewQuery {
    /// Clip length, 1 to 60 seconds (default 10).
    pub seconds: Option<u32>,
    /// Master gain, 0.0 to 1.0 (default 0.7).
    pub volume: Option<f32>,
    /// Noise and event seed; equal seeds give identical clips (default 0).
    pub seed: Option<u64>,
}

/// GET /api/sounds - The static track catalog
#[utoipa::path(
    get,
    path = "/api/sounds",
    responses(
        (status = 200, description = "Tracks grouped by category", body = [SoundCategory])
    )
)]
pub async fn catalog_handler() -> Json<Vec<SoundCategory>> {
    Json(catalog())
}

/// GET /api/sounds/{track_id}/preview - A rendered WAV clip of a track
///
/// Unknown track ids render white noise.
#[utoipa::path(
    get,
    path = "/api/sounds/{track_id}/preview",
    params(
        ("track_id" = String, Path, description = "Catalog track id, e.g. `rain`."),
        PreviewQuery
    ),
    responses(
        (status = 200, description = "16-bit mono WAV", content_type = "audio/wav"),
        (status = 500, description = "Rendering failed")
    )
)]
pub async fn preview_handler(
    Path(track_id): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let track = TrackId::from_id_lossy(&track_id);
    let seconds = query
        .seconds
        .unwrap_or(DEFAULT_PREVIEW_SECONDS)
        .clamp(1, MAX_RENDER_SECONDS);
    let volume = clamp_volume(query.volume.unwrap_or(DEFAULT_VOLUME));
    let seed = query.seed.unwrap_or(0);

    // Rendering is CPU-bound; keep it off the async workers.
    let wav = tokio::task::spawn_blocking(move || {
        let samples = render_track(track, PREVIEW_SAMPLE_RATE, seconds, volume, seed);
        encode_wav(&samples, PREVIEW_SAMPLE_RATE)
    })
    .await
    .map_err(|e| {
        error!("Preview render task failed: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render preview".to_string())
    })?
    .map_err(|e| {
        error!("Failed to encode preview: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode preview".to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav))
}
