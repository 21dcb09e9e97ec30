//! The fixed catalog of synthesizable tracks.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

/// Every catalog track plays for a nominal hour.
pub const TRACK_DURATION_SECONDS: u32 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackId {
    Rain,
    Ocean,
    Forest,
    WhiteNoise,
    PinkNoise,
    BrownNoise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryId {
    Nature,
    WhiteNoise,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown track id '{0}'")]
pub struct UnknownTrack(pub String);

impl TrackId {
    pub const ALL: [TrackId; 6] = [
        TrackId::Rain,
        TrackId::Ocean,
        TrackId::Forest,
        TrackId::WhiteNoise,
        TrackId::PinkNoise,
        TrackId::BrownNoise,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackId::Rain => "rain",
            TrackId::Ocean => "ocean",
            TrackId::Forest => "forest",
            TrackId::WhiteNoise => "white-noise",
            TrackId::PinkNoise => "pink-noise",
            TrackId::BrownNoise => "brown-noise",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TrackId::Rain => "Realistic Rain",
            TrackId::Ocean => "Realistic Ocean Waves",
            TrackId::Forest => "Forest Ambience",
            TrackId::WhiteNoise => "White Noise",
            TrackId::PinkNoise => "Pink Noise",
            TrackId::BrownNoise => "Brown Noise",
        }
    }

    pub fn category(self) -> CategoryId {
        match self {
            TrackId::Rain | TrackId::Ocean | TrackId::Forest => CategoryId::Nature,
            TrackId::WhiteNoise | TrackId::PinkNoise | TrackId::BrownNoise => {
                CategoryId::WhiteNoise
            }
        }
    }

    /// Parses `id`, falling back to white noise for anything unrecognised.
    pub fn from_id_lossy(id: &str) -> Self {
        id.parse().unwrap_or_else(|e: UnknownTrack| {
            warn!("{}; falling back to white noise", e);
            TrackId::WhiteNoise
        })
    }

    pub fn sound_track(self) -> SoundTrack {
        SoundTrack {
            id: self.as_str().to_string(),
            name: self.name().to_string(),
            duration: TRACK_DURATION_SECONDS,
            category: self.category().as_str().to_string(),
        }
    }
}

impl FromStr for TrackId {
    type Err = UnknownTrack;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackId::ALL
            .into_iter()
            .find(|track| track.as_str() == s)
            .ok_or_else(|| UnknownTrack(s.to_string()))
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CategoryId {
    pub const ALL: [CategoryId; 2] = [CategoryId::Nature, CategoryId::WhiteNoise];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryId::Nature => "nature",
            CategoryId::WhiteNoise => "white-noise",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CategoryId::Nature => "Nature Sounds",
            CategoryId::WhiteNoise => "White Noise",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SoundTrack {
    pub id: String,
    pub name: String,
    /// Nominal length in seconds.
    pub duration: u32,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SoundCategory {
    pub id: String,
    pub name: String,
    pub sounds: Vec<SoundTrack>,
}

/// The catalog grouped by category, in display order.
pub fn catalog() -> Vec<SoundCategory> {
    CategoryId::ALL
        .into_iter()
        .map(|category| SoundCategory {
            id: category.as_str().to_string(),
            name: category.name().to_string(),
            sounds: TrackId::ALL
                .into_iter()
                .filter(|track| track.category() == category)
                .map(TrackId::sound_track)
                .collect(),
        })
        .collect()
}
