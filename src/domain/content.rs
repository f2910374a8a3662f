//! Media catalog types: clips, snippets, tracks.
//!
//! All of these are read-only to the planner. The catalog is synced from
//! external tooling (clip tagging, track analysis) via the import path.

use serde::{Deserialize, Serialize};

/// Coarse mood/intensity category used to match visuals to audio sections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Moment {
    Calm,
    Build,
    Peak,
    /// Unset / not meaningful for matching
    Neutral,
}

impl Moment {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Moment::Calm => "calm",
            Moment::Build => "build",
            Moment::Peak => "peak",
            Moment::Neutral => "neutral",
        }
    }

    /// Whether this moment carries matching signal.
    pub fn is_meaningful(&self) -> bool {
        !matches!(self, Moment::Neutral)
    }
}

impl std::fmt::Display for Moment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audio-sync takedown risk of a clip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SyncRisk {
    Safe,
    Sensitive,
    /// Never usable; hard-blocks the whole clip set
    Critical,
}

impl SyncRisk {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncRisk::Safe => "safe",
            SyncRisk::Sensitive => "sensitive",
            SyncRisk::Critical => "critical",
        }
    }
}

/// What kind of footage a clip is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ClipCategory {
    /// Screen capture of the DAW session; the recognizable montage anchor
    DawCapture,
    /// Studio b-roll (hands on gear, monitors, room)
    Studio,
    /// Performance footage (playing, singing)
    Performance,
    /// Lifestyle / out-of-studio footage
    Lifestyle,
    /// Abstract visuals (loops, renders)
    Abstract,
}

impl ClipCategory {
    /// Get the string representation (used as the CLIP_CATEGORY arm id).
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipCategory::DawCapture => "daw-capture",
            ClipCategory::Studio => "studio",
            ClipCategory::Performance => "performance",
            ClipCategory::Lifestyle => "lifestyle",
            ClipCategory::Abstract => "abstract",
        }
    }
}

impl std::fmt::Display for ClipCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single video clip in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: String,
    pub category: ClipCategory,
    pub moment: Moment,
    pub sync_risk: SyncRisk,
    /// Raw clip length, seconds
    pub duration_secs: f64,
}

/// A candidate music snippet cut from a track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    pub id: String,
    pub track_id: String,
    /// Start offset within the track, seconds
    pub start: f64,
    /// Snippet duration, seconds
    pub duration: f64,
    /// Flagged as a strong 3-7s hook moment
    pub moment_3_to_7: bool,
    /// Flagged as a strong 7-11s hook moment
    pub moment_7_to_11: bool,
    /// Section label from track analysis ("drop", "chorus", "verse", ...)
    pub section: String,
    /// Normalized energy score in [0, 1]
    pub energy: f64,
}

impl Snippet {
    /// The coarse moment this snippet's section maps to.
    pub fn moment(&self) -> Moment {
        section_moment(&self.section)
    }
}

/// A track the snippets were cut from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
}

/// Map a section label from track analysis onto a coarse moment.
///
/// Unknown or empty labels are Neutral and carry no matching signal.
pub fn section_moment(section: &str) -> Moment {
    match section.trim().to_lowercase().as_str() {
        "drop" | "chorus" | "hook" => Moment::Peak,
        "build" | "buildup" | "pre-chorus" | "riser" => Moment::Build,
        "intro" | "verse" | "bridge" | "outro" | "breakdown" => Moment::Calm,
        _ => Moment::Neutral,
    }
}
