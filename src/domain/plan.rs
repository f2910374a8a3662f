//! Plan record: one scheduled unit of content.
//!
//! A Plan is created by the assembler when a slot commits and is never
//! mutated by the planner afterward. Later lifecycle stages (render,
//! upload, posting) are driven by external collaborators that only advance
//! `status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{generate_plan_id, now_ms};

/// The visual format of a post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// Single looping clip.
    Static,
    /// Ordered multi-clip sequence.
    Montage,
}

impl Container {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Container::Static => "static",
            Container::Montage => "montage",
        }
    }

    /// Parse from the string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "static" => Some(Container::Static),
            "montage" => Some(Container::Montage),
            _ => None,
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Plan lifecycle state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Created by the planner, waiting for render
    Planned,
    /// Video rendered, waiting for upload
    Rendered,
    /// Uploaded, waiting for the platform to confirm
    Pending,
    /// Live on the platform
    Posted,
    /// Render or upload failed
    Failed,
}

impl PlanStatus {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Planned => "planned",
            PlanStatus::Rendered => "rendered",
            PlanStatus::Pending => "pending",
            PlanStatus::Posted => "posted",
            PlanStatus::Failed => "failed",
        }
    }

    /// Parse from the string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(PlanStatus::Planned),
            "rendered" => Some(PlanStatus::Rendered),
            "pending" => Some(PlanStatus::Pending),
            "posted" => Some(PlanStatus::Posted),
            "failed" => Some(PlanStatus::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Posted | PlanStatus::Failed)
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the bandit arrived at a choice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Arm had zero pulls and was force-picked
    Unpulled,
    /// Uniform sample under the exploration budget
    Explore,
    /// Max UCB1 score
    Exploit,
    /// Locked-arm share override
    Locked,
}

impl SelectionMode {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Unpulled => "unpulled",
            SelectionMode::Explore => "explore",
            SelectionMode::Exploit => "exploit",
            SelectionMode::Locked => "locked",
        }
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which selection mode produced each dimension of a plan.
///
/// Recorded so the performance-ingest side can attribute reward to
/// exploration vs exploitation per dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanExperiment {
    pub container: SelectionMode,
    pub recipe: SelectionMode,
    /// None when the recipe carries no CTA
    pub cta: Option<SelectionMode>,
    pub snippet_strategy: SelectionMode,
    /// Mode of the first (anchor) clip pick; None when no anchor candidate
    /// existed
    pub anchor_clip: Option<SelectionMode>,
}

/// One scheduled unit of content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Timestamp-based ID: "1738300800123-a1b2"
    pub id: String,

    /// When this plan should be posted
    pub scheduled_at: DateTime<Utc>,

    /// Visual format
    pub container: Container,

    /// Ordered clip IDs making up the visual sequence
    pub clip_ids: Vec<String>,

    /// Track the snippet belongs to
    pub track_id: String,

    /// Chosen music snippet
    pub snippet_id: String,

    /// Snippet start offset within the track, seconds
    pub snippet_start: f64,

    /// Snippet duration, seconds
    pub snippet_duration: f64,

    /// First on-screen text line (hook beat 1)
    pub line1: String,

    /// Second on-screen text line (hook beat 2)
    pub line2: String,

    /// Rendered caption including hashtags
    pub caption: String,

    /// Recipe that produced the text
    pub recipe_id: String,

    /// Hook family of the recipe, denormalized for history scans
    pub hook_family: String,

    /// Clip-set / snippet compatibility score in [0, 1]
    pub compat_score: f64,

    /// Human-readable scoring and assembly notes
    pub reasons: Vec<String>,

    /// Lifecycle status
    pub status: PlanStatus,

    /// Selection-mode metadata per dimension
    pub experiment: PlanExperiment,

    /// Unix timestamp in milliseconds
    pub created_at: i64,
}

impl Plan {
    /// Ordered clip-id signature used for montage exact-repeat detection.
    pub fn clip_signature(&self) -> String {
        self.clip_ids.join("+")
    }
}

/// Builder-ish constructor used by the assembler's commit stage.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    pub scheduled_at: DateTime<Utc>,
    pub container: Container,
    pub clip_ids: Vec<String>,
    pub track_id: String,
    pub snippet_id: String,
    pub snippet_start: f64,
    pub snippet_duration: f64,
    pub line1: String,
    pub line2: String,
    pub caption: String,
    pub recipe_id: String,
    pub hook_family: String,
    pub compat_score: f64,
    pub reasons: Vec<String>,
    pub experiment: PlanExperiment,
}

impl PlanDraft {
    /// Finalize the draft into a Plan with a fresh id and Planned status.
    pub fn commit(self) -> Plan {
        Plan {
            id: generate_plan_id(),
            scheduled_at: self.scheduled_at,
            container: self.container,
            clip_ids: self.clip_ids,
            track_id: self.track_id,
            snippet_id: self.snippet_id,
            snippet_start: self.snippet_start,
            snippet_duration: self.snippet_duration,
            line1: self.line1,
            line2: self.line2,
            caption: self.caption,
            recipe_id: self.recipe_id,
            hook_family: self.hook_family,
            compat_score: self.compat_score,
            reasons: self.reasons,
            status: PlanStatus::Planned,
            experiment: self.experiment,
            created_at: now_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_draft() -> PlanDraft {
        PlanDraft {
            scheduled_at: Utc::now(),
            container: Container::Montage,
            clip_ids: vec!["c1".into(), "c2".into()],
            track_id: "tr1".into(),
            snippet_id: "sn1".into(),
            snippet_start: 31.0,
            snippet_duration: 8.5,
            line1: "watch this beat come together".into(),
            line2: "the last layer changes everything".into(),
            caption: "making something out of nothing #producer".into(),
            recipe_id: "r1".into(),
            hook_family: "process-reveal".into(),
            compat_score: 0.87,
            reasons: vec!["moment match".into()],
            experiment: PlanExperiment {
                container: SelectionMode::Explore,
                recipe: SelectionMode::Exploit,
                cta: Some(SelectionMode::Unpulled),
                snippet_strategy: SelectionMode::Explore,
                anchor_clip: Some(SelectionMode::Exploit),
            },
        }
    }

    #[test]
    fn test_container_as_str() {
        assert_eq!(Container::Static.as_str(), "static");
        assert_eq!(Container::Montage.as_str(), "montage");
    }

    #[test]
    fn test_plan_status_as_str() {
        assert_eq!(PlanStatus::Planned.as_str(), "planned");
        assert_eq!(PlanStatus::Rendered.as_str(), "rendered");
        assert_eq!(PlanStatus::Posted.as_str(), "posted");
    }

    #[test]
    fn test_plan_status_parse_roundtrip() {
        for status in [
            PlanStatus::Planned,
            PlanStatus::Rendered,
            PlanStatus::Pending,
            PlanStatus::Posted,
            PlanStatus::Failed,
        ] {
            assert_eq!(PlanStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PlanStatus::parse("cancelled"), None);
    }

    #[test]
    fn test_plan_status_is_terminal() {
        assert!(!PlanStatus::Planned.is_terminal());
        assert!(!PlanStatus::Rendered.is_terminal());
        assert!(!PlanStatus::Pending.is_terminal());
        assert!(PlanStatus::Posted.is_terminal());
        assert!(PlanStatus::Failed.is_terminal());
    }

    #[test]
    fn test_selection_mode_as_str() {
        assert_eq!(SelectionMode::Unpulled.as_str(), "unpulled");
        assert_eq!(SelectionMode::Explore.as_str(), "explore");
        assert_eq!(SelectionMode::Exploit.as_str(), "exploit");
        assert_eq!(SelectionMode::Locked.as_str(), "locked");
    }

    #[test]
    fn test_draft_commit_sets_id_and_status() {
        let plan = sample_draft().commit();
        assert!(plan.id.contains('-'));
        assert_eq!(plan.status, PlanStatus::Planned);
        assert!(plan.created_at > 0);
        assert_eq!(plan.container, Container::Montage);
    }

    #[test]
    fn test_clip_signature_joins_in_order() {
        let plan = sample_draft().commit();
        assert_eq!(plan.clip_signature(), "c1+c2");
    }

    #[test]
    fn test_plan_serialization_roundtrip() {
        let plan = sample_draft().commit();
        let json = serde_json::to_string(&plan).unwrap();
        let restored: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, restored);
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&PlanStatus::Planned).unwrap();
        assert_eq!(json, "\"planned\"");
        let json = serde_json::to_string(&Container::Montage).unwrap();
        assert_eq!(json, "\"montage\"");
    }
}
