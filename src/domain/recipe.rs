//! Text recipes and calls-to-action.

use serde::{Deserialize, Serialize};

use crate::domain::content::Moment;
use crate::domain::plan::Container;

/// What a CTA asks the viewer to do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CtaKind {
    Comment,
    Follow,
    Share,
    Save,
    Link,
}

impl CtaKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CtaKind::Comment => "comment",
            CtaKind::Follow => "follow",
            CtaKind::Share => "share",
            CtaKind::Save => "save",
            CtaKind::Link => "link",
        }
    }

    /// The behavioral intent bucket this kind belongs to.
    pub fn intent(&self) -> CtaIntent {
        match self {
            CtaKind::Comment => CtaIntent::Engage,
            CtaKind::Follow => CtaIntent::Grow,
            CtaKind::Share | CtaKind::Save => CtaIntent::Spread,
            CtaKind::Link => CtaIntent::Click,
        }
    }
}

impl std::fmt::Display for CtaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Intent buckets used for streak limits (repeating the same ask gets stale).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CtaIntent {
    Engage,
    Grow,
    Spread,
    Click,
}

impl CtaIntent {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CtaIntent::Engage => "engage",
            CtaIntent::Grow => "grow",
            CtaIntent::Spread => "spread",
            CtaIntent::Click => "click",
        }
    }
}

impl std::fmt::Display for CtaIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A call-to-action line, selectable as a bandit arm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cta {
    pub id: String,
    pub kind: CtaKind,
    pub text: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
}

impl Cta {
    /// The intent bucket, from the kind.
    pub fn intent(&self) -> CtaIntent {
        self.kind.intent()
    }
}

/// A post text recipe: two overlay beats, a caption template, and a CTA ask.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    /// First overlay line (the hook)
    pub beat1: String,
    /// Second overlay line (the payoff)
    pub beat2: String,
    /// Caption template; `{track}` and `{artist}` are substituted
    pub caption_template: String,
    /// Kind of CTA this recipe asks for, if any
    #[serde(default)]
    pub cta_kind: Option<CtaKind>,
    /// Moments this recipe reads well over; empty means any
    #[serde(default)]
    pub allowed_moments: Vec<Moment>,
    /// Containers this recipe must not be used with
    #[serde(default)]
    pub disallowed_containers: Vec<Container>,
    /// Hook family tag for day/week variety caps
    #[serde(default)]
    pub hook_family: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
}

impl Recipe {
    /// Whether this recipe may run in the given container.
    pub fn allows_container(&self, container: Container) -> bool {
        !self.disallowed_containers.contains(&container)
    }

    /// Whether this recipe reads well over the given moment.
    ///
    /// An empty allow list means the recipe is moment-agnostic. A Neutral
    /// moment never conflicts with a populated list.
    pub fn allows_moment(&self, moment: Moment) -> bool {
        self.allowed_moments.is_empty()
            || !moment.is_meaningful()
            || self.allowed_moments.contains(&moment)
    }

    /// The CTA intent this recipe carries, if it asks for anything.
    pub fn cta_intent(&self) -> Option<CtaIntent> {
        self.cta_kind.map(|k| k.intent())
    }
}

fn default_true() -> bool {
    true
}
