//! Thinking steps streamed alongside assistant text.
//!
//! The backend refines steps incrementally: a step is introduced once and
//! later frames update its status or extend its description. Identity is
//! the step id when present, otherwise the title.

use serde::{Deserialize, Deserializer, Serialize};

/// Status of a thinking step.
///
/// Statuses only move forward within a session:
/// `Pending -> InProgress -> {Completed, Error}`. `Completed` and `Error`
/// are terminal for a given step identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    #[serde(alias = "in_progress")]
    Inprogress,
    Completed,
    Error,
}

impl StepStatus {
    /// Rank in the status lattice. Equal ranks never replace each other
    /// except that nothing replaces a terminal status.
    fn rank(self) -> u8 {
        match self {
            StepStatus::Pending => 0,
            StepStatus::Inprogress => 1,
            StepStatus::Completed => 2,
            StepStatus::Error => 2,
        }
    }

    /// Whether this status is terminal for the step identity.
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Error)
    }

    /// Apply an incoming status on top of the current one, preserving the
    /// no-regression invariant. Returns the status that should be kept.
    pub fn advance(self, incoming: StepStatus) -> StepStatus {
        if self.is_terminal() {
            return self;
        }
        if incoming.rank() >= self.rank() {
            incoming
        } else {
            self
        }
    }
}

/// One step of the assistant's visible reasoning.
///
/// Description entries are step-shaped themselves and merge recursively by
/// the same identity rule as top-level steps. The backend may send a
/// description entry as a bare string; it deserializes as a pending step
/// titled with that string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThinkingStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default, deserialize_with = "deserialize_description")]
    pub description: Vec<ThinkingStep>,
}

impl ThinkingStep {
    /// Create a new pending step with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            status: StepStatus::Pending,
            description: Vec::new(),
        }
    }

    /// Check whether `other` refers to the same step.
    ///
    /// Id wins when both sides carry one; otherwise titles are compared.
    /// An incoming id that matches nothing falls back to title matching at
    /// the merge site, so backends that add ids midway do not fork steps.
    pub fn same_identity(&self, other: &ThinkingStep) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => !self.title.is_empty() && self.title == other.title,
        }
    }
}

/// Description entries arrive either as nested step objects or as bare
/// strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptionEntry {
    Text(String),
    Step(ThinkingStep),
}

fn deserialize_description<'de, D>(deserializer: D) -> Result<Vec<ThinkingStep>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<DescriptionEntry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            DescriptionEntry::Text(text) => ThinkingStep::new(text),
            DescriptionEntry::Step(step) => step,
        })
        .collect())
}
