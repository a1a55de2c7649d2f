//! Ordered instruction steps shown for a module.

use serde::{Deserialize, Serialize};

/// Presentation emphasis of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Info,
    Action,
    Warning,
    Success,
}

/// One instruction. `condition` is computed from the live bomb when the
/// steps are generated, so regenerating after a state change reflects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionStep {
    /// 1-based position in the sequence.
    pub step: u32,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl InstructionStep {
    pub fn new(kind: StepKind, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            step: 0,
            kind,
            title: title.into(),
            content: content.into(),
            condition: None,
            note: None,
            warning: None,
        }
    }

    pub fn info(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(StepKind::Info, title, content)
    }

    /// Closing step every module ends with: do it, and mind the strike.
    pub fn final_warning(
        title: impl Into<String>,
        content: impl Into<String>,
        warning: impl Into<String>,
    ) -> Self {
        Self::new(StepKind::Warning, title, content).with_warning(warning)
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Assign 1-based step numbers in order.
pub fn numbered(steps: Vec<InstructionStep>) -> Vec<InstructionStep> {
    steps
        .into_iter()
        .zip(1..)
        .map(|(mut s, n)| {
            s.step = n;
            s
        })
        .collect()
}

/// `YES` / `NO` as printed in step conditions.
pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}
