//! Module rule engine.
//!
//! Every module has [`ModuleInfo`] and an ordered list of instruction steps.
//! Modules whose correct action follows deterministically from a short
//! questionnaire are [`ModuleLogic::Structured`]: they also expose the
//! questions and a pure `solve` over an ordered, first-match-wins rule
//! table. The rest are [`ModuleLogic::Narrative`]: they only present the
//! procedure and the player judges the outcome.
//!
//! | Module | Variant | Source of truth |
//! |--------|---------|-----------------|
//! | [`wires`] | structured | per-count rule tables |
//! | [`button`] | structured | 9-rule table + strip timing |
//! | [`keypads`] | structured | 3-column symbol grid |
//! | [`simon`] | narrative | serial/strike colour tables |
//! | [`whos_on_first`] | narrative | two word → position tables |
//! | [`memory`] | narrative | five-stage position rules |
//! | [`morse`] | narrative | Morse chart + frequency table |

pub mod button;
pub mod keypads;
pub mod memory;
pub mod morse;
pub mod simon;
pub mod whos_on_first;
pub mod wires;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bomb::{Bomb, ModuleId};
use crate::steps::InstructionStep;

// ============================================================================
// MODULE METADATA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Regular,
    Needy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub id: ModuleId,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub difficulty: Difficulty,
}

// ============================================================================
// QUESTIONNAIRE
// ============================================================================

/// A single questionnaire answer as supplied by the form collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

/// Answers keyed by question id.
pub type Answers = BTreeMap<String, Answer>;

impl Answer {
    /// Scalar reading. Whole numbers render without a fraction.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.trim().to_string()),
            Self::Number(n) if n.fract() == 0.0 => Some(format!("{n:.0}")),
            Self::Number(n) => Some(n.to_string()),
            Self::Flag(_) | Self::List(_) => None,
        }
    }

    /// List reading. Text is split on commas.
    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            Self::List(items) => Some(
                items
                    .iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            Self::Text(s) => Some(
                s.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect(),
            ),
            Self::Flag(_) | Self::Number(_) => None,
        }
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<&str>> for Answer {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Build an answer map from `(question id, answer)` pairs.
pub fn answers<I, A>(pairs: I) -> Answers
where
    I: IntoIterator<Item = (&'static str, A)>,
    A: Into<Answer>,
{
    pairs
        .into_iter()
        .map(|(id, a)| (id.to_string(), a.into()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Select,
    Text,
    Multiselect,
    Boolean,
    Number,
}

/// One input prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub label: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}

pub(crate) fn required_text(answers: &Answers, id: &'static str) -> Result<String, SolveError> {
    answers
        .get(id)
        .and_then(Answer::as_text)
        .filter(|s| !s.is_empty())
        .ok_or(SolveError::MissingAnswer(id))
}

pub(crate) fn required_list(
    answers: &Answers,
    id: &'static str,
) -> Result<Vec<String>, SolveError> {
    answers
        .get(id)
        .and_then(Answer::as_list)
        .filter(|items| !items.is_empty())
        .ok_or(SolveError::MissingAnswer(id))
}

// ============================================================================
// SOLVING
// ============================================================================

/// Concrete instruction chosen by a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub solution: String,
    pub explanation: String,
}

/// Why a structured module could not produce a solution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("no answer given for `{0}`")]
    MissingAnswer(&'static str),
    #[error("`{value}` is not a valid answer for `{question}`")]
    InvalidAnswer {
        question: &'static str,
        value: String,
    },
    #[error("the manual has no rules for {0} wires (expected 3 to 6)")]
    UnsupportedWireCount(u32),
    #[error("{expected} wires declared but {found} colours given")]
    WireCountMismatch { expected: usize, found: usize },
    #[error("exactly 4 keypad symbols are needed, got {0}")]
    WrongSymbolCount(usize),
    #[error("keypad symbol `{0}` was entered twice")]
    DuplicateSymbol(String),
    #[error("`{0}` is not a keypad symbol")]
    UnknownSymbol(String),
    #[error("no column contains all four symbols; re-check the keypad")]
    NoMatchingColumn,
    #[error("{0} columns contain all four symbols; re-check the keypad")]
    AmbiguousColumn(usize),
}

/// Result of checking a questionnaire against a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub correct: bool,
    pub message: String,
}

/// A module that only presents its procedure.
#[derive(Clone, Copy)]
pub struct NarrativeModule {
    pub info: ModuleInfo,
    pub steps: fn(&Bomb) -> Vec<InstructionStep>,
}

/// A module with a questionnaire and a deterministic solver.
#[derive(Clone, Copy)]
pub struct StructuredModule {
    pub info: ModuleInfo,
    pub steps: fn(&Bomb) -> Vec<InstructionStep>,
    /// Questions still relevant given the answers so far.
    pub questions: fn(&Bomb, &Answers) -> Vec<Question>,
    pub solve: fn(&Bomb, &Answers) -> Result<Solution, SolveError>,
    pub default_answers: fn() -> Answers,
}

impl StructuredModule {
    pub fn questions(&self, bomb: &Bomb, answers: &Answers) -> Vec<Question> {
        (self.questions)(bomb, answers)
    }

    pub fn solve(&self, bomb: &Bomb, answers: &Answers) -> Result<Solution, SolveError> {
        (self.solve)(bomb, answers)
    }

    pub fn default_answers(&self) -> Answers {
        (self.default_answers)()
    }
}

#[derive(Clone, Copy)]
pub enum ModuleLogic {
    Narrative(NarrativeModule),
    Structured(StructuredModule),
}

impl ModuleLogic {
    pub fn info(&self) -> &ModuleInfo {
        match self {
            Self::Narrative(m) => &m.info,
            Self::Structured(m) => &m.info,
        }
    }

    pub fn steps(&self, bomb: &Bomb) -> Vec<InstructionStep> {
        match self {
            Self::Narrative(m) => (m.steps)(bomb),
            Self::Structured(m) => (m.steps)(bomb),
        }
    }

    pub fn as_structured(&self) -> Option<&StructuredModule> {
        match self {
            Self::Structured(m) => Some(m),
            Self::Narrative(_) => None,
        }
    }

    /// Check a questionnaire. Narrative modules are judged by the player.
    pub fn validate(&self, bomb: &Bomb, answers: &Answers) -> Validation {
        match self {
            Self::Narrative(m) => Validation {
                correct: true,
                message: format!("{} is judged by the player", m.info.name),
            },
            Self::Structured(m) => match m.solve(bomb, answers) {
                Ok(solution) => Validation {
                    correct: true,
                    message: solution.solution,
                },
                Err(e) => Validation {
                    correct: false,
                    message: e.to_string(),
                },
            },
        }
    }
}

impl std::fmt::Debug for ModuleLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Narrative(_) => "Narrative",
            Self::Structured(_) => "Structured",
        };
        f.debug_struct(variant).field("info", self.info()).finish()
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

pub fn module_logic(id: ModuleId) -> ModuleLogic {
    match id {
        ModuleId::Wires => ModuleLogic::Structured(wires::MODULE),
        ModuleId::Button => ModuleLogic::Structured(button::MODULE),
        ModuleId::Keypads => ModuleLogic::Structured(keypads::MODULE),
        ModuleId::Simon => ModuleLogic::Narrative(simon::MODULE),
        ModuleId::WhosOnFirst => ModuleLogic::Narrative(whos_on_first::MODULE),
        ModuleId::Memory => ModuleLogic::Narrative(memory::MODULE),
        ModuleId::Morse => ModuleLogic::Narrative(morse::MODULE),
    }
}

pub fn module_name(id: ModuleId) -> &'static str {
    module_logic(id).info().name
}

/// All modules in display order.
pub fn all_modules() -> Vec<ModuleLogic> {
    ModuleId::ALL.into_iter().map(module_logic).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bomb::tests::sample_bomb;

    #[test]
    fn registry_covers_every_module_in_order() {
        let modules = all_modules();
        assert_eq!(modules.len(), ModuleId::COUNT);
        for (logic, id) in modules.iter().zip(ModuleId::ALL) {
            assert_eq!(logic.info().id, id);
        }
    }

    #[test]
    fn structured_variants() {
        let structured: Vec<ModuleId> = all_modules()
            .iter()
            .filter(|m| m.as_structured().is_some())
            .map(|m| m.info().id)
            .collect();
        assert_eq!(
            structured,
            vec![ModuleId::Wires, ModuleId::Button, ModuleId::Keypads]
        );
    }

    #[test]
    fn names() {
        assert_eq!(module_name(ModuleId::Button), "The Button");
        assert_eq!(module_name(ModuleId::WhosOnFirst), "Who's on First");
    }

    #[test]
    fn every_module_produces_numbered_steps() {
        let bomb = sample_bomb("AB12C3");
        for logic in all_modules() {
            let steps = logic.steps(&bomb);
            assert!(!steps.is_empty(), "{} has no steps", logic.info().name);
            for (i, step) in steps.iter().enumerate() {
                assert_eq!(step.step as usize, i + 1);
            }
        }
    }

    #[test]
    fn default_answers_solve() {
        let bomb = sample_bomb("AB12C3");
        for logic in all_modules() {
            if let Some(m) = logic.as_structured() {
                let result = m.solve(&bomb, &m.default_answers());
                assert!(result.is_ok(), "{}: {result:?}", m.info.name);
            }
        }
    }

    #[test]
    fn answer_readings() {
        assert_eq!(Answer::Number(4.0).as_text().as_deref(), Some("4"));
        assert_eq!(Answer::from(" 5 ").as_text().as_deref(), Some("5"));
        assert_eq!(
            Answer::from("R, y,,B").as_list(),
            Some(vec!["R".to_string(), "y".to_string(), "B".to_string()])
        );
        assert_eq!(Answer::Flag(true).as_text(), None);
    }

    #[test]
    fn untagged_answers_deserialize() {
        let parsed: Answers = serde_json::from_str(
            r#"{"a": "text", "b": ["x", "y"], "c": true, "d": 3}"#,
        )
        .unwrap();
        assert_eq!(parsed["a"], Answer::Text("text".into()));
        assert_eq!(parsed["b"], Answer::from(vec!["x", "y"]));
        assert_eq!(parsed["c"], Answer::Flag(true));
        assert_eq!(parsed["d"], Answer::Number(3.0));
    }

    #[test]
    fn validate_reports_errors_as_incorrect() {
        let bomb = sample_bomb("AB12C3");
        let keypads = module_logic(ModuleId::Keypads);
        let verdict = keypads.validate(&bomb, &answers([("symbols", vec!["Ω", "Ξ", "Α", "Σ"])]));
        assert!(!verdict.correct);
        let simon = module_logic(ModuleId::Simon);
        assert!(simon.validate(&bomb, &Answers::new()).correct);
    }
}
