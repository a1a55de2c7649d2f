//! Keypads.
//!
//! Four symbols are shown. Exactly one column of the reference grid holds
//! all four, and the keys are pressed in that column's top-to-bottom order.

use std::collections::BTreeSet;

use crate::bomb::{Bomb, ModuleId};
use crate::steps::{numbered, InstructionStep};

use super::{
    required_list, Answers, Category, Difficulty, ModuleInfo, Question, QuestionKind, Solution,
    SolveError, StructuredModule,
};

pub const MODULE: StructuredModule = StructuredModule {
    info: ModuleInfo {
        id: ModuleId::Keypads,
        name: "Keypads",
        description: "Input the correct sequence of symbols displayed on the keypad.",
        category: Category::Regular,
        difficulty: Difficulty::Medium,
    },
    steps,
    questions,
    solve,
    default_answers,
};

/// Number of keys on the module.
pub const KEY_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeypadSymbol {
    pub name: &'static str,
    pub glyph: &'static str,
}

const fn sym(name: &'static str, glyph: &'static str) -> KeypadSymbol {
    KeypadSymbol { name, glyph }
}

/// The reference grid, one array per column, top to bottom.
pub static COLUMNS: [[KeypadSymbol; 6]; 3] = [
    [
        sym("Omega", "Ω"),
        sym("Psi", "Ψ"),
        sym("Yu", "Ю"),
        sym("Sigma", "Σ"),
        sym("Phi", "Φ"),
        sym("Lambda", "Λ"),
    ],
    [
        sym("Xi", "Ξ"),
        sym("Chi", "Χ"),
        sym("Gamma", "Γ"),
        sym("Delta", "Δ"),
        sym("Theta", "Θ"),
        sym("Beta", "Β"),
    ],
    [
        sym("Alpha", "Α"),
        sym("Pi", "Π"),
        sym("Zeta", "Ζ"),
        sym("Eta", "Η"),
        sym("Tau", "Τ"),
        sym("Bullseye", "◎"),
    ],
];

/// Every symbol in the grid.
pub fn symbols() -> impl Iterator<Item = &'static KeypadSymbol> {
    COLUMNS.iter().flatten()
}

/// Look a symbol up by glyph or by name (any case).
pub fn find_symbol(raw: &str) -> Option<KeypadSymbol> {
    let raw = raw.trim();
    symbols()
        .find(|s| s.glyph == raw || s.name.eq_ignore_ascii_case(raw))
        .copied()
}

/// Parse and check the four entered symbols.
fn parse_symbols(answers: &Answers) -> Result<Vec<KeypadSymbol>, SolveError> {
    let raw = required_list(answers, "symbols")?;
    if raw.len() != KEY_COUNT {
        return Err(SolveError::WrongSymbolCount(raw.len()));
    }

    let mut seen = BTreeSet::new();
    raw.iter()
        .map(|entry| {
            let symbol =
                find_symbol(entry).ok_or_else(|| SolveError::UnknownSymbol(entry.clone()))?;
            if !seen.insert(symbol.glyph) {
                return Err(SolveError::DuplicateSymbol(symbol.glyph.to_string()));
            }
            Ok(symbol)
        })
        .collect()
}

/// The entered symbols in the order of the single column holding them all.
pub fn press_order(entered: &[KeypadSymbol]) -> Result<Vec<KeypadSymbol>, SolveError> {
    let matching: Vec<&[KeypadSymbol; 6]> = COLUMNS
        .iter()
        .filter(|column| entered.iter().all(|s| column.contains(s)))
        .collect();

    match matching.as_slice() {
        [] => Err(SolveError::NoMatchingColumn),
        [column] => Ok(column
            .iter()
            .filter(|s| entered.contains(s))
            .copied()
            .collect()),
        many => Err(SolveError::AmbiguousColumn(many.len())),
    }
}

fn solve(_bomb: &Bomb, answers: &Answers) -> Result<Solution, SolveError> {
    let entered = parse_symbols(answers)?;
    let order = press_order(&entered)?;
    let glyphs: Vec<&str> = order.iter().map(|s| s.glyph).collect();
    let names: Vec<&str> = order.iter().map(|s| s.name).collect();

    Ok(Solution {
        solution: glyphs.join(" → "),
        explanation: format!(
            "All four symbols are in one column; press them top to bottom: {}",
            names.join(", ")
        ),
    })
}

fn steps(_bomb: &Bomb) -> Vec<InstructionStep> {
    let grid = COLUMNS
        .iter()
        .zip(1..)
        .map(|(column, n)| {
            let entries: Vec<String> = column
                .iter()
                .map(|s| format!("{} ({})", s.glyph, s.name))
                .collect();
            format!("Column {n}: {}", entries.join(" | "))
        })
        .collect::<Vec<_>>()
        .join("\n");

    numbered(vec![
        InstructionStep::info(
            "Identify the Symbols",
            "Look at the 4 symbols displayed on the keypad buttons. Note each symbol's shape.",
        ),
        InstructionStep::info(
            "Find the Column",
            format!("Find the one column below that contains all 4 symbols:\n\n{grid}"),
        )
        .with_note("Only one column will contain all four symbols."),
        InstructionStep::info(
            "Determine the Order",
            "Press the keys in the order their symbols appear in that column, from top to bottom.",
        ),
        InstructionStep::final_warning(
            "Press in Correct Order",
            "Press the 4 keypad buttons in the determined order.",
            "Wrong order will cause a strike!",
        ),
    ])
}

fn questions(_bomb: &Bomb, _answers: &Answers) -> Vec<Question> {
    vec![Question {
        id: "symbols",
        kind: QuestionKind::Multiselect,
        label: "Keypad symbols",
        description: "Select the 4 symbols shown on the keypad",
        options: symbols().map(|s| s.glyph).collect(),
    }]
}

fn default_answers() -> Answers {
    super::answers([("symbols", vec!["Ω", "Ψ", "Ю", "Σ"])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bomb::tests::sample_bomb;
    use crate::modules::answers;

    fn press(symbols: Vec<&str>) -> Result<Solution, SolveError> {
        solve(&sample_bomb("AB12C3"), &answers([("symbols", symbols)]))
    }

    #[test]
    fn orders_by_column_position() {
        let s = press(vec!["Λ", "Ω", "Φ", "Ψ"]).unwrap();
        assert_eq!(s.solution, "Ω → Ψ → Φ → Λ");

        let s = press(vec!["Ω", "Ψ", "Ю", "Σ"]).unwrap();
        assert_eq!(s.solution, "Ω → Ψ → Ю → Σ");
    }

    #[test]
    fn names_are_accepted() {
        let s = press(vec!["bullseye", "Alpha", "TAU", "Ζ"]).unwrap();
        assert_eq!(s.solution, "Α → Ζ → Τ → ◎");
        assert!(s.explanation.ends_with("Alpha, Zeta, Tau, Bullseye"));
    }

    #[test]
    fn mixed_columns_have_no_match() {
        assert_eq!(
            press(vec!["Ω", "Ξ", "Α", "Σ"]),
            Err(SolveError::NoMatchingColumn)
        );
    }

    #[test]
    fn wrong_count() {
        assert_eq!(
            press(vec!["Ω", "Ψ", "Σ"]),
            Err(SolveError::WrongSymbolCount(3))
        );
        assert_eq!(
            press(vec!["Ω", "Ψ", "Σ", "Φ", "Λ"]),
            Err(SolveError::WrongSymbolCount(5))
        );
    }

    #[test]
    fn duplicates_and_unknowns() {
        assert_eq!(
            press(vec!["Ω", "omega", "Σ", "Φ"]),
            Err(SolveError::DuplicateSymbol("Ω".to_string()))
        );
        assert_eq!(
            press(vec!["Ω", "☃", "Σ", "Φ"]),
            Err(SolveError::UnknownSymbol("☃".to_string()))
        );
    }

    #[test]
    fn empty_answer_is_missing() {
        assert_eq!(
            solve(&sample_bomb("AB12C3"), &Answers::new()),
            Err(SolveError::MissingAnswer("symbols"))
        );
    }

    #[test]
    fn grid_has_unique_symbols() {
        let glyphs: BTreeSet<&str> = symbols().map(|s| s.glyph).collect();
        assert_eq!(glyphs.len(), 18);
        assert_eq!(questions(&sample_bomb("AB12C3"), &Answers::new())[0].options.len(), 18);
    }
}
