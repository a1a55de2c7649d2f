//! Morse Code.

use crate::bomb::{Bomb, ModuleId};
use crate::steps::{numbered, InstructionStep};

use super::{Category, Difficulty, ModuleInfo, NarrativeModule};

pub const MODULE: NarrativeModule = NarrativeModule {
    info: ModuleInfo {
        id: ModuleId::Morse,
        name: "Morse Code",
        description: "Decode morse code signals to find the correct transmission frequency.",
        category: Category::Regular,
        difficulty: Difficulty::Medium,
    },
    steps,
};

pub const LETTERS: [(char, &str); 26] = [
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
];

pub const DIGITS: [(char, &str); 10] = [
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
];

/// Frequency of `A` in kHz; each following letter adds [`FREQUENCY_STEP_KHZ`].
pub const BASE_FREQUENCY_KHZ: u32 = 3505;
pub const FREQUENCY_STEP_KHZ: u32 = 10;

/// Decode one dot/dash group.
pub fn decode_letter(code: &str) -> Option<char> {
    let code = code.trim();
    LETTERS
        .iter()
        .chain(DIGITS.iter())
        .find(|(_, c)| *c == code)
        .map(|&(ch, _)| ch)
}

/// Decode a space-separated sequence of groups.
pub fn decode_word(groups: &str) -> Option<String> {
    groups.split_whitespace().map(decode_letter).collect()
}

/// Frequency for a letter, in kHz.
pub fn frequency_for(letter: char) -> Option<u32> {
    let letter = letter.to_ascii_uppercase();
    letter
        .is_ascii_uppercase()
        .then(|| BASE_FREQUENCY_KHZ + FREQUENCY_STEP_KHZ * (letter as u32 - 'A' as u32))
}

/// `3.505 MHz` style rendering of a kHz value.
pub fn format_mhz(khz: u32) -> String {
    format!("{}.{:03} MHz", khz / 1000, khz % 1000)
}

/// Whether the frequency gets the serial-number adjustment.
pub fn needs_adjustment(bomb: &Bomb) -> bool {
    bomb.has_vowel_in_serial() || bomb.is_last_digit_odd()
}

fn chart() -> String {
    let column = |rows: &[(char, &str)]| -> Vec<String> {
        rows.iter().map(|(ch, code)| format!("{ch}: {code:<6}")).collect()
    };
    let left = column(&LETTERS[..13]);
    let middle = column(&LETTERS[13..]);
    let right = column(&DIGITS[..]);

    (0..13)
        .map(|i| {
            let digit = right.get(i).map(String::as_str).unwrap_or("");
            format!("  {}{}{}", left[i], middle[i], digit).trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn frequency_table() -> String {
    (0u8..13)
        .map(|i| {
            let a = char::from(b'A' + i);
            let b = char::from(b'N' + i);
            let khz = |c| frequency_for(c).map(format_mhz).unwrap_or_default();
            format!("  {a}: {}  {b}: {}", khz(a), khz(b))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn steps(bomb: &Bomb) -> Vec<InstructionStep> {
    let vowel = bomb.has_vowel_in_serial();
    let odd = bomb.is_last_digit_odd();
    let adjustment = u32::from(needs_adjustment(bomb));

    numbered(vec![
        InstructionStep::info(
            "Decode the Morse Code",
            format!(
                "A word will be transmitted in Morse code on the module. Decode it using the chart below.\n\n\
                 MORSE CODE REFERENCE:\n{}\n\n\
                 Listen for the pattern of dots (short) and dashes (long).",
                chart()
            ),
        ),
        InstructionStep::info(
            "Find the Frequency",
            format!(
                "Once you've decoded the word, find it in the list below to get the frequency:\n\n{}",
                frequency_table()
            ),
        ),
        InstructionStep::info(
            "Adjust for Bomb Characteristics",
            format!(
                "If ANY of these conditions are true, ADD 1 to the frequency:\n\
                 \x20 • Serial number contains a vowel\n\
                 \x20 • Last digit of serial is odd\n\n\
                 FREQUENCY ADJUSTMENT:\n\
                 \x20 {}\n\
                 \x20 {}\n\n\
                 Base frequency + {adjustment}",
                if vowel { "✓ Serial has vowel" } else { "✗ Serial has no vowel" },
                if odd { "✓ Last digit is odd" } else { "✗ Last digit is even" },
            ),
        )
        .with_condition(format!(
            "Adjustment: +{adjustment} (e.g. A = {})",
            format_mhz(BASE_FREQUENCY_KHZ + adjustment * 1000)
        ))
        .with_note("Enter the frequency exactly as listed."),
        InstructionStep::info(
            "Enter the Frequency",
            "Enter the final frequency using the keypad:\n\
             1. Press the frequency number (e.g., \"3.505\" for base 3.505 MHz)\n\
             2. Press the \"TX\" (transmit) button to submit\n\n\
             If the frequency is incorrect, a strike will be given.",
        ),
        InstructionStep::final_warning(
            "Transmit the Correct Frequency",
            "Enter the decoded frequency and press TX.",
            "Wrong frequency will cause a strike!",
        ),
    ])
}
