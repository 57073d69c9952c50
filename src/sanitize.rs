//! Sanitization: deterministic cleanup of extracted markdown/text.
//!
//! ## Why is sanitization necessary?
//!
//! Extraction libraries faithfully reproduce everything a document contains,
//! including artefacts no language model needs to pay tokens for:
//!
//! - PDF extractors leak `/uni0041`-style escape sequences, stray control
//!   characters, and invisible Unicode (zero-width spaces, soft hyphens)
//! - Spreadsheet extraction pads every row to the widest column, producing
//!   walls of empty cells and literal `\n` escapes
//! - Typographic characters (smart quotes, em dashes, ellipses) tokenize
//!   worse than their ASCII equivalents
//! - Word processors emit runs of blank lines and dot-leader rules
//!
//! This module applies cheap, deterministic regex/string rules that strip
//! those artefacts without touching content. Each rule is a pure function
//! (`&str -> String`) with no shared state, independently testable.
//!
//! ## Rule Order
//!
//! Rules must run in this specific order: artefact stripping and line-ending
//! normalisation first so later rules see clean input; typographic
//! normalisation before run-collapsing so `……` collapses like `......`;
//! whitespace compression before table optimisation so separator detection
//! works on trimmed rows; empty-section removal last among the structural
//! passes because earlier rules are what empty sections out.
//!
//! ## Contract
//!
//! [`sanitize`] never panics for any input, is deterministic, and is
//! idempotent: `sanitize(sanitize(x)) == sanitize(x)`. Empty or
//! whitespace-only input yields the empty string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Statistics for a piece of sanitized text.
///
/// `estimated_tokens` uses the chars/4 heuristic, rounded to nearest. The
/// formula is part of the output contract (the JSON artifact and summary
/// report expose it), so it must not be swapped for a real tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextStats {
    /// Unicode scalar count (not bytes).
    pub char_count: usize,
    /// Whitespace-delimited token count.
    pub word_count: usize,
    /// `round(char_count / 4)`.
    pub estimated_tokens: usize,
}

impl TextStats {
    /// Measure a string.
    pub fn measure(text: &str) -> Self {
        let char_count = text.chars().count();
        Self {
            char_count,
            word_count: text.split_whitespace().count(),
            estimated_tokens: estimate_tokens(char_count),
        }
    }
}

/// The chars/4 token estimate, rounded to nearest.
pub fn estimate_tokens(char_count: usize) -> usize {
    (char_count as f64 / 4.0).round() as usize
}

/// Apply all sanitization rules to raw extracted text.
///
/// Passes (applied in order):
/// 1. Strip extraction artefacts: `/uniXXXX` escapes, control characters,
///    invisible Unicode; normalise line endings
/// 2. Normalise typographic characters to ASCII-safe equivalents
/// 3. Clean spreadsheet/extraction artefacts: literal `\n` escapes, pandas
///    column placeholders, pipe runs, trailing empty cells, rule runs
/// 4. Compress whitespace: trim line ends, collapse horizontal runs outside
///    fenced code blocks, collapse 3+ blank lines to one
/// 5. Optimise tables: minimal separator rows, drop fully empty rows
/// 6. Remove sections left empty by the passes above
/// 7. Normalise numbers: redundant decimal zeros, spaced thousands groups,
///    midnight-timestamp padding
pub fn sanitize(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }
    let s = strip_extraction_artifacts(input);
    let s = normalize_special_chars(&s);
    let s = clean_cell_artifacts(&s);
    let s = compress_whitespace(&s);
    let s = optimize_tables(&s);
    let s = remove_empty_sections(&s);
    let s = normalize_numbers(&s);
    s.trim().to_string()
}

/// Sanitize and measure in one call.
pub fn sanitize_and_measure(input: &str) -> (String, TextStats) {
    let cleaned = sanitize(input);
    let stats = TextStats::measure(&cleaned);
    (cleaned, stats)
}

// ── Pass 1: Strip extraction artefacts ───────────────────────────────────────

static RE_UNI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/uni[0-9A-Fa-f]{4,5}").unwrap());

fn strip_extraction_artifacts(input: &str) -> String {
    let s = input.replace("\r\n", "\n").replace('\r', "\n");
    let s = RE_UNI_ESCAPE.replace_all(&s, "").into_owned();
    s.chars()
        .filter(|&c| {
            // LF and TAB survive; every other control character is an
            // extraction artefact.
            if c.is_control() {
                return c == '\n' || c == '\t';
            }
            !matches!(
                c,
                '\u{200B}' | '\u{FEFF}' | '\u{00AD}' | '\u{200C}' | '\u{200D}' | '\u{2060}'
            )
        })
        .collect()
}

// ── Pass 2: Normalise typographic characters ─────────────────────────────────

/// ASCII-safe replacement for a typographic character, if one exists.
///
/// Characters without a lossless or near-lossless mapping pass through
/// unchanged.
fn ascii_replacement(c: char) -> Option<&'static str> {
    Some(match c {
        '\u{201C}' | '\u{201D}' | '\u{201E}' => "\"",
        '\u{2018}' | '\u{2019}' | '\u{201A}' => "'",
        '\u{2014}' | '\u{2013}' | '\u{2012}' | '\u{2212}' => "-",
        '\u{2026}' => "...",
        '\u{00A0}' | '\u{2009}' | '\u{202F}' => " ",
        '€' => "EUR",
        '§' => "section",
        '®' => "(R)",
        '©' => "(C)",
        '™' => "(TM)",
        '°' => "deg",
        '±' => "+/-",
        '×' => "x",
        '÷' => "/",
        '≤' => "<=",
        '≥' => ">=",
        '≠' => "!=",
        '≈' => "~=",
        _ => return None,
    })
}

fn normalize_special_chars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match ascii_replacement(c) {
            Some(rep) => out.push_str(rep),
            None => out.push(c),
        }
    }
    out
}

// ── Pass 3: Clean spreadsheet/extraction artefacts ───────────────────────────

static RE_ESCAPED_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\+n").unwrap());
static RE_UNNAMED_COL: Lazy<Regex> = Lazy::new(|| Regex::new(r"Unnamed: \d+").unwrap());
static RE_NAN_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bNaN\b").unwrap());
static RE_PIPE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|{2,}").unwrap());
static RE_TRAILING_CELLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(\| *){2,}\|[ \t]*$").unwrap());
static RE_RULE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-=_]{10,}").unwrap());
static RE_DOT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{4,}").unwrap());
static RE_PUNCT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;]{2,}").unwrap());

fn clean_cell_artifacts(input: &str) -> String {
    let s = RE_ESCAPED_NEWLINE.replace_all(input, "\n");
    let s = RE_UNNAMED_COL.replace_all(&s, "Col");
    let s = RE_NAN_CELL.replace_all(&s, "-");
    let s = RE_PIPE_RUN.replace_all(&s, "|");
    // Trailing empty-cell padding: `| a | b | | | |` -> `| a | b |`
    let s = RE_TRAILING_CELLS.replace_all(&s, "|");
    let s = RE_RULE_RUN.replace_all(&s, "---");
    let s = RE_DOT_RUN.replace_all(&s, "...");
    RE_PUNCT_RUN.replace_all(&s, ",").into_owned()
}

// ── Pass 4: Compress whitespace ──────────────────────────────────────────────

static RE_HSPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn compress_whitespace(input: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;
    for line in input.lines() {
        let line = line.trim_end();
        if is_fence_line(line) {
            in_fence = !in_fence;
            lines.push(line.to_string());
            continue;
        }
        if in_fence {
            // Code keeps its indentation and internal alignment.
            lines.push(line.to_string());
        } else {
            lines.push(RE_HSPACE_RUN.replace_all(line, " ").into_owned());
        }
    }
    let joined = lines.join("\n");
    RE_BLANK_LINES.replace_all(&joined, "\n\n").into_owned()
}

// ── Pass 5: Optimise tables ──────────────────────────────────────────────────

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') || !trimmed.contains('-') {
        return false;
    }
    trimmed
        .chars()
        .all(|c| c == '|' || c == '-' || c == ':' || c == ' ')
}

/// A table line whose every cell is blank, including degenerate `|` stubs
/// left behind by trailing-cell removal.
fn is_empty_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.chars().all(|c| c == '|' || c == ' ')
}

/// Rewrite a separator row to its minimal valid form, preserving alignment
/// colons: `|:-------|-----:|` -> `| :--- | ---: |`.
fn minimal_separator(line: &str) -> String {
    let inner = line
        .trim()
        .trim_start_matches('|')
        .trim_end_matches('|');
    let cells: Vec<&str> = inner
        .split('|')
        .map(|cell| {
            let cell = cell.trim();
            let left = cell.starts_with(':');
            let right = cell.len() > 1 && cell.ends_with(':');
            match (left, right) {
                (true, true) => ":---:",
                (true, false) => ":---",
                (false, true) => "---:",
                (false, false) => "---",
            }
        })
        .collect();
    format!("| {} |", cells.join(" | "))
}

fn optimize_tables(input: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;
    for line in input.lines() {
        if is_fence_line(line) {
            in_fence = !in_fence;
            out.push(line.to_string());
            continue;
        }
        if !in_fence && line.trim().starts_with('|') {
            if is_empty_row(line) {
                continue;
            }
            if is_separator_row(line) {
                out.push(minimal_separator(line));
                continue;
            }
        }
        out.push(line.to_string());
    }
    out.join("\n")
}

// ── Pass 6: Remove empty sections ────────────────────────────────────────────

/// ATX heading level (1-6), or None if the line is not a heading.
fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match trimmed.as_bytes().get(hashes) {
        None | Some(b' ') => Some(hashes),
        _ => None,
    }
}

/// Drop headings with no content before the next equal-or-higher heading (or
/// end of document). Runs to a fixpoint because removing an inner heading can
/// empty out its parent section.
fn remove_empty_sections(input: &str) -> String {
    let mut lines: Vec<String> = input.lines().map(str::to_string).collect();
    let mut in_fence;
    loop {
        let mut drop = vec![false; lines.len()];
        let mut removed = false;
        in_fence = false;
        for i in 0..lines.len() {
            if is_fence_line(&lines[i]) {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            let Some(level) = heading_level(&lines[i]) else {
                continue;
            };
            let mut j = i + 1;
            while j < lines.len() && lines[j].trim().is_empty() {
                j += 1;
            }
            let section_empty = match lines.get(j) {
                None => true,
                Some(next) => heading_level(next).is_some_and(|next_level| next_level <= level),
            };
            if section_empty {
                removed = true;
                drop[i] = true;
                // Absorb the blank run that followed the heading.
                for blank in drop.iter_mut().take(j).skip(i + 1) {
                    *blank = true;
                }
            }
        }
        if !removed {
            break;
        }
        lines = lines
            .into_iter()
            .zip(drop)
            .filter(|(_, d)| !d)
            .map(|(l, _)| l)
            .collect();
    }
    lines.join("\n")
}

// ── Pass 7: Normalise numbers ────────────────────────────────────────────────

static RE_TRAILING_ZEROS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.0+\b([^.\d]|$)").unwrap());
static RE_MIDNIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})[ T]00:00:00\b").unwrap());
static RE_SPACED_THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3})((?: \d{3})+)\b").unwrap());

fn normalize_numbers(input: &str) -> String {
    // Dotted sequences like `1.00.0` re-expose a match once the inner group
    // is stripped, so this rule runs to a fixpoint. Each round shrinks the
    // string, so termination is guaranteed.
    let mut s = input.to_string();
    loop {
        let next = RE_TRAILING_ZEROS.replace_all(&s, "$1$2").into_owned();
        if next == s {
            break;
        }
        s = next;
    }
    // Spreadsheet datetimes carry a midnight time for plain dates.
    let s = RE_MIDNIGHT.replace_all(&s, "$1");
    RE_SPACED_THOUSANDS
        .replace_all(&s, |caps: &regex::Captures<'_>| {
            format!("{}{}", &caps[1], caps[2].replace(' ', ""))
        })
        .into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   \n\n\t "), "");
        let (text, stats) = sanitize_and_measure("");
        assert_eq!(text, "");
        assert_eq!(stats, TextStats::default());
    }

    #[test]
    fn whitespace_scenario_from_contract() {
        assert_eq!(sanitize("Hello   world\n\n\n\n\nBye"), "Hello world\n\nBye");
    }

    #[test]
    fn token_estimate_is_round_chars_over_four() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(3), 1);
        assert_eq!(estimate_tokens(4), 1);
        assert_eq!(estimate_tokens(7), 2);
        assert_eq!(estimate_tokens(100), 25);
        let stats = TextStats::measure("Hello world\n\nBye");
        assert_eq!(stats.char_count, 16);
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.estimated_tokens, 4);
    }

    #[test]
    fn strips_unicode_escapes_and_control_chars() {
        let input = "before/uni0041after\u{0000}\u{0007}end";
        assert_eq!(strip_extraction_artifacts(input), "beforeafterend");
    }

    #[test]
    fn strips_invisible_unicode() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(strip_extraction_artifacts(input), "helloworldfoobar");
    }

    #[test]
    fn preserves_tabs_and_newlines() {
        assert_eq!(strip_extraction_artifacts("a\tb\nc"), "a\tb\nc");
    }

    #[test]
    fn normalizes_line_endings() {
        assert_eq!(strip_extraction_artifacts("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn typographic_chars_become_ascii() {
        assert_eq!(
            normalize_special_chars("\u{201C}quoted\u{201D} \u{2014} it\u{2019}s \u{2026}"),
            "\"quoted\" - it's ...",
        );
        assert_eq!(normalize_special_chars("5 ≤ 10 ≥ 2 ≠ 3"), "5 <= 10 >= 2 != 3");
    }

    #[test]
    fn unmapped_chars_pass_through() {
        assert_eq!(normalize_special_chars("日本語 αβγ"), "日本語 αβγ");
    }

    #[test]
    fn cleans_spreadsheet_artifacts() {
        assert_eq!(clean_cell_artifacts("a\\nb"), "a\nb");
        assert_eq!(clean_cell_artifacts("Unnamed: 3 | NaN |"), "Col | - |");
        assert_eq!(clean_cell_artifacts("| a ||| b |"), "| a | b |");
    }

    #[test]
    fn removes_trailing_empty_cells() {
        assert_eq!(clean_cell_artifacts("| a | b | | | |"), "| a | b |");
        // A row with no padding is untouched.
        assert_eq!(clean_cell_artifacts("| a | b |"), "| a | b |");
    }

    #[test]
    fn collapses_rule_runs() {
        assert_eq!(clean_cell_artifacts("==========="), "---");
        assert_eq!(clean_cell_artifacts("a.......b"), "a...b");
        assert_eq!(clean_cell_artifacts("x,,,,y"), "x,y");
    }

    #[test]
    fn horizontal_whitespace_collapses_outside_fences_only() {
        let input = "a   b\n```\ncode    indent\n```\nc\t\td";
        assert_eq!(compress_whitespace(input), "a b\n```\ncode    indent\n```\nc d");
    }

    #[test]
    fn trailing_whitespace_trimmed_per_line() {
        assert_eq!(compress_whitespace("hello   \nworld\t"), "hello\nworld");
    }

    #[test]
    fn separator_rows_minimized() {
        assert_eq!(minimal_separator("|-----|------|"), "| --- | --- |");
        assert_eq!(minimal_separator("|:----|----:|"), "| :--- | ---: |");
        assert_eq!(minimal_separator("| :---: |"), "| :---: |");
    }

    #[test]
    fn fully_empty_rows_dropped() {
        let input = "| a | b |\n| --- | --- |\n|  |  |\n| 1 | 2 |";
        assert_eq!(
            optimize_tables(input),
            "| a | b |\n| --- | --- |\n| 1 | 2 |"
        );
    }

    #[test]
    fn empty_section_removed_before_sibling_heading() {
        let input = "# Intro\n\ncontent\n\n## Empty\n\n## Full\n\nmore";
        let out = remove_empty_sections(input);
        assert!(!out.contains("## Empty"));
        assert!(out.contains("## Full"));
        assert!(out.contains("content"));
    }

    #[test]
    fn empty_section_removed_at_end_of_document() {
        let out = remove_empty_sections("# A\n\ntext\n\n## Trailing\n");
        assert!(!out.contains("## Trailing"));
        assert!(out.contains("text"));
    }

    #[test]
    fn cascading_empty_sections_removed() {
        // Removing the empty subsection leaves its parent empty too.
        let out = remove_empty_sections("# Parent\n\n## Child\n\n# Next\n\ntext");
        assert!(!out.contains("Parent"));
        assert!(!out.contains("Child"));
        assert!(out.contains("# Next"));
    }

    #[test]
    fn heading_with_content_survives() {
        let input = "## Kept\n\nbody text";
        assert_eq!(remove_empty_sections(input), input);
    }

    #[test]
    fn hash_lines_in_fences_are_not_headings() {
        let input = "```sh\n# not a heading\n```\ntext";
        assert_eq!(remove_empty_sections(input), input);
    }

    #[test]
    fn redundant_decimal_zeros_stripped() {
        assert_eq!(normalize_numbers("12.0 items, 99.00% done"), "12 items, 99% done");
        // Real decimals untouched.
        assert_eq!(normalize_numbers("3.14 and 2.05"), "3.14 and 2.05");
    }

    #[test]
    fn spaced_thousands_groups_joined() {
        assert_eq!(normalize_numbers("1 000 000 EUR"), "1000000 EUR");
        // Adjacent independent numbers are not joined.
        assert_eq!(normalize_numbers("in 2024 2025 was"), "in 2024 2025 was");
    }

    #[test]
    fn midnight_timestamps_truncated_to_date() {
        assert_eq!(normalize_numbers("2024-01-15 00:00:00"), "2024-01-15");
        assert_eq!(normalize_numbers("2024-01-15 09:30:00"), "2024-01-15 09:30:00");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "Hello   world\n\n\n\n\nBye",
            "# A\n\n## B\n\n# C\n\ncontent 1 000 000",
            "| a | b | | |\n|----|----|\n| 1.0 | NaN |",
            "smart \u{201C}quotes\u{201D}\u{2026} and\u{200B} zero-width",
            "```\nkeep   this\n```\n\n\n\nafter",
            "text ===========\n\nmore.......",
        ];
        for input in inputs {
            let once = sanitize(input);
            let twice = sanitize(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn sanitize_never_explodes_in_size() {
        let inputs = ["…©®™§€", "normal text", "±×÷≤≥≠≈°"];
        for input in inputs {
            let out = sanitize(input);
            assert!(
                out.chars().count() <= input.chars().count() * 8,
                "pathological expansion for {input:?}"
            );
        }
    }

    #[test]
    fn sanitize_full_pipeline() {
        let input = "# Report\u{200B}\r\n\r\nTotal:   1 250 000\u{00A0}EUR\n\n\n\n\n| Item | Cost | | |\n|------|------|\n| Widget | 10.00 |\n\n## Notes\n\n# Appendix\n\ndone";
        let out = sanitize(input);
        assert!(out.starts_with("# Report"));
        assert!(out.contains("Total: 1250000 EUR"));
        assert!(out.contains("| Item | Cost |"));
        assert!(out.contains("| --- | --- |"));
        assert!(out.contains("| Widget | 10 |"));
        assert!(!out.contains("## Notes"), "empty section must be dropped");
        assert!(out.contains("# Appendix"));
        assert!(!out.contains("\n\n\n"));
    }
}
