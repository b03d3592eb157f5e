//! Response Sanitizer - cleanup and validation between raw generated text
//! and a displayable message. Pure functions, no retained state.

use std::sync::LazyLock;

use regex::Regex;

/// Cleaned output shorter than this is treated as a generation failure.
pub const MIN_RESPONSE_CHARS: usize = 5;

/// Minimum content to keep when truncating at a whitespace boundary.
const MIN_CLEAN_CUT: usize = 80;

/// Suffixes that make a period part of a technical term rather than a
/// sentence end ("Node.js" must not be treated as end-of-sentence).
const TECH_SUFFIXES: &[&str] = &["js", "ts", "css", "io", "rs", "py", "net", "dev", "com"];

// Pre-compiled regexes, compiled once and reused on every call.
static LABEL_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(answer|response|a|q)\s*:\s*").expect("label prefix regex is valid")
});
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("link regex is valid"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]*)\*\*").expect("bold regex is valid"));
static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]*)\*").expect("emphasis regex is valid"));
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]*)`").expect("code regex is valid"));
static PERIODS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{3,}").expect("periods regex is valid"));

/// Clean raw backend output and validate it. Returns `None` when the text
/// fails the quality heuristics, which the caller treats as a generation
/// failure.
pub fn sanitize(raw: &str, prompt: &str, max_chars: usize) -> Option<String> {
    // Some backends return prompt + completion concatenated
    let text = raw.strip_prefix(prompt).unwrap_or(raw).trim();

    // First line only; defends against the model continuing the dialogue
    let line = text.lines().next().unwrap_or("").trim();

    let mut cleaned = line.to_string();
    loop {
        let stripped = LABEL_PREFIX_RE.replace(&cleaned, "").into_owned();
        if stripped == cleaned {
            break;
        }
        cleaned = stripped;
    }

    cleaned = strip_markup(&cleaned);
    cleaned = PERIODS_RE.replace_all(&cleaned, ".").into_owned();
    let cleaned = cleaned.trim();

    let truncated = truncate_at_boundary(cleaned, max_chars);

    if is_rejected(&truncated) {
        tracing::debug!(len = truncated.chars().count(), "Sanitizer rejected output");
        return None;
    }
    Some(truncated)
}

fn strip_markup(text: &str) -> String {
    let text = LINK_RE.replace_all(text, "$1");
    let text = BOLD_RE.replace_all(&text, "$1");
    let text = EMPHASIS_RE.replace_all(&text, "$1");
    CODE_RE.replace_all(&text, "$1").into_owned()
}

/// Rejection predicate: empty, too short, or instruction-leakage artifacts.
fn is_rejected(text: &str) -> bool {
    if text.chars().count() < MIN_RESPONSE_CHARS {
        return true;
    }
    let lower = text.to_lowercase();
    if lower.contains("please answer") {
        return true;
    }
    // An isolated short fragment mentioning the question is the model
    // echoing instructions, not an answer
    lower.contains("question") && text.chars().count() < 40
}

/// Enforce the character budget, preferring a clean sentence boundary, then
/// a whitespace boundary with an ellipsis marker, then a hard cut.
fn truncate_at_boundary(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    // Last sentence terminator within budget that really ends a sentence
    let mut sentence_end = None;
    for i in (0..max_chars).rev() {
        if is_sentence_end(&chars, i) {
            sentence_end = Some(i);
            break;
        }
    }
    if let Some(i) = sentence_end {
        if i + 1 >= MIN_CLEAN_CUT / 2 {
            return chars[..=i].iter().collect();
        }
    }

    // Last whitespace boundary past the minimum content length
    let mut space_cut = None;
    for i in (MIN_CLEAN_CUT..max_chars).rev() {
        if chars[i].is_whitespace() {
            space_cut = Some(i);
            break;
        }
    }
    if let Some(i) = space_cut {
        let mut out: String = chars[..i].iter().collect();
        let kept = out.trim_end().len();
        out.truncate(kept);
        out.push('…');
        return out;
    }

    chars[..max_chars].iter().collect()
}

/// A terminator char ends a sentence only when followed by whitespace (or
/// nothing) in the full text, and a period never does when it introduces a
/// known technical suffix ("Node.js" stays whole).
fn is_sentence_end(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if !matches!(c, '.' | '!' | '?') {
        return false;
    }
    if c == '.' {
        let tail: String = chars[i + 1..].iter().take(4).collect::<String>().to_lowercase();
        for suffix in TECH_SUFFIXES {
            if tail.starts_with(suffix) {
                let boundary = tail[suffix.len()..].chars().next();
                if boundary.map_or(true, |c| !c.is_alphanumeric()) {
                    return false;
                }
            }
        }
    }
    match chars.get(i + 1) {
        None => true,
        Some(next) => next.is_whitespace(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 200;

    #[test]
    fn passes_clean_text_through() {
        let out = sanitize("Alex builds web applications with React and Rust.", "", MAX);
        assert_eq!(out.unwrap(), "Alex builds web applications with React and Rust.");
    }

    #[test]
    fn strips_echoed_prompt() {
        let prompt = "Context here\n\nAnswer:";
        let raw = format!("{} Alex is a full stack developer.", prompt);
        let out = sanitize(&raw, prompt, MAX).unwrap();
        assert_eq!(out, "Alex is a full stack developer.");
    }

    #[test]
    fn takes_first_line_only() {
        let raw = "Alex works with React.\nUser: what else?\nAssistant: ...";
        let out = sanitize(raw, "", MAX).unwrap();
        assert_eq!(out, "Alex works with React.");
    }

    #[test]
    fn strips_label_prefixes() {
        assert_eq!(
            sanitize("Answer: Alex enjoys building dashboards.", "", MAX).unwrap(),
            "Alex enjoys building dashboards."
        );
        assert_eq!(
            sanitize("A: Response: Alex enjoys building dashboards.", "", MAX).unwrap(),
            "Alex enjoys building dashboards."
        );
    }

    #[test]
    fn strips_markup() {
        let out = sanitize("Alex uses **React** and `Rust`, see [the site](https://x.dev).", "", MAX);
        assert_eq!(out.unwrap(), "Alex uses React and Rust, see the site.");
    }

    #[test]
    fn collapses_repeated_periods() {
        let out = sanitize("Alex builds things.... lots of things.", "", MAX).unwrap();
        assert!(!out.contains("...."));
        assert!(out.contains("things."));
    }

    #[test]
    fn rejects_empty_and_short() {
        assert!(sanitize("", "", MAX).is_none());
        assert!(sanitize("   \n", "", MAX).is_none());
        assert!(sanitize("ok.", "", MAX).is_none());
    }

    #[test]
    fn rejects_instruction_leakage() {
        assert!(sanitize("please answer the question below", "", MAX).is_none());
        assert!(sanitize("That is a question", "", MAX).is_none());
    }

    #[test]
    fn long_text_mentioning_questions_is_kept() {
        let raw = "Alex is happy to field any question about past projects, roles, and the technologies behind them.";
        assert!(sanitize(raw, "", MAX).is_some());
    }

    #[test]
    fn idempotent_for_in_bounds_text() {
        let inputs = [
            "Alex builds web applications with React and Rust.",
            "Alex uses React and Rust, see the site.",
            "Short but valid answer here.",
        ];
        for input in inputs {
            let once = sanitize(input, "", MAX).unwrap();
            let twice = sanitize(&once, "", MAX).unwrap();
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn truncates_to_budget_at_sentence_boundary() {
        let raw = "Alex spent several years building interactive dashboards for industrial sensor fleets. \
                   The work covered everything from streaming ingestion to chart rendering in the browser, \
                   and it shaped how Alex approaches frontend performance today.";
        let out = sanitize(raw, "", MAX).unwrap();
        assert!(out.chars().count() <= MAX);
        assert!(out.ends_with('.'));
    }

    #[test]
    fn never_cuts_inside_a_technical_term() {
        let raw = "Alex has deep experience with Node.js and has shipped many production services with Node.js, \
                   plus tooling, deployment pipelines, integration testing, and long-term maintenance for each of them across teams.";
        let out = sanitize(raw, "", MAX).unwrap();
        assert!(out.chars().count() <= MAX);
        assert!(!out.ends_with(".j"));
        // A period directly before "js" is never chosen as the cut point
        if out.ends_with('.') {
            assert!(!raw[out.len()..].trim_start().to_lowercase().starts_with("js"));
        }
    }

    #[test]
    fn whitespace_cut_appends_ellipsis() {
        // No sentence terminator anywhere: forces the whitespace-boundary path
        let raw = "word ".repeat(80);
        let out = sanitize(&raw, "", MAX).unwrap();
        assert!(out.chars().count() <= MAX);
        assert!(out.ends_with('…'));
    }
}
