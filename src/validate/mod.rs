//! Structural checks and confidence scoring for raw completions

use crate::api::TaskKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Shortest accepted response, counted in characters after trimming
pub const DEFAULT_MIN_CHARS: usize = 10;

/// Shapes that count as "contains code": a fence or a definition header.
/// Bare words like "function" or "class" in prose do not match.
const CODE_PATTERNS: &[&str] = &[
    r"```",
    r"\bdef\s+\w+\s*\(",
    r"\bclass\s+\w+(\s*[:({<]|\s+(extends|implements)\b)",
    r"\bfn\s+\w+\s*[<(]",
    r"\bfunction\*?\s+\w+\s*\(",
    r"\bfunction\s*\([^)]*\)\s*\{",
    r"\bfunc\s+(\([^)]*\)\s*)?\w+\s*\(",
];

static CODE_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    CODE_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

fn contains_code(text: &str) -> bool {
    CODE_MARKERS.iter().any(|re| re.is_match(text))
}

const MOBILE_KEYWORDS: &[&str] = &["swift", "kotlin", "ios", "android", "app", "mobile"];

/// Outcome of assessing one completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Accept { confidence: f64 },
    Reject { reason: String },
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Validator {
    min_chars: usize,
}

impl Validator {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    pub fn assess(&self, text: &str, task: TaskKind) -> Verdict {
        let trimmed = text.trim();
        let length = trimmed.chars().count();

        if length == 0 {
            return Verdict::Reject {
                reason: "empty response".to_string(),
            };
        }
        if length < self.min_chars {
            return Verdict::Reject {
                reason: format!("response too short ({} < {} chars)", length, self.min_chars),
            };
        }

        match task {
            TaskKind::CodeGeneration if !contains_code(trimmed) => {
                return Verdict::Reject {
                    reason: "no code block or definition found".to_string(),
                };
            }
            TaskKind::MobileDevelopment => {
                let lower = trimmed.to_lowercase();
                if !MOBILE_KEYWORDS.iter().any(|k| lower.contains(k)) {
                    return Verdict::Reject {
                        reason: "no mobile platform keyword found".to_string(),
                    };
                }
            }
            _ => {}
        }

        Verdict::Accept {
            confidence: confidence(trimmed, task),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CHARS)
    }
}

/// Base 0.5 plus bonuses for length, structure and task keywords
fn confidence(text: &str, task: TaskKind) -> f64 {
    let mut score: f64 = 0.5;
    let length = text.chars().count();

    if length > 500 {
        score += 0.1;
    }
    if length > 1000 {
        score += 0.1;
    }
    if text.contains("```") {
        score += 0.1;
    }
    if text.contains("1.") || text.contains('•') {
        score += 0.1;
    }
    if task == TaskKind::CodeGeneration && text.contains("def ") {
        score += 0.2;
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(verdict: Verdict) -> f64 {
        match verdict {
            Verdict::Accept { confidence } => confidence,
            Verdict::Reject { reason } => panic!("expected accept, got reject: {}", reason),
        }
    }

    #[test]
    fn test_empty_is_rejected() {
        let v = Validator::default();
        assert!(!v.assess("", TaskKind::Conversation).is_accept());
        assert!(!v.assess("   \n\t ", TaskKind::Conversation).is_accept());
    }

    #[test]
    fn test_exact_minimum_length_is_accepted() {
        let v = Validator::default();
        assert_eq!(accepted(v.assess("0123456789", TaskKind::Conversation)), 0.5);
        assert!(!v.assess("012345678", TaskKind::Conversation).is_accept());
        // Surrounding whitespace does not count
        assert!(!v.assess("  012345678  ", TaskKind::Conversation).is_accept());
    }

    #[test]
    fn test_code_generation_requires_code() {
        let v = Validator::default();
        assert!(v.assess("```py\nx=1\n```", TaskKind::CodeGeneration).is_accept());
        assert!(v.assess("def f(): return 1", TaskKind::CodeGeneration).is_accept());
        assert!(!v
            .assess("Here is some prose without code.", TaskKind::CodeGeneration)
            .is_accept());
    }

    #[test]
    fn test_code_words_in_prose_are_not_code() {
        let v = Validator::default();
        for prose in [
            "This function returns the total of all orders.",
            "The class of problems you describe is common.",
            "Define the fn keyword usage in your own words.",
        ] {
            assert!(!v.assess(prose, TaskKind::CodeGeneration).is_accept(), "{}", prose);
        }
    }

    #[test]
    fn test_definition_headers_count_as_code() {
        let v = Validator::default();
        for code in [
            "class Point:\n    pass",
            "public class Main {\n}",
            "class Cart extends Base {}",
            "fn total(items: &[u32]) -> u32 { 0 }",
            "function add(a, b) { return a + b; }",
            "const f = function (x) { return x; }",
            "func (s *Server) Start() error { return nil }",
        ] {
            assert!(v.assess(code, TaskKind::CodeGeneration).is_accept(), "{}", code);
        }
        assert_eq!(CODE_MARKERS.len(), CODE_PATTERNS.len());
    }

    #[test]
    fn test_mobile_requires_keyword() {
        let v = Validator::default();
        assert!(v
            .assess("Use SwiftUI for the screen layout.", TaskKind::MobileDevelopment)
            .is_accept());
        assert!(!v
            .assess("A generic answer about databases.", TaskKind::MobileDevelopment)
            .is_accept());
    }

    #[test]
    fn test_confidence_bonuses() {
        let v = Validator::default();

        let fenced = "```py\nx=1\n```";
        assert!((accepted(v.assess(fenced, TaskKind::Conversation)) - 0.6).abs() < 1e-9);

        let code = "def f():\n    return 1";
        assert!((accepted(v.assess(code, TaskKind::CodeGeneration)) - 0.7).abs() < 1e-9);

        let long = format!("1. {}\n```\n```\ndef x", "a".repeat(1200));
        assert_eq!(accepted(v.assess(&long, TaskKind::CodeGeneration)), 1.0);
    }

    #[test]
    fn test_custom_minimum() {
        let v = Validator::new(3);
        assert!(v.assess("yes", TaskKind::Conversation).is_accept());
        assert!(!v.assess("no", TaskKind::Conversation).is_accept());
    }
}
