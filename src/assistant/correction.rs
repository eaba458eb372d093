//! Detects "change the task title to X" style corrections.
//!
//! Each rule is a regex whose first capture group is the new title. Rules run
//! in order against each sentence of the utterance, last sentence first, so
//! "don't call it X. Call it Y" yields "Y".

use regex::Regex;

pub struct CorrectionRule {
    pub name: &'static str,
    pattern: Regex,
}

impl CorrectionRule {
    fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }
}

pub struct CorrectionRules {
    rules: Vec<CorrectionRule>,
}

const MIN_TITLE_CHARS: usize = 3;
const MAX_TITLE_CHARS: usize = 100;

impl Default for CorrectionRules {
    fn default() -> Self {
        Self::standard()
    }
}

impl CorrectionRules {
    pub fn standard() -> Self {
        let table: [(&'static str, &str); 7] = [
            (
                "change-title-to",
                r"(?i)^.*\b(?:change|rename|set|make)\s+(?:the\s+)?(?:task\s+)?(?:title|name)\s+(?:to|as|into)\s+(.+)$",
            ),
            ("rename-task", r"(?i)^.*\b(?:rename|retitle)\s+(?:the\s+task|it)\s+(?:to\s+)?(.+)$"),
            ("title-should-be", r"(?i)^.*\b(?:title|name)\s+should\s+be\s+(.+)$"),
            // A bare "no, it's X" answers the current slot; only a named title counts.
            (
                "no-title-is",
                r"(?i)^(?:no|not|wrong)\b[\s,]*(?:the\s+)?(?:task\s+)?(?:title|name)\s+(?:is|it'?s)\s+(.+)$",
            ),
            ("call-it", r"(?i)^.*\b(?:call|name)\s+(?:it|the\s+task)\s+(.+)$"),
            (
                "fa-set-title",
                r"(?:اسم|عنوان|نام)\s+(?:تسک\s+)?(?:رو|را)?\s*بذار\s+(.+?)(?:\s+(?:نذار|نکن|نباشه))?$",
            ),
            (
                "fa-title",
                r"(?:اسم|عنوان|نام)\s+تسک\s+(?:رو|را)?\s*(?:به\s+)?(.+?)(?:\s+(?:تغییر\s+بده|عوض\s+کن|کن|نذار|نکن|نباشه))?$",
            ),
        ];

        let rules = table
            .into_iter()
            .filter_map(|(name, pattern)| match CorrectionRule::new(name, pattern) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::error!("correction rule {} failed to compile: {}", name, e);
                    None
                }
            })
            .collect();
        Self { rules }
    }

    pub fn with_rules(rules: Vec<CorrectionRule>) -> Self {
        Self { rules }
    }

    /// The corrected task title, if the utterance is a title correction.
    pub fn detect(&self, text: &str) -> Option<String> {
        let sentences: Vec<&str> = text
            .split(['.', ';', '!', '?', '،', '؛', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        for sentence in sentences.iter().rev() {
            for rule in &self.rules {
                let Some(caps) = rule.pattern.captures(sentence) else {
                    continue;
                };
                let Some(raw) = caps.get(1) else {
                    continue;
                };
                if let Some(title) = clean_title(raw.as_str()) {
                    tracing::debug!("correction rule {} matched", rule.name);
                    return Some(title);
                }
            }
        }
        None
    }
}

fn clean_title(raw: &str) -> Option<String> {
    let quotes: &[char] = &['"', '\'', '«', '»', '“', '”', ',', '،', ':'];
    let mut title = raw.trim().trim_matches(quotes).trim().to_string();
    for prefix in ["رو ", "را "] {
        if let Some(rest) = title.strip_prefix(prefix) {
            title = rest.trim().to_string();
        }
    }
    let len = title.chars().count();
    if (MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
        Some(title)
    } else {
        None
    }
}
