//! Keyword tables for short dialogue answers.
//!
//! Phrases are matched on word boundaries after [`normalize_text`], so "no"
//! never fires inside "notes" and "نه" never fires inside "نهایی".

/// Lowercase, map Persian and Arabic-Indic digits to ASCII, turn the
/// zero-width non-joiner into a space and collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{200c}' => ' ',
            'ي' => 'ی',
            'ك' => 'ک',
            other => other,
        })
        .collect();
    mapped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn words_of(text: &str) -> Vec<String> {
    normalize_text(text)
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when `phrase` appears in `text` as a run of whole words.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let haystack = words_of(text);
    let needle = words_of(phrase);
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    pub negations: Vec<&'static str>,
    pub affirmations: Vec<&'static str>,
    pub assign_keywords: Vec<&'static str>,
    /// Answers longer than this are content, not a bare yes/no.
    pub short_answer_words: usize,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::standard()
    }
}

impl Lexicon {
    /// English plus the Persian phrasing the planner's users speak.
    pub fn standard() -> Self {
        Self {
            negations: vec![
                "no",
                "nope",
                "none",
                "skip",
                "not needed",
                "no need",
                "nothing",
                "نه",
                "خیر",
                "نیاز نداره",
                "نیازی نیست",
                "لازم نیست",
                "نمیخواد",
            ],
            affirmations: vec![
                "yes", "yeah", "yep", "ok", "okay", "sure", "confirm", "do it", "بله", "آره", "باشه",
                "تایید", "اوکی",
            ],
            assign_keywords: vec!["assign", "assigned", "responsible", "اساین", "مسئول", "مسئولش"],
            short_answer_words: 5,
        }
    }

    fn is_short(&self, text: &str) -> bool {
        words_of(text).len() <= self.short_answer_words
    }

    /// A short answer declining the question ("no", "not needed", "نیازی نیست").
    pub fn is_negation(&self, text: &str) -> bool {
        self.is_short(text) && self.negations.iter().any(|p| contains_phrase(text, p))
    }

    /// A short bare "yes". Longer utterances are treated as new commands.
    pub fn is_affirmation(&self, text: &str) -> bool {
        self.is_short(text)
            && !self.is_negation(text)
            && self.affirmations.iter().any(|p| contains_phrase(text, p))
    }

    pub fn has_assign_keyword(&self, text: &str) -> bool {
        let norm = normalize_text(text);
        self.assign_keywords.iter().any(|k| norm.contains(k))
    }
}
