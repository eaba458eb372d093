//! Language understanding for the planner assistant: entity resolution,
//! date phrases, correction detection, classifier normalization and the
//! per-intent handlers. Everything here is pure; the kernel drives it.

pub mod correction;
pub mod dates;
pub mod handlers;
pub mod intent;
pub mod lexicon;
pub mod resolver;

use correction::CorrectionRules;
use dates::DateExpressionParser;
use lexicon::Lexicon;

/// Primary language tags the standard tables understand.
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "fa"];

/// The locale-specific rule tables, bundled so a session can swap them as a unit.
pub struct Language {
    pub lexicon: Lexicon,
    pub dates: DateExpressionParser,
    pub corrections: CorrectionRules,
}

impl Language {
    /// English with the Persian phrasing the planner's users mix in.
    pub fn standard() -> Self {
        Self {
            lexicon: Lexicon::standard(),
            dates: DateExpressionParser::standard(),
            corrections: CorrectionRules::standard(),
        }
    }

    /// Whether `locale` (`en`, `fa-IR`, `en_US`...) has rule tables.
    pub fn supports(locale: &str) -> bool {
        let tag = locale.trim().to_ascii_lowercase();
        let primary = tag.split(['-', '_']).next().unwrap_or_default();
        SUPPORTED_LOCALES.contains(&primary)
    }

    /// Rule tables for `locale`. English and Persian share the standard
    /// tables since users mix the two in one utterance.
    pub fn for_locale(locale: &str) -> Option<Self> {
        Self::supports(locale).then(Self::standard)
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::standard()
    }
}
