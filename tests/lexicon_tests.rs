use jarvis::assistant::correction::CorrectionRules;
use jarvis::assistant::lexicon::{contains_phrase, normalize_text, Lexicon};

#[test]
fn test_negation_on_word_boundaries() {
    let lexicon = Lexicon::standard();
    assert!(lexicon.is_negation("no"));
    assert!(lexicon.is_negation("No, not needed."));
    assert!(lexicon.is_negation("نه"));
    assert!(lexicon.is_negation("نیازی نیست"));
    assert!(!lexicon.is_negation("notes about the layout"), "\"no\" must not fire inside \"notes\"");
    assert!(!lexicon.is_negation("نهایی کردن طرح"));
    assert!(
        !lexicon.is_negation("no wait I want to describe the whole login flow here"),
        "Long answers are content"
    );
}

#[test]
fn test_affirmation() {
    let lexicon = Lexicon::standard();
    assert!(lexicon.is_affirmation("yes"));
    assert!(lexicon.is_affirmation("okay do it"));
    assert!(lexicon.is_affirmation("بله"));
    assert!(!lexicon.is_affirmation("no"));
    assert!(!lexicon.is_affirmation("yesterday"));
}

#[test]
fn test_normalization() {
    assert_eq!(normalize_text("  Fix   ۱۵ Bugs "), "fix 15 bugs");
    assert!(contains_phrase("Well, not needed!", "not needed"));
    assert!(!contains_phrase("needed", "not needed"));
}

#[test]
fn test_title_corrections() {
    let rules = CorrectionRules::standard();
    assert_eq!(rules.detect("change the title to fix signup bug").as_deref(), Some("fix signup bug"));
    assert_eq!(rules.detect("no, call it \"payment page\"").as_deref(), Some("payment page"));
    assert_eq!(
        rules.detect("don't call it login. Call it signup flow").as_deref(),
        Some("signup flow"),
        "The last sentence wins"
    );
    assert_eq!(rules.detect("no, the title is fix signup bug").as_deref(), Some("fix signup bug"));
    assert_eq!(rules.detect("no, it's Sara"), None, "A slot answer is not a rename");
    assert_eq!(rules.detect("tomorrow"), None);
    assert_eq!(rules.detect("rename it to ab"), None, "Titles need at least three characters");
}
