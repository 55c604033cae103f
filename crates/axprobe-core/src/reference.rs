//! Verse-reference pattern matching over extracted UI text.
//!
//! The probe verifies that the simulator is rendering scripture content by
//! scanning the flattened UI text for a reference of the form
//! `<BookName> <chapter>:<verse>` (e.g. "John 3:16"). The book list is a
//! fixed closed set; matching is case-insensitive.

use std::sync::LazyLock;

use regex::Regex;

/// Book names eligible to open a reference. Closed list; anything else
/// ("Mark 1:1") does not match.
pub const BOOK_NAMES: [&str; 8] = [
    "Genesis", "Exodus", "John", "Romans", "Psalm", "Psalms", "Proverbs", "Isaiah",
];

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let books = BOOK_NAMES.join("|");
    Regex::new(&format!(r"(?i)({books})\s+\d+:\d+")).expect("reference pattern compiles")
});

/// Returns `true` if `text` contains a verse-like reference anywhere.
pub fn is_reference(text: &str) -> bool {
    REFERENCE_PATTERN.is_match(text)
}

/// Returns the first string (in sequence order) containing a reference, or
/// `None` if no extracted string matches.
pub fn find_reference(texts: &[String]) -> Option<&str> {
    texts.iter().find(|t| is_reference(t)).map(String::as_str)
}
