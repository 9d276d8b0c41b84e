pub const NO_CONTENT_MARKER: &str = "<NO_CONTENT>";

/// Lowercase fragments that show up when the backend explains why it will not
/// comply instead of emitting [`NO_CONTENT_MARKER`]. Changes here alter which
/// responses reach the cache; keep the tests below in step.
pub const EXPLANATORY_PATTERNS: &[&str] = &[
    "i appreciate",
    "i need to clarify",
    "i notice",
    "i should mention",
    "i should point out",
    "just the front matter",
    "just the table of contents",
    "doesn't include any actual",
    "lacks actual narrative",
];

pub fn is_valid_response(response: &str) -> bool {
    if response.trim().is_empty() {
        return false;
    }
    if response.contains(NO_CONTENT_MARKER) {
        return false;
    }

    let lower = response.to_lowercase();
    !EXPLANATORY_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_response_is_rejected() {
        assert!(!is_valid_response(""));
        assert!(!is_valid_response("  \n"));
    }

    #[test]
    fn rejection_marker_is_rejected() {
        assert!(!is_valid_response("<NO_CONTENT>"));
        assert!(!is_valid_response("Sorry.\n<NO_CONTENT>\n"));
    }

    #[test]
    fn explanatory_response_is_rejected() {
        assert!(!is_valid_response(
            "I should mention this text lacks narrative content"
        ));
        assert!(!is_valid_response("I NOTICE this is just the front matter."));
    }

    #[test]
    fn every_pattern_rejects() {
        for pattern in EXPLANATORY_PATTERNS {
            let response = format!("Well, {} here.", pattern.to_uppercase());
            assert!(!is_valid_response(&response), "{pattern} slipped through");
        }
    }

    #[test]
    fn narrative_response_is_accepted() {
        assert!(is_valid_response("The moor stretched endlessly into fog."));
        assert!(is_valid_response("Whispers beneath the frozen lake"));
    }
}
