//! Registered scoring algorithms.
//!
//! Names are unique string keys shared between scorer deployments and the
//! aggregator's quorum accounting. The quorum is always derived from the
//! configured registered set, never from a hard-coded count.

pub const DETECT_ADULT_CONTENT: &str = "detect_adult_content";
pub const DETECT_SPAMMY_WORDS: &str = "detect_spammy_words";
pub const DETECT_KNOWN_BAD_CONTENT: &str = "detect_known_bad_content";

/// Every algorithm registered in this build.
pub fn all() -> Vec<String> {
    vec![
        DETECT_ADULT_CONTENT.to_string(),
        DETECT_SPAMMY_WORDS.to_string(),
        DETECT_KNOWN_BAD_CONTENT.to_string(),
    ]
}

pub fn is_registered(name: &str) -> bool {
    matches!(
        name,
        DETECT_ADULT_CONTENT | DETECT_SPAMMY_WORDS | DETECT_KNOWN_BAD_CONTENT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names_are_unique() {
        let names = all();
        assert_eq!(names.len(), 3);
        for name in &names {
            assert!(is_registered(name));
        }
        assert!(!is_registered("detect_unknown"));
    }
}
