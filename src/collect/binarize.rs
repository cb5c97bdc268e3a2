//! Free-text to binary outcome classification.

/// Maps model output text to a favorable/unfavorable decision.
///
/// Kept behind a trait so a better classifier can replace the keyword
/// heuristic without touching the collection pipeline.
pub trait Classifier: Send + Sync {
    /// True when the text reads as a favorable decision.
    fn classify(&self, text: &str) -> bool;
}

/// Case-insensitive substring match against a fixed keyword set.
///
/// This is a lossy heuristic, not a parser: a favorable answer phrased
/// without any of the keywords ("we would be glad to offer the position")
/// is a false negative.
pub struct KeywordClassifier {
    /// Lowercase keywords
    keywords: Vec<String>,
}

impl KeywordClassifier {
    /// Classifier with the default favorable-decision keyword set.
    pub fn new() -> Self {
        Self::with_keywords(&["yes", "approve", "accept", "hire"])
    }

    /// Classifier with a custom keyword set.
    pub fn with_keywords(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_match() {
        let classifier = KeywordClassifier::new();
        assert!(classifier.classify("YES, we approve"));
        assert!(classifier.classify("yes, we approve"));
        assert!(classifier.classify("We would HIRE them immediately."));
    }

    #[test]
    fn test_unfavorable_text() {
        let classifier = KeywordClassifier::new();
        assert!(!classifier.classify("no"));
        assert!(!classifier.classify("The application should be declined."));
        assert!(!classifier.classify(""));
    }

    #[test]
    fn test_known_false_negative() {
        // Favorable phrasing without a keyword is misclassified; documented
        // limitation of the heuristic.
        let classifier = KeywordClassifier::new();
        assert!(!classifier.classify("We would be glad to offer the position."));
    }

    #[test]
    fn test_custom_keywords() {
        let classifier = KeywordClassifier::with_keywords(&["Granted"]);
        assert!(classifier.classify("Visa granted."));
        assert!(!classifier.classify("yes"));
    }
}
