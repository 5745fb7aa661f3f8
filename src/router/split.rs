//! Clause splitting for multi-intent utterances

/// Splits one utterance into independently routable clauses
pub trait ClauseSplitter: Send + Sync {
    /// Split `text` into ordered, non-empty clauses
    fn split(&self, text: &str) -> Vec<String>;
}

/// Keyword-and-comma splitter
///
/// Splits on "then", "and", "after that", and commas. Deliberately naive:
/// "peanut butter and jelly" splits too. The trait seam exists so a
/// smarter splitter can replace this one without touching the router.
pub struct KeywordSplitter {
    boundary: regex::Regex,
}

impl Default for KeywordSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordSplitter {
    /// Create the splitter
    ///
    /// # Panics
    ///
    /// Panics if the boundary pattern is invalid, which cannot happen for
    /// this fixed pattern
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: regex::Regex::new(r"(?i)\b(?:after that|then|and)\b|,")
                .expect("valid boundary pattern"),
        }
    }
}

impl ClauseSplitter for KeywordSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        self.boundary
            .split(text)
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_keywords_and_commas() {
        let splitter = KeywordSplitter::new();
        let clauses = splitter.split("play some jazz, then set a timer and check the weather");
        assert_eq!(
            clauses,
            vec!["play some jazz", "set a timer", "check the weather"]
        );
    }

    #[test]
    fn test_after_that_is_one_boundary() {
        let splitter = KeywordSplitter::new();
        let clauses = splitter.split("open my calendar after that stop the music");
        assert_eq!(clauses, vec!["open my calendar", "stop the music"]);
    }

    #[test]
    fn test_single_clause_passes_through() {
        let splitter = KeywordSplitter::new();
        assert_eq!(splitter.split("how are you today"), vec!["how are you today"]);
    }

    #[test]
    fn test_empty_clauses_dropped() {
        let splitter = KeywordSplitter::new();
        assert_eq!(splitter.split("then, and"), Vec::<String>::new());
    }
}
