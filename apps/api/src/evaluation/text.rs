//! Lexical answer features: word counts, keyword coverage, filler words.

use lazy_static::lazy_static;
use regex::Regex;

/// Spoken fillers counted against communication quality. Matched as whole words.
pub const FILLER_WORDS: &[&str] = &[
    "um",
    "uh",
    "like",
    "you know",
    "so",
    "actually",
    "basically",
    "i mean",
];

lazy_static! {
    static ref FILLER_PATTERNS: Vec<Regex> = FILLER_WORDS
        .iter()
        .map(|f| Regex::new(&format!(r"\b{}\b", regex::escape(f))).expect("filler pattern is valid"))
        .collect();
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordCoverage {
    /// Keywords found, as written in the config, in configured order.
    pub matched: Vec<String>,
    /// matched / configured; 0 when nothing is configured.
    pub coverage: f64,
}

/// Case-insensitive substring match of each keyword against the answer.
pub fn keyword_coverage(answer: &str, keywords: &[String]) -> KeywordCoverage {
    if keywords.is_empty() {
        return KeywordCoverage {
            matched: vec![],
            coverage: 0.0,
        };
    }

    let text = answer.to_lowercase();
    let matched: Vec<String> = keywords
        .iter()
        .filter(|kw| text.contains(&kw.to_lowercase()))
        .cloned()
        .collect();
    let coverage = matched.len() as f64 / keywords.len() as f64;

    KeywordCoverage { matched, coverage }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillerStats {
    pub fillers: usize,
    pub total_words: usize,
    /// fillers / total_words; 0 for an empty answer.
    pub filler_rate: f64,
}

pub fn filler_stats(answer: &str) -> FillerStats {
    let text = answer.to_lowercase();
    let total_words = word_count(&text);
    let fillers: usize = FILLER_PATTERNS
        .iter()
        .map(|re| re.find_iter(&text).count())
        .sum();
    let filler_rate = if total_words > 0 {
        fillers as f64 / total_words as f64
    } else {
        0.0
    };

    FillerStats {
        fillers,
        total_words,
        filler_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keyword_coverage_case_insensitive() {
        let result = keyword_coverage(
            "I used Docker and Kubernetes",
            &kws(&["docker", "kubernetes", "aws"]),
        );
        assert_eq!(result.matched, vec!["docker", "kubernetes"]);
        assert!((result.coverage - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_keyword_coverage_keeps_configured_casing() {
        let result = keyword_coverage("we deployed on aws", &kws(&["AWS"]));
        assert_eq!(result.matched, vec!["AWS"]);
        assert_eq!(result.coverage, 1.0);
    }

    #[test]
    fn test_keyword_coverage_without_keywords_is_zero() {
        let result = keyword_coverage("anything at all", &[]);
        assert!(result.matched.is_empty());
        assert_eq!(result.coverage, 0.0);
    }

    #[test]
    fn test_keyword_substring_match() {
        // substring, not whole-word: "rust" matches inside "rustc"
        let result = keyword_coverage("compiled with rustc", &kws(&["rust"]));
        assert_eq!(result.coverage, 1.0);
    }

    #[test]
    fn test_filler_words_whole_word_only() {
        let stats = filler_stats("Um so I mean like it works");
        assert_eq!(stats.total_words, 7);
        assert_eq!(stats.fillers, 4);
        assert!((stats.filler_rate - 4.0 / 7.0).abs() < 1e-12);

        // "likely", "also", "umbrella" contain fillers but are not fillers
        let clean = filler_stats("It is likely also an umbrella term");
        assert_eq!(clean.fillers, 0);
        assert_eq!(clean.filler_rate, 0.0);
    }

    #[test]
    fn test_filler_words_across_punctuation() {
        let stats = filler_stats("Well, you know, it's basically done.");
        assert_eq!(stats.fillers, 2);
        assert_eq!(stats.total_words, 6);
    }

    #[test]
    fn test_empty_answer_has_zero_rate() {
        let stats = filler_stats("   ");
        assert_eq!(stats.total_words, 0);
        assert_eq!(stats.filler_rate, 0.0);
    }

    #[test]
    fn test_word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("  one   two\tthree\n"), 3);
        assert_eq!(word_count(""), 0);
    }
}
