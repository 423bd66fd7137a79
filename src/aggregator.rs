//! Flattening and title-based de-duplication of per-feed results.

use crate::models::Article;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Deduplicator {
    min_key_len: usize,
}

impl Deduplicator {
    pub fn new(min_key_len: usize) -> Self {
        Self { min_key_len }
    }

    /// Flatten `per_feed` in the given order, keeping the first article for
    /// each normalized title. Articles whose key is shorter than
    /// `min_key_len` characters are dropped.
    pub fn aggregate(&self, per_feed: Vec<Vec<Article>>) -> Vec<Article> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        let mut degenerate = 0usize;
        let mut duplicates = 0usize;

        for article in per_feed.into_iter().flatten() {
            let key = normalize_title(&article.title);
            if key.chars().count() < self.min_key_len {
                degenerate += 1;
                continue;
            }
            if !seen.insert(key) {
                duplicates += 1;
                continue;
            }
            out.push(article);
        }

        debug!(kept = out.len(), duplicates, degenerate, "Aggregated feed results");
        out
    }
}

/// Lowercase `title` and keep only alphanumeric characters.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(title: &str, source: &str) -> Article {
        Article::new(title, String::new(), String::new(), Utc::now(), source).unwrap()
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Apple Unveils New Chip!"), "appleunveilsnewchip");
        assert_eq!(normalize_title("  --  "), "");
        assert_eq!(normalize_title("Žltý Kôň 2025"), "žltýkôň2025");
        assert_eq!(normalize_title("東京 ニュース"), "東京ニュース");
    }

    #[test]
    fn test_case_and_punctuation_variants_collapse() {
        let dedup = Deduplicator::new(3);
        let out = dedup.aggregate(vec![
            vec![article("Apple unveils new chip", "Tech")],
            vec![article("Apple Unveils New Chip!", "Business")],
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "Tech");
    }

    #[test]
    fn test_first_occurrence_wins_within_and_across_feeds() {
        let dedup = Deduplicator::new(3);
        let out = dedup.aggregate(vec![
            vec![article("One story", "A"), article("Two story", "A"), article("one STORY", "A")],
            vec![article("Three story", "B"), article("two-story", "B")],
        ]);
        let titles: Vec<_> = out.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["One story", "Two story", "Three story"]);
    }

    #[test]
    fn test_degenerate_keys_are_dropped() {
        let dedup = Deduplicator::new(3);
        let out = dedup.aggregate(vec![vec![
            article("!!", "A"),
            article("A.", "A"),
            article("Ok?", "A"),
            article("Real headline", "A"),
        ]]);
        let titles: Vec<_> = out.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Real headline"]);
    }

    #[test]
    fn test_output_keys_are_unique() {
        let dedup = Deduplicator::new(3);
        let feeds: Vec<Vec<Article>> = (0..4)
            .map(|f| (0..10).map(|i| article(&format!("Headline {}", (i + f) % 6), "S")).collect())
            .collect();
        let out = dedup.aggregate(feeds);
        let keys: HashSet<String> = out.iter().map(|a| normalize_title(&a.title)).collect();
        assert_eq!(keys.len(), out.len());
        assert_eq!(out.len(), 6);
    }
}
